use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThermalError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid geometry on node {key}: {message}")]
    InvalidGeometry { key: u32, message: String },

    #[error("Node {key} has non-positive thermal mass {value} J/K")]
    NonPositiveThermalMass { key: u32, value: f64 },

    #[error("Unknown radiating body '{0}' (expected earth, sun, internal or none)")]
    UnknownRadiatingBody(String),

    #[error("Unknown node key {0}")]
    UnknownNode(u32),

    #[error("Duplicate node key {0}")]
    DuplicateNode(u32),

    #[error("Node {key} references unknown material '{material}'")]
    UnknownMaterial { key: u32, material: String },

    #[error("Integration did not converge at t={t} s (step {step} s): {reason}")]
    NonConvergence { t: f64, step: f64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ThermalError {
    /// True for failures a caller may retry with a different step policy.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ThermalError::NonConvergence { .. })
    }
}

pub type ThermalResult<T> = Result<T, ThermalError>;
