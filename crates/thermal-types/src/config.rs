// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASELINE_TEMPERATURE, EARTH_MEAN_RADIUS, EARTH_MU, EARTH_RADIUS, SOLAR_CONSTANT,
    STEFAN_BOLTZMANN, SUN_RADIUS,
};
use crate::error::{ThermalError, ThermalResult};

/// Top-level run configuration: physics tables, solver and sweep grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalConfig {
    pub mission_name: String,
    #[serde(default)]
    pub constants: PhysicalConstants,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub terms: HeatBalanceTerms,
    #[serde(default)]
    pub integrator: IntegratorConfig,
    pub sweep: SweepConfig,
}

/// Immutable physical-constants table, loaded once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// σ [W/m²·K⁴]
    #[serde(default = "default_sigma")]
    pub stefan_boltzmann: f64,
    /// μ = G·M [m³/s²]
    #[serde(default = "default_mu")]
    pub earth_mu: f64,
    /// Radius used by the orbital period [m]
    #[serde(default = "default_earth_mean_radius")]
    pub earth_mean_radius: f64,
    /// Radius used by eclipse and view-factor geometry [m]
    #[serde(default = "default_earth_radius")]
    pub earth_radius: f64,
    /// Effective radius of the Sun as a radiating body [m]
    #[serde(default = "default_sun_radius")]
    pub sun_radius: f64,
    /// [W/m²]
    #[serde(default = "default_solar_constant")]
    pub solar_constant: f64,
    /// Nominal isothermal start [K]
    #[serde(default = "default_baseline")]
    pub baseline_temperature: f64,
}

fn default_sigma() -> f64 {
    STEFAN_BOLTZMANN
}
fn default_mu() -> f64 {
    EARTH_MU
}
fn default_earth_mean_radius() -> f64 {
    EARTH_MEAN_RADIUS
}
fn default_earth_radius() -> f64 {
    EARTH_RADIUS
}
fn default_sun_radius() -> f64 {
    SUN_RADIUS
}
fn default_solar_constant() -> f64 {
    SOLAR_CONSTANT
}
fn default_baseline() -> f64 {
    BASELINE_TEMPERATURE
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        PhysicalConstants {
            stefan_boltzmann: default_sigma(),
            earth_mu: default_mu(),
            earth_mean_radius: default_earth_mean_radius(),
            earth_radius: default_earth_radius(),
            sun_radius: default_sun_radius(),
            solar_constant: default_solar_constant(),
            baseline_temperature: default_baseline(),
        }
    }
}

impl PhysicalConstants {
    pub fn validate(&self) -> ThermalResult<()> {
        for (label, value) in [
            ("stefan_boltzmann", self.stefan_boltzmann),
            ("earth_mu", self.earth_mu),
            ("earth_mean_radius", self.earth_mean_radius),
            ("earth_radius", self.earth_radius),
            ("sun_radius", self.sun_radius),
            ("solar_constant", self.solar_constant),
            ("baseline_temperature", self.baseline_temperature),
        ] {
            require_positive(label, value)?;
        }
        Ok(())
    }
}

/// Environment tables: albedo/IR regimes, eclipse leakage, compartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Albedo coefficient below the regime threshold
    #[serde(default = "default_albedo_low")]
    pub albedo_low: f64,
    /// Albedo coefficient at or above the regime threshold
    #[serde(default = "default_albedo_high")]
    pub albedo_high: f64,
    /// Earth IR [W/m²] below the regime threshold
    #[serde(default = "default_ir_low")]
    pub infrared_low: f64,
    /// Earth IR [W/m²] at or above the regime threshold
    #[serde(default = "default_ir_high")]
    pub infrared_high: f64,
    /// Beta angle separating the two regimes [deg]
    #[serde(default = "default_regime_threshold")]
    pub regime_threshold_deg: f64,
    /// Fraction of albedo flux still received while eclipsed.
    /// Ad hoc penumbra leakage; kept configurable until validated.
    #[serde(default = "default_eclipse_albedo")]
    pub eclipse_albedo_fraction: f64,
    /// Fixed compartment temperature [K]
    #[serde(default = "default_compartment_temperature")]
    pub compartment_temperature: f64,
    /// Emissivity of the compartment surface
    #[serde(default = "default_compartment_emissivity")]
    pub compartment_emissivity: f64,
}

fn default_albedo_low() -> f64 {
    0.14
}
fn default_albedo_high() -> f64 {
    0.19
}
fn default_ir_low() -> f64 {
    228.0
}
fn default_ir_high() -> f64 {
    218.0
}
fn default_regime_threshold() -> f64 {
    30.0
}
fn default_eclipse_albedo() -> f64 {
    0.3
}
fn default_compartment_temperature() -> f64 {
    293.15
}
fn default_compartment_emissivity() -> f64 {
    0.31
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            albedo_low: default_albedo_low(),
            albedo_high: default_albedo_high(),
            infrared_low: default_ir_low(),
            infrared_high: default_ir_high(),
            regime_threshold_deg: default_regime_threshold(),
            eclipse_albedo_fraction: default_eclipse_albedo(),
            compartment_temperature: default_compartment_temperature(),
            compartment_emissivity: default_compartment_emissivity(),
        }
    }
}

impl EnvironmentConfig {
    pub fn validate(&self) -> ThermalResult<()> {
        require_unit_interval("albedo_low", self.albedo_low)?;
        require_unit_interval("albedo_high", self.albedo_high)?;
        require_unit_interval("eclipse_albedo_fraction", self.eclipse_albedo_fraction)?;
        require_unit_interval("compartment_emissivity", self.compartment_emissivity)?;
        require_non_negative("infrared_low", self.infrared_low)?;
        require_non_negative("infrared_high", self.infrared_high)?;
        require_positive("compartment_temperature", self.compartment_temperature)?;
        if !self.regime_threshold_deg.is_finite()
            || !(0.0..=90.0).contains(&self.regime_threshold_deg)
        {
            return Err(ThermalError::ConfigError(format!(
                "regime_threshold_deg must lie in [0, 90], got {}",
                self.regime_threshold_deg
            )));
        }
        Ok(())
    }
}

/// Switches for each term of the heat balance. All on for flight runs;
/// verification runs turn some off (e.g. conduction-only energy checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatBalanceTerms {
    #[serde(default = "default_true")]
    pub conduction: bool,
    #[serde(default = "default_true")]
    pub compartment: bool,
    #[serde(default = "default_true")]
    pub environment: bool,
    #[serde(default = "default_true")]
    pub self_radiation: bool,
    #[serde(default = "default_true")]
    pub dissipation: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HeatBalanceTerms {
    fn default() -> Self {
        HeatBalanceTerms {
            conduction: true,
            compartment: true,
            environment: true,
            self_radiation: true,
            dissipation: true,
        }
    }
}

impl HeatBalanceTerms {
    /// Only node-to-node conduction. Total internal energy is invariant.
    pub fn conduction_only() -> Self {
        HeatBalanceTerms {
            conduction: true,
            compartment: false,
            environment: false,
            self_radiation: false,
            dissipation: false,
        }
    }
}

/// Adaptive Runge–Kutta step control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// Initial step [s]; estimated from the derivative when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_step: Option<f64>,
    /// Factor applied to the estimated initial step.
    #[serde(default = "default_first_step_scale")]
    pub first_step_scale: f64,
    /// Upper bound on the step [s]; unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_step: Option<f64>,
    /// Step size below which the integration is reported as non-convergent [s].
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    /// Attempted-step budget per integration call.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_rtol() -> f64 {
    1e-3
}
fn default_atol() -> f64 {
    1e-6
}
fn default_first_step_scale() -> f64 {
    1.0
}
fn default_min_step() -> f64 {
    1e-9
}
fn default_max_steps() -> usize {
    100_000
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorConfig {
            rtol: default_rtol(),
            atol: default_atol(),
            first_step: None,
            first_step_scale: default_first_step_scale(),
            max_step: None,
            min_step: default_min_step(),
            max_steps: default_max_steps(),
        }
    }
}

impl IntegratorConfig {
    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        IntegratorConfig {
            rtol,
            atol,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ThermalResult<()> {
        require_positive("rtol", self.rtol)?;
        require_positive("atol", self.atol)?;
        require_positive("min_step", self.min_step)?;
        require_positive("first_step_scale", self.first_step_scale)?;
        if let Some(h) = self.first_step {
            require_positive("first_step", h)?;
        }
        if let Some(h) = self.max_step {
            require_positive("max_step", h)?;
            if h < self.min_step {
                return Err(ThermalError::ConfigError(format!(
                    "max_step ({h}) must be >= min_step ({})",
                    self.min_step
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(ThermalError::ConfigError(
                "max_steps must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Step policy for a retry after non-convergence: first step (given or
    /// estimated) and minimum step divided by ten, twice the budget.
    pub fn relaxed(&self) -> Self {
        IntegratorConfig {
            first_step: self.first_step.map(|h| h / 10.0),
            first_step_scale: self.first_step_scale / 10.0,
            min_step: self.min_step / 10.0,
            max_steps: self.max_steps.saturating_mul(2),
            ..self.clone()
        }
    }
}

/// Grid of (beta, altitude, time) cells to integrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Beta angles [deg]
    pub betas_deg: Vec<f64>,
    /// Circular orbit altitudes [m]
    pub altitudes_m: Vec<f64>,
    /// Horizons since the common epoch [s]
    pub times_s: Vec<f64>,
    /// Isothermal start [K]; `constants.baseline_temperature` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_temperature: Option<f64>,
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Retries per failing cell with a relaxed step policy.
    #[serde(default = "default_retries")]
    pub retries: usize,
}

fn default_retries() -> usize {
    1
}

impl SweepConfig {
    pub fn new(betas_deg: Vec<f64>, altitudes_m: Vec<f64>, times_s: Vec<f64>) -> Self {
        SweepConfig {
            betas_deg,
            altitudes_m,
            times_s,
            initial_temperature: None,
            parallel: true,
            retries: default_retries(),
        }
    }

    pub fn validate(&self) -> ThermalResult<()> {
        for (label, axis) in [
            ("betas_deg", &self.betas_deg),
            ("altitudes_m", &self.altitudes_m),
            ("times_s", &self.times_s),
        ] {
            if axis.is_empty() {
                return Err(ThermalError::ConfigError(format!(
                    "sweep axis {label} must not be empty"
                )));
            }
            if let Some(bad) = axis.iter().find(|v| !v.is_finite()) {
                return Err(ThermalError::ConfigError(format!(
                    "sweep axis {label} contains non-finite value {bad}"
                )));
            }
        }
        if let Some(bad) = self.betas_deg.iter().find(|b| b.abs() > 90.0) {
            return Err(ThermalError::ConfigError(format!(
                "beta must lie in [-90, 90] deg, got {bad}"
            )));
        }
        if let Some(bad) = self.altitudes_m.iter().find(|h| **h <= 0.0) {
            return Err(ThermalError::ConfigError(format!(
                "altitude must be > 0 m, got {bad}"
            )));
        }
        if let Some(bad) = self.times_s.iter().find(|t| **t < 0.0) {
            return Err(ThermalError::ConfigError(format!(
                "sweep time must be >= 0 s, got {bad}"
            )));
        }
        if let Some(t0) = self.initial_temperature {
            require_positive("initial_temperature", t0)?;
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.betas_deg.len() * self.altitudes_m.len() * self.times_s.len()
    }
}

impl ThermalConfig {
    /// Default physics and solver tables around a sweep grid.
    pub fn new(mission_name: &str, sweep: SweepConfig) -> Self {
        ThermalConfig {
            mission_name: mission_name.to_string(),
            constants: PhysicalConstants::default(),
            environment: EnvironmentConfig::default(),
            terms: HeatBalanceTerms::default(),
            integrator: IntegratorConfig::default(),
            sweep,
        }
    }

    /// Load from a JSON file and validate every section.
    pub fn from_file(path: &str) -> ThermalResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> ThermalResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ThermalResult<()> {
        self.constants.validate()?;
        self.environment.validate()?;
        self.integrator.validate()?;
        self.sweep.validate()
    }
}

fn require_positive(label: &str, value: f64) -> ThermalResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ThermalError::ConfigError(format!(
            "{label} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(label: &str, value: f64) -> ThermalResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ThermalError::ConfigError(format!(
            "{label} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

fn require_unit_interval(label: &str, value: f64) -> ThermalResult<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ThermalError::ConfigError(format!(
            "{label} must lie in [0, 1], got {value}"
        )));
    }
    Ok(())
}
