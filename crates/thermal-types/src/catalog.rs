// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Catalog
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Static description of a lumped thermal network.
//!
//! A [`NodeCatalog`] is what the hardware registry hands over: a table of
//! materials plus one [`NodeSpec`] per isothermal surface, each listing the
//! conductive contacts it knows about. Contacts are directed; the catalog
//! never infers the reverse link.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{BASELINE_TEMPERATURE, KELVIN_OFFSET};
use crate::error::{ThermalError, ThermalResult};

/// Bulk and surface properties shared by every node built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Thermal conductivity [W/m·K]
    pub conductivity: f64,
    /// Specific heat capacity [J/kg·K]
    pub specific_heat: f64,
    /// Solar and albedo absorptance [0, 1]
    pub absorptance: f64,
    /// Infrared emissivity [0, 1]
    pub emissivity: f64,
}

impl Material {
    pub fn new(
        name: &str,
        conductivity: f64,
        specific_heat: f64,
        absorptance: f64,
        emissivity: f64,
    ) -> Self {
        Material {
            name: name.to_string(),
            conductivity,
            specific_heat,
            absorptance,
            emissivity,
        }
    }

    pub fn validate(&self) -> ThermalResult<()> {
        if self.name.trim().is_empty() {
            return Err(ThermalError::ConfigError(
                "material name must not be empty".to_string(),
            ));
        }
        if !self.conductivity.is_finite() || self.conductivity < 0.0 {
            return Err(ThermalError::ConfigError(format!(
                "material '{}': conductivity must be finite and >= 0, got {}",
                self.name, self.conductivity
            )));
        }
        if !self.specific_heat.is_finite() || self.specific_heat <= 0.0 {
            return Err(ThermalError::ConfigError(format!(
                "material '{}': specific_heat must be finite and > 0, got {}",
                self.name, self.specific_heat
            )));
        }
        for (label, value) in [
            ("absorptance", self.absorptance),
            ("emissivity", self.emissivity),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ThermalError::ConfigError(format!(
                    "material '{}': {label} must lie in [0, 1], got {value}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Body whose geometry drives a node's environmental flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RadiatingBody {
    /// Planet-facing: solar (through the Earth view factor), albedo and IR.
    Earth,
    /// Sun-facing: direct solar only.
    Sun,
    /// Inside the bus: no environmental flux.
    Internal,
    /// Shadowed or decoupled: no environmental flux.
    None,
}

impl RadiatingBody {
    pub fn as_str(&self) -> &'static str {
        match self {
            RadiatingBody::Earth => "earth",
            RadiatingBody::Sun => "sun",
            RadiatingBody::Internal => "internal",
            RadiatingBody::None => "none",
        }
    }

    /// Whether this assignment receives any environmental flux at all.
    pub fn is_exposed(&self) -> bool {
        matches!(self, RadiatingBody::Earth | RadiatingBody::Sun)
    }
}

impl FromStr for RadiatingBody {
    type Err = ThermalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earth" => Ok(RadiatingBody::Earth),
            "sun" => Ok(RadiatingBody::Sun),
            "internal" => Ok(RadiatingBody::Internal),
            "none" => Ok(RadiatingBody::None),
            _ => Err(ThermalError::UnknownRadiatingBody(s.to_string())),
        }
    }
}

impl TryFrom<String> for RadiatingBody {
    type Error = ThermalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RadiatingBody> for String {
    fn from(body: RadiatingBody) -> Self {
        body.as_str().to_string()
    }
}

impl fmt::Display for RadiatingBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed conductive link to another node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactSpec {
    /// Key of the node heat is exchanged with.
    pub neighbor: u32,
    /// Physical contact area [m²]
    pub area: f64,
}

/// Coupling of a node to the fixed-temperature internal compartment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CompartmentCoupling {
    /// Conductive support contact area [m²]
    #[serde(default)]
    pub support_area: f64,
    /// Compartment surface area radiating onto this node [m²]
    #[serde(default)]
    pub view_area: f64,
}

impl CompartmentCoupling {
    pub fn is_coupled(&self) -> bool {
        self.support_area > 0.0 || self.view_area > 0.0
    }
}

/// Allowed temperature band for a node [K].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureLimits {
    pub min: f64,
    pub max: f64,
}

impl TemperatureLimits {
    pub fn from_celsius(min_c: f64, max_c: f64) -> Self {
        TemperatureLimits {
            min: min_c + KELVIN_OFFSET,
            max: max_c + KELVIN_OFFSET,
        }
    }

    pub fn contains(&self, temperature: f64) -> bool {
        temperature >= self.min && temperature <= self.max
    }
}

fn default_temperature() -> f64 {
    BASELINE_TEMPERATURE
}

/// One lumped node as described by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub key: u32,
    pub name: String,
    /// Exposed surface area [m²]
    pub area: f64,
    /// Mass [kg]
    pub mass: f64,
    /// Name of an entry in [`NodeCatalog::materials`].
    pub material: String,
    /// Initial temperature [K]
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Tilt relative to the radiating body [deg]: 0 faces it, 90 is edge-on.
    pub gamma: f64,
    pub radiating_body: RadiatingBody,
    #[serde(default)]
    pub contacts: Vec<ContactSpec>,
    #[serde(default)]
    pub compartment: CompartmentCoupling,
    /// Constant internal dissipation [W]
    #[serde(default)]
    pub heat_load: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<TemperatureLimits>,
}

impl NodeSpec {
    /// Bare exposed node with no contacts, compartment coupling or load.
    pub fn new(
        key: u32,
        name: &str,
        area: f64,
        mass: f64,
        material: &str,
        gamma: f64,
        radiating_body: RadiatingBody,
    ) -> Self {
        NodeSpec {
            key,
            name: name.to_string(),
            area,
            mass,
            material: material.to_string(),
            temperature: BASELINE_TEMPERATURE,
            gamma,
            radiating_body,
            contacts: Vec::new(),
            compartment: CompartmentCoupling::default(),
            heat_load: 0.0,
            limits: None,
        }
    }

    pub fn with_contact(mut self, neighbor: u32, area: f64) -> Self {
        self.contacts.push(ContactSpec { neighbor, area });
        self
    }

    pub fn with_compartment(mut self, support_area: f64, view_area: f64) -> Self {
        self.compartment = CompartmentCoupling {
            support_area,
            view_area,
        };
        self
    }

    pub fn with_heat_load(mut self, watts: f64) -> Self {
        self.heat_load = watts;
        self
    }

    pub fn with_limits(mut self, limits: TemperatureLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_temperature(mut self, kelvin: f64) -> Self {
        self.temperature = kelvin;
        self
    }
}

/// Materials plus nodes: everything needed to build a node graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCatalog {
    pub name: String,
    pub materials: Vec<Material>,
    pub nodes: Vec<NodeSpec>,
}

impl NodeCatalog {
    pub fn from_file(path: &str) -> ThermalResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> ThermalResult<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        Ok(catalog)
    }

    pub fn to_json_pretty(&self) -> ThermalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn node(&self, key: u32) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.key == key)
    }
}
