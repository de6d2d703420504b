// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Node Graph
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Immutable arena of lumped nodes built once from a [`NodeCatalog`].
//!
//! Nodes are addressed by key through an index map; adjacency is stored as
//! directed `(index, contact area)` edges resolved at construction time.
//! Links need not be reciprocal, and self-links are kept (they carry no
//! heat since `T_i − T_i = 0`). Only the start-temperature field changes
//! after construction; integration results live in the returned
//! trajectories and sweep tensors, never in the graph.

use std::collections::HashMap;

use log::debug;
use ndarray::Array1;
use thermal_types::catalog::{
    CompartmentCoupling, ContactSpec, Material, NodeCatalog, NodeSpec, RadiatingBody,
    TemperatureLimits,
};
use thermal_types::error::{ThermalError, ThermalResult};

/// Directed conductive edge to the node at `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub index: usize,
    /// [m²]
    pub area: f64,
}

/// A validated node with its material resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub key: u32,
    pub name: String,
    /// Exposed area [m²]
    pub area: f64,
    /// [kg]
    pub mass: f64,
    pub material: Material,
    /// mass × specific heat [J/K]
    pub thermal_mass: f64,
    /// Tilt [deg]
    pub gamma: f64,
    pub radiating_body: RadiatingBody,
    pub contacts: Vec<Contact>,
    pub compartment: CompartmentCoupling,
    /// [W]
    pub heat_load: f64,
    pub limits: Option<TemperatureLimits>,
    /// Catalog start temperature [K]
    pub initial_temperature: f64,
}

#[derive(Debug, Clone)]
pub struct NodeGraph {
    name: String,
    materials: Vec<Material>,
    nodes: Vec<Node>,
    index: HashMap<u32, usize>,
    temperatures: Array1<f64>,
}

impl NodeGraph {
    /// Validate the catalog and resolve keys and materials in a single pass.
    pub fn from_catalog(catalog: &NodeCatalog) -> ThermalResult<Self> {
        if catalog.nodes.is_empty() {
            return Err(ThermalError::ConfigError(format!(
                "catalog '{}' contains no nodes",
                catalog.name
            )));
        }

        let mut materials: HashMap<&str, &Material> = HashMap::new();
        for material in &catalog.materials {
            material.validate()?;
            if materials.insert(material.name.as_str(), material).is_some() {
                return Err(ThermalError::ConfigError(format!(
                    "material '{}' defined twice",
                    material.name
                )));
            }
        }

        let mut index = HashMap::with_capacity(catalog.nodes.len());
        for (i, spec) in catalog.nodes.iter().enumerate() {
            if index.insert(spec.key, i).is_some() {
                return Err(ThermalError::DuplicateNode(spec.key));
            }
        }

        let mut nodes = Vec::with_capacity(catalog.nodes.len());
        for spec in &catalog.nodes {
            let material = materials.get(spec.material.as_str()).ok_or_else(|| {
                ThermalError::UnknownMaterial {
                    key: spec.key,
                    material: spec.material.clone(),
                }
            })?;
            nodes.push(build_node(spec, material, &index)?);
        }

        let temperatures = nodes.iter().map(|n| n.initial_temperature).collect();
        Ok(NodeGraph {
            name: catalog.name.clone(),
            materials: catalog.materials.clone(),
            nodes,
            index,
            temperatures,
        })
    }

    /// Static description of the graph; rebuilding from it yields the same graph.
    pub fn to_catalog(&self) -> NodeCatalog {
        let nodes = self
            .nodes
            .iter()
            .map(|node| NodeSpec {
                key: node.key,
                name: node.name.clone(),
                area: node.area,
                mass: node.mass,
                material: node.material.name.clone(),
                temperature: node.initial_temperature,
                gamma: node.gamma,
                radiating_body: node.radiating_body,
                contacts: node
                    .contacts
                    .iter()
                    .map(|c| ContactSpec {
                        neighbor: self.nodes[c.index].key,
                        area: c.area,
                    })
                    .collect(),
                compartment: node.compartment,
                heat_load: node.heat_load,
                limits: node.limits,
            })
            .collect();
        NodeCatalog {
            name: self.name.clone(),
            materials: self.materials.clone(),
            nodes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn keys(&self) -> Vec<u32> {
        self.nodes.iter().map(|n| n.key).collect()
    }

    pub fn index_of(&self, key: u32) -> Option<usize> {
        self.index.get(&key).copied()
    }

    pub fn node(&self, key: u32) -> Option<&Node> {
        self.index_of(key).map(|i| &self.nodes[i])
    }

    /// Node by key, or [`ThermalError::UnknownNode`].
    pub fn require(&self, key: u32) -> ThermalResult<&Node> {
        self.node(key).ok_or(ThermalError::UnknownNode(key))
    }

    /// Start-temperature field [K] read by trajectory runs. Seeded from the
    /// catalog; integration never writes it back.
    pub fn temperatures(&self) -> &Array1<f64> {
        &self.temperatures
    }

    pub fn temperature(&self, key: u32) -> ThermalResult<f64> {
        let i = self.index_of(key).ok_or(ThermalError::UnknownNode(key))?;
        Ok(self.temperatures[i])
    }

    /// Replace the start-temperature field; length and values are checked.
    pub fn set_temperatures(&mut self, temperatures: &[f64]) -> ThermalResult<()> {
        if temperatures.len() != self.nodes.len() {
            return Err(ThermalError::ConfigError(format!(
                "temperature field has {} entries, graph has {} nodes",
                temperatures.len(),
                self.nodes.len()
            )));
        }
        if let Some((i, bad)) = temperatures
            .iter()
            .enumerate()
            .find(|(_, t)| !t.is_finite() || **t <= 0.0)
        {
            return Err(ThermalError::ConfigError(format!(
                "node {}: temperature must be finite and > 0 K, got {bad}",
                self.nodes[i].key
            )));
        }
        self.temperatures = Array1::from(temperatures.to_vec());
        Ok(())
    }

    /// Sum of thermal masses [J/K].
    pub fn total_thermal_mass(&self) -> f64 {
        self.nodes.iter().map(|n| n.thermal_mass).sum()
    }

    /// True when every edge i→j has a partner j→i with the same area.
    pub fn is_reciprocal(&self) -> bool {
        self.nodes.iter().enumerate().all(|(i, node)| {
            node.contacts.iter().all(|c| {
                self.nodes[c.index]
                    .contacts
                    .iter()
                    .any(|back| back.index == i && back.area == c.area)
            })
        })
    }
}

fn build_node(
    spec: &NodeSpec,
    material: &Material,
    index: &HashMap<u32, usize>,
) -> ThermalResult<Node> {
    let key = spec.key;
    let geometry = |message: String| ThermalError::InvalidGeometry { key, message };

    if !spec.area.is_finite() || spec.area < 0.0 {
        return Err(geometry(format!(
            "area must be finite and >= 0 m², got {}",
            spec.area
        )));
    }
    if !spec.gamma.is_finite() {
        return Err(geometry(format!("tilt must be finite, got {}", spec.gamma)));
    }
    let thermal_mass = spec.mass * material.specific_heat;
    if !thermal_mass.is_finite() || thermal_mass <= 0.0 {
        return Err(ThermalError::NonPositiveThermalMass {
            key,
            value: thermal_mass,
        });
    }
    if !spec.temperature.is_finite() || spec.temperature <= 0.0 {
        return Err(ThermalError::ConfigError(format!(
            "node {key}: temperature must be finite and > 0 K, got {}",
            spec.temperature
        )));
    }
    for (label, value) in [
        ("support_area", spec.compartment.support_area),
        ("view_area", spec.compartment.view_area),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(geometry(format!(
                "compartment {label} must be finite and >= 0 m², got {value}"
            )));
        }
    }
    if !spec.heat_load.is_finite() {
        return Err(ThermalError::ConfigError(format!(
            "node {key}: heat_load must be finite, got {}",
            spec.heat_load
        )));
    }
    if let Some(limits) = spec.limits {
        if !(limits.min.is_finite() && limits.max.is_finite() && limits.min < limits.max) {
            return Err(ThermalError::ConfigError(format!(
                "node {key}: limits must satisfy min < max, got [{}, {}]",
                limits.min, limits.max
            )));
        }
    }

    let mut contacts = Vec::with_capacity(spec.contacts.len());
    for contact in &spec.contacts {
        if !contact.area.is_finite() || contact.area <= 0.0 {
            return Err(geometry(format!(
                "contact area to node {} must be finite and > 0 m², got {}",
                contact.neighbor, contact.area
            )));
        }
        let neighbor = *index
            .get(&contact.neighbor)
            .ok_or(ThermalError::UnknownNode(contact.neighbor))?;
        if contact.neighbor == key {
            debug!("node {key}: self contact ({} m²) carries no heat", contact.area);
        }
        contacts.push(Contact {
            index: neighbor,
            area: contact.area,
        });
    }

    Ok(Node {
        key,
        name: spec.name.clone(),
        area: spec.area,
        mass: spec.mass,
        material: material.clone(),
        thermal_mass,
        gamma: spec.gamma,
        radiating_body: spec.radiating_body,
        contacts,
        compartment: spec.compartment,
        heat_load: spec.heat_load,
        limits: spec.limits,
        initial_temperature: spec.temperature,
    })
}
