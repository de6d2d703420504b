// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Reference Bus
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ten-node hexagonal bus: six side panels, two end panels and two solar
//! arrays on booms.
//!
//! The conduction table is not reciprocal (node 4 links to the south array
//! but the array only links back to node 3); it is reproduced as is.

use thermal_types::catalog::{Material, NodeCatalog, NodeSpec, RadiatingBody};

/// Side panel area [m²]
pub const SIDE_PANEL_AREA: f64 = 4.657;
/// End panel area [m²]
pub const END_PANEL_AREA: f64 = 2.25;
/// Solar array area [m²]
pub const SOLAR_ARRAY_AREA: f64 = 6.0;

/// Side panel mass [kg]: 5 mm × 0.93 m × 5 m of aluminium.
const SIDE_PANEL_MASS: f64 = 70.0;
const END_PANEL_MASS: f64 = 30.0;
const SOLAR_ARRAY_MASS: f64 = 60.0;

/// Edge contact between adjacent side panels [m²]
const SIDE_CONTACT: f64 = 0.025;
/// Edge contact of an end panel with the six sides [m²]
const END_CONTACT: f64 = 0.0279;
/// Boom root contact of a solar array [m²]
const BOOM_CONTACT: f64 = 0.00149;

/// Compartment support contact per side panel [m²]
const SUPPORT_AREA: f64 = 0.001;
/// Compartment cylinder surface (r = 0.3 m, h = 0.8 m) [m²]
const COMPARTMENT_VIEW_AREA: f64 = 2.64;

pub const SKIN: &str = "Aluminium";
pub const ARRAY: &str = "Solar-Array";

/// (key, name, body, tilt [deg], neighbours)
type Row = (u32, &'static str, RadiatingBody, f64, &'static [u32]);

const LAYOUT: [Row; 10] = [
    (1, "Nadir-North", RadiatingBody::Earth, 30.0, &[2, 6, 7, 8]),
    (2, "Nadir-South", RadiatingBody::Earth, 30.0, &[1, 3, 7, 8]),
    (3, "South", RadiatingBody::Sun, 90.0, &[2, 4, 7, 8]),
    (4, "Zenith-South", RadiatingBody::Sun, 30.0, &[3, 5, 7, 8, 10]),
    (5, "Zenith-North", RadiatingBody::Sun, 30.0, &[4, 6, 7, 8]),
    (6, "North", RadiatingBody::Earth, 90.0, &[1, 5, 7, 8]),
    (7, "Velocity", RadiatingBody::Earth, 90.0, &[1, 2, 3, 4, 5, 6, 9]),
    (8, "Negative-Velocity", RadiatingBody::Sun, 90.0, &[1, 2, 3, 4, 5, 6]),
    (9, "North-Solar-Array", RadiatingBody::Earth, 0.0, &[6]),
    (10, "South-Solar-Array", RadiatingBody::Earth, 0.0, &[3]),
];

/// Contact area of a link is set by the node it reaches.
fn contact_area(neighbor: u32) -> f64 {
    match neighbor {
        1..=6 => SIDE_CONTACT,
        7 | 8 => END_CONTACT,
        _ => BOOM_CONTACT,
    }
}

pub fn ten_node_bus() -> NodeCatalog {
    let nodes = LAYOUT
        .iter()
        .map(|&(key, name, body, gamma, neighbors)| {
            let (area, mass, material) = match key {
                1..=6 => (SIDE_PANEL_AREA, SIDE_PANEL_MASS, SKIN),
                7 | 8 => (END_PANEL_AREA, END_PANEL_MASS, SKIN),
                _ => (SOLAR_ARRAY_AREA, SOLAR_ARRAY_MASS, ARRAY),
            };
            let support = if key <= 6 { SUPPORT_AREA } else { 0.0 };
            // The negative-velocity panel and the arrays do not see the compartment.
            let view = if key <= 7 { COMPARTMENT_VIEW_AREA } else { 0.0 };

            neighbors.iter().fold(
                NodeSpec::new(key, name, area, mass, material, gamma, body)
                    .with_compartment(support, view),
                |spec, &n| spec.with_contact(n, contact_area(n)),
            )
        })
        .collect();

    NodeCatalog {
        name: "ten-node-bus".to_string(),
        materials: vec![
            Material::new(SKIN, 237.0, 897.0, 0.3, 0.9),
            Material::new(ARRAY, 237.0, 340.0, 0.8, 0.8),
        ],
        nodes,
    }
}
