// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — End-to-End Scenario Tests
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Whole-model runs: eight-panel hexagonal bus swept over beta and time,
//! catalog persistence through the graph, the ten-node reference bus and
//! the shipped sample configuration.

use thermal_core::graph::NodeGraph;
use thermal_core::model::ThermalModel;
use thermal_core::reference::ten_node_bus;
use thermal_core::sweep::SweepResult;
use thermal_types::catalog::{Material, NodeCatalog, NodeSpec, RadiatingBody};
use thermal_types::config::{IntegratorConfig, SweepConfig, ThermalConfig};

const EARTH_SIDES: [u32; 3] = [1, 3, 5];
const SUN_SIDES: [u32; 3] = [2, 4, 6];

/// Six side panels alternating earth/sun facing in a ring, plus an
/// earth-side and a sun-side end cap bridging all six.
fn eight_panel_bus() -> NodeCatalog {
    let mut nodes = Vec::new();
    for key in 1..=6u32 {
        let prev = (key + 4) % 6 + 1;
        let next = key % 6 + 1;
        let (body, gamma) = if key % 2 == 1 {
            (RadiatingBody::Earth, 150.0)
        } else {
            (RadiatingBody::Sun, 0.0)
        };
        nodes.push(
            NodeSpec::new(key, &format!("Side-{key}"), 4.657, 70.0, "Aluminium", gamma, body)
                .with_contact(prev, 0.001)
                .with_contact(next, 0.001)
                .with_contact(7, 0.005)
                .with_contact(8, 0.005)
                .with_compartment(0.001, 2.64),
        );
    }
    for (key, body) in [(7u32, RadiatingBody::Earth), (8, RadiatingBody::Sun)] {
        let cap = (1..=6u32).fold(
            NodeSpec::new(key, &format!("Cap-{key}"), 2.25, 30.0, "Aluminium", 90.0, body),
            |spec, side| spec.with_contact(side, 0.005),
        );
        nodes.push(cap);
    }
    NodeCatalog {
        name: "eight-panel-bus".to_string(),
        materials: vec![Material::new("Aluminium", 237.0, 897.0, 0.3, 0.9)],
        nodes,
    }
}

fn mean(result: &SweepResult, keys: &[u32], beta_index: usize, time_index: usize) -> f64 {
    let cell = result.cell(beta_index, 0, time_index).unwrap();
    keys.iter()
        .map(|k| cell[result.node_index(*k).unwrap()])
        .sum::<f64>()
        / keys.len() as f64
}

fn spread(result: &SweepResult, beta_index: usize, time_index: usize) -> f64 {
    mean(result, &SUN_SIDES, beta_index, time_index) - mean(result, &EARTH_SIDES, beta_index, time_index)
}

fn eight_panel_sweep() -> SweepResult {
    let mut sweep = SweepConfig::new(vec![0.0, 90.0], vec![300e3], vec![0.0, 5000.0, 50000.0]);
    sweep.initial_temperature = Some(293.15);
    let mut config = ThermalConfig::new("eight-panel", sweep);
    config.integrator = IntegratorConfig::with_tolerances(1e-8, 1e-8);
    let model = ThermalModel::from_catalog(&eight_panel_bus(), config).unwrap();
    model.sweep().unwrap()
}

// ── Eight-Panel Bus ──────────────────────────────────────────────────

#[test]
fn sun_and_earth_sides_diverge_over_time() {
    let result = eight_panel_sweep();
    assert!(result.is_complete(), "failures: {:?}", result.failures);

    for bi in 0..2 {
        let d: Vec<f64> = (0..3).map(|ti| spread(&result, bi, ti)).collect();
        assert_eq!(d[0], 0.0);
        assert!(
            d[0].abs() < d[1].abs() && d[1].abs() < d[2].abs(),
            "beta index {bi}: spreads {d:?}"
        );
    }
}

#[test]
fn broadside_beta_spreads_more_than_eclipsing_beta() {
    let result = eight_panel_sweep();
    for ti in 1..3 {
        let eclipsing = spread(&result, 0, ti).abs();
        let broadside = spread(&result, 1, ti);
        assert!(broadside > 0.0, "sun sides should run hot at β = 90°");
        assert!(broadside > eclipsing, "t index {ti}: {broadside} vs {eclipsing}");
    }
}

#[test]
fn symmetric_panels_share_trajectories() {
    let result = eight_panel_sweep();
    for group in [EARTH_SIDES, SUN_SIDES] {
        let first = result.node(group[0]).unwrap();
        for key in &group[1..] {
            let other = result.node(*key).unwrap();
            for (a, b) in first.iter().zip(other.iter()) {
                assert!((a - b).abs() < 1e-9, "node {key}: {a} vs {b}");
            }
        }
    }
}

// ── Catalog Persistence ──────────────────────────────────────────────

#[test]
fn graph_survives_catalog_json() {
    let graph = NodeGraph::from_catalog(&eight_panel_bus()).unwrap();
    let json = graph.to_catalog().to_json_pretty().unwrap();
    let rebuilt = NodeGraph::from_catalog(&NodeCatalog::from_json(&json).unwrap()).unwrap();

    assert_eq!(rebuilt.keys(), graph.keys());
    for (a, b) in graph.nodes().iter().zip(rebuilt.nodes()) {
        assert_eq!(a, b);
    }
    assert_eq!(rebuilt.to_catalog(), graph.to_catalog());
}

// ── Reference Bus ────────────────────────────────────────────────────

#[test]
fn reference_bus_stays_in_physical_band() {
    let sweep = SweepConfig::new(vec![0.0, 45.0, 90.0], vec![300e3], vec![5000.0, 50000.0]);
    let model = ThermalModel::from_catalog(&ten_node_bus(), ThermalConfig::new("bus", sweep)).unwrap();
    let result = model.sweep().unwrap();
    assert!(result.is_complete(), "failures: {:?}", result.failures);
    for t in result.temperatures.iter() {
        assert!((250.0..=450.0).contains(t), "temperature {t} K out of band");
    }
    // Arrays absorb more and store less heat than the skin.
    let array = result.node(9).unwrap();
    let skin = result.node(1).unwrap();
    assert!(array[[2, 0, 1]] > skin[[2, 0, 1]]);
}

// ── Sample Configuration ─────────────────────────────────────────────

#[test]
fn sample_config_drives_reference_bus() {
    let path = format!("{}/../../configs/leo_300km.json", env!("CARGO_MANIFEST_DIR"));
    let mut config = ThermalConfig::from_file(&path).unwrap();
    config.sweep.times_s = vec![0.0, 5000.0];
    let model = ThermalModel::from_catalog(&ten_node_bus(), config).unwrap();
    let result = model.sweep().unwrap();
    assert_eq!(result.temperatures.dim(), (4, 1, 2, 10));
    assert!(result.is_complete());
}
