// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Thermal Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Node graph plus run configuration: entry point for sweeps and
//! continuous trajectories.

use log::info;
use ndarray::{Array1, Array2};
use thermal_math::ode::{Output, Stats};
use thermal_types::catalog::NodeCatalog;
use thermal_types::config::{SweepConfig, ThermalConfig};
use thermal_types::error::{ThermalError, ThermalResult};

use crate::graph::NodeGraph;
use crate::heat_balance::HeatBalance;
use crate::sweep::{run_sweep, solve_with_retries, SweepResult};

/// One continuous integration sampled at requested times.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub beta_deg: f64,
    pub altitude_m: f64,
    pub keys: Vec<u32>,
    pub times_s: Vec<f64>,
    /// `[time, node]` [K]
    pub temperatures: Array2<f64>,
    pub stats: Stats,
}

impl Trajectory {
    /// Temperature history of node `key`.
    pub fn node(&self, key: u32) -> Option<Array1<f64>> {
        let n = self.keys.iter().position(|k| *k == key)?;
        Some(self.temperatures.column(n).to_owned())
    }
}

#[derive(Debug, Clone)]
pub struct ThermalModel {
    graph: NodeGraph,
    config: ThermalConfig,
}

impl ThermalModel {
    pub fn new(graph: NodeGraph, config: ThermalConfig) -> ThermalResult<Self> {
        config.validate()?;
        Ok(ThermalModel { graph, config })
    }

    pub fn from_catalog(catalog: &NodeCatalog, config: ThermalConfig) -> ThermalResult<Self> {
        Self::new(NodeGraph::from_catalog(catalog)?, config)
    }

    /// Load a node catalog and a run configuration from JSON files.
    pub fn from_files(catalog_path: &str, config_path: &str) -> ThermalResult<Self> {
        let catalog = NodeCatalog::from_file(catalog_path)?;
        let config = ThermalConfig::from_file(config_path)?;
        info!(
            "loaded '{}' ({} nodes) for mission '{}'",
            catalog.name,
            catalog.nodes.len(),
            config.mission_name
        );
        Self::from_catalog(&catalog, config)
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn config(&self) -> &ThermalConfig {
        &self.config
    }

    pub fn heat_balance(&self, altitude: f64) -> ThermalResult<HeatBalance<'_>> {
        HeatBalance::new(
            &self.graph,
            &self.config.constants,
            &self.config.environment,
            self.config.terms,
            altitude,
        )
    }

    /// Sweep over the configured grid.
    pub fn sweep(&self) -> ThermalResult<SweepResult> {
        run_sweep(&self.graph, &self.config, &self.config.sweep)
    }

    /// Sweep over another grid with the same physics and solver settings.
    pub fn sweep_with(&self, sweep: &SweepConfig) -> ThermalResult<SweepResult> {
        run_sweep(&self.graph, &self.config, sweep)
    }

    /// Integrate once from the graph's current temperature field at t = 0
    /// and sample at `times` (ascending, >= 0).
    pub fn trajectory(
        &self,
        beta_deg: f64,
        altitude: f64,
        times: &[f64],
    ) -> ThermalResult<Trajectory> {
        let t_final = match times.last() {
            Some(&t) => t,
            None => {
                return Err(ThermalError::ConfigError(
                    "trajectory needs at least one sample time".to_string(),
                ))
            }
        };
        if !beta_deg.is_finite() || beta_deg.abs() > 90.0 {
            return Err(ThermalError::ConfigError(format!(
                "beta must lie in [-90, 90] deg, got {beta_deg}"
            )));
        }
        let balance = self.heat_balance(altitude)?;
        let y0 = self.graph.temperatures().to_vec();
        let solution = solve_with_retries(
            &balance,
            beta_deg,
            &y0,
            t_final.max(0.0),
            &Output::Times(times.to_vec()),
            &self.config.integrator,
            self.config.sweep.retries,
        )
        .map_err(|(_, e)| e)?;

        Ok(Trajectory {
            beta_deg,
            altitude_m: altitude,
            keys: self.graph.keys(),
            times_s: solution.t.to_vec(),
            temperatures: solution.y,
            stats: solution.stats,
        })
    }
}
