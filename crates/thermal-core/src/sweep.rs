// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Sweep Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Cold-start sweep over a (beta, altitude, time) grid.
//!
//! Every cell integrates from the same isothermal field at t = 0 (the
//! sweep's `initial_temperature`, else the configured baseline) to its own
//! horizon, so cells are independent and run on the rayon pool when the
//! sweep is parallel. A cell that does not converge is retried with a
//! relaxed step policy, then recorded as a [`CellFailure`] and filled with
//! NaN; its siblings are unaffected.

use log::{debug, info, warn};
use ndarray::{s, Array1, Array4, ArrayView1, ArrayView3, Axis};
use rayon::prelude::*;
use serde::Serialize;
use thermal_math::ode::{DormandPrince, Output, Solution};
use thermal_types::catalog::TemperatureLimits;
use thermal_types::config::{IntegratorConfig, SweepConfig, ThermalConfig};
use thermal_types::error::{ThermalError, ThermalResult};

use crate::graph::NodeGraph;
use crate::heat_balance::HeatBalance;

/// A grid cell whose integration failed after every retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFailure {
    pub beta_index: usize,
    pub altitude_index: usize,
    pub time_index: usize,
    pub beta_deg: f64,
    pub altitude_m: f64,
    pub time_s: f64,
    /// Integration attempts made, retries included.
    pub attempts: usize,
    pub error: String,
}

/// A node outside its allowed band in one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitViolation {
    pub beta_index: usize,
    pub altitude_index: usize,
    pub time_index: usize,
    pub key: u32,
    /// [K]
    pub temperature: f64,
    pub limits: TemperatureLimits,
}

/// Temperature tensor [K] with axes `[beta, altitude, time, node]`.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub betas_deg: Vec<f64>,
    pub altitudes_m: Vec<f64>,
    pub times_s: Vec<f64>,
    /// Node axis order.
    pub keys: Vec<u32>,
    pub temperatures: Array4<f64>,
    pub failures: Vec<CellFailure>,
}

impl SweepResult {
    /// True when no cell failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn node_index(&self, key: u32) -> Option<usize> {
        self.keys.iter().position(|k| *k == key)
    }

    /// `[beta, time, node]` slab at one altitude.
    pub fn at_altitude(&self, altitude_index: usize) -> Option<ArrayView3<'_, f64>> {
        (altitude_index < self.altitudes_m.len())
            .then(|| self.temperatures.index_axis(Axis(1), altitude_index))
    }

    /// `[beta, altitude, time]` history of one node.
    pub fn node(&self, key: u32) -> Option<ArrayView3<'_, f64>> {
        self.node_index(key)
            .map(|n| self.temperatures.index_axis(Axis(3), n))
    }

    /// Node temperatures of one cell.
    pub fn cell(
        &self,
        beta_index: usize,
        altitude_index: usize,
        time_index: usize,
    ) -> Option<ArrayView1<'_, f64>> {
        let (nb, na, nt, _) = self.temperatures.dim();
        (beta_index < nb && altitude_index < na && time_index < nt).then(|| {
            self.temperatures
                .slice(s![beta_index, altitude_index, time_index, ..])
        })
    }

    /// Every (cell, node) outside the node's temperature limits. Failed
    /// cells are skipped.
    pub fn limit_violations(&self, graph: &NodeGraph) -> Vec<LimitViolation> {
        let limits: Vec<Option<TemperatureLimits>> = self
            .keys
            .iter()
            .map(|k| graph.node(*k).and_then(|n| n.limits))
            .collect();

        let mut violations = Vec::new();
        for ((bi, ai, ti, n), &temperature) in self.temperatures.indexed_iter() {
            let Some(band) = limits[n] else { continue };
            if temperature.is_finite() && !band.contains(temperature) {
                violations.push(LimitViolation {
                    beta_index: bi,
                    altitude_index: ai,
                    time_index: ti,
                    key: self.keys[n],
                    temperature,
                    limits: band,
                });
            }
        }
        violations
    }

    pub fn to_json_pretty(&self) -> ThermalResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Integrate with the given step policy, relaxing it after each
/// non-convergence up to `retries` times. Returns the attempt count with
/// the last error on failure.
pub(crate) fn solve_with_retries(
    balance: &HeatBalance<'_>,
    beta_deg: f64,
    y0: &[f64],
    t_final: f64,
    output: &Output,
    policy: &IntegratorConfig,
    retries: usize,
) -> Result<Solution, (usize, ThermalError)> {
    let system = balance.system(beta_deg);
    let mut policy = policy.clone();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let solver = DormandPrince::new(policy.clone()).map_err(|e| (attempt, e))?;
        match solver.integrate(&system, 0.0, t_final, y0, output) {
            Ok(solution) => return Ok(solution),
            Err(e) if e.is_recoverable() && attempt <= retries => {
                warn!(
                    "β={beta_deg}° h={:.0} m t={t_final} s: {e}; retry {attempt}/{retries} with relaxed steps",
                    balance.orbit().altitude()
                );
                policy = policy.relaxed();
            }
            Err(e) => return Err((attempt, e)),
        }
    }
}

/// Run every cell of `sweep` against `graph`.
pub fn run_sweep(
    graph: &NodeGraph,
    config: &ThermalConfig,
    sweep: &SweepConfig,
) -> ThermalResult<SweepResult> {
    sweep.validate()?;
    config.integrator.validate()?;

    let y0: Array1<f64> = match sweep.initial_temperature {
        Some(t0) => Array1::from_elem(graph.len(), t0),
        None => Array1::from_elem(graph.len(), config.constants.baseline_temperature),
    };
    let y0 = y0.to_vec();

    let balances = sweep
        .altitudes_m
        .iter()
        .map(|&h| {
            HeatBalance::new(
                graph,
                &config.constants,
                &config.environment,
                config.terms,
                h,
            )
        })
        .collect::<ThermalResult<Vec<_>>>()?;

    let (nb, na, nt, nn) = (
        sweep.betas_deg.len(),
        sweep.altitudes_m.len(),
        sweep.times_s.len(),
        graph.len(),
    );
    info!(
        "sweep '{}' on '{}': {nb} betas × {na} altitudes × {nt} times × {nn} nodes",
        config.mission_name,
        graph.name()
    );

    let cells: Vec<(usize, usize, usize)> = (0..nb)
        .flat_map(|bi| (0..na).flat_map(move |ai| (0..nt).map(move |ti| (bi, ai, ti))))
        .collect();

    let run_cell = |&(bi, ai, ti): &(usize, usize, usize)| {
        let beta = sweep.betas_deg[bi];
        let horizon = sweep.times_s[ti];
        let outcome = solve_with_retries(
            &balances[ai],
            beta,
            &y0,
            horizon,
            &Output::Final,
            &config.integrator,
            sweep.retries,
        );
        match outcome {
            Ok(solution) => {
                debug!(
                    "cell β={beta}° h={} m t={horizon} s: {} accepted, {} rejected, {} evals",
                    sweep.altitudes_m[ai],
                    solution.stats.accepted,
                    solution.stats.rejected,
                    solution.stats.rhs_evals
                );
                Ok(solution.final_state())
            }
            Err((attempts, e)) => Err(CellFailure {
                beta_index: bi,
                altitude_index: ai,
                time_index: ti,
                beta_deg: beta,
                altitude_m: sweep.altitudes_m[ai],
                time_s: horizon,
                attempts,
                error: e.to_string(),
            }),
        }
    };

    let outcomes: Vec<Result<Array1<f64>, CellFailure>> = if sweep.parallel {
        cells.par_iter().map(run_cell).collect()
    } else {
        cells.iter().map(run_cell).collect()
    };

    let mut temperatures = Array4::from_elem((nb, na, nt, nn), f64::NAN);
    let mut failures = Vec::new();
    for (&(bi, ai, ti), outcome) in cells.iter().zip(outcomes) {
        match outcome {
            Ok(state) => temperatures.slice_mut(s![bi, ai, ti, ..]).assign(&state),
            Err(failure) => {
                warn!(
                    "cell β={}° h={} m t={} s failed after {} attempt(s): {}",
                    failure.beta_deg,
                    failure.altitude_m,
                    failure.time_s,
                    failure.attempts,
                    failure.error
                );
                failures.push(failure);
            }
        }
    }

    info!(
        "sweep '{}' finished: {} cells, {} failed",
        config.mission_name,
        cells.len(),
        failures.len()
    );

    Ok(SweepResult {
        betas_deg: sweep.betas_deg.clone(),
        altitudes_m: sweep.altitudes_m.clone(),
        times_s: sweep.times_s.clone(),
        keys: graph.keys(),
        temperatures,
        failures,
    })
}
