// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — ODE
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Adaptive explicit Runge–Kutta integration.
//!
//! Dormand–Prince 5(4) embedded pair with first-same-as-last stage reuse,
//! mixed absolute/relative RMS error norm and the Hairer–Wanner initial
//! step heuristic. Step control is bounded: an attempted-step budget and a
//! minimum step turn runaway step halving into a
//! [`ThermalError::NonConvergence`] instead of a hang.

use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use thermal_types::config::IntegratorConfig;
use thermal_types::error::{ThermalError, ThermalResult};

/// Right-hand side `dy/dt = f(t, y)` of a first-order system.
pub trait OdeSystem {
    /// Length of the state vector.
    fn dimension(&self) -> usize;
    /// Evaluate `f(t, y)` into `dydt`. Must not allocate per call.
    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]);
}

/// Closure-backed [`OdeSystem`].
pub struct FnSystem<F> {
    dim: usize,
    f: F,
}

impl<F> FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    pub fn new(dim: usize, f: F) -> Self {
        FnSystem { dim, f }
    }
}

impl<F> OdeSystem for FnSystem<F>
where
    F: Fn(f64, &[f64], &mut [f64]),
{
    fn dimension(&self) -> usize {
        self.dim
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        (self.f)(t, y, dydt)
    }
}

/// Which states an integration call keeps.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Only the state at the horizon.
    Final,
    /// The initial state and every accepted step.
    Steps,
    /// The state at each listed time (ascending, inside `[t0, t_final]`).
    /// Steps are shortened to land on them exactly.
    Times(Vec<f64>),
}

/// Work counters for one integration call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub accepted: usize,
    pub rejected: usize,
    pub rhs_evals: usize,
}

/// Recorded trajectory: `t[i]` pairs with row `y[i, ..]`.
#[derive(Debug, Clone)]
pub struct Solution {
    pub t: Array1<f64>,
    /// States `[n_points, dimension]`.
    pub y: Array2<f64>,
    pub stats: Stats,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn state(&self, index: usize) -> ArrayView1<'_, f64> {
        self.y.row(index)
    }

    /// Last recorded state.
    pub fn final_state(&self) -> Array1<f64> {
        match self.y.nrows() {
            0 => Array1::zeros(self.y.ncols()),
            n => self.y.row(n - 1).to_owned(),
        }
    }
}

// Dormand–Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights (also row 7 of A).
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth minus fourth order weights.
const E1: f64 = -71.0 / 57600.0;
const E3: f64 = 71.0 / 16695.0;
const E4: f64 = -71.0 / 1920.0;
const E5: f64 = 17253.0 / 339200.0;
const E6: f64 = -22.0 / 525.0;
const E7: f64 = 1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
/// Error exponent 1/(q+1) for the embedded order q = 4.
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

/// Dormand–Prince 5(4) integrator.
#[derive(Debug, Clone)]
pub struct DormandPrince {
    config: IntegratorConfig,
}

/// Stage storage reused across steps.
struct Workspace {
    k: [Vec<f64>; 7],
    y_stage: Vec<f64>,
    y_new: Vec<f64>,
}

impl Workspace {
    fn new(n: usize) -> Self {
        Workspace {
            k: std::array::from_fn(|_| vec![0.0; n]),
            y_stage: vec![0.0; n],
            y_new: vec![0.0; n],
        }
    }
}

impl DormandPrince {
    pub fn new(config: IntegratorConfig) -> ThermalResult<Self> {
        config.validate()?;
        Ok(DormandPrince { config })
    }

    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Integrate and return only the state at `t_final`.
    pub fn integrate_final<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t0: f64,
        t_final: f64,
        y0: &[f64],
    ) -> ThermalResult<(Array1<f64>, Stats)> {
        let solution = self.integrate(system, t0, t_final, y0, &Output::Final)?;
        Ok((solution.final_state(), solution.stats))
    }

    /// Integrate `system` from `(t0, y0)` to `t_final`.
    pub fn integrate<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t0: f64,
        t_final: f64,
        y0: &[f64],
        output: &Output,
    ) -> ThermalResult<Solution> {
        let n = system.dimension();
        validate_problem(n, t0, t_final, y0, output)?;

        let mut times: Vec<f64> = Vec::new();
        let mut states: Vec<f64> = Vec::new();
        let mut stats = Stats::default();

        let targets: &[f64] = match output {
            Output::Times(ts) => ts.as_slice(),
            _ => &[],
        };
        let mut next_target = 0usize;
        let mut record = |t: f64, y: &[f64]| {
            times.push(t);
            states.extend_from_slice(y);
        };

        let mut t = t0;
        let mut y = y0.to_vec();

        match output {
            Output::Steps => record(t, &y),
            Output::Times(_) => {
                while next_target < targets.len() && targets[next_target] <= t {
                    record(t, &y);
                    next_target += 1;
                }
            }
            Output::Final => {}
        }

        if t_final > t0 {
            let mut ws = Workspace::new(n);
            system.rhs(t, &y, &mut ws.k[0]);
            stats.rhs_evals += 1;

            let mut h = match self.config.first_step {
                Some(h) => h,
                None => self.initial_step(system, t, &y, &mut ws, &mut stats),
            };
            let mut attempts = 0usize;
            let mut rejected_last = false;

            while t < t_final {
                if attempts >= self.config.max_steps {
                    return Err(ThermalError::NonConvergence {
                        t,
                        step: h,
                        reason: format!(
                            "step budget of {} attempts exhausted before t={t_final}",
                            self.config.max_steps
                        ),
                    });
                }
                attempts += 1;

                if let Some(max_step) = self.config.max_step {
                    h = h.min(max_step);
                }
                let stop = if next_target < targets.len() {
                    targets[next_target].min(t_final)
                } else {
                    t_final
                };
                let (h_try, hits_stop) = if t + h >= stop {
                    (stop - t, true)
                } else {
                    (h, false)
                };

                let min_allowed = self.config.min_step.max(10.0 * f64::EPSILON * t.abs());
                if !hits_stop && h_try < min_allowed {
                    return Err(ThermalError::NonConvergence {
                        t,
                        step: h_try,
                        reason: format!("step size underflow below {min_allowed:e} s"),
                    });
                }

                self.stages(system, t, &y, h_try, &mut ws);
                stats.rhs_evals += 6;
                let err_norm = self.error_norm(&y, h_try, &ws);

                if err_norm <= 1.0 {
                    t = if hits_stop { stop } else { t + h_try };
                    std::mem::swap(&mut y, &mut ws.y_new);
                    ws.k.swap(0, 6);
                    stats.accepted += 1;

                    if y.iter().any(|v| !v.is_finite()) {
                        return Err(ThermalError::NonConvergence {
                            t,
                            step: h_try,
                            reason: "state became non-finite".to_string(),
                        });
                    }

                    match output {
                        Output::Steps => record(t, &y),
                        Output::Times(_) => {
                            while next_target < targets.len() && targets[next_target] <= t {
                                record(t, &y);
                                next_target += 1;
                            }
                        }
                        Output::Final => {}
                    }

                    let mut factor = if err_norm == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * err_norm.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                    };
                    if rejected_last {
                        factor = factor.min(1.0);
                    }
                    let proposed = h_try * factor;
                    // A step shortened to hit a stop says nothing about the
                    // natural step size; keep the larger proposal.
                    h = if hits_stop { proposed.max(h) } else { proposed };
                    rejected_last = false;
                } else {
                    stats.rejected += 1;
                    let factor = if err_norm.is_finite() {
                        (SAFETY * err_norm.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
                    } else {
                        MIN_FACTOR
                    };
                    h = h_try * factor;
                    rejected_last = true;
                }
            }
        }

        if matches!(output, Output::Final) {
            record(t, &y);
        }

        debug!(
            "dopri5 {t0}→{t_final} s: accepted={} rejected={} rhs_evals={}",
            stats.accepted, stats.rejected, stats.rhs_evals
        );

        let n_points = times.len();
        let y = Array2::from_shape_vec((n_points, n), states).map_err(|e| {
            ThermalError::ConfigError(format!("trajectory shape mismatch: {e}"))
        })?;
        Ok(Solution {
            t: Array1::from(times),
            y,
            stats,
        })
    }

    /// Stages 2–7; `ws.k[0]` holds `f(t, y)` on entry, `ws.y_new` the
    /// fifth-order solution and `ws.k[6]` its derivative on exit.
    fn stages<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        y: &[f64],
        h: f64,
        ws: &mut Workspace,
    ) {
        let n = y.len();
        let Workspace { k, y_stage, y_new } = ws;

        for i in 0..n {
            y_stage[i] = y[i] + h * A21 * k[0][i];
        }
        system.rhs(t + C2 * h, y_stage, &mut k[1]);

        for i in 0..n {
            y_stage[i] = y[i] + h * (A31 * k[0][i] + A32 * k[1][i]);
        }
        system.rhs(t + C3 * h, y_stage, &mut k[2]);

        for i in 0..n {
            y_stage[i] = y[i] + h * (A41 * k[0][i] + A42 * k[1][i] + A43 * k[2][i]);
        }
        system.rhs(t + C4 * h, y_stage, &mut k[3]);

        for i in 0..n {
            y_stage[i] = y[i]
                + h * (A51 * k[0][i] + A52 * k[1][i] + A53 * k[2][i] + A54 * k[3][i]);
        }
        system.rhs(t + C5 * h, y_stage, &mut k[4]);

        for i in 0..n {
            y_stage[i] = y[i]
                + h * (A61 * k[0][i]
                    + A62 * k[1][i]
                    + A63 * k[2][i]
                    + A64 * k[3][i]
                    + A65 * k[4][i]);
        }
        system.rhs(t + h, y_stage, &mut k[5]);

        for i in 0..n {
            y_new[i] = y[i]
                + h * (B1 * k[0][i] + B3 * k[2][i] + B4 * k[3][i] + B5 * k[4][i] + B6 * k[5][i]);
        }
        system.rhs(t + h, y_new, &mut k[6]);
    }

    /// RMS of the embedded error scaled by `atol + rtol·max(|y|, |y_new|)`.
    fn error_norm(&self, y: &[f64], h: f64, ws: &Workspace) -> f64 {
        let n = y.len();
        if n == 0 {
            return 0.0;
        }
        let k = &ws.k;
        let mut sum = 0.0;
        for i in 0..n {
            let err = h
                * (E1 * k[0][i]
                    + E3 * k[2][i]
                    + E4 * k[3][i]
                    + E5 * k[4][i]
                    + E6 * k[5][i]
                    + E7 * k[6][i]);
            let scale = self.config.atol + self.config.rtol * y[i].abs().max(ws.y_new[i].abs());
            let r = err / scale;
            sum += r * r;
        }
        (sum / n as f64).sqrt()
    }

    /// Hairer–Wanner starting step estimate (Solving ODEs I, §II.4).
    fn initial_step<S: OdeSystem + ?Sized>(
        &self,
        system: &S,
        t: f64,
        y: &[f64],
        ws: &mut Workspace,
        stats: &mut Stats,
    ) -> f64 {
        let n = y.len();
        if n == 0 {
            return 1.0;
        }
        let scale: Vec<f64> = y
            .iter()
            .map(|v| self.config.atol + v.abs() * self.config.rtol)
            .collect();
        let rms = |v: &mut dyn Iterator<Item = f64>| -> f64 {
            (v.map(|x| x * x).sum::<f64>() / n as f64).sqrt()
        };

        let d0 = rms(&mut y.iter().zip(&scale).map(|(v, s)| v / s));
        let d1 = rms(&mut ws.k[0].iter().zip(&scale).map(|(v, s)| v / s));
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };

        for i in 0..n {
            ws.y_stage[i] = y[i] + h0 * ws.k[0][i];
        }
        system.rhs(t + h0, &ws.y_stage, &mut ws.k[1]);
        stats.rhs_evals += 1;

        let d2 = rms(
            &mut ws.k[1]
                .iter()
                .zip(&ws.k[0])
                .zip(&scale)
                .map(|((f1, f0), s)| (f1 - f0) / s),
        ) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };
        let h = (100.0 * h0).min(h1) * self.config.first_step_scale;
        match self.config.max_step {
            Some(max_step) => h.min(max_step),
            None => h,
        }
    }
}

fn validate_problem(
    n: usize,
    t0: f64,
    t_final: f64,
    y0: &[f64],
    output: &Output,
) -> ThermalResult<()> {
    if y0.len() != n {
        return Err(ThermalError::ConfigError(format!(
            "initial state has {} entries, system dimension is {n}",
            y0.len()
        )));
    }
    if !t0.is_finite() || !t_final.is_finite() {
        return Err(ThermalError::ConfigError(format!(
            "integration bounds must be finite, got [{t0}, {t_final}]"
        )));
    }
    if t_final < t0 {
        return Err(ThermalError::ConfigError(format!(
            "t_final ({t_final}) must be >= t0 ({t0})"
        )));
    }
    if let Some(bad) = y0.iter().find(|v| !v.is_finite()) {
        return Err(ThermalError::ConfigError(format!(
            "initial state contains non-finite value {bad}"
        )));
    }
    if let Output::Times(ts) = output {
        if ts.windows(2).any(|w| w[1] < w[0]) {
            return Err(ThermalError::ConfigError(
                "output times must be ascending".to_string(),
            ));
        }
        if let Some(bad) = ts.iter().find(|t| !(t0..=t_final).contains(*t)) {
            return Err(ThermalError::ConfigError(format!(
                "output time {bad} outside [{t0}, {t_final}]"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tight() -> DormandPrince {
        DormandPrince::new(IntegratorConfig::with_tolerances(1e-10, 1e-12)).unwrap()
    }

    fn decay(lambda: f64) -> FnSystem<impl Fn(f64, &[f64], &mut [f64])> {
        FnSystem::new(1, move |_t, y: &[f64], dydt: &mut [f64]| dydt[0] = -lambda * y[0])
    }

    #[test]
    fn test_exponential_decay_accuracy() {
        let (y, stats) = tight().integrate_final(&decay(1.0), 0.0, 1.0, &[1.0]).unwrap();
        assert!((y[0] - (-1.0f64).exp()).abs() < 1e-9, "got {}", y[0]);
        assert!(stats.accepted > 0);
    }

    #[test]
    fn test_zero_horizon_returns_initial_state() {
        let solver = DormandPrince::new(IntegratorConfig::default()).unwrap();
        let (y, stats) = solver.integrate_final(&decay(3.0), 5.0, 5.0, &[2.5]).unwrap();
        assert_eq!(y[0], 2.5);
        assert_eq!(stats, Stats::default());
    }

    #[test]
    fn test_requested_times_are_hit_exactly() {
        let times = vec![0.0, 0.25, 0.5, 1.0, 2.0];
        let sol = tight()
            .integrate(&decay(0.5), 0.0, 2.0, &[1.0], &Output::Times(times.clone()))
            .unwrap();
        assert_eq!(sol.len(), times.len());
        for (i, &t) in times.iter().enumerate() {
            assert_eq!(sol.t[i], t);
            assert!((sol.y[[i, 0]] - (-0.5 * t).exp()).abs() < 1e-8);
        }
    }

    #[test]
    fn test_step_output_is_monotone() {
        let sol = DormandPrince::new(IntegratorConfig::default())
            .unwrap()
            .integrate(&decay(1.0), 0.0, 10.0, &[1.0], &Output::Steps)
            .unwrap();
        assert_eq!(sol.t[0], 0.0);
        assert_eq!(sol.t[sol.len() - 1], 10.0);
        assert!(sol.t.windows(2).into_iter().all(|w| w[1] > w[0]));
        assert_eq!(sol.len(), sol.stats.accepted + 1);
    }

    #[test]
    fn test_linear_invariant_preserved() {
        // Two bodies exchanging heat: C1·y1 + C2·y2 is constant.
        let (c1, c2, g) = (2.0, 5.0, 0.7);
        let sys = FnSystem::new(2, move |_t, y: &[f64], dydt: &mut [f64]| {
            let q = g * (y[1] - y[0]);
            dydt[0] = q / c1;
            dydt[1] = -q / c2;
        });
        let y0 = [400.0, 250.0];
        let solver = DormandPrince::new(IntegratorConfig::default()).unwrap();
        let (y, _) = solver.integrate_final(&sys, 0.0, 30.0, &y0).unwrap();
        let e0 = c1 * y0[0] + c2 * y0[1];
        let e1 = c1 * y[0] + c2 * y[1];
        assert!((e1 - e0).abs() < 1e-9 * e0, "invariant drift {}", e1 - e0);
    }

    #[test]
    fn test_finite_time_blowup_reports_non_convergence() {
        let sys = FnSystem::new(1, |_t, y: &[f64], dydt: &mut [f64]| dydt[0] = y[0] * y[0]);
        let solver = DormandPrince::new(IntegratorConfig::default()).unwrap();
        let err = solver
            .integrate_final(&sys, 0.0, 2.0, &[1.0])
            .expect_err("y' = y² blows up at t = 1");
        assert!(err.is_recoverable(), "got {err:?}");
        match err {
            ThermalError::NonConvergence { t, .. } => assert!(t <= 1.0 + 1e-6, "t={t}"),
            other => panic!("Unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn test_step_budget_exhaustion() {
        let cfg = IntegratorConfig {
            max_steps: 3,
            first_step: Some(1e-3),
            max_step: Some(1e-3),
            ..IntegratorConfig::default()
        };
        let solver = DormandPrince::new(cfg).unwrap();
        match solver.integrate_final(&decay(1.0), 0.0, 100.0, &[1.0]) {
            Err(ThermalError::NonConvergence { reason, .. }) => {
                assert!(reason.contains("budget"), "reason: {reason}")
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_first_step_scale_shrinks_estimate() {
        let run = |cfg: IntegratorConfig| {
            DormandPrince::new(cfg)
                .unwrap()
                .integrate(&decay(1.0), 0.0, 1.0, &[1.0], &Output::Steps)
                .unwrap()
        };
        let estimated = run(IntegratorConfig::default());
        let scaled = run(IntegratorConfig::default().relaxed());
        assert!(scaled.t[1] < estimated.t[1], "{} vs {}", scaled.t[1], estimated.t[1]);
        let final_error = (scaled.final_state()[0] - (-1.0f64).exp()).abs();
        assert!(final_error < 1e-3, "error {final_error}");
    }

    #[test]
    fn test_max_step_is_respected() {
        let cfg = IntegratorConfig {
            max_step: Some(0.5),
            ..IntegratorConfig::default()
        };
        let sol = DormandPrince::new(cfg)
            .unwrap()
            .integrate(&decay(0.01), 0.0, 10.0, &[1.0], &Output::Steps)
            .unwrap();
        assert!(sol.t.windows(2).into_iter().all(|w| w[1] - w[0] <= 0.5 + 1e-12));
        assert!(sol.stats.accepted >= 20);
    }

    #[test]
    fn test_rejects_invalid_problems() {
        let solver = DormandPrince::new(IntegratorConfig::default()).unwrap();
        assert!(solver.integrate_final(&decay(1.0), 1.0, 0.0, &[1.0]).is_err());
        assert!(solver.integrate_final(&decay(1.0), 0.0, 1.0, &[1.0, 2.0]).is_err());
        assert!(solver.integrate_final(&decay(1.0), 0.0, 1.0, &[f64::NAN]).is_err());
        let unsorted = Output::Times(vec![0.5, 0.2]);
        assert!(solver.integrate(&decay(1.0), 0.0, 1.0, &[1.0], &unsorted).is_err());
        let outside = Output::Times(vec![2.0]);
        assert!(solver.integrate(&decay(1.0), 0.0, 1.0, &[1.0], &outside).is_err());
        assert!(DormandPrince::new(IntegratorConfig::with_tolerances(0.0, 1e-6)).is_err());
    }

    #[test]
    fn test_discontinuous_forcing_converges() {
        // Square-wave source, like sunlight switching at eclipse entry and exit.
        let sys = FnSystem::new(1, |t: f64, y: &[f64], dydt: &mut [f64]| {
            let source = if (t % 10.0) < 6.0 { 1.0 } else { 0.0 };
            dydt[0] = source - 0.1 * y[0];
        });
        let solver = DormandPrince::new(IntegratorConfig::with_tolerances(1e-8, 1e-10)).unwrap();
        let (y, stats) = solver.integrate_final(&sys, 0.0, 100.0, &[0.0]).unwrap();
        assert!(y[0].is_finite() && y[0] > 0.0 && y[0] < 10.0);
        assert!(stats.rejected > 0, "discontinuities should force rejections");
    }
}
