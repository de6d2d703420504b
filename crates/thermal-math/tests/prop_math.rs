// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Property-Based Tests (proptest) for thermal-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for thermal-math using proptest.
//!
//! Covers: Dormand–Prince accuracy on linear decay, conservation of linear
//! invariants, output sampling.

use proptest::prelude::*;
use thermal_math::ode::{DormandPrince, FnSystem, Output};
use thermal_types::config::IntegratorConfig;

// ── Accuracy ─────────────────────────────────────────────────────────

proptest! {
    /// y' = -λy matches the closed form within a small multiple of rtol.
    #[test]
    fn decay_matches_closed_form(
        lambda in 0.01f64..5.0,
        y0 in 0.1f64..1000.0,
        horizon in 0.1f64..10.0,
    ) {
        let sys = FnSystem::new(1, move |_t, y: &[f64], dydt: &mut [f64]| {
            dydt[0] = -lambda * y[0];
        });
        let solver = DormandPrince::new(IntegratorConfig::with_tolerances(1e-9, 1e-12)).unwrap();
        let (y, _) = solver.integrate_final(&sys, 0.0, horizon, &[y0]).unwrap();
        let exact = y0 * (-lambda * horizon).exp();
        prop_assert!((y[0] - exact).abs() <= 1e-6 * y0,
            "λ={} y0={} t={} got {} want {}", lambda, y0, horizon, y[0], exact);
        prop_assert!(y[0] > 0.0);
    }

    /// Sampled output lands exactly on every requested time.
    #[test]
    fn sampled_times_exact(
        mut times in prop::collection::vec(0.0f64..50.0, 1..8),
    ) {
        times.sort_by(|a, b| a.total_cmp(b));
        let horizon = 50.0;
        let sys = FnSystem::new(1, |_t, y: &[f64], dydt: &mut [f64]| dydt[0] = -0.1 * y[0]);
        let solver = DormandPrince::new(IntegratorConfig::default()).unwrap();
        let sol = solver
            .integrate(&sys, 0.0, horizon, &[1.0], &Output::Times(times.clone()))
            .unwrap();
        prop_assert_eq!(sol.len(), times.len());
        for (i, t) in times.iter().enumerate() {
            prop_assert_eq!(sol.t[i], *t);
        }
    }
}

// ── Conservation ─────────────────────────────────────────────────────

proptest! {
    /// Symmetric exchange between lumps conserves Σ Cᵢ·yᵢ: every stage is a
    /// linear combination of derivatives with zero weighted sum.
    #[test]
    fn symmetric_exchange_conserves_energy(
        caps in prop::collection::vec(1.0f64..100.0, 2..6),
        temps in prop::collection::vec(200.0f64..400.0, 6),
        g in 0.01f64..2.0,
    ) {
        let n = caps.len();
        let c = caps.clone();
        let sys = FnSystem::new(n, move |_t, y: &[f64], dydt: &mut [f64]| {
            for i in 0..n {
                let mut q = 0.0;
                for j in 0..n {
                    if j != i {
                        q += g * (y[j] - y[i]);
                    }
                }
                dydt[i] = q / c[i];
            }
        });
        let y0 = &temps[..n];
        let solver = DormandPrince::new(IntegratorConfig::default()).unwrap();
        let (y, _) = solver.integrate_final(&sys, 0.0, 20.0, y0).unwrap();

        let e0: f64 = caps.iter().zip(y0).map(|(c, t)| c * t).sum();
        let e1: f64 = caps.iter().zip(y.iter()).map(|(c, t)| c * t).sum();
        prop_assert!((e1 - e0).abs() <= 1e-9 * e0, "drift {}", e1 - e0);

        let lo = y0.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = y0.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for v in y.iter() {
            prop_assert!(*v >= lo - 1e-3 && *v <= hi + 1e-3);
        }
    }
}
