// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Orbital Geometry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Circular-orbit geometry and environmental irradiance.
//!
//! Period, eclipse onset and duration, planet/Sun view factors and the
//! solar, albedo and planetary-infrared terms for one node. All angles
//! enter in degrees.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use thermal_types::config::{EnvironmentConfig, PhysicalConstants};
use thermal_types::error::{ThermalError, ThermalResult};

/// Circular orbit period τ = 2π √((R + h)³ / μ) [s].
pub fn orbital_period(mu: f64, radius: f64, altitude: f64) -> f64 {
    2.0 * PI * ((radius + altitude).powi(3) / mu).sqrt()
}

/// Beta angle below which the orbit passes through the shadow [rad].
pub fn eclipse_critical_beta(radius: f64, altitude: f64) -> f64 {
    (radius / (radius + altitude)).asin()
}

/// Fraction of one orbit spent in shadow at `beta_deg`.
///
/// f = (1/π)·acos(√(h² + 2Rh) / ((R + h)·cos β)) for |β| below the critical
/// beta, zero otherwise.
pub fn eclipse_fraction(radius: f64, altitude: f64, beta_deg: f64) -> f64 {
    let beta = beta_deg.to_radians().abs();
    if beta >= eclipse_critical_beta(radius, altitude) {
        return 0.0;
    }
    let ratio = (altitude * altitude + 2.0 * radius * altitude).sqrt()
        / ((radius + altitude) * beta.cos());
    ratio.min(1.0).acos() / PI
}

/// View factor from a flat plate at `tilt_deg` to a sphere of radius
/// `body_radius` seen from `altitude` above its surface.
///
/// Three regimes: the full sphere is visible (`cos γ / H²`), the horizon
/// cuts the plate's field of view (closed-form band expression), or the
/// sphere is behind the plate (0).
pub fn view_factor(altitude: f64, tilt_deg: f64, body_radius: f64) -> f64 {
    let h = (body_radius + altitude) / body_radius;
    let phi_m = (1.0 / h).asin();
    let gamma = tilt_deg.to_radians();

    if gamma <= FRAC_PI_2 - phi_m {
        return gamma.cos() / (h * h);
    }
    if gamma > FRAC_PI_2 + phi_m {
        return 0.0;
    }

    let b = (h * h - 1.0).sqrt();
    let (sin_g, cos_g) = gamma.sin_cos();
    let band = FRAC_PI_4 - 0.5 * clamp_unit(b / (h * sin_g)).asin()
        + (cos_g * clamp_unit(-b * cos_g / sin_g).acos()
            - b * (1.0 - h * h * cos_g * cos_g).max(0.0).sqrt())
            / (2.0 * h * h);
    // Non-negative in exact arithmetic; rounding near the horizon is not.
    (2.0 / PI * band).max(0.0)
}

fn clamp_unit(x: f64) -> f64 {
    x.clamp(-1.0, 1.0)
}

/// Orbit at one altitude with the environment tables it is evaluated against.
#[derive(Debug, Clone)]
pub struct Orbit {
    altitude: f64,
    period: f64,
    critical_beta: f64,
    constants: PhysicalConstants,
    environment: EnvironmentConfig,
}

impl Orbit {
    pub fn new(
        altitude: f64,
        constants: &PhysicalConstants,
        environment: &EnvironmentConfig,
    ) -> ThermalResult<Self> {
        if !altitude.is_finite() || altitude <= 0.0 {
            return Err(ThermalError::ConfigError(format!(
                "altitude must be finite and > 0 m, got {altitude}"
            )));
        }
        Ok(Orbit {
            altitude,
            period: orbital_period(constants.earth_mu, constants.earth_mean_radius, altitude),
            critical_beta: eclipse_critical_beta(constants.earth_radius, altitude),
            constants: constants.clone(),
            environment: environment.clone(),
        })
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    /// [s]
    pub fn period(&self) -> f64 {
        self.period
    }

    /// [rad]
    pub fn critical_beta(&self) -> f64 {
        self.critical_beta
    }

    pub fn critical_beta_deg(&self) -> f64 {
        self.critical_beta.to_degrees()
    }

    pub fn eclipse_fraction(&self, beta_deg: f64) -> f64 {
        eclipse_fraction(self.constants.earth_radius, self.altitude, beta_deg)
    }

    /// Whether mission time `t` falls in the shadow window centred on the
    /// anti-sun point, of half-width (τ/2)·f.
    pub fn in_eclipse(&self, t: f64, eclipse_fraction: f64) -> bool {
        if eclipse_fraction <= 0.0 {
            return false;
        }
        let phase = t.rem_euclid(self.period);
        let half = 0.5 * self.period;
        phase > half * (1.0 - eclipse_fraction) && phase < half * (1.0 + eclipse_fraction)
    }

    pub fn earth_view_factor(&self, tilt_deg: f64) -> f64 {
        view_factor(self.altitude, tilt_deg, self.constants.earth_radius)
    }

    pub fn sun_view_factor(&self, tilt_deg: f64) -> f64 {
        view_factor(self.altitude, tilt_deg, self.constants.sun_radius)
    }

    fn low_regime(&self, beta_deg: f64) -> bool {
        beta_deg.abs() < self.environment.regime_threshold_deg
    }

    pub fn albedo_coefficient(&self, beta_deg: f64) -> f64 {
        if self.low_regime(beta_deg) {
            self.environment.albedo_low
        } else {
            self.environment.albedo_high
        }
    }

    /// Planetary infrared exitance [W/m²].
    pub fn infrared_constant(&self, beta_deg: f64) -> f64 {
        if self.low_regime(beta_deg) {
            self.environment.infrared_low
        } else {
            self.environment.infrared_high
        }
    }

    /// Direct solar input [W].
    pub fn solar_flux(&self, view_factor: f64, area: f64, absorptance: f64) -> f64 {
        view_factor * area * self.constants.solar_constant * absorptance
    }

    /// Reflected solar input [W].
    pub fn albedo_flux(&self, beta_deg: f64, area: f64, absorptance: f64) -> f64 {
        self.albedo_coefficient(beta_deg) * area * self.constants.solar_constant * absorptance
    }

    /// Planetary infrared input [W].
    pub fn infrared_flux(&self, beta_deg: f64, area: f64) -> f64 {
        self.infrared_constant(beta_deg) * area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermal_types::constants::{EARTH_MEAN_RADIUS, EARTH_MU, EARTH_RADIUS, SUN_RADIUS};

    fn leo() -> Orbit {
        Orbit::new(
            300e3,
            &PhysicalConstants::default(),
            &EnvironmentConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_period_at_300km() {
        let tau = orbital_period(EARTH_MU, EARTH_MEAN_RADIUS, 300e3);
        assert!((tau - 5422.67).abs() < 0.05, "τ = {tau}");
        assert_eq!(leo().period(), tau);
    }

    #[test]
    fn test_critical_beta_at_300km() {
        let beta = eclipse_critical_beta(EARTH_RADIUS, 300e3).to_degrees();
        assert!((beta - 72.76).abs() < 0.01, "β* = {beta}");
    }

    #[test]
    fn test_eclipse_fraction_reference() {
        let f = eclipse_fraction(EARTH_RADIUS, 300e3, 0.0);
        assert!((f - 0.404_227_253_0).abs() < 1e-6, "f = {f}");
        assert_eq!(eclipse_fraction(EARTH_RADIUS, 300e3, 80.0), 0.0);
        assert_eq!(
            eclipse_fraction(EARTH_RADIUS, 300e3, -30.0),
            eclipse_fraction(EARTH_RADIUS, 300e3, 30.0)
        );
    }

    #[test]
    fn test_earth_view_factor_regimes() {
        let orbit = leo();
        assert!((orbit.earth_view_factor(0.0) - 0.9122).abs() < 1e-4);
        assert!((orbit.earth_view_factor(30.0) - 0.7977).abs() < 1e-4);
        assert!((orbit.earth_view_factor(90.0) - 0.3141).abs() < 1e-4);
        assert_eq!(orbit.earth_view_factor(170.0), 0.0);
    }

    #[test]
    fn test_sun_view_factor() {
        assert!((view_factor(300e3, 0.0, SUN_RADIUS) - 1.0).abs() < 1e-4);
        assert!((view_factor(300e3, 30.0, SUN_RADIUS) - 0.9324).abs() < 1e-4);
        assert!((view_factor(300e3, 90.0, SUN_RADIUS) - 0.4987).abs() < 1e-3);
    }

    #[test]
    fn test_view_factor_continuous_at_band_edge() {
        let h = (EARTH_RADIUS + 300e3) / EARTH_RADIUS;
        let edge = (FRAC_PI_2 - (1.0 / h).asin()).to_degrees();
        let below = view_factor(300e3, edge - 1e-6, EARTH_RADIUS);
        let above = view_factor(300e3, edge + 1e-6, EARTH_RADIUS);
        assert!((below - above).abs() < 1e-5, "{below} vs {above}");
    }

    #[test]
    fn test_eclipse_window() {
        let orbit = leo();
        let tau = orbit.period();
        let f = orbit.eclipse_fraction(0.0);
        assert!(!orbit.in_eclipse(0.0, f));
        assert!(orbit.in_eclipse(0.5 * tau, f));
        assert!(orbit.in_eclipse(1.5 * tau, f));
        assert!(!orbit.in_eclipse(0.5 * tau * (1.0 - f), f));
        assert!(!orbit.in_eclipse(0.5 * tau, 0.0));
    }

    #[test]
    fn test_regime_step_functions() {
        let orbit = leo();
        assert_eq!(orbit.albedo_coefficient(0.0), 0.14);
        assert_eq!(orbit.albedo_coefficient(-29.9), 0.14);
        assert_eq!(orbit.albedo_coefficient(30.0), 0.19);
        assert_eq!(orbit.infrared_constant(10.0), 228.0);
        assert_eq!(orbit.infrared_constant(60.0), 218.0);
        assert!((orbit.infrared_flux(60.0, 2.0) - 436.0).abs() < 1e-12);
        assert!((orbit.albedo_flux(0.0, 1.0, 0.3) - 0.14 * 1370.0 * 0.3).abs() < 1e-9);
        assert!((orbit.solar_flux(0.5, 2.0, 0.3) - 411.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_altitude() {
        let c = PhysicalConstants::default();
        let e = EnvironmentConfig::default();
        assert!(Orbit::new(0.0, &c, &e).is_err());
        assert!(Orbit::new(f64::NAN, &c, &e).is_err());
    }
}
