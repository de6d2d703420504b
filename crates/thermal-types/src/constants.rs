// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Stefan–Boltzmann constant (W/m²·K⁴), at the precision the thermal
/// tables were calibrated with.
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Newtonian gravitational constant (m³/kg·s²)
pub const GRAVITATIONAL_CONSTANT: f64 = 6.674e-11;

/// Earth mass (kg)
pub const EARTH_MASS: f64 = 5.972e24;

/// Earth gravitational parameter μ = G·M (m³/s²)
pub const EARTH_MU: f64 = GRAVITATIONAL_CONSTANT * EARTH_MASS;

/// Earth mean radius (m). Used for the orbital period.
pub const EARTH_MEAN_RADIUS: f64 = 6.371e6;

/// Earth equatorial radius (m). Used for eclipse geometry and view factors.
pub const EARTH_RADIUS: f64 = 6.378e6;

/// Effective radius of the Sun as a radiating body (m).
/// NOTE: this is the Sun–Earth distance, so the Sun behaves as a sphere
/// large enough that every sunward tilt sees it almost fully.
pub const SUN_RADIUS: f64 = 1.4731e11;

/// Solar constant at 1 AU (W/m²)
pub const SOLAR_CONSTANT: f64 = 1370.0;

/// Nominal isothermal starting temperature (K), 20 °C.
pub const BASELINE_TEMPERATURE: f64 = 293.15;

/// Absolute zero offset (K → °C)
pub const KELVIN_OFFSET: f64 = 273.15;
