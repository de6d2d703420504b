//! Numerical integration for the SCPN thermal network.

pub mod ode;
