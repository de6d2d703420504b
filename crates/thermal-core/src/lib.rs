//! Lumped-node spacecraft thermal network.
//!
//! Node graph, orbital geometry, heat-balance engine and the
//! beta/altitude/time sweep driver.

pub mod graph;
pub mod heat_balance;
pub mod model;
pub mod orbit;
pub mod reference;
pub mod sweep;
