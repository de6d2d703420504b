// ─────────────────────────────────────────────────────────────────────
// SCPN Thermal Core — Heat Balance
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Net heat rate per node: the right-hand side of the network ODE.
//!
//! For node i with thermal mass Cᵢ:
//!
//! Cᵢ·dTᵢ/dt = Σⱼ kᵢ·Aᵢⱼ·(Tⱼ − Tᵢ)                      conduction
//!           + kᵢ·A_sup·(T_c − Tᵢ) + σ·ε_c·A_view·T_c⁴   compartment
//!           + Q_solar + Q_albedo + Q_ir                  environment
//!           + Q_load                                     dissipation
//!           − σ·εᵢ·Aᵢ·Tᵢ⁴                                radiated
//!
//! Conductivity is the receiving node's. The compartment is a fixed
//! boundary temperature, never a state variable.

use log::debug;
use ndarray::Array1;
use serde::Serialize;
use thermal_math::ode::OdeSystem;
use thermal_types::catalog::RadiatingBody;
use thermal_types::config::{EnvironmentConfig, HeatBalanceTerms, PhysicalConstants};
use thermal_types::error::{ThermalError, ThermalResult};

use crate::graph::{Node, NodeGraph};
use crate::orbit::Orbit;

/// Rounding slack when checking a view factor against [0, 1].
const VIEW_FACTOR_TOLERANCE: f64 = 1e-9;

/// Per-node heat flows [W]; positive into the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeatFlows {
    pub solar: f64,
    pub albedo: f64,
    pub infrared: f64,
    pub conduction: f64,
    pub compartment: f64,
    pub dissipation: f64,
    /// Self-emitted loss, subtracted from the balance.
    pub radiated: f64,
}

impl HeatFlows {
    /// Environmental input: solar + albedo + infrared.
    pub fn boundary(&self) -> f64 {
        self.solar + self.albedo + self.infrared
    }

    pub fn net(&self) -> f64 {
        self.boundary() + self.conduction + self.compartment + self.dissipation - self.radiated
    }
}

/// Beta-dependent illumination shared by every node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Illumination {
    pub beta_deg: f64,
    pub eclipse_fraction: f64,
    pub albedo_coefficient: f64,
    pub infrared_constant: f64,
}

/// Heat-balance engine for one graph at one altitude.
#[derive(Debug, Clone)]
pub struct HeatBalance<'g> {
    graph: &'g NodeGraph,
    orbit: Orbit,
    terms: HeatBalanceTerms,
    sigma: f64,
    solar_constant: f64,
    eclipse_albedo_fraction: f64,
    /// View factor of each node's radiating body, 0 for unexposed nodes.
    view_factors: Vec<f64>,
    /// σ·ε_c·A_view·T_c⁴ per node [W]
    compartment_radiation: Vec<f64>,
    compartment_temperature: f64,
}

impl<'g> HeatBalance<'g> {
    /// Precompute view factors; a tilt whose view factor leaves [0, 1] fails
    /// with [`ThermalError::InvalidGeometry`].
    pub fn new(
        graph: &'g NodeGraph,
        constants: &PhysicalConstants,
        environment: &EnvironmentConfig,
        terms: HeatBalanceTerms,
        altitude: f64,
    ) -> ThermalResult<Self> {
        let orbit = Orbit::new(altitude, constants, environment)?;

        let mut view_factors = Vec::with_capacity(graph.len());
        for node in graph.nodes() {
            let f = match node.radiating_body {
                RadiatingBody::Earth => orbit.earth_view_factor(node.gamma),
                RadiatingBody::Sun => orbit.sun_view_factor(node.gamma),
                RadiatingBody::Internal | RadiatingBody::None => 0.0,
            };
            if !f.is_finite() || f < -VIEW_FACTOR_TOLERANCE || f > 1.0 + VIEW_FACTOR_TOLERANCE {
                return Err(ThermalError::InvalidGeometry {
                    key: node.key,
                    message: format!(
                        "tilt {}° toward {} gives view factor {f} outside [0, 1]",
                        node.gamma, node.radiating_body
                    ),
                });
            }
            view_factors.push(f.clamp(0.0, 1.0));
        }

        let t_c4 = environment.compartment_temperature.powi(4);
        let compartment_radiation = graph
            .nodes()
            .iter()
            .map(|n| {
                constants.stefan_boltzmann
                    * environment.compartment_emissivity
                    * n.compartment.view_area
                    * t_c4
            })
            .collect();

        debug!(
            "heat balance '{}' at {:.0} m: period {:.1} s, eclipse below β = {:.2}°",
            graph.name(),
            altitude,
            orbit.period(),
            orbit.critical_beta_deg()
        );

        Ok(HeatBalance {
            graph,
            orbit,
            terms,
            sigma: constants.stefan_boltzmann,
            solar_constant: constants.solar_constant,
            eclipse_albedo_fraction: environment.eclipse_albedo_fraction,
            view_factors,
            compartment_radiation,
            compartment_temperature: environment.compartment_temperature,
        })
    }

    pub fn graph(&self) -> &'g NodeGraph {
        self.graph
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    pub fn terms(&self) -> HeatBalanceTerms {
        self.terms
    }

    pub fn view_factors(&self) -> &[f64] {
        &self.view_factors
    }

    pub fn illumination(&self, beta_deg: f64) -> Illumination {
        Illumination {
            beta_deg,
            eclipse_fraction: self.orbit.eclipse_fraction(beta_deg),
            albedo_coefficient: self.orbit.albedo_coefficient(beta_deg),
            infrared_constant: self.orbit.infrared_constant(beta_deg),
        }
    }

    /// dT/dt [K/s] at mission time `t`.
    pub fn derivative(
        &self,
        t: f64,
        temperatures: &[f64],
        beta_deg: f64,
    ) -> ThermalResult<Array1<f64>> {
        self.check_len(temperatures)?;
        let mut dtdt = Array1::zeros(self.graph.len());
        if let Some(out) = dtdt.as_slice_mut() {
            self.derivative_into(t, temperatures, &self.illumination(beta_deg), out);
        }
        Ok(dtdt)
    }

    /// Net heat rate per node [W].
    pub fn heat_rates(
        &self,
        t: f64,
        temperatures: &[f64],
        beta_deg: f64,
    ) -> ThermalResult<Array1<f64>> {
        Ok(self
            .breakdown(t, temperatures, beta_deg)?
            .iter()
            .map(HeatFlows::net)
            .collect())
    }

    /// Every term of every node's balance [W].
    pub fn breakdown(
        &self,
        t: f64,
        temperatures: &[f64],
        beta_deg: f64,
    ) -> ThermalResult<Vec<HeatFlows>> {
        self.check_len(temperatures)?;
        let illum = self.illumination(beta_deg);
        let eclipsed = self.orbit.in_eclipse(t, illum.eclipse_fraction);
        Ok((0..self.graph.len())
            .map(|i| self.flows(i, temperatures, &illum, eclipsed))
            .collect())
    }

    /// Solar + albedo + infrared input to the node `key` [W].
    pub fn boundary_flux(&self, key: u32, t: f64, beta_deg: f64) -> ThermalResult<f64> {
        let i = self
            .graph
            .index_of(key)
            .ok_or(ThermalError::UnknownNode(key))?;
        let illum = self.illumination(beta_deg);
        let eclipsed = self.orbit.in_eclipse(t, illum.eclipse_fraction);
        let (solar, albedo, infrared) = self.environment(i, &illum, eclipsed);
        Ok(solar + albedo + infrared)
    }

    /// ODE view of this balance at a fixed beta.
    pub fn system(&self, beta_deg: f64) -> BetaSystem<'_, 'g> {
        BetaSystem {
            balance: self,
            illumination: self.illumination(beta_deg),
        }
    }

    fn check_len(&self, temperatures: &[f64]) -> ThermalResult<()> {
        if temperatures.len() != self.graph.len() {
            return Err(ThermalError::ConfigError(format!(
                "temperature field has {} entries, graph has {} nodes",
                temperatures.len(),
                self.graph.len()
            )));
        }
        Ok(())
    }

    fn derivative_into(&self, t: f64, temperatures: &[f64], illum: &Illumination, out: &mut [f64]) {
        let eclipsed = self.orbit.in_eclipse(t, illum.eclipse_fraction);
        for (i, (node, slot)) in self.graph.nodes().iter().zip(out.iter_mut()).enumerate() {
            *slot = self.flows(i, temperatures, illum, eclipsed).net() / node.thermal_mass;
        }
    }

    fn flows(&self, i: usize, temperatures: &[f64], illum: &Illumination, eclipsed: bool) -> HeatFlows {
        let node: &Node = &self.graph.nodes()[i];
        let t_i = temperatures[i];
        let k = node.material.conductivity;
        let mut flows = HeatFlows::default();

        if self.terms.conduction {
            flows.conduction = node
                .contacts
                .iter()
                .map(|c| k * c.area * (temperatures[c.index] - t_i))
                .sum();
        }
        if self.terms.compartment && node.compartment.is_coupled() {
            flows.compartment = k * node.compartment.support_area
                * (self.compartment_temperature - t_i)
                + self.compartment_radiation[i];
        }
        if self.terms.environment && node.radiating_body.is_exposed() {
            let (solar, albedo, infrared) = self.environment(i, illum, eclipsed);
            flows.solar = solar;
            flows.albedo = albedo;
            flows.infrared = infrared;
        }
        if self.terms.dissipation {
            flows.dissipation = node.heat_load;
        }
        if self.terms.self_radiation {
            flows.radiated = self.sigma * node.material.emissivity * node.area * t_i.powi(4);
        }
        flows
    }

    /// (solar, albedo, infrared) gated by radiating body and eclipse.
    fn environment(&self, i: usize, illum: &Illumination, eclipsed: bool) -> (f64, f64, f64) {
        let node = &self.graph.nodes()[i];
        let alpha = node.material.absorptance;
        let solar = if eclipsed {
            0.0
        } else {
            self.orbit.solar_flux(self.view_factors[i], node.area, alpha)
        };
        match node.radiating_body {
            RadiatingBody::Earth => {
                let mut albedo =
                    illum.albedo_coefficient * node.area * self.solar_constant * alpha;
                if eclipsed {
                    albedo *= self.eclipse_albedo_fraction;
                }
                (solar, albedo, illum.infrared_constant * node.area)
            }
            RadiatingBody::Sun => (solar, 0.0, 0.0),
            RadiatingBody::Internal | RadiatingBody::None => (0.0, 0.0, 0.0),
        }
    }
}

/// [`HeatBalance`] bound to one beta angle, for the integrator.
pub struct BetaSystem<'b, 'g> {
    balance: &'b HeatBalance<'g>,
    illumination: Illumination,
}

impl BetaSystem<'_, '_> {
    pub fn illumination(&self) -> &Illumination {
        &self.illumination
    }
}

impl OdeSystem for BetaSystem<'_, '_> {
    fn dimension(&self) -> usize {
        self.balance.graph.len()
    }

    fn rhs(&self, t: f64, y: &[f64], dydt: &mut [f64]) {
        self.balance.derivative_into(t, y, &self.illumination, dydt);
    }
}
