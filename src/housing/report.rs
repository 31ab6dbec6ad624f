//! Caller-facing housing prediction rows (rates in percent) and yearly series.

use serde::Serialize;

use super::simulate::{EstimateMethod, HousingEstimate, HousingSimulator, SimulationMethod};
use crate::error::{Error, Result};

/// One housing prediction, shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingPrediction {
    pub state: String,
    pub current_price: f64,
    pub target_year: i32,
    pub nominal_price: f64,
    pub real_price_2025_dollars: f64,
    pub nominal_increase_pct: f64,
    /// Percent per year.
    pub normal_growth_rate: f64,
    /// Percent per year.
    pub hyperscale_effect_rate: f64,
    /// Percent per year.
    pub total_growth_rate: f64,
    pub method: EstimateMethod,
}

impl HousingPrediction {
    pub fn from_estimate(current_price: f64, e: &HousingEstimate) -> Self {
        Self {
            state: e.state.clone(),
            current_price,
            target_year: e.target_year,
            nominal_price: e.nominal_price,
            real_price_2025_dollars: e.real_price,
            nominal_increase_pct: (e.nominal_price - current_price) / current_price * 100.0,
            normal_growth_rate: e.normal_growth_rate * 100.0,
            hyperscale_effect_rate: e.hyperscale_effect_rate * 100.0,
            total_growth_rate: (e.normal_growth_rate + e.hyperscale_effect_rate) * 100.0,
            method: e.method,
        }
    }
}

/// One prediction per year for `1..=horizon` years after `base_year`.
///
/// # Errors
///
/// `Error::Input` for a zero horizon; otherwise whatever the simulator reports.
pub fn projection(
    sim: &HousingSimulator<'_>,
    method: SimulationMethod,
    state: &str,
    current_price: f64,
    base_year: i32,
    horizon: i32,
) -> Result<Vec<HousingPrediction>> {
    if horizon < 1 {
        return Err(Error::Input(format!("horizon must be >= 1, got {horizon}")));
    }
    (1..=horizon)
        .map(|years| {
            sim.simulate(method, state, current_price, years, base_year)
                .map(|e| HousingPrediction::from_estimate(current_price, &e))
        })
        .collect()
}
