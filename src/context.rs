//! Process-wide model state: loaded tables and fitted coefficients.
//!
//! A [`ModelContext`] is built once before any query runs and is read-only
//! afterwards. Every query borrows it immutably, so it can be shared across
//! threads behind an `Arc` without locking.

use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;
use crate::data::{EnergyTable, HousingTable};
use crate::error::{Error, Result};
use crate::housing::{
    CpiTable, GrowthDefaults, HistoryPoint, HousingEstimate, HousingPrediction, HousingSimulator,
    SimulationMethod, projection,
};
use crate::model::{PriceModels, PricingMode, WhatIfRequest, WhatIfResult, what_if_added_dc};

/// Which inputs are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextStatus {
    pub electricity: bool,
    pub housing: bool,
}

/// State codes known to each table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCatalog {
    pub electricity_states: Vec<String>,
    pub housing_states: Vec<String>,
    pub all_states: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModelContext {
    config: AppConfig,
    energy: EnergyTable,
    models: PriceModels,
    housing: Option<HousingTable>,
    cpi: CpiTable,
}

impl ModelContext {
    /// Reads every configured source and fits the price models.
    ///
    /// # Errors
    ///
    /// Propagates load and fit failures. A configured but unreadable housing
    /// file is an error; an unconfigured one just disables housing queries.
    pub fn load(config: AppConfig) -> Result<Self> {
        let energy = EnergyTable::load(
            &config.data.state_metrics_csv,
            &config.data.datacenter_csv,
        )?;
        let housing = match &config.data.housing_csv {
            Some(path) => Some(HousingTable::load(path)?),
            None => None,
        };
        Self::from_tables(config, energy, housing)
    }

    /// Builds a context from tables already in memory.
    pub fn from_tables(
        config: AppConfig,
        energy: EnergyTable,
        housing: Option<HousingTable>,
    ) -> Result<Self> {
        let models = PriceModels::fit(&energy)?;
        let cpi = CpiTable::default().with_fallback_rate(config.housing.annual_inflation_rate);
        info!(
            states = energy.len(),
            housing = housing.is_some(),
            "model context ready"
        );
        Ok(Self {
            config,
            energy,
            models,
            housing,
            cpi,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn energy(&self) -> &EnergyTable {
        &self.energy
    }

    pub fn models(&self) -> &PriceModels {
        &self.models
    }

    pub fn cpi(&self) -> &CpiTable {
        &self.cpi
    }

    /// # Errors
    ///
    /// `Error::Unavailable` when no housing table was loaded.
    pub fn housing(&self) -> Result<&HousingTable> {
        self.housing.as_ref().ok_or(Error::Unavailable("housing"))
    }

    pub fn status(&self) -> ContextStatus {
        ContextStatus {
            electricity: !self.energy.is_empty(),
            housing: self.housing.is_some(),
        }
    }

    pub fn catalog(&self) -> StateCatalog {
        let electricity_states = self.energy.state_codes();
        let housing_states = self
            .housing
            .as_ref()
            .map(HousingTable::state_codes)
            .unwrap_or_default();
        let mut all_states: Vec<String> = electricity_states
            .iter()
            .chain(&housing_states)
            .cloned()
            .collect();
        all_states.sort();
        all_states.dedup();
        StateCatalog {
            electricity_states,
            housing_states,
            all_states,
        }
    }

    /// A what-if request for `state` pre-filled with the configured assumptions.
    pub fn what_if_request(&self, state: &str) -> Result<WhatIfRequest> {
        let p = &self.config.pricing;
        Ok(WhatIfRequest::new(state)
            .pue(p.pue)
            .share_floor(p.share_floor)
            .pass_through(p.pass_through_elec)
            .include_in_sales(p.include_added_load_in_sales)
            .mode(p.mode.parse::<PricingMode>()?))
    }

    pub fn what_if_added_dc(&self, request: &WhatIfRequest) -> Result<WhatIfResult> {
        what_if_added_dc(&self.energy, &self.models, request)
    }

    pub fn housing_simulator(&self) -> Result<HousingSimulator<'_>> {
        let h = &self.config.housing;
        let defaults = GrowthDefaults {
            normal: h.default_normal_growth,
            hyperscale: h.default_hyperscale_effect,
        };
        Ok(HousingSimulator::new(self.housing()?, &self.cpi, defaults)
            .with_min_regression_records(h.min_regression_records))
    }

    pub fn simple_simulate_house_price(
        &self,
        state: &str,
        current_price: f64,
        years_after: i32,
        base_year: i32,
    ) -> Result<HousingEstimate> {
        self.housing_simulator()?
            .simple(state, current_price, years_after, base_year)
    }

    pub fn advanced_simulate_house_price(
        &self,
        state: &str,
        current_price: f64,
        future_year: i32,
        base_year: i32,
    ) -> Result<HousingEstimate> {
        self.housing_simulator()?
            .advanced(state, current_price, future_year, base_year)
    }

    pub fn state_housing_history(&self, state: &str) -> Result<Vec<HistoryPoint>> {
        self.housing_simulator()?.history(state)
    }

    pub fn housing_predictions(
        &self,
        method: SimulationMethod,
        state: &str,
        current_price: f64,
        base_year: i32,
        horizon: i32,
    ) -> Result<Vec<HousingPrediction>> {
        let sim = self.housing_simulator()?;
        projection(&sim, method, state, current_price, base_year, horizon)
    }
}
