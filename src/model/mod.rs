//! Electricity price models and the added-load counterfactual.

pub mod counterfactual;
pub mod features;
pub mod ols;

pub use counterfactual::{
    AssumptionPassThrough, PricingMode, PricingStrategy, TrainedExtrapolation, WhatIfRequest,
    WhatIfResult, what_if_added_dc,
};
pub use features::{Design, FeatureSet, build_features, build_features_baseline};
pub use ols::FittedModel;

use tracing::info;

use crate::data::EnergyTable;
use crate::error::Result;

/// The two coefficient vectors fitted at start-up.
#[derive(Debug, Clone)]
pub struct PriceModels {
    /// Structural drivers only.
    pub baseline: FittedModel,
    /// Structural drivers plus data-center load.
    pub full: FittedModel,
}

impl PriceModels {
    /// Fits both models against the observed prices in `table`.
    pub fn fit(table: &EnergyTable) -> Result<Self> {
        let baseline = FittedModel::fit(FeatureSet::Baseline, table)?;
        let full = FittedModel::fit(FeatureSet::Full, table)?;
        info!(
            states = table.len(),
            baseline_r2 = ?baseline.r_squared,
            full_r2 = ?full.r_squared,
            "price models fitted"
        );
        Ok(Self { baseline, full })
    }
}
