//! What-if repricing for a hypothetical data-center load added to one state.
//!
//! Two strategies are supported:
//! - [`AssumptionPassThrough`]: structural baseline price scaled by a fixed
//!   pass-through of the new data-center share (with a floor).
//! - [`TrainedExtrapolation`]: the full regression evaluated before and after
//!   the load is added.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PriceModels;
use crate::data::{EnergyTable, StateEnergyRecord};
use crate::error::{Error, Result};

pub const HOURS_PER_YEAR: f64 = 8760.0;
pub const DEFAULT_PUE: f64 = 1.25;
/// Fractional price increase per +100% data-center share of state sales.
pub const PASS_THROUGH_ELEC: f64 = 0.30;
pub const ASSUMPTION_SHARE_FLOOR: f64 = 0.01;

/// How the new price is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    #[default]
    Assumption,
    Trained,
}

impl FromStr for PricingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assumption" => Ok(Self::Assumption),
            "trained" => Ok(Self::Trained),
            other => Err(Error::Input(format!(
                "mode must be \"assumption\" or \"trained\", got \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assumption => write!(f, "assumption"),
            Self::Trained => write!(f, "trained"),
        }
    }
}

/// New price plus the assumption-mode bookkeeping, when it applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repricing {
    pub new_price: f64,
    pub effective_share: Option<f64>,
    pub share_floor: Option<f64>,
}

/// One way of turning a state's current and hypothetical records into prices.
pub trait PricingStrategy {
    fn mode(&self) -> PricingMode;

    /// Price before the added load (cents/kWh).
    fn baseline_price(&self, models: &PriceModels, current: &StateEnergyRecord) -> Result<f64>;

    /// Price once `hypothetical` replaces the current record.
    fn reprice(
        &self,
        models: &PriceModels,
        baseline_price: f64,
        hypothetical: &StateEnergyRecord,
    ) -> Result<Repricing>;
}

/// Fixed pass-through: `new = baseline * (1 + pass_through * max(share, floor))`.
///
/// The baseline comes from the structural model so the state's existing
/// data-center footprint is not counted twice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssumptionPassThrough {
    pub pass_through: f64,
    pub share_floor: f64,
}

impl Default for AssumptionPassThrough {
    fn default() -> Self {
        Self {
            pass_through: PASS_THROUGH_ELEC,
            share_floor: ASSUMPTION_SHARE_FLOOR,
        }
    }
}

impl PricingStrategy for AssumptionPassThrough {
    fn mode(&self) -> PricingMode {
        PricingMode::Assumption
    }

    fn baseline_price(&self, models: &PriceModels, current: &StateEnergyRecord) -> Result<f64> {
        models.baseline.predict_record(current)
    }

    fn reprice(
        &self,
        _models: &PriceModels,
        baseline_price: f64,
        hypothetical: &StateEnergyRecord,
    ) -> Result<Repricing> {
        let effective_share = hypothetical.dc_share().max(self.share_floor);
        Ok(Repricing {
            new_price: baseline_price * (1.0 + self.pass_through * effective_share),
            effective_share: Some(effective_share),
            share_floor: Some(self.share_floor),
        })
    }
}

/// Direct extrapolation with the full (data-center aware) regression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainedExtrapolation;

impl PricingStrategy for TrainedExtrapolation {
    fn mode(&self) -> PricingMode {
        PricingMode::Trained
    }

    fn baseline_price(&self, models: &PriceModels, current: &StateEnergyRecord) -> Result<f64> {
        models.full.predict_record(current)
    }

    fn reprice(
        &self,
        models: &PriceModels,
        _baseline_price: f64,
        hypothetical: &StateEnergyRecord,
    ) -> Result<Repricing> {
        Ok(Repricing {
            new_price: models.full.predict_record(hypothetical)?,
            effective_share: None,
            share_floor: None,
        })
    }
}

/// Arguments of a what-if query.
///
/// When both `added_annual_mwh` and `added_power_mw` are set the energy
/// figure wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WhatIfRequest {
    pub state: String,
    pub added_power_mw: Option<f64>,
    pub added_annual_mwh: Option<f64>,
    pub pue: f64,
    pub include_added_load_in_sales: bool,
    pub mode: PricingMode,
    /// Only consulted in assumption mode.
    pub share_floor: f64,
    /// Only consulted in assumption mode.
    pub pass_through: f64,
}

impl Default for WhatIfRequest {
    fn default() -> Self {
        Self {
            state: String::new(),
            added_power_mw: None,
            added_annual_mwh: None,
            pue: DEFAULT_PUE,
            include_added_load_in_sales: true,
            mode: PricingMode::Assumption,
            share_floor: ASSUMPTION_SHARE_FLOOR,
            pass_through: PASS_THROUGH_ELEC,
        }
    }
}

impl WhatIfRequest {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ..Self::default()
        }
    }

    pub fn power_mw(mut self, mw: f64) -> Self {
        self.added_power_mw = Some(mw);
        self
    }

    pub fn annual_mwh(mut self, mwh: f64) -> Self {
        self.added_annual_mwh = Some(mwh);
        self
    }

    pub fn mode(mut self, mode: PricingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn pue(mut self, pue: f64) -> Self {
        self.pue = pue;
        self
    }

    pub fn share_floor(mut self, floor: f64) -> Self {
        self.share_floor = floor;
        self
    }

    pub fn include_in_sales(mut self, include: bool) -> Self {
        self.include_added_load_in_sales = include;
        self
    }

    pub fn pass_through(mut self, pass_through: f64) -> Self {
        self.pass_through = pass_through;
        self
    }

    /// Annual energy of the added load: MWh as given, or `MW * 8760 * PUE`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Input` if neither figure is set, either is negative or
    /// non-finite, or the PUE is not positive.
    pub fn resolved_annual_mwh(&self) -> Result<f64> {
        if let Some(mwh) = self.added_annual_mwh {
            return non_negative("added_annual_mwh", mwh);
        }
        let Some(mw) = self.added_power_mw else {
            return Err(Error::Input(
                "provide either added_power_mw or added_annual_mwh".into(),
            ));
        };
        let mw = non_negative("added_power_mw", mw)?;
        if !(self.pue > 0.0 && self.pue.is_finite()) {
            return Err(Error::Input(format!("pue must be > 0, got {}", self.pue)));
        }
        Ok(mw * HOURS_PER_YEAR * self.pue)
    }

    /// The strategy selected by `mode`.
    pub fn strategy(&self) -> Result<Box<dyn PricingStrategy>> {
        match self.mode {
            PricingMode::Assumption => {
                non_negative("share_floor", self.share_floor)?;
                non_negative("pass_through", self.pass_through)?;
                Ok(Box::new(AssumptionPassThrough {
                    pass_through: self.pass_through,
                    share_floor: self.share_floor,
                }))
            }
            PricingMode::Trained => Ok(Box::new(TrainedExtrapolation)),
        }
    }
}

fn non_negative(name: &str, v: f64) -> Result<f64> {
    if v >= 0.0 && v.is_finite() {
        Ok(v)
    } else {
        Err(Error::Input(format!("{name} must be a finite value >= 0, got {v}")))
    }
}

/// Outcome of a what-if query.
///
/// `effective_share` and `share_floor` are only reported in assumption mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfResult {
    pub state: String,
    pub mode: PricingMode,
    #[serde(rename = "observed_c_per_kWh")]
    pub observed_c_per_kwh: f64,
    #[serde(rename = "baseline_pred_c_per_kWh")]
    pub baseline_pred_c_per_kwh: f64,
    #[serde(rename = "new_pred_c_per_kWh")]
    pub new_pred_c_per_kwh: f64,
    #[serde(rename = "delta_c_per_kWh")]
    pub delta_c_per_kwh: f64,
    pub added_annual_mwh: f64,
    pub dc_share_new: f64,
    pub include_added_load_in_sales: bool,
    pub effective_share: Option<f64>,
    pub share_floor: Option<f64>,
}

/// Prices the request with the strategy its `mode` selects.
///
/// # Errors
///
/// `Error::NotFound` for an unknown state; `Error::Input` for a missing or
/// invalid load figure.
pub fn what_if_added_dc(
    table: &EnergyTable,
    models: &PriceModels,
    request: &WhatIfRequest,
) -> Result<WhatIfResult> {
    let strategy = request.strategy()?;
    what_if_with(strategy.as_ref(), table, models, request)
}

/// Prices the request with an explicit strategy, ignoring `request.mode`.
pub fn what_if_with(
    strategy: &dyn PricingStrategy,
    table: &EnergyTable,
    models: &PriceModels,
    request: &WhatIfRequest,
) -> Result<WhatIfResult> {
    let current = table.get(&request.state)?;
    let added_annual_mwh = request.resolved_annual_mwh()?;

    let baseline = strategy.baseline_price(models, current)?;
    let hypothetical = current.with_added_load(added_annual_mwh, request.include_added_load_in_sales);
    let dc_share_new = hypothetical.dc_share();
    let repriced = strategy.reprice(models, baseline, &hypothetical)?;

    debug!(
        state = %current.state_code,
        mode = %strategy.mode(),
        added_annual_mwh,
        dc_share_new,
        baseline,
        new_price = repriced.new_price,
        "what-if priced"
    );

    Ok(WhatIfResult {
        state: current.state_code.clone(),
        mode: strategy.mode(),
        observed_c_per_kwh: current.avg_retail_price_cents_per_kwh,
        baseline_pred_c_per_kwh: baseline,
        new_pred_c_per_kwh: repriced.new_price,
        delta_c_per_kwh: repriced.new_price - baseline,
        added_annual_mwh,
        dc_share_new,
        include_added_load_in_sales: request.include_added_load_in_sales,
        effective_share: repriced.effective_share,
        share_floor: repriced.share_floor,
    })
}
