//! Splits historical home-value growth into normal and post-announcement excess growth.
//!
//! Both rates are resolved through the same ordered chain of tiers, stopping
//! at the first tier that has data:
//! 1. the state's own records,
//! 2. every state's records,
//! 3. a configured constant.

use serde::Serialize;
use tracing::warn;

use crate::data::{HousingRecord, HousingTable, normalize_state};
use crate::error::Result;

pub const DEFAULT_NORMAL_GROWTH: f64 = 0.03;
pub const DEFAULT_HYPERSCALE_EFFECT: f64 = 0.20;

/// Evaluation order of the fallback chain.
pub const FALLBACK_CHAIN: [GrowthTier; 3] =
    [GrowthTier::State, GrowthTier::CrossState, GrowthTier::Default];

/// Which tier produced a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTier {
    State,
    CrossState,
    Default,
}

/// A fractional annual rate tagged with its source tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthEstimate {
    pub rate: f64,
    pub source: GrowthTier,
}

/// Constants at the bottom of each chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthDefaults {
    pub normal: f64,
    pub hyperscale: f64,
}

impl Default for GrowthDefaults {
    fn default() -> Self {
        Self {
            normal: DEFAULT_NORMAL_GROWTH,
            hyperscale: DEFAULT_HYPERSCALE_EFFECT,
        }
    }
}

/// Normal and hyperscale rates for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthDecomposition {
    pub state: String,
    pub normal_growth_rate: GrowthEstimate,
    pub hyperscale_effect_rate: GrowthEstimate,
}

impl GrowthDecomposition {
    pub fn total(&self) -> f64 {
        self.normal_growth_rate.rate + self.hyperscale_effect_rate.rate
    }
}

/// Growth-rate lookups over a borrowed housing table.
#[derive(Debug, Clone, Copy)]
pub struct GrowthDecomposer<'a> {
    table: &'a HousingTable,
    defaults: GrowthDefaults,
}

impl<'a> GrowthDecomposer<'a> {
    pub fn new(table: &'a HousingTable, defaults: GrowthDefaults) -> Self {
        Self { table, defaults }
    }

    /// Normal rate for `tier`, or `None` when that tier has no data.
    pub fn normal_tier(&self, state: &str, tier: GrowthTier) -> Option<f64> {
        match tier {
            GrowthTier::State => mean_fraction(self.state_rows(state), false),
            GrowthTier::CrossState => mean_fraction(self.table.records(), false),
            GrowthTier::Default => Some(self.defaults.normal),
        }
    }

    /// Hyperscale excess for `tier`, or `None` when that tier has no data.
    ///
    /// The state tier subtracts the state's resolved normal rate; every tier
    /// is floored at zero.
    pub fn hyperscale_tier(&self, state: &str, tier: GrowthTier) -> Option<f64> {
        match tier {
            GrowthTier::State => mean_fraction(self.state_rows(state), true)
                .map(|post| (post - self.normal_growth_rate(state).rate).max(0.0)),
            GrowthTier::CrossState => {
                mean_fraction(self.table.records(), true).map(|post| post.max(0.0))
            }
            GrowthTier::Default => Some(self.defaults.hyperscale.max(0.0)),
        }
    }

    /// Mean pre-announcement growth as a fraction.
    pub fn normal_growth_rate(&self, state: &str) -> GrowthEstimate {
        resolve(state, "normal growth", self.defaults.normal, |tier| {
            self.normal_tier(state, tier)
        })
    }

    /// Post-announcement growth in excess of normal growth, never negative.
    pub fn hyperscale_effect_rate(&self, state: &str) -> GrowthEstimate {
        resolve(state, "hyperscale effect", self.defaults.hyperscale, |tier| {
            self.hyperscale_tier(state, tier)
        })
    }

    /// Both rates for a state present in the table.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the table has no rows for `state`.
    pub fn decompose(&self, state: &str) -> Result<GrowthDecomposition> {
        let code = normalize_state(state);
        self.table.state_records(&code)?;
        Ok(GrowthDecomposition {
            normal_growth_rate: self.normal_growth_rate(&code),
            hyperscale_effect_rate: self.hyperscale_effect_rate(&code),
            state: code,
        })
    }

    fn state_rows(&self, state: &str) -> impl Iterator<Item = &'a HousingRecord> {
        self.table.state_records(state).unwrap_or_default().iter()
    }
}

fn resolve(
    state: &str,
    what: &str,
    default: f64,
    eval: impl Fn(GrowthTier) -> Option<f64>,
) -> GrowthEstimate {
    let estimate = FALLBACK_CHAIN
        .iter()
        .find_map(|&tier| eval(tier).map(|rate| GrowthEstimate { rate, source: tier }))
        .unwrap_or(GrowthEstimate {
            rate: default,
            source: GrowthTier::Default,
        });
    if estimate.source != GrowthTier::State {
        warn!(state, source = ?estimate.source, rate = estimate.rate, "{what} fell back");
    }
    estimate
}

/// Mean of non-null percent changes for one announcement phase, as a fraction.
fn mean_fraction<'r>(
    records: impl Iterator<Item = &'r HousingRecord>,
    post_announcement: bool,
) -> Option<f64> {
    let (sum, n) = records
        .filter(|r| r.is_post_announcement == post_announcement)
        .filter_map(|r| r.home_value_pct_change)
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64 / 100.0)
}
