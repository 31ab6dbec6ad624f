//! Home-value projections: compounded growth rates or a regression with a sanity gate.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use tracing::{debug, warn};

use super::growth::{GrowthDecomposer, GrowthDefaults, GrowthTier};
use super::inflation::{CpiTable, REAL_DOLLAR_YEAR};
use crate::data::{HousingTable, normalize_state};
use crate::error::{Error, Result};
use crate::model::ols;

/// Fewest valued state records the regression is fitted on.
pub const MIN_REGRESSION_RECORDS: usize = 3;

/// Which simulator the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMethod {
    #[default]
    Simple,
    Advanced,
}

impl FromStr for SimulationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "advanced" => Ok(Self::Advanced),
            other => Err(Error::Input(format!(
                "method must be \"simple\" or \"advanced\", got \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for SimulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// Why the advanced simulator answered with the simple one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    TooFewRecords { found: usize, required: usize },
    BelowNormalGrowth,
}

/// How an estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMethod {
    Compounded,
    Regression,
    Fallback(FallbackReason),
}

impl fmt::Display for EstimateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compounded => write!(f, "compounded"),
            Self::Regression => write!(f, "regression"),
            Self::Fallback(FallbackReason::TooFewRecords { .. }) => {
                write!(f, "fallback_too_few_records")
            }
            Self::Fallback(FallbackReason::BelowNormalGrowth) => {
                write!(f, "fallback_below_normal_growth")
            }
        }
    }
}

/// A projected home value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingEstimate {
    pub state: String,
    pub target_year: i32,
    /// Dollars of `target_year`.
    pub nominal_price: f64,
    /// Dollars of [`REAL_DOLLAR_YEAR`].
    pub real_price: f64,
    pub normal_growth_rate: f64,
    pub hyperscale_effect_rate: f64,
    pub normal_source: GrowthTier,
    pub hyperscale_source: GrowthTier,
    pub method: EstimateMethod,
}

impl HousingEstimate {
    /// `(nominal_price, real_price, normal_growth_rate, hyperscale_effect_rate)`.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (
            self.nominal_price,
            self.real_price,
            self.normal_growth_rate,
            self.hyperscale_effect_rate,
        )
    }
}

/// One historical observation as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: String,
    pub year: i32,
    pub avg_home_value: Option<f64>,
    pub pct_change: Option<f64>,
    pub is_post_announcement: u8,
}

/// Housing projections over borrowed, read-only tables.
#[derive(Debug, Clone, Copy)]
pub struct HousingSimulator<'a> {
    table: &'a HousingTable,
    cpi: &'a CpiTable,
    growth: GrowthDecomposer<'a>,
    min_regression_records: usize,
}

impl<'a> HousingSimulator<'a> {
    pub fn new(table: &'a HousingTable, cpi: &'a CpiTable, defaults: GrowthDefaults) -> Self {
        Self {
            table,
            cpi,
            growth: GrowthDecomposer::new(table, defaults),
            min_regression_records: MIN_REGRESSION_RECORDS,
        }
    }

    pub fn with_min_regression_records(mut self, n: usize) -> Self {
        self.min_regression_records = n;
        self
    }

    pub fn growth(&self) -> &GrowthDecomposer<'a> {
        &self.growth
    }

    /// Compounds `normal + hyperscale` growth for `years_after` years.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for a state without rows; `Error::Input` for a
    /// non-positive price or a negative horizon.
    pub fn simple(
        &self,
        state: &str,
        current_price: f64,
        years_after: i32,
        base_year: i32,
    ) -> Result<HousingEstimate> {
        let code = normalize_state(state);
        self.table.state_records(&code)?;
        check_price(current_price)?;
        if years_after < 0 {
            return Err(Error::Input(format!(
                "years_after must be >= 0, got {years_after}"
            )));
        }

        let d = self.growth.decompose(&code)?;
        let target_year = base_year + years_after;
        let nominal_price = current_price * (1.0 + d.total()).powi(years_after);
        let real = self.cpi.adjust(nominal_price, target_year, REAL_DOLLAR_YEAR);

        debug!(
            state = %code,
            normal = d.normal_growth_rate.rate,
            hyperscale = d.hyperscale_effect_rate.rate,
            inflation = ?real.source,
            "simple projection"
        );

        Ok(HousingEstimate {
            state: code,
            target_year,
            nominal_price,
            real_price: real.value,
            normal_growth_rate: d.normal_growth_rate.rate,
            hyperscale_effect_rate: d.hyperscale_effect_rate.rate,
            normal_source: d.normal_growth_rate.source,
            hyperscale_source: d.hyperscale_effect_rate.source,
            method: EstimateMethod::Compounded,
        })
    }

    /// Regresses real home value on `(year, post_announcement)` and projects
    /// `future_year` with the announcement flag set.
    ///
    /// Only rows carrying a home value enter the regression; the fit is
    /// centered, so a collinear year and flag share the slope evenly. The
    /// projection is rescaled so the latest historical real value maps to
    /// `current_price`. Falls back to [`Self::simple`] when the state has too
    /// few valued records or when the projection undershoots plain normal
    /// growth.
    pub fn advanced(
        &self,
        state: &str,
        current_price: f64,
        future_year: i32,
        base_year: i32,
    ) -> Result<HousingEstimate> {
        let code = normalize_state(state);
        let rows = self.table.state_records(&code)?;
        check_price(current_price)?;
        let years_after = future_year - base_year;
        if years_after < 0 {
            return Err(Error::Input(format!(
                "future_year {future_year} precedes base_year {base_year}"
            )));
        }

        let valued: Vec<_> = rows
            .iter()
            .filter_map(|r| r.avg_home_value.map(|v| (r, v)))
            .collect();
        if valued.len() < self.min_regression_records {
            warn!(
                state = %code,
                records = valued.len(),
                "too few records for regression, using simple projection"
            );
            let reason = FallbackReason::TooFewRecords {
                found: valued.len(),
                required: self.min_regression_records,
            };
            return self.fallback(&code, current_price, years_after, base_year, reason);
        }

        let real_values: Vec<f64> = valued
            .iter()
            .map(|(r, v)| self.cpi.to_real(*v, r.year()))
            .collect();
        let design: Vec<f64> = valued
            .iter()
            .flat_map(|(r, _)| {
                [
                    f64::from(r.year() - REAL_DOLLAR_YEAR),
                    if r.is_post_announcement { 1.0 } else { 0.0 },
                ]
            })
            .collect();
        let x = DMatrix::from_row_slice(valued.len(), 2, &design);
        let y = DVector::from_column_slice(&real_values);
        let (intercept, beta) = ols::fit_centered(&x, &y)?;

        let future =
            DMatrix::from_row_slice(1, 2, &[f64::from(future_year - REAL_DOLLAR_YEAR), 1.0]);
        let predicted_real = intercept + ols::predict(&future, &beta)?[0];

        let latest_real = real_values.last().copied().unwrap_or(0.0);
        let anchor = if latest_real != 0.0 {
            current_price / latest_real
        } else {
            1.0
        };
        let real_price = predicted_real * anchor;
        let nominal_price = self
            .cpi
            .adjust(real_price, REAL_DOLLAR_YEAR, future_year)
            .value;

        let normal = self.growth.normal_growth_rate(&code);
        let floor = current_price * (1.0 + normal.rate).powi(years_after);
        if real_price < floor {
            warn!(
                state = %code,
                real_price,
                floor,
                "regression undershoots normal growth, using simple projection"
            );
            return self.fallback(
                &code,
                current_price,
                years_after,
                base_year,
                FallbackReason::BelowNormalGrowth,
            );
        }

        let hyperscale = self.growth.hyperscale_effect_rate(&code);
        debug!(state = %code, predicted_real, anchor, "regression projection");
        Ok(HousingEstimate {
            state: code,
            target_year: future_year,
            nominal_price,
            real_price,
            normal_growth_rate: normal.rate,
            hyperscale_effect_rate: hyperscale.rate,
            normal_source: normal.source,
            hyperscale_source: hyperscale.source,
            method: EstimateMethod::Regression,
        })
    }

    /// Dispatches on `method`; `years_after` is measured from `base_year`.
    pub fn simulate(
        &self,
        method: SimulationMethod,
        state: &str,
        current_price: f64,
        years_after: i32,
        base_year: i32,
    ) -> Result<HousingEstimate> {
        match method {
            SimulationMethod::Simple => self.simple(state, current_price, years_after, base_year),
            SimulationMethod::Advanced => {
                self.advanced(state, current_price, base_year + years_after, base_year)
            }
        }
    }

    /// A state's observations in date order.
    pub fn history(&self, state: &str) -> Result<Vec<HistoryPoint>> {
        let rows = self.table.state_records(state)?;
        Ok(rows
            .iter()
            .map(|r| HistoryPoint {
                date: r.date.format("%Y-%m-%d").to_string(),
                year: r.year(),
                avg_home_value: r.avg_home_value,
                pct_change: r.home_value_pct_change,
                is_post_announcement: u8::from(r.is_post_announcement),
            })
            .collect())
    }

    fn fallback(
        &self,
        state: &str,
        current_price: f64,
        years_after: i32,
        base_year: i32,
        reason: FallbackReason,
    ) -> Result<HousingEstimate> {
        let mut estimate = self.simple(state, current_price, years_after, base_year)?;
        estimate.method = EstimateMethod::Fallback(reason);
        Ok(estimate)
    }
}

fn check_price(price: f64) -> Result<()> {
    if price > 0.0 && price.is_finite() {
        Ok(())
    } else {
        Err(Error::Input(format!("current_price must be > 0, got {price}")))
    }
}
