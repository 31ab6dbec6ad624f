//! CPI-based conversion between nominal and real dollars.

use std::collections::BTreeMap;

use serde::Serialize;

/// Year all real-dollar figures are expressed in.
pub const REAL_DOLLAR_YEAR: i32 = 2025;
/// Compounding rate used when either year is missing from the CPI table.
pub const ANNUAL_INFLATION_RATE: f64 = 0.025;

/// CPI-U annual index, 2000 through 2025 (2025 provisional).
const US_CPI: [(i32, f64); 26] = [
    (2000, 172.2),
    (2001, 177.1),
    (2002, 179.9),
    (2003, 184.0),
    (2004, 188.9),
    (2005, 195.3),
    (2006, 201.6),
    (2007, 207.3),
    (2008, 215.3),
    (2009, 214.5),
    (2010, 218.1),
    (2011, 224.9),
    (2012, 229.6),
    (2013, 233.0),
    (2014, 236.7),
    (2015, 237.0),
    (2016, 240.0),
    (2017, 245.1),
    (2018, 251.1),
    (2019, 255.7),
    (2020, 258.8),
    (2021, 271.0),
    (2022, 296.8),
    (2023, 308.5),
    (2024, 319.6),
    (2025, 320.0),
];

/// Where an adjustment factor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InflationSource {
    Cpi,
    ConstantRate,
}

/// An adjusted value tagged with how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjusted {
    pub value: f64,
    pub source: InflationSource,
}

/// Calendar-year price index with a constant-rate fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct CpiTable {
    index: BTreeMap<i32, f64>,
    fallback_rate: f64,
}

impl Default for CpiTable {
    fn default() -> Self {
        Self::new(US_CPI.into_iter().collect(), ANNUAL_INFLATION_RATE)
    }
}

impl CpiTable {
    pub fn new(index: BTreeMap<i32, f64>, fallback_rate: f64) -> Self {
        Self {
            index,
            fallback_rate,
        }
    }

    pub fn with_fallback_rate(mut self, rate: f64) -> Self {
        self.fallback_rate = rate;
        self
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.index.get(&year).copied()
    }

    /// Re-expresses `value` from `from_year` dollars in `to_year` dollars.
    ///
    /// Uses the CPI ratio when both years are indexed, otherwise compounds
    /// the fallback rate over the year difference.
    pub fn adjust(&self, value: f64, from_year: i32, to_year: i32) -> Adjusted {
        match (self.get(from_year), self.get(to_year)) {
            (Some(from), Some(to)) if from > 0.0 => Adjusted {
                value: value * (to / from),
                source: InflationSource::Cpi,
            },
            _ => Adjusted {
                value: value * (1.0 + self.fallback_rate).powi(to_year - from_year),
                source: InflationSource::ConstantRate,
            },
        }
    }

    /// Converts a nominal `year` value into real-dollar-year dollars.
    pub fn to_real(&self, value: f64, year: i32) -> f64 {
        self.adjust(value, year, REAL_DOLLAR_YEAR).value
    }
}

/// Untagged shorthand for [`CpiTable::adjust`].
pub fn adjust_for_inflation(value: f64, from_year: i32, to_year: i32, cpi: &CpiTable) -> f64 {
    cpi.adjust(value, from_year, to_year).value
}
