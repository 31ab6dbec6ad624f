//! Per-(state, date) housing observations with the post-announcement flag.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{normalize_state, require_columns};
use crate::error::{Error, Result};

const HOUSING_COLUMNS: &[&str] = &[
    "State",
    "Date",
    "Avg_Home_Value",
    "HomeValue_Pct_Change",
    "Is_Post_Announcement",
];

#[derive(Debug, Deserialize)]
struct HousingRow {
    #[serde(rename = "State")]
    state: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Avg_Home_Value")]
    avg_home_value: Option<f64>,
    #[serde(rename = "HomeValue_Pct_Change")]
    home_value_pct_change: Option<f64>,
    #[serde(rename = "Is_Post_Announcement")]
    is_post_announcement: f64,
}

/// One housing observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HousingRecord {
    pub state: String,
    pub date: NaiveDate,
    /// Absent for rows that only carry a percent change; such rows still
    /// count toward growth means but not toward the regression.
    pub avg_home_value: Option<f64>,
    /// Percent change from the previous observation; absent on a state's first row.
    pub home_value_pct_change: Option<f64>,
    /// Observation dated after the state's data-center announcement.
    pub is_post_announcement: bool,
}

impl HousingRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Immutable housing table; each state's records are sorted by date.
#[derive(Debug, Clone, Default)]
pub struct HousingTable {
    by_state: BTreeMap<String, Vec<HousingRecord>>,
}

impl HousingTable {
    /// Loads the housing CSV.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when required columns are missing or a row
    /// cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "loading housing table");
        Self::from_reader(File::open(path)?)
    }

    /// Reads the housing table from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        require_columns("housing", rdr.headers()?, HOUSING_COLUMNS)?;

        let mut records = Vec::new();
        let mut valueless = 0usize;
        for (i, rec) in rdr.deserialize::<HousingRow>().enumerate() {
            let row = rec.map_err(|e| Error::Validation(format!("housing row {}: {e}", i + 1)))?;
            let avg_home_value = row.avg_home_value.filter(|v| v.is_finite());
            if avg_home_value.is_none() {
                valueless += 1;
            }
            let date = parse_date(&row.date).ok_or_else(|| {
                Error::Validation(format!("housing row {}: bad Date {:?}", i + 1, row.date))
            })?;
            let is_post_announcement = match row.is_post_announcement {
                v if v == 0.0 => false,
                v if v == 1.0 => true,
                v => {
                    return Err(Error::Validation(format!(
                        "housing row {}: Is_Post_Announcement must be 0 or 1, got {v}",
                        i + 1
                    )));
                }
            };
            records.push(HousingRecord {
                state: normalize_state(&row.state),
                date,
                avg_home_value,
                home_value_pct_change: row.home_value_pct_change.filter(|v| v.is_finite()),
                is_post_announcement,
            });
        }
        if valueless > 0 {
            warn!(
                valueless,
                "housing rows without a home value are kept for growth means only"
            );
        }
        Self::from_records(records)
    }

    /// Groups records by state and orders each group chronologically.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if a state's post-announcement flag ever
    /// flips back from 1 to 0.
    pub fn from_records(records: Vec<HousingRecord>) -> Result<Self> {
        let mut by_state: BTreeMap<String, Vec<HousingRecord>> = BTreeMap::new();
        for r in records {
            by_state.entry(r.state.clone()).or_default().push(r);
        }
        for (state, rows) in &mut by_state {
            rows.sort_by_key(|r| r.date);
            let regressed = rows
                .windows(2)
                .any(|w| w[0].is_post_announcement && !w[1].is_post_announcement);
            if regressed {
                return Err(Error::Validation(format!(
                    "housing: Is_Post_Announcement for {state} flips back to 0"
                )));
            }
        }
        debug!(states = by_state.len(), "housing table ready");
        Ok(Self { by_state })
    }

    /// A state's records in date order.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the state has no rows.
    pub fn state_records(&self, state: &str) -> Result<&[HousingRecord]> {
        let code = normalize_state(state);
        self.by_state
            .get(&code)
            .map(Vec::as_slice)
            .filter(|rows| !rows.is_empty())
            .ok_or_else(|| Error::NotFound(format!("no housing data found for state {code}")))
    }

    /// Every record, grouped by state.
    pub fn records(&self) -> impl Iterator<Item = &HousingRecord> {
        self.by_state.values().flatten()
    }

    /// Sorted state codes.
    pub fn state_codes(&self) -> Vec<String> {
        self.by_state.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_state.is_empty()
    }
}

/// Accepts `YYYY-MM-DD` and the `YYYY-MM-DD HH:MM:SS` form dataframe exports produce.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}
