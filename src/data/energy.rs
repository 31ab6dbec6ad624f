//! Per-state energy table: state metrics merged with aggregated data-center load.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{normalize_state, require_columns};
use crate::error::{Error, Result};

const STATE_COLUMNS: &[&str] = &[
    "StateCode",
    "TotalRetailSales_MWh",
    "NetGeneration_MWh",
    "NetSummerCapacity_MW",
    "AvgRetailPrice_cents_per_kWh",
];

const DATACENTER_COLUMNS: &[&str] = &["State", "EstimatedAnnualElectricityMWh"];

/// One row of the per-state energy metrics source.
#[derive(Debug, Clone, Deserialize)]
pub struct StateMetricsRow {
    #[serde(rename = "StateCode")]
    pub state_code: String,
    #[serde(rename = "TotalRetailSales_MWh")]
    pub total_retail_sales_mwh: f64,
    #[serde(rename = "NetGeneration_MWh")]
    pub net_generation_mwh: f64,
    #[serde(rename = "NetSummerCapacity_MW")]
    pub net_summer_capacity_mw: f64,
    #[serde(rename = "AvgRetailPrice_cents_per_kWh")]
    pub avg_retail_price_cents_per_kwh: f64,
}

/// One row of the per-facility data-center source.
#[derive(Debug, Clone, Deserialize)]
pub struct DataCenterRow {
    #[serde(rename = "State")]
    pub state: String,
    /// Blank cells count as no load.
    #[serde(rename = "EstimatedAnnualElectricityMWh")]
    pub estimated_annual_electricity_mwh: Option<f64>,
}

/// Merged per-state record used by the price models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateEnergyRecord {
    pub state_code: String,
    pub total_retail_sales_mwh: f64,
    pub net_generation_mwh: f64,
    pub net_summer_capacity_mw: f64,
    /// Observed average retail price, the regression target.
    pub avg_retail_price_cents_per_kwh: f64,
    /// Sum of facility estimates for the state; zero when none are listed.
    pub dc_annual_electricity_mwh: f64,
}

impl StateEnergyRecord {
    /// Data-center share of retail sales, zero when sales are zero.
    pub fn dc_share(&self) -> f64 {
        if self.total_retail_sales_mwh == 0.0 {
            0.0
        } else {
            self.dc_annual_electricity_mwh / self.total_retail_sales_mwh
        }
    }

    /// Returns a copy of the record with `added_mwh` of data-center load.
    ///
    /// Sales grow by the same amount only when `include_in_sales` is set.
    pub fn with_added_load(&self, added_mwh: f64, include_in_sales: bool) -> Self {
        Self {
            dc_annual_electricity_mwh: self.dc_annual_electricity_mwh + added_mwh,
            total_retail_sales_mwh: if include_in_sales {
                self.total_retail_sales_mwh + added_mwh
            } else {
                self.total_retail_sales_mwh
            },
            ..self.clone()
        }
    }
}

/// Immutable per-state energy table keyed by upper-case state code.
#[derive(Debug, Clone, Default)]
pub struct EnergyTable {
    records: BTreeMap<String, StateEnergyRecord>,
}

impl EnergyTable {
    /// Loads and merges the two CSV sources.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a file cannot be opened and `Error::Validation`
    /// if a source lacks required columns or violates a table invariant.
    pub fn load(state_metrics: &Path, datacenters: &Path) -> Result<Self> {
        info!(
            state_metrics = %state_metrics.display(),
            datacenters = %datacenters.display(),
            "loading energy tables"
        );
        Self::from_readers(File::open(state_metrics)?, File::open(datacenters)?)
    }

    /// Reads both sources from arbitrary readers and merges them.
    pub fn from_readers(state_metrics: impl Read, datacenters: impl Read) -> Result<Self> {
        let states = read_rows::<StateMetricsRow>("state metrics", state_metrics, STATE_COLUMNS)?;
        let facilities =
            read_rows::<DataCenterRow>("data centers", datacenters, DATACENTER_COLUMNS)?;
        Self::merge(states, facilities)
    }

    /// Left-joins aggregated facility load onto the state rows.
    ///
    /// Facilities in states absent from `states` are dropped; states with no
    /// facilities get zero load.
    pub fn merge(states: Vec<StateMetricsRow>, facilities: Vec<DataCenterRow>) -> Result<Self> {
        let mut dc_by_state: BTreeMap<String, f64> = BTreeMap::new();
        for (i, f) in facilities.iter().enumerate() {
            let mwh = f.estimated_annual_electricity_mwh.unwrap_or(0.0);
            if !(mwh >= 0.0 && mwh.is_finite()) {
                return Err(Error::Validation(format!(
                    "data centers row {}: EstimatedAnnualElectricityMWh must be >= 0, got {mwh}",
                    i + 1
                )));
            }
            *dc_by_state.entry(normalize_state(&f.state)).or_default() += mwh;
        }

        let mut records = BTreeMap::new();
        for row in states {
            let code = normalize_state(&row.state_code);
            if code.is_empty() {
                return Err(Error::Validation("state metrics: empty StateCode".into()));
            }
            let record = StateEnergyRecord {
                dc_annual_electricity_mwh: dc_by_state.get(&code).copied().unwrap_or(0.0),
                state_code: code.clone(),
                total_retail_sales_mwh: row.total_retail_sales_mwh,
                net_generation_mwh: row.net_generation_mwh,
                net_summer_capacity_mw: row.net_summer_capacity_mw,
                avg_retail_price_cents_per_kwh: row.avg_retail_price_cents_per_kwh,
            };
            if records.insert(code.clone(), record).is_some() {
                return Err(Error::Validation(format!(
                    "state metrics: duplicate StateCode {code}"
                )));
            }
        }

        let unmatched = dc_by_state
            .keys()
            .filter(|k| !records.contains_key(*k))
            .count();
        debug!(
            states = records.len(),
            dc_states = dc_by_state.len(),
            unmatched,
            "merged energy tables"
        );
        Ok(Self { records })
    }

    /// Looks up a state by code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown code.
    pub fn get(&self, state_code: &str) -> Result<&StateEnergyRecord> {
        let code = normalize_state(state_code);
        self.records
            .get(&code)
            .ok_or_else(|| Error::NotFound(format!("state {code} not found in energy table")))
    }

    /// Records in state-code order.
    pub fn records(&self) -> impl Iterator<Item = &StateEnergyRecord> {
        self.records.values()
    }

    /// Sorted state codes.
    pub fn state_codes(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_rows<T>(table: &str, reader: impl Read, required: &[&str]) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    require_columns(table, rdr.headers()?, required)?;
    let mut rows = Vec::new();
    for (i, rec) in rdr.deserialize::<T>().enumerate() {
        let row = rec.map_err(|e| Error::Validation(format!("{table} row {}: {e}", i + 1)))?;
        rows.push(row);
    }
    Ok(rows)
}
