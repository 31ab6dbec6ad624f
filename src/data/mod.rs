//! Tabular inputs: per-state energy metrics and per-(state, date) housing observations.

pub mod energy;
pub mod housing;

pub use energy::{DataCenterRow, EnergyTable, StateEnergyRecord, StateMetricsRow};
pub use housing::{HousingRecord, HousingTable};

use crate::error::{Error, Result};

/// Normalizes a state code for lookups: trimmed and upper-cased.
pub fn normalize_state(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Fails with [`Error::Validation`] naming every column in `required` that
/// `headers` lacks.
pub(crate) fn require_columns(
    table: &str,
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h.trim() == *col))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{table}: missing required columns: {}",
            missing.join(", ")
        )))
    }
}
