//! Design-matrix construction for the structural (baseline) and full price models.

use nalgebra::{DMatrix, DVector};

use crate::data::{EnergyTable, StateEnergyRecord};

/// MWh to TWh.
const MWH_PER_TWH: f64 = 1e6;
/// MW to GW.
const MW_PER_GW: f64 = 1000.0;

const BASELINE_NAMES: &[&str] = &["Intercept", "Sales_TWh", "Gen_TWh", "Capacity_GW"];
const FULL_NAMES: &[&str] = &[
    "Intercept",
    "Sales_TWh",
    "Gen_TWh",
    "Capacity_GW",
    "DC_Load_Share",
    "DC_Present",
];

/// Which columns a feature vector carries.
///
/// `Baseline` holds only structural drivers so a price predicted from it
/// carries no trace of the state's existing data-center footprint. `Full`
/// appends the data-center share and presence indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSet {
    Baseline,
    Full,
}

impl FeatureSet {
    /// Ordered column labels.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Baseline => BASELINE_NAMES,
            Self::Full => FULL_NAMES,
        }
    }

    pub fn len(self) -> usize {
        self.names().len()
    }

    /// Builds a fresh feature vector for one record.
    pub fn vector(self, record: &StateEnergyRecord) -> Vec<f64> {
        let mut v = vec![
            1.0,
            record.total_retail_sales_mwh / MWH_PER_TWH,
            record.net_generation_mwh / MWH_PER_TWH,
            record.net_summer_capacity_mw / MW_PER_GW,
        ];
        if self == Self::Full {
            let present = if record.dc_annual_electricity_mwh > 0.0 {
                1.0
            } else {
                0.0
            };
            v.push(record.dc_share());
            v.push(present);
        }
        v
    }

    /// Stacks feature vectors and observed prices for every record.
    pub fn design<'a>(self, records: impl IntoIterator<Item = &'a StateEnergyRecord>) -> Design {
        let mut rows = Vec::new();
        let mut prices = Vec::new();
        for r in records {
            rows.extend(self.vector(r));
            prices.push(r.avg_retail_price_cents_per_kwh);
        }
        let n = prices.len();
        Design {
            x: DMatrix::from_row_slice(n, self.len(), &rows),
            y: DVector::from_vec(prices),
            names: self.names(),
        }
    }
}

/// Design matrix `x` (one row per state), observed prices `y`, and column labels.
#[derive(Debug, Clone)]
pub struct Design {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub names: &'static [&'static str],
}

/// Structural-only features for the whole table.
pub fn build_features_baseline(table: &EnergyTable) -> Design {
    FeatureSet::Baseline.design(table.records())
}

/// Structural plus data-center features for the whole table.
pub fn build_features(table: &EnergyTable) -> Design {
    FeatureSet::Full.design(table.records())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sales: f64, dc: f64) -> StateEnergyRecord {
        StateEnergyRecord {
            state_code: "VA".into(),
            total_retail_sales_mwh: sales,
            net_generation_mwh: 80_000_000.0,
            net_summer_capacity_mw: 25_000.0,
            avg_retail_price_cents_per_kwh: 11.0,
            dc_annual_electricity_mwh: dc,
        }
    }

    #[test]
    fn baseline_vector_is_scaled() {
        let v = FeatureSet::Baseline.vector(&record(120_000_000.0, 5.0));
        assert_eq!(v, vec![1.0, 120.0, 80.0, 25.0]);
    }

    #[test]
    fn full_vector_appends_share_and_presence() {
        let v = FeatureSet::Full.vector(&record(100_000_000.0, 20_000_000.0));
        assert_eq!(v.len(), 6);
        assert!((v[4] - 0.2).abs() < 1e-12);
        assert_eq!(v[5], 1.0);
    }

    #[test]
    fn zero_sales_gives_zero_share_not_nan() {
        let v = FeatureSet::Full.vector(&record(0.0, 1_000.0));
        assert_eq!(v[4], 0.0);
        assert!(v.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn no_dc_load_means_not_present() {
        let v = FeatureSet::Full.vector(&record(1.0, 0.0));
        assert_eq!(v[5], 0.0);
    }

    #[test]
    fn design_shapes_match_names() {
        let recs = [record(1e8, 0.0), record(2e8, 1e6), record(3e8, 0.0)];
        let d = FeatureSet::Full.design(recs.iter());
        assert_eq!(d.x.nrows(), 3);
        assert_eq!(d.x.ncols(), d.names.len());
        assert_eq!(d.y.len(), 3);
        assert_eq!(d.x[(1, 1)], 200.0);
    }
}
