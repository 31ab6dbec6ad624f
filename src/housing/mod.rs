//! Home-value growth decomposition, inflation adjustment, and projections.

pub mod growth;
pub mod inflation;
pub mod report;
pub mod simulate;

pub use growth::{GrowthDecomposer, GrowthDecomposition, GrowthDefaults, GrowthEstimate, GrowthTier};
pub use inflation::{CpiTable, InflationSource, REAL_DOLLAR_YEAR, adjust_for_inflation};
pub use report::{HousingPrediction, projection};
pub use simulate::{
    EstimateMethod, FallbackReason, HistoryPoint, HousingEstimate, HousingSimulator,
    SimulationMethod,
};
