//! Shared test fixtures for integration tests.

use std::path::PathBuf;

use dc_impact::ModelContext;
use dc_impact::config::AppConfig;
use dc_impact::data::{EnergyTable, HousingTable};

/// Six states with a spread of sizes; VA and OR carry data-center load.
const STATE_METRICS: &str = "\
StateCode,TotalRetailSales_MWh,NetGeneration_MWh,NetSummerCapacity_MW,AvgRetailPrice_cents_per_kWh
VA,133600000,96700000,30100,11.55
TX,475400000,512000000,149600,10.81
WY,16200000,41600000,10100,9.16
CA,247700000,203300000,85600,22.33
OR,52900000,61700000,18300,10.23
NY,142000000,124800000,39500,19.35
";

const FACILITIES: &str = "\
State,EstimatedAnnualElectricityMWh
VA,9000000
VA,4000000
OR,2400000
GU,100000
";

/// TX has a full pre/post history; NM has two rows only.
const HOUSING: &str = "\
State,Date,Avg_Home_Value,HomeValue_Pct_Change,Is_Post_Announcement
TX,2018-01-31,200000,,0
TX,2019-01-31,210000,5.0,0
TX,2020-01-31,220500,5.0,0
TX,2021-01-31,233730,6.0,1
TX,2022-01-31,247754,6.0,1
TX,2023-01-31,262619,6.0,1
NM,2023-01-31,265000,,0
NM,2024-01-31,276500,4.3396,1
";

/// In-memory energy table.
pub fn energy_table() -> EnergyTable {
    EnergyTable::from_readers(STATE_METRICS.as_bytes(), FACILITIES.as_bytes())
        .expect("energy fixture should load")
}

/// In-memory housing table.
pub fn housing_table() -> HousingTable {
    HousingTable::from_reader(HOUSING.as_bytes()).expect("housing fixture should load")
}

/// Context over the in-memory tables with default assumptions.
pub fn fixture_context() -> ModelContext {
    ModelContext::from_tables(AppConfig::default(), energy_table(), Some(housing_table()))
        .expect("fixture context should build")
}

/// Context over the sample files shipped under `data/`.
pub fn sample_context() -> ModelContext {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
    let mut config = AppConfig::default();
    config.data.state_metrics_csv = root.join("state_energy_metrics.csv");
    config.data.datacenter_csv = root.join("datacenters.csv");
    config.data.housing_csv = Some(root.join("states_hyperscale.csv"));
    ModelContext::load(config).expect("sample data should load")
}
