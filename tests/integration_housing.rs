//! Integration tests for housing growth, inflation, and projections.

mod common;

use rand::{Rng, SeedableRng, rngs::StdRng};

use dc_impact::Error;
use dc_impact::data::{HousingRecord, HousingTable};
use dc_impact::housing::{
    CpiTable, EstimateMethod, FallbackReason, GrowthDecomposer, GrowthDefaults, GrowthTier,
    HousingSimulator, SimulationMethod, adjust_for_inflation,
};

#[test]
fn texas_simple_projection() {
    let ctx = common::fixture_context();
    let e = ctx
        .simple_simulate_house_price("TX", 300_000.0, 5, 2025)
        .expect("simple should succeed");

    assert_eq!(e.target_year, 2030);
    assert_eq!(e.method, EstimateMethod::Compounded);
    assert!((e.normal_growth_rate - 0.05).abs() < 1e-12);
    assert!((e.hyperscale_effect_rate - 0.01).abs() < 1e-12);
    assert!(e.nominal_price > 300_000.0);
    assert!((e.nominal_price - 300_000.0 * 1.06_f64.powi(5)).abs() < 1e-6);
    // 2030 is past the CPI table, so deflation uses the constant rate.
    assert!((e.real_price - e.nominal_price / 1.025_f64.powi(5)).abs() < 1e-6);
}

#[test]
fn sparse_state_advanced_equals_simple() {
    let ctx = common::fixture_context();
    let simple = ctx
        .simple_simulate_house_price("NM", 250_000.0, 3, 2025)
        .expect("simple");
    let adv = ctx
        .advanced_simulate_house_price("NM", 250_000.0, 2028, 2025)
        .expect("advanced");
    assert_eq!(adv.as_tuple(), simple.as_tuple());
    assert_eq!(
        adv.method,
        EstimateMethod::Fallback(FallbackReason::TooFewRecords {
            found: 2,
            required: 3
        })
    );
}

#[test]
fn advanced_undershoot_returns_simple_projection() {
    let ctx = common::fixture_context();
    let e = ctx
        .advanced_simulate_house_price("TX", 300_000.0, 2030, 2025)
        .expect("advanced");
    assert_eq!(
        e.method,
        EstimateMethod::Fallback(FallbackReason::BelowNormalGrowth)
    );
    let simple = ctx
        .simple_simulate_house_price("TX", 300_000.0, 5, 2025)
        .expect("simple");
    assert_eq!(e.as_tuple(), simple.as_tuple());
}

/// Real values exactly `300k + 12k * (year - 2025) + 40k * post`, stored
/// as nominal dollars of each year.
fn linear_table(cpi: &CpiTable) -> HousingTable {
    let records = (2016..=2024)
        .map(|year| {
            let post = year >= 2020;
            let step = if post { 40_000.0 } else { 0.0 };
            let real = 300_000.0 + 12_000.0 * f64::from(year - 2025) + step;
            HousingRecord {
                state: "LN".to_string(),
                date: chrono::NaiveDate::from_ymd_opt(year, 1, 31).expect("valid date"),
                avg_home_value: Some(cpi.adjust(real, 2025, year).value),
                home_value_pct_change: match (year, post) {
                    (2016, _) => None,
                    (_, false) => Some(2.0),
                    (_, true) => Some(3.0),
                },
                is_post_announcement: post,
            }
        })
        .collect();
    HousingTable::from_records(records).expect("linear table should be valid")
}

#[test]
fn advanced_regression_on_linear_history() {
    let cpi = CpiTable::default();
    let table = linear_table(&cpi);
    let sim = HousingSimulator::new(&table, &cpi, GrowthDefaults::default());
    let e = sim.advanced("LN", 350_000.0, 2030, 2025).expect("advanced");

    assert_eq!(e.method, EstimateMethod::Regression);
    assert_eq!(e.target_year, 2030);

    // exact fit: 300k + 12k * 5 + 40k at 2030, anchored on the 2024 value
    let predicted_real = 400_000.0;
    let latest_real = 328_000.0;
    let expected_real = predicted_real * 350_000.0 / latest_real;
    assert!((e.real_price - expected_real).abs() < 1e-4, "{}", e.real_price);

    let expected_nominal = cpi.adjust(e.real_price, 2025, 2030).value;
    assert!((e.nominal_price - expected_nominal).abs() < 1e-6);
    assert!((e.nominal_price - e.real_price * 1.025_f64.powi(5)).abs() < 1e-6);

    assert!(e.real_price >= 350_000.0 * 1.02_f64.powi(5));
    assert!((e.normal_growth_rate - 0.02).abs() < 1e-12);
    assert!((e.hyperscale_effect_rate - 0.01).abs() < 1e-12);
    assert_eq!(e.normal_source, GrowthTier::State);
}

#[test]
fn unknown_state_is_not_found() {
    let ctx = common::fixture_context();
    assert!(matches!(
        ctx.simple_simulate_house_price("ZZ", 300_000.0, 5, 2025),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        ctx.state_housing_history("ZZ"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn history_is_chronological_with_first_change_missing() {
    let ctx = common::fixture_context();
    let points = ctx.state_housing_history("tx").expect("history");
    assert_eq!(points.len(), 6);
    assert_eq!(points[0].date, "2018-01-31");
    assert_eq!(points[0].pct_change, None);
    assert!(points.windows(2).all(|w| w[0].year < w[1].year));
    assert_eq!(points[3].is_post_announcement, 1);
}

#[test]
fn projection_rows_cover_horizon() {
    let ctx = common::fixture_context();
    let rows = ctx
        .housing_predictions(SimulationMethod::Simple, "TX", 300_000.0, 2025, 10)
        .expect("projection");
    assert_eq!(rows.len(), 10);
    assert!((rows[0].total_growth_rate - 6.0).abs() < 1e-9);
    assert_eq!(rows[9].target_year, 2035);
}

#[test]
fn catalog_lists_both_tables() {
    let ctx = common::fixture_context();
    let c = ctx.catalog();
    assert_eq!(c.housing_states, vec!["NM", "TX"]);
    assert!(c.all_states.contains(&"NM".to_string()));
    assert!(c.all_states.contains(&"VA".to_string()));
}

#[test]
fn sample_data_projects_every_housing_state() {
    let ctx = common::sample_context();
    for state in ctx.catalog().housing_states {
        for method in [SimulationMethod::Simple, SimulationMethod::Advanced] {
            let rows = ctx
                .housing_predictions(method, &state, 350_000.0, 2025, 5)
                .expect("projection");
            assert!(rows.iter().all(|r| r.nominal_price.is_finite()), "{state}");
            assert!(rows.iter().all(|r| r.hyperscale_effect_rate >= 0.0), "{state}");
        }
    }
}

#[test]
fn inflation_round_trips_within_cpi_table() {
    let cpi = CpiTable::default();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..200 {
        let value = rng.random_range(1_000.0..2_000_000.0);
        let a = rng.random_range(2000..=2025);
        let b = rng.random_range(2000..=2025);
        let there = adjust_for_inflation(value, a, b, &cpi);
        let back = adjust_for_inflation(there, b, a, &cpi);
        assert!((back - value).abs() / value < 1e-9, "{value} {a} {b}");
    }
}

#[test]
fn inflation_outside_table_compounds_constant_rate() {
    let cpi = CpiTable::default();
    let v = adjust_for_inflation(100.0, 2025, 2027, &cpi);
    assert!((v - 100.0 * 1.025 * 1.025).abs() < 1e-9);
}

fn random_table(rng: &mut StdRng) -> HousingTable {
    let mut records = Vec::new();
    for (i, state) in ["AA", "BB", "CC", "DD"].iter().enumerate() {
        let announce = rng.random_range(2016..=2024);
        let mut value = 150_000.0 + 25_000.0 * i as f64;
        for year in 2015..=2024 {
            let pct = (year > 2015).then(|| rng.random_range(-8.0..12.0));
            if let Some(p) = pct {
                value *= 1.0 + p / 100.0;
            }
            records.push(HousingRecord {
                state: (*state).to_string(),
                date: chrono::NaiveDate::from_ymd_opt(year, 1, 31).expect("valid date"),
                avg_home_value: Some(value),
                home_value_pct_change: pct,
                is_post_announcement: year >= announce,
            });
        }
    }
    HousingTable::from_records(records).expect("generated table should be valid")
}

#[test]
fn hyperscale_effect_is_never_negative() {
    let cpi = CpiTable::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let table = random_table(&mut rng);
        let g = GrowthDecomposer::new(&table, GrowthDefaults::default());
        for state in table.state_codes() {
            let h = g.hyperscale_effect_rate(&state);
            assert!(h.rate >= 0.0, "{state}: {}", h.rate);
            assert_eq!(h.source, GrowthTier::State);
        }
        let sim = HousingSimulator::new(&table, &cpi, GrowthDefaults::default());
        let e = sim.simple("AA", 200_000.0, 3, 2025).expect("simple");
        assert!(e.nominal_price.is_finite());
    }
}
