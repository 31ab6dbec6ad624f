//! Integration tests for the added-load price counterfactual.

mod common;

use dc_impact::Error;
use dc_impact::model::{PricingMode, WhatIfRequest};
use dc_impact::reporting::{PriceChangeSummary, SummaryKind};

#[test]
fn virginia_500_mw_assumption_mode() {
    let ctx = common::fixture_context();
    let req = ctx.what_if_request("VA").expect("request").power_mw(500.0);
    let r = ctx.what_if_added_dc(&req).expect("what-if should succeed");

    assert_eq!(r.added_annual_mwh, 5_475_000.0);
    assert_eq!(r.observed_c_per_kwh, 11.55);

    let share = (13_000_000.0 + 5_475_000.0) / (133_600_000.0 + 5_475_000.0);
    assert!((r.dc_share_new - share).abs() < 1e-12);
    assert!(r.effective_share.is_some_and(|s| (s - share).abs() < 1e-12));

    let expected_new = r.baseline_pred_c_per_kwh * (1.0 + 0.30 * share);
    assert!((r.new_pred_c_per_kwh - expected_new).abs() < 1e-9);
    assert!((r.delta_c_per_kwh - (r.new_pred_c_per_kwh - r.baseline_pred_c_per_kwh)).abs() < 1e-12);

    let summary = PriceChangeSummary::summarize(&r, &PriceChangeSummary::default_states());
    assert_eq!(summary.kind, SummaryKind::BaselineToNew);
    assert!(summary.pct_change.is_some_and(|p| (p - 0.30 * share).abs() < 1e-9));
}

#[test]
fn annual_mwh_overrides_power() {
    let ctx = common::fixture_context();
    let req = ctx
        .what_if_request("tx")
        .expect("request")
        .power_mw(500.0)
        .annual_mwh(1_000_000.0);
    let r = ctx.what_if_added_dc(&req).expect("what-if should succeed");
    assert_eq!(r.state, "TX");
    assert_eq!(r.added_annual_mwh, 1_000_000.0);
}

#[test]
fn small_share_is_floored() {
    let ctx = common::fixture_context();
    // WY has no existing load; 1 MWh is far below the 1% floor.
    let req = ctx.what_if_request("WY").expect("request").annual_mwh(1.0);
    let r = ctx.what_if_added_dc(&req).expect("what-if should succeed");
    assert_eq!(r.effective_share, Some(0.01));
    assert!((r.new_pred_c_per_kwh - r.baseline_pred_c_per_kwh * 1.003).abs() < 1e-9);
}

#[test]
fn excluding_load_from_sales_raises_share() {
    let ctx = common::fixture_context();
    let base = ctx.what_if_request("OR").expect("request").annual_mwh(5_000_000.0);
    let included = ctx.what_if_added_dc(&base).expect("included");
    let excluded = ctx
        .what_if_added_dc(&base.clone().include_in_sales(false))
        .expect("excluded");
    assert!(excluded.dc_share_new > included.dc_share_new);
    assert!(!excluded.include_added_load_in_sales);
}

#[test]
fn every_state_yields_finite_predictions_in_both_modes() {
    let ctx = common::fixture_context();
    for state in ctx.energy().state_codes() {
        for mode in [PricingMode::Assumption, PricingMode::Trained] {
            let req = ctx
                .what_if_request(&state)
                .expect("request")
                .power_mw(100.0)
                .mode(mode);
            let r = ctx.what_if_added_dc(&req).expect("what-if should succeed");
            assert!(r.baseline_pred_c_per_kwh.is_finite(), "{state} {mode}");
            assert!(r.new_pred_c_per_kwh.is_finite(), "{state} {mode}");
        }
    }
}

#[test]
fn trained_mode_reports_no_floor() {
    let ctx = common::fixture_context();
    let req = ctx
        .what_if_request("VA")
        .expect("request")
        .power_mw(500.0)
        .mode(PricingMode::Trained);
    let r = ctx.what_if_added_dc(&req).expect("what-if should succeed");
    assert_eq!(r.mode, PricingMode::Trained);
    assert_eq!(r.effective_share, None);
    assert_eq!(r.share_floor, None);
}

#[test]
fn unknown_state_is_not_found() {
    let ctx = common::fixture_context();
    let req = WhatIfRequest::new("ZZ").power_mw(500.0);
    let err = ctx.what_if_added_dc(&req).expect_err("ZZ is not loaded");
    assert!(matches!(err, Error::NotFound(_)));
    assert!(err.is_client_error());
}

#[test]
fn missing_load_is_rejected() {
    let ctx = common::fixture_context();
    let req = WhatIfRequest::new("VA");
    assert!(matches!(ctx.what_if_added_dc(&req), Err(Error::Input(_))));
}

#[test]
fn unmatched_facility_states_are_dropped() {
    let table = common::energy_table();
    assert_eq!(table.len(), 6);
    assert!(table.get("GU").is_err());
    let va = table.get("VA").expect("VA loaded");
    assert_eq!(va.dc_annual_electricity_mwh, 13_000_000.0);
}

#[test]
fn sample_data_fits_and_answers() {
    let ctx = common::sample_context();
    assert!(ctx.status().electricity);
    assert!(ctx.status().housing);
    let r2 = ctx.models().baseline.r_squared.expect("non-constant prices");
    assert!((0.0..=1.0).contains(&r2));

    let req = ctx.what_if_request("VA").expect("request").power_mw(500.0);
    let r = ctx.what_if_added_dc(&req).expect("what-if should succeed");
    assert!(r.new_pred_c_per_kwh > r.baseline_pred_c_per_kwh);
}
