//! Human-readable summaries for the command line.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::model::{FittedModel, PriceModels, WhatIfResult};

/// States reported as model baseline → new price rather than min → max.
pub const BASELINE_TO_NEW_STATES: &[&str] = &["IA", "OR", "NC", "AZ", "SC", "VA", "NM", "WI", "UT"];

/// Fit quality and coefficients of both price models.
#[derive(Debug, Clone)]
pub struct ModelSummary<'a> {
    pub states: usize,
    pub models: &'a PriceModels,
    pub pass_through: f64,
}

impl<'a> ModelSummary<'a> {
    /// `pass_through` is the assumption-mode coefficient in effect.
    pub fn new(states: usize, models: &'a PriceModels, pass_through: f64) -> Self {
        Self {
            states,
            models,
            pass_through,
        }
    }
}

fn write_model(f: &mut fmt::Formatter<'_>, title: &str, m: &FittedModel) -> fmt::Result {
    writeln!(f, "{title}")?;
    match m.r_squared {
        Some(r2) => writeln!(f, "R^2: {r2:.3}")?,
        None => writeln!(f, "R^2: n/a")?,
    }
    writeln!(f, "Coefficients:")?;
    for (name, coef) in m.coefficients() {
        writeln!(f, "  {name:>14}: {coef:+.4}")?;
    }
    Ok(())
}

impl fmt::Display for ModelSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_model(
            f,
            &format!(
                "Baseline structural model (no DC vars) trained on {} states",
                self.states
            ),
            &self.models.baseline,
        )?;
        writeln!(f)?;
        write_model(f, "Full model (with DC vars)", &self.models.full)?;
        write!(
            f,
            "Assumption: PASS_THROUGH_ELEC = {:.3} (price +{:.1}% per +100% DC share)",
            self.pass_through,
            self.pass_through * 100.0
        )
    }
}

/// Which comparison a [`PriceChangeSummary`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryKind {
    BaselineToNew,
    MinToMax,
}

/// Headline percentage change for a what-if result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceChangeSummary {
    pub kind: SummaryKind,
    pub from_c_per_kwh: f64,
    pub to_c_per_kwh: f64,
    /// `None` when the reference price is zero.
    pub pct_change: Option<f64>,
}

impl PriceChangeSummary {
    /// Baseline → new for the listed states, otherwise the spread between the
    /// smallest and largest of observed, baseline, and new prices.
    pub fn summarize(result: &WhatIfResult, baseline_to_new: &BTreeSet<&str>) -> Self {
        let (kind, from, to) = if baseline_to_new.contains(result.state.as_str()) {
            (
                SummaryKind::BaselineToNew,
                result.baseline_pred_c_per_kwh,
                result.new_pred_c_per_kwh,
            )
        } else {
            let values = [
                result.observed_c_per_kwh,
                result.baseline_pred_c_per_kwh,
                result.new_pred_c_per_kwh,
            ];
            (
                SummaryKind::MinToMax,
                values.iter().copied().fold(f64::INFINITY, f64::min),
                values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };
        Self {
            kind,
            from_c_per_kwh: from,
            to_c_per_kwh: to,
            pct_change: (from != 0.0).then(|| (to - from) / from),
        }
    }

    pub fn default_states() -> BTreeSet<&'static str> {
        BASELINE_TO_NEW_STATES.iter().copied().collect()
    }
}

impl fmt::Display for PriceChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (title, from_label, to_label) = match self.kind {
            SummaryKind::BaselineToNew => (
                "Baseline->New summary (selected states):",
                "baseline (model)",
                "predicted (new)",
            ),
            SummaryKind::MinToMax => (
                "Min/Max summary across observed, baseline, new:",
                "baseline (min)",
                "predicted (max)",
            ),
        };
        writeln!(f, "{title}")?;
        writeln!(f, "  {from_label:<20} c/kWh: {:.4}", self.from_c_per_kwh)?;
        writeln!(f, "  {to_label:<20} c/kWh: {:.4}", self.to_c_per_kwh)?;
        match self.pct_change {
            Some(p) => write!(f, "  pct_change (pred vs base):  {:.2}%", p * 100.0),
            None => write!(f, "  pct_change (pred vs base):  n/a"),
        }
    }
}

/// Multi-line rendering of a what-if result.
pub struct WhatIfReport<'a>(pub &'a WhatIfResult);

impl fmt::Display for WhatIfReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(
            f,
            "What-if ({}): +{:.1} MWh/yr in {}",
            r.mode, r.added_annual_mwh, r.state
        )?;
        writeln!(f, "  Observed state avg price (c/kWh):  {:.4}", r.observed_c_per_kwh)?;
        writeln!(f, "  Baseline predicted price (c/kWh):  {:.4}", r.baseline_pred_c_per_kwh)?;
        writeln!(f, "  New predicted price (c/kWh):       {:.4}", r.new_pred_c_per_kwh)?;
        writeln!(f, "  Delta (c/kWh):                     {:.4}", r.delta_c_per_kwh)?;
        write!(f, "  New DC load share of sales:        {:.4}", r.dc_share_new)?;
        if let Some(share) = r.effective_share {
            write!(f, "\n  Effective share (floored):         {share:.4}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricingMode;

    fn result(state: &str, observed: f64, baseline: f64, new: f64) -> WhatIfResult {
        WhatIfResult {
            state: state.into(),
            mode: PricingMode::Assumption,
            observed_c_per_kwh: observed,
            baseline_pred_c_per_kwh: baseline,
            new_pred_c_per_kwh: new,
            delta_c_per_kwh: new - baseline,
            added_annual_mwh: 1.0,
            dc_share_new: 0.1,
            include_added_load_in_sales: true,
            effective_share: Some(0.1),
            share_floor: Some(0.01),
        }
    }

    #[test]
    fn listed_state_reports_baseline_to_new() {
        let s = PriceChangeSummary::summarize(
            &result("VA", 20.0, 10.0, 11.0),
            &PriceChangeSummary::default_states(),
        );
        assert_eq!(s.kind, SummaryKind::BaselineToNew);
        assert_eq!(s.from_c_per_kwh, 10.0);
        assert!((s.pct_change.unwrap_or_default() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn other_states_report_min_to_max() {
        let s = PriceChangeSummary::summarize(
            &result("TX", 12.0, 10.0, 11.0),
            &PriceChangeSummary::default_states(),
        );
        assert_eq!(s.kind, SummaryKind::MinToMax);
        assert_eq!(s.from_c_per_kwh, 10.0);
        assert_eq!(s.to_c_per_kwh, 12.0);
    }

    #[test]
    fn model_summary_reports_configured_pass_through() {
        use crate::data::EnergyTable;

        let states = "\
StateCode,TotalRetailSales_MWh,NetGeneration_MWh,NetSummerCapacity_MW,AvgRetailPrice_cents_per_kWh
VA,120000000,95000000,28000,11.2
TX,430000000,480000000,140000,10.1
WY,16000000,42000000,10000,8.9
CA,250000000,200000000,85000,22.5
OR,50000000,60000000,18000,9.8
";
        let facilities = "State,EstimatedAnnualElectricityMWh\n";
        let table = EnergyTable::from_readers(states.as_bytes(), facilities.as_bytes())
            .expect("fixture should load");
        let models = PriceModels::fit(&table).expect("fit");
        let text = ModelSummary::new(table.len(), &models, 0.25).to_string();
        assert!(text.contains("PASS_THROUGH_ELEC = 0.250"), "{text}");
        assert!(text.contains("+25.0%"), "{text}");
        assert!(text.contains("trained on 5 states"), "{text}");
    }

    #[test]
    fn zero_reference_has_no_pct() {
        let s = PriceChangeSummary::summarize(
            &result("VA", 1.0, 0.0, 1.0),
            &PriceChangeSummary::default_states(),
        );
        assert_eq!(s.pct_change, None);
        assert!(s.to_string().contains("n/a"));
    }
}
