//! CSV export for housing history and projections.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::housing::{HistoryPoint, HousingPrediction};

const HISTORY_HEADER: &str = "date,year,avg_home_value,pct_change,is_post_announcement";

const PREDICTION_HEADER: &str = "state,target_year,current_price,nominal_price,\
                                 real_price_2025_dollars,nominal_increase_pct,\
                                 normal_growth_rate,hyperscale_effect_rate,\
                                 total_growth_rate,method";

/// Exports a state's housing history to a CSV file at the given path.
///
/// # Arguments
///
/// * `points` - History in chronological order
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_history_csv(points: &[HistoryPoint], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_history_csv(points, io::BufWriter::new(file))
}

/// Writes housing history as CSV to any writer. Missing values and percent
/// changes are written as empty cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_history_csv(points: &[HistoryPoint], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HISTORY_HEADER.split(','))?;
    for p in points {
        wtr.write_record(&[
            p.date.clone(),
            p.year.to_string(),
            p.avg_home_value.map(|v| format!("{v:.2}")).unwrap_or_default(),
            p.pct_change.map(|v| format!("{v:.4}")).unwrap_or_default(),
            p.is_post_announcement.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports a yearly projection to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_predictions_csv(rows: &[HousingPrediction], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_predictions_csv(rows, io::BufWriter::new(file))
}

/// Writes projection rows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_predictions_csv(rows: &[HousingPrediction], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PREDICTION_HEADER.split(',').map(str::trim))?;
    for r in rows {
        wtr.write_record(&[
            r.state.clone(),
            r.target_year.to_string(),
            format!("{:.2}", r.current_price),
            format!("{:.2}", r.nominal_price),
            format!("{:.2}", r.real_price_2025_dollars),
            format!("{:.4}", r.nominal_increase_pct),
            format!("{:.4}", r.normal_growth_rate),
            format!("{:.4}", r.hyperscale_effect_rate),
            format!("{:.4}", r.total_growth_rate),
            r.method.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::housing::EstimateMethod;

    fn point(year: i32) -> HistoryPoint {
        HistoryPoint {
            date: format!("{year}-01-31"),
            year,
            avg_home_value: Some(300_000.0 + f64::from(year - 2020) * 1_000.0),
            pct_change: (year > 2020).then_some(0.33),
            is_post_announcement: u8::from(year >= 2023),
        }
    }

    fn prediction(target_year: i32) -> HousingPrediction {
        HousingPrediction {
            state: "TX".into(),
            current_price: 300_000.0,
            target_year,
            nominal_price: 315_000.0,
            real_price_2025_dollars: 307_000.0,
            nominal_increase_pct: 5.0,
            normal_growth_rate: 4.0,
            hyperscale_effect_rate: 1.0,
            total_growth_rate: 5.0,
            method: EstimateMethod::Compounded,
        }
    }

    #[test]
    fn history_header_and_empty_pct_cell() {
        let mut buf = Vec::new();
        write_history_csv(&[point(2020)], &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(lines[0], HISTORY_HEADER);
        assert_eq!(lines[1], "2020-01-31,2020,300000.00,,0");
    }

    #[test]
    fn row_count_matches_point_count() {
        let points: Vec<HistoryPoint> = (2015..2025).map(point).collect();
        let mut buf = Vec::new();
        write_history_csv(&points, &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        // 1 header + 10 data rows
        assert_eq!(output.as_deref().unwrap_or("").lines().count(), 11);
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<HousingPrediction> = (2026..2030).map(prediction).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_predictions_csv(&rows, &mut buf1).ok();
        write_predictions_csv(&rows, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn predictions_are_parseable() {
        let rows: Vec<HousingPrediction> = (2026..2029).map(prediction).collect();
        let mut buf = Vec::new();
        write_predictions_csv(&rows, &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(10));
        let records: Vec<csv::StringRecord> = rdr.records().filter_map(|r| r.ok()).collect();
        assert_eq!(records.len(), 3);
        for rec in &records {
            for i in 2..9 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
            assert_eq!(&rec[9], "compounded");
        }
    }
}
