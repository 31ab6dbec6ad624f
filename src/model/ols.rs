//! Ordinary least squares via singular value decomposition.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::features::FeatureSet;
use crate::data::{EnergyTable, StateEnergyRecord};
use crate::error::{Error, Result};

/// Solves `min ||X b - y||^2`.
///
/// Uses an SVD with the usual relative cutoff (machine epsilon times the
/// larger dimension times the largest singular value), so collinear columns
/// yield the minimum-norm solution instead of a blow-up.
///
/// # Errors
///
/// Returns `Error::Dimension` if `x` and `y` have different row counts and
/// `Error::Input` for an empty design.
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    if x.nrows() != y.len() {
        return Err(Error::Dimension {
            what: "fit",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::Input("cannot fit an empty design".into()));
    }

    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.max();
    let eps = f64::EPSILON * x.nrows().max(x.ncols()) as f64 * max_sv;
    let beta = svd
        .solve(y, eps)
        .map_err(|e| Error::Solve(e.to_string()))?;

    debug!(rows = x.nrows(), cols = x.ncols(), max_sv, "ols fit");
    Ok(beta)
}

/// Fits `y = a + X b` with the intercept handled by centering.
///
/// Columns of `x` and `y` are shifted to zero mean, solved with [`fit`], and
/// the intercept is recovered as `mean(y) - mean(X) b`. When the centered
/// columns are collinear this gives the minimum-norm slopes of the centered
/// problem, which is not the same as the minimum-norm solution of a design
/// carrying an explicit ones column.
///
/// # Errors
///
/// Same as [`fit`].
pub fn fit_centered(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<(f64, DVector<f64>)> {
    if x.nrows() != y.len() {
        return Err(Error::Dimension {
            what: "fit",
            expected: x.nrows(),
            found: y.len(),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::Input("cannot fit an empty design".into()));
    }

    let x_means: Vec<f64> = x.column_iter().map(|c| c.mean()).collect();
    let y_mean = y.mean();
    let mut xc = x.clone();
    for (mut col, m) in xc.column_iter_mut().zip(&x_means) {
        col.iter_mut().for_each(|v| *v -= m);
    }
    let yc = y.map(|v| v - y_mean);

    let beta = fit(&xc, &yc)?;
    let intercept = y_mean - x_means.iter().zip(beta.iter()).map(|(m, b)| m * b).sum::<f64>();
    Ok((intercept, beta))
}

/// Computes `X b`.
///
/// # Errors
///
/// Returns `Error::Dimension` if `x` has a different column count than `beta`.
pub fn predict(x: &DMatrix<f64>, beta: &DVector<f64>) -> Result<DVector<f64>> {
    if x.ncols() != beta.len() {
        return Err(Error::Dimension {
            what: "predict",
            expected: beta.len(),
            found: x.ncols(),
        });
    }
    Ok(x * beta)
}

/// Coefficient of determination, `None` when `y` has no variance.
pub fn r_squared(y: &DVector<f64>, fitted: &DVector<f64>) -> Option<f64> {
    if y.is_empty() || y.len() != fitted.len() {
        return None;
    }
    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return None;
    }
    let ss_res: f64 = y.iter().zip(fitted.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    Some(1.0 - ss_res / ss_tot)
}

/// A coefficient vector paired with the feature set it was fitted on.
///
/// Fitted once at start-up and read-only afterwards.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub feature_set: FeatureSet,
    pub beta: DVector<f64>,
    /// In-sample R², absent for a constant target.
    pub r_squared: Option<f64>,
}

impl FittedModel {
    /// Fits `feature_set` against observed prices for every state in `table`.
    pub fn fit(feature_set: FeatureSet, table: &EnergyTable) -> Result<Self> {
        let design = feature_set.design(table.records());
        let beta = fit(&design.x, &design.y)?;
        let fitted = predict(&design.x, &beta)?;
        Ok(Self {
            feature_set,
            r_squared: r_squared(&design.y, &fitted),
            beta,
        })
    }

    /// Predicted price for a single record.
    pub fn predict_record(&self, record: &StateEnergyRecord) -> Result<f64> {
        self.predict_vector(&self.feature_set.vector(record))
    }

    /// Predicted price for a prepared feature vector.
    pub fn predict_vector(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.beta.len() {
            return Err(Error::Dimension {
                what: "predict",
                expected: self.beta.len(),
                found: features.len(),
            });
        }
        Ok(features.iter().zip(self.beta.iter()).map(|(f, b)| f * b).sum())
    }

    /// `(name, coefficient)` pairs in column order.
    pub fn coefficients(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.feature_set
            .names()
            .iter()
            .copied()
            .zip(self.beta.iter().copied())
    }
}
