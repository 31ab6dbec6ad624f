//! Data-center load impact estimator.
//!
//! Fits linear models of state retail electricity prices, answers
//! "what if a data center were added here?" questions, and projects home
//! values under normal and hyperscale-driven growth.

pub mod cli;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod housing;
pub mod io;
/// Price feature construction, least squares, and counterfactual pricing.
pub mod model;
pub mod reporting;
pub mod telemetry;

pub use context::ModelContext;
pub use error::{Error, Result};
