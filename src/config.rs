//! TOML-based configuration: data sources, pricing assumptions, and housing defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults matching the shipped sample data and the
/// built-in pricing assumptions. Load from TOML with
/// [`AppConfig::from_toml_file`] or use [`AppConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Input table locations.
    #[serde(default)]
    pub data: DataConfig,
    /// Electricity what-if assumptions.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Housing simulator parameters.
    #[serde(default)]
    pub housing: HousingConfig,
}

/// Input table locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Per-state energy metrics CSV.
    pub state_metrics_csv: PathBuf,
    /// Per-facility data-center power estimates CSV.
    pub datacenter_csv: PathBuf,
    /// Per-(state, date) housing CSV. Housing commands are unavailable without it.
    pub housing_csv: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            state_metrics_csv: PathBuf::from("data/state_energy_metrics.csv"),
            datacenter_csv: PathBuf::from("data/datacenters.csv"),
            housing_csv: Some(PathBuf::from("data/states_hyperscale.csv")),
        }
    }
}

/// Electricity what-if assumptions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// Fractional price increase per +100% data-center share of state sales.
    pub pass_through_elec: f64,
    /// Minimum effective data-center share in assumption mode.
    pub share_floor: f64,
    /// Power-usage-effectiveness multiplier applied to MW inputs.
    pub pue: f64,
    /// Whether added load is folded into state retail sales.
    pub include_added_load_in_sales: bool,
    /// Default what-if mode: `"assumption"` or `"trained"`.
    pub mode: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            pass_through_elec: 0.30,
            share_floor: 0.01,
            pue: 1.25,
            include_added_load_in_sales: true,
            mode: "assumption".to_string(),
        }
    }
}

/// Housing simulator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HousingConfig {
    /// Year the caller's current price is expressed in.
    pub base_year: i32,
    /// Constant inflation used outside the CPI table.
    pub annual_inflation_rate: f64,
    /// Normal growth used when no pre-announcement data exists anywhere.
    pub default_normal_growth: f64,
    /// Hyperscale effect used when no post-announcement data exists anywhere.
    pub default_hyperscale_effect: f64,
    /// Fewest state records the regression simulator will fit.
    pub min_regression_records: usize,
}

impl Default for HousingConfig {
    fn default() -> Self {
        Self {
            base_year: 2025,
            annual_inflation_rate: 0.025,
            default_normal_growth: 0.03,
            default_hyperscale_effect: 0.20,
            min_regression_records: 3,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"pricing.pue"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Reads `path` (or the built-in defaults) and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unreadable or malformed file, or for a
    /// configuration that fails [`AppConfig::validate`].
    pub fn load(path: Option<&Path>) -> crate::error::Result<Self> {
        let config = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        config.validated()
    }

    /// Returns `self` when [`AppConfig::validate`] finds nothing, otherwise
    /// one `Error::Config` naming every offending field.
    pub fn validated(self) -> crate::error::Result<Self> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(self);
        }
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        let messages: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        Err(ConfigError {
            field: fields.join(", "),
            message: messages.join("; "),
        }
        .into())
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let p = &self.pricing;

        if !(0.0..=1.0).contains(&p.pass_through_elec) {
            errors.push(ConfigError {
                field: "pricing.pass_through_elec".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if !(0.0..=1.0).contains(&p.share_floor) {
            errors.push(ConfigError {
                field: "pricing.share_floor".into(),
                message: "must be in [0.0, 1.0]".into(),
            });
        }
        if !(p.pue > 0.0 && p.pue.is_finite()) {
            errors.push(ConfigError {
                field: "pricing.pue".into(),
                message: "must be > 0".into(),
            });
        }
        if p.mode != "assumption" && p.mode != "trained" {
            errors.push(ConfigError {
                field: "pricing.mode".into(),
                message: format!("must be \"assumption\" or \"trained\", got \"{}\"", p.mode),
            });
        }

        let h = &self.housing;
        if !(h.annual_inflation_rate > -1.0 && h.annual_inflation_rate.is_finite()) {
            errors.push(ConfigError {
                field: "housing.annual_inflation_rate".into(),
                message: "must be finite and > -1.0".into(),
            });
        }
        if !(h.default_normal_growth > -1.0 && h.default_normal_growth.is_finite()) {
            errors.push(ConfigError {
                field: "housing.default_normal_growth".into(),
                message: "must be finite and > -1.0".into(),
            });
        }
        if !(h.default_hyperscale_effect >= 0.0 && h.default_hyperscale_effect.is_finite()) {
            errors.push(ConfigError {
                field: "housing.default_hyperscale_effect".into(),
                message: "must be finite and >= 0.0".into(),
            });
        }
        if h.min_regression_records < 2 {
            errors.push(ConfigError {
                field: "housing.min_regression_records".into(),
                message: "must be >= 2".into(),
            });
        }

        errors
    }
}
