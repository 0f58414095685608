//! Configuration types for the quality audit.
//!
//! The configuration is loaded once (from a TOML file or defaults) and passed
//! explicitly to the run controller, which threads it down to the source
//! auditor and the detectors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};

/// Plausibility interval for contract amounts, in euros.
///
/// An amount is plausible only when `lower < amount < upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmountBounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for AmountBounds {
    fn default() -> Self {
        Self {
            lower: 200.0,
            upper: 1_000_000_000.0,
        }
    }
}

/// Columns ignored when comparing rows for duplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateRowsConfig {
    /// The `uid` column is always ignored since it identifies the row.
    pub excluded_columns: Vec<String>,
}

impl Default for DuplicateRowsConfig {
    fn default() -> Self {
        Self {
            excluded_columns: vec!["id".to_string()],
        }
    }
}

/// Statistical outlier detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Numeric columns inspected for outliers.
    pub included_columns: Vec<String>,
    /// A value is an outlier above `mean + stdev_multiplier * stdev`.
    pub stdev_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            included_columns: vec!["montant".to_string(), "dureeMois".to_string()],
            stdev_multiplier: 3.0,
        }
    }
}

/// Local file locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Consolidated dataset (`{"marches": [...]}`).
    pub dataset: PathBuf,
    /// JSON Schema describing the dataset.
    pub schema: PathBuf,
    /// Audit artifact written by the `audit` command.
    pub results: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/decp.json"),
            schema: PathBuf::from("data/decp.schema.json"),
            results: PathBuf::from("data/audit.json"),
        }
    }
}

/// Remote locations fetched by the `download` command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub dataset_url: Option<String>,
    pub schema_url: Option<String>,
}

/// External reporting dashboard launched by the `web` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Program and arguments.
    pub command: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "streamlit".to_string(),
                "run".to_string(),
                "streamlit_app.py".to_string(),
            ],
        }
    }
}

/// Configuration for an audit run.
///
/// Use [`AuditConfig::builder()`] to override individual settings, or
/// [`AuditConfig::from_toml_file()`] to load a configuration file.
///
/// # Example
///
/// ```rust,ignore
/// use decp_quality::config::{AmountBounds, AuditConfig};
///
/// let config = AuditConfig::builder()
///     .publication_delay_days(60)
///     .amount_bounds(AmountBounds { lower: 200.0, upper: 1e9 })
///     .sources(["megalis-bretagne", "ternum-bfc"])
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum number of days allowed between notification and publication.
    /// Default: 60
    pub publication_delay_days: i64,

    /// Plausibility interval for amounts.
    /// Default: (200, 1 000 000 000)
    pub amount_bounds: AmountBounds,

    /// Duplicate row detection.
    pub duplicates: DuplicateRowsConfig,

    /// Statistical outlier detection.
    pub outliers: OutlierConfig,

    /// Lower bound applied to the days since the last publication before it
    /// is turned into a rate.
    /// Default: 100
    pub days_since_publication_floor: i64,

    /// Value of `_type` (case-insensitive) kept for the audit.
    /// Default: "marché"
    pub market_type: String,

    /// Sources audited, in output order.
    pub sources: Vec<String>,

    pub paths: PathsConfig,

    pub download: DownloadConfig,

    pub web: WebConfig,
}

fn default_sources() -> Vec<String> {
    [
        "data.gouv.fr_aife",
        "data.gouv.fr_pes",
        "marches-publics.info",
        "megalis-bretagne",
        "ternum-bfc",
        "e-marchespublics",
        "grandlyon",
        "atexo-maximilien",
        "decp_aws",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            publication_delay_days: 60,
            amount_bounds: AmountBounds::default(),
            duplicates: DuplicateRowsConfig::default(),
            outliers: OutlierConfig::default(),
            days_since_publication_floor: 100,
            market_type: "marché".to_string(),
            sources: default_sources(),
            paths: PathsConfig::default(),
            download: DownloadConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load and validate a TOML configuration file.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .context(format!("Reading configuration {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AuditConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        let AmountBounds { lower, upper } = self.amount_bounds;
        if !(lower < upper) {
            return Err(ConfigValidationError::InvalidAmountBounds { lower, upper });
        }

        if !(self.outliers.stdev_multiplier > 0.0) {
            return Err(ConfigValidationError::InvalidStdevMultiplier(
                self.outliers.stdev_multiplier,
            ));
        }

        if self.publication_delay_days < 0 {
            return Err(ConfigValidationError::NegativeDays {
                field: "publication_delay_days".to_string(),
                value: self.publication_delay_days,
            });
        }

        if self.days_since_publication_floor < 0 {
            return Err(ConfigValidationError::NegativeDays {
                field: "days_since_publication_floor".to_string(),
                value: self.days_since_publication_floor,
            });
        }

        if self.sources.is_empty() {
            return Err(ConfigValidationError::EmptySources);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid amount bounds: lower {lower} must be strictly below upper {upper}")]
    InvalidAmountBounds { lower: f64, upper: f64 },

    #[error("Invalid standard deviation multiplier: {0} (must be positive)")]
    InvalidStdevMultiplier(f64),

    #[error("Invalid value for '{field}': {value} (must not be negative)")]
    NegativeDays { field: String, value: i64 },

    #[error("At least one source must be configured")]
    EmptySources,
}

/// Builder for [`AuditConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AuditConfigBuilder {
    publication_delay_days: Option<i64>,
    amount_bounds: Option<AmountBounds>,
    excluded_columns: Option<Vec<String>>,
    outlier_columns: Option<Vec<String>>,
    stdev_multiplier: Option<f64>,
    days_since_publication_floor: Option<i64>,
    market_type: Option<String>,
    sources: Option<Vec<String>>,
    paths: Option<PathsConfig>,
}

impl AuditConfigBuilder {
    /// Set the maximum delay between notification and publication, in days.
    pub fn publication_delay_days(mut self, days: i64) -> Self {
        self.publication_delay_days = Some(days);
        self
    }

    /// Set the amount plausibility interval.
    pub fn amount_bounds(mut self, bounds: AmountBounds) -> Self {
        self.amount_bounds = Some(bounds);
        self
    }

    /// Set the columns ignored by duplicate row detection.
    pub fn excluded_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the columns inspected for statistical outliers.
    pub fn outlier_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outlier_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of standard deviations above the mean marking an outlier.
    pub fn stdev_multiplier(mut self, k: f64) -> Self {
        self.stdev_multiplier = Some(k);
        self
    }

    /// Set the floor applied to the days since the last publication.
    pub fn days_since_publication_floor(mut self, days: i64) -> Self {
        self.days_since_publication_floor = Some(days);
        self
    }

    /// Set the `_type` value kept for the audit.
    pub fn market_type(mut self, market_type: impl Into<String>) -> Self {
        self.market_type = Some(market_type.into());
        self
    }

    /// Set the audited sources.
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Set the local file locations.
    pub fn paths(mut self, paths: PathsConfig) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AuditConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<AuditConfig, ConfigValidationError> {
        let defaults = AuditConfig::default();
        let config = AuditConfig {
            publication_delay_days: self
                .publication_delay_days
                .unwrap_or(defaults.publication_delay_days),
            amount_bounds: self.amount_bounds.unwrap_or(defaults.amount_bounds),
            duplicates: DuplicateRowsConfig {
                excluded_columns: self
                    .excluded_columns
                    .unwrap_or(defaults.duplicates.excluded_columns),
            },
            outliers: OutlierConfig {
                included_columns: self
                    .outlier_columns
                    .unwrap_or(defaults.outliers.included_columns),
                stdev_multiplier: self
                    .stdev_multiplier
                    .unwrap_or(defaults.outliers.stdev_multiplier),
            },
            days_since_publication_floor: self
                .days_since_publication_floor
                .unwrap_or(defaults.days_since_publication_floor),
            market_type: self.market_type.unwrap_or(defaults.market_type),
            sources: self.sources.unwrap_or(defaults.sources),
            paths: self.paths.unwrap_or(defaults.paths),
            download: defaults.download,
            web: defaults.web,
        };

        config.validate()?;
        Ok(config)
    }
}
