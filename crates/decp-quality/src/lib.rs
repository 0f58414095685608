//! Public Procurement Data Quality Audit
//!
//! Measures the quality of the consolidated French public procurement
//! dataset (DECP) source by source, and ranks the sources against each other.
//!
//! # Overview
//!
//! Each source is scored on six quality dimensions, every score being the
//! mean of defect rates (lower is better):
//!
//! - **Singularité**: non-unique identifiers, duplicated rows
//! - **Conformité**: badly encoded characters, invalid formats, invalid values
//! - **Complétude**: missing data, unfilled values
//! - **Validité**: days since last publication, publication delay overruns
//! - **Cohérence**: notification after publication, amount/duration mismatch
//! - **Exactitude**: abnormal amounts, extreme values
//!
//! A general score averages the six dimensions. Sources are then ranked on
//! each score, 1 being the best.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use decp_quality::{AuditConfig, Dataset, audit_dataset};
//!
//! let config = AuditConfig::from_toml_file("decp-quality.toml")?;
//! let dataset = Dataset::from_json_file(&config.paths.dataset)?;
//! let schema = serde_json::from_str(&std::fs::read_to_string(&config.paths.schema)?)?;
//!
//! let today = chrono::Local::now().date_naive();
//! let results = audit_dataset(dataset, &schema, &config, today)?;
//!
//! let aife = results.lookup("data.gouv.fr_aife")?;
//! println!("General score: {} (rank {:?})", aife.general.value, aife.general.rank);
//! results.save_json("data/audit.json")?;
//! ```
//!
//! # Comparing two audits
//!
//! ```rust,ignore
//! use decp_quality::{AuditResultSet, SourceComparison};
//!
//! let current = AuditResultSet::load_json("audit-2024-06.json")?;
//! let previous = AuditResultSet::load_json("audit-2024-05.json")?;
//! let comparison = SourceComparison::new(
//!     current.lookup("megalis-bretagne")?,
//!     previous.lookup("megalis-bretagne").ok(),
//! );
//! println!("{}", comparison);
//! ```

pub mod audit;
pub mod config;
pub mod dataset;
pub mod detectors;
#[cfg(feature = "download")]
pub mod download;
pub mod error;
pub mod reporting;
pub mod results;
pub mod schema;
pub mod utils;

// Re-exports for convenient access
pub use audit::{AuditRun, SourceAuditor, audit_dataset, audit_source};
pub use config::{
    AmountBounds, AuditConfig, AuditConfigBuilder, ConfigValidationError, DownloadConfig,
    DuplicateRowsConfig, OutlierConfig, PathsConfig, WebConfig,
};
pub use dataset::{Dataset, Record, RecordTable};
pub use error::{AuditError, Result as AuditResult, ResultExt};
pub use reporting::{MetricDelta, SourceComparison};
pub use results::{AuditResultSet, Dimension, General, Measure, SourceAuditResult};
pub use schema::{SchemaValidator, SchemaViolations, audit_against_schema};
pub use utils::{divide_and_round, rate, round_to};
