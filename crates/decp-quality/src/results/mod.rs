//! Audit results: measures, per-source results and the ranked result set.

mod measure;
mod set;
mod source;

pub use measure::{Dimension, General, Measure};
pub use set::{AuditResultSet, dense_ranks};
pub use source::{SerializedMeasure, SerializedScore, SerializedSourceResult, SourceAuditResult};
