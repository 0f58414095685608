//! Audit orchestration.
//!
//! [`SourceAuditor`] scores one source; [`audit_dataset`] and [`run`] drive
//! the whole dataset through it.

mod auditor;
mod controller;

pub use auditor::{SourceAuditor, audit_source};
pub use controller::{AuditRun, audit_dataset, run};
