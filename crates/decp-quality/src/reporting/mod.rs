//! Reporting on persisted audit results.
//!
//! [`SourceComparison`] lays one source's scores from the latest audit next
//! to an older audit: values as whole percentages, deltas in points, ranks
//! and every detail rate.

mod comparison;

pub use comparison::{DetailPercentage, MetricDelta, SourceComparison, to_percentage};
