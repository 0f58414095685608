//! Procurement records and their tabular view.
//!
//! - [`Record`] and [`Dataset`]: the consolidated JSON dataset
//! - [`RecordTable`]: a polars frame of one source's records, used by the
//!   dataset-level detectors

mod record;
mod table;

pub use record::{
    AMOUNT, DURATION_MONTHS, Dataset, NOTIFICATION_DATE, OBJECT, PUBLICATION_DATE, Record, SOURCE,
    TYPE, UID,
};
pub use table::RecordTable;
