//! Quality defect detectors.
//!
//! Record-level predicates ([`dates`], [`amounts`], [`encoding`]) look at one
//! record's fields. Source-level counters ([`table`]) look at every record of
//! a source at once through a [`RecordTable`](crate::dataset::RecordTable).

pub mod amounts;
pub mod dates;
pub mod encoding;
pub mod table;

pub use amounts::{are_amount_and_duration_inconsistent, is_amount_abnormal};
pub use dates::{is_after, is_publication_delay_overrun, is_temporally_inconsistent, parse_date};
pub use encoding::has_unsupported_character;
pub use table::{
    count_duplicated_rows, count_non_unique_identifiers, count_outlier_rows,
    days_since_last_publication,
};
