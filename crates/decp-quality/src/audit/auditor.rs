//! Quality audit of one source.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AuditConfig;
use crate::dataset::{Record, RecordTable};
use crate::detectors::{
    are_amount_and_duration_inconsistent, count_duplicated_rows, count_non_unique_identifiers,
    count_outlier_rows, days_since_last_publication, has_unsupported_character,
    is_amount_abnormal, is_publication_delay_overrun, is_temporally_inconsistent,
};
use crate::error::{Result, ResultExt};
use crate::results::{Dimension, Measure, SourceAuditResult};
use crate::schema::{KeywordClass, SchemaValidator, SchemaViolations, classify_keyword};
use crate::utils::rate;

/// Raw defect counts of one source, before conversion to rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DefectCounts {
    non_unique_identifiers: usize,
    duplicated_rows: usize,
    unsupported_characters: usize,
    invalid_formats: usize,
    invalid_values: usize,
    missing_data: usize,
    unfilled_values: usize,
    days_since_last_publication: usize,
    publication_delay_overruns: usize,
    temporal_inconsistencies: usize,
    amount_duration_inconsistencies: usize,
    abnormal_amounts: usize,
    extreme_values: usize,
}

impl DefectCounts {
    /// Count the defects revealed by the schema keywords a record broke.
    fn add_schema_keywords<'a>(&mut self, keywords: impl IntoIterator<Item = &'a String>) {
        for keyword in keywords {
            match classify_keyword(keyword) {
                KeywordClass::Format => self.invalid_formats += 1,
                KeywordClass::Value => self.invalid_values += 1,
                KeywordClass::Missing => {
                    self.missing_data += 1;
                    self.unfilled_values += 1;
                }
                KeywordClass::Unclassified => warn!("Unhandled schema validator: {}", keyword),
            }
        }
    }

    fn into_measures(self, num_records: usize) -> Vec<Measure> {
        let r = |count| rate(count, num_records);
        vec![
            Measure::new(
                Dimension::Singularite,
                &[r(self.non_unique_identifiers), r(self.duplicated_rows)],
            ),
            Measure::new(
                Dimension::Conformite,
                &[
                    r(self.unsupported_characters),
                    r(self.invalid_formats),
                    r(self.invalid_values),
                ],
            ),
            Measure::new(
                Dimension::Completude,
                &[r(self.missing_data), r(self.unfilled_values)],
            ),
            Measure::new(
                Dimension::Validite,
                &[
                    r(self.days_since_last_publication),
                    r(self.publication_delay_overruns),
                ],
            ),
            Measure::new(
                Dimension::Coherence,
                &[
                    r(self.temporal_inconsistencies),
                    r(self.amount_duration_inconsistencies),
                ],
            ),
            Measure::new(
                Dimension::Exactitude,
                &[r(self.abnormal_amounts), r(self.extreme_values)],
            ),
        ]
    }
}

/// Audits the records of one source at a time against a compiled schema.
pub struct SourceAuditor<'a> {
    validator: &'a SchemaValidator,
    config: &'a AuditConfig,
    today: NaiveDate,
}

impl<'a> SourceAuditor<'a> {
    /// `today` is the reference date for the days since last publication.
    pub fn new(validator: &'a SchemaValidator, config: &'a AuditConfig, today: NaiveDate) -> Self {
        Self {
            validator,
            config,
            today,
        }
    }

    /// Score the records of `source`.
    ///
    /// A source without records scores zero everywhere. A record lacking the
    /// fields a detector needs is skipped by that detector; a malformed date
    /// fails the whole source.
    pub fn audit(&self, source: &str, records: &[Record]) -> Result<SourceAuditResult> {
        let num_records = records.len();
        info!("{} records for source {}", num_records, source);
        if num_records == 0 {
            return Ok(SourceAuditResult::empty(source));
        }

        let violations = self.validator.validate(records);
        let counts = self
            .count_defects(records, &violations)
            .context(format!("Auditing source '{}'", source))?;

        SourceAuditResult::new(source, counts.into_measures(num_records))
    }

    fn count_defects(&self, records: &[Record], violations: &SchemaViolations) -> Result<DefectCounts> {
        let mut counts = DefectCounts {
            non_unique_identifiers: count_non_unique_identifiers(records),
            ..DefectCounts::default()
        };

        let table = RecordTable::from_records(records)?;
        counts.duplicated_rows =
            count_duplicated_rows(&table, &self.config.duplicates.excluded_columns)?;
        let days = days_since_last_publication(&table, self.today)?.unwrap_or(0);
        counts.days_since_last_publication =
            days.max(self.config.days_since_publication_floor).max(0) as usize;
        counts.extreme_values = count_outlier_rows(
            &table,
            &self.config.outliers.included_columns,
            self.config.outliers.stdev_multiplier,
        )?;

        for record in records {
            let uid = record.uid().unwrap_or_default();
            if let Some(found) = violations.get(&uid) {
                counts.add_schema_keywords(&found.failed_validators);
            }

            if let (Some(notification), Some(publication)) =
                (record.notification_date(), record.publication_date())
            {
                if is_temporally_inconsistent(&notification, &publication)? {
                    counts.temporal_inconsistencies += 1;
                }
                if is_publication_delay_overrun(
                    &notification,
                    &publication,
                    self.config.publication_delay_days,
                )? {
                    counts.publication_delay_overruns += 1;
                }
            }

            if let Some(amount) = record.amount() {
                if is_amount_abnormal(amount, &self.config.amount_bounds) {
                    counts.abnormal_amounts += 1;
                }
                if let Some(duration) = record.duration_months() {
                    if are_amount_and_duration_inconsistent(amount, duration) {
                        counts.amount_duration_inconsistencies += 1;
                    }
                }
            }

            if record.object().is_some_and(has_unsupported_character) {
                counts.unsupported_characters += 1;
            }
        }

        Ok(counts)
    }
}

/// Audit one source against `schema` in one call.
pub fn audit_source(
    source: &str,
    records: &[Record],
    schema: &Value,
    config: &AuditConfig,
    today: NaiveDate,
) -> Result<SourceAuditResult> {
    if records.is_empty() {
        info!("0 records for source {}", source);
        return Ok(SourceAuditResult::empty(source));
    }
    let validator = SchemaValidator::new(schema)?;
    SourceAuditor::new(&validator, config, today).audit(source, records)
}
