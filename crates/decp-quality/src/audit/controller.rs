//! Full audit run: load, filter, audit every source, rank, persist.

use chrono::{Local, NaiveDate};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

use super::auditor::SourceAuditor;
use crate::config::AuditConfig;
use crate::dataset::{Dataset, Record};
use crate::error::{Result, ResultExt};
use crate::results::{AuditResultSet, SourceAuditResult};
use crate::schema::SchemaValidator;

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct AuditRun {
    pub results: AuditResultSet,
    /// Records left after the row limit and the type filter.
    pub num_records: usize,
    pub output: PathBuf,
    pub duration_ms: u64,
}

/// Audit every configured source of an in-memory dataset and rank them.
///
/// Records whose `_type` is not the configured market type are left out of
/// every source. Sources are audited in configuration order.
pub fn audit_dataset(
    mut dataset: Dataset,
    schema: &Value,
    config: &AuditConfig,
    today: NaiveDate,
) -> Result<AuditResultSet> {
    dataset.retain_type(&config.market_type);
    audit_markets(&dataset, schema, config, today)
}

fn audit_markets(
    markets: &Dataset,
    schema: &Value,
    config: &AuditConfig,
    today: NaiveDate,
) -> Result<AuditResultSet> {
    let partitions: Vec<(&String, Vec<Record>)> = config
        .sources
        .iter()
        .map(|source| (source, markets.records_for_source(source)))
        .collect();

    // The schema is only compiled when there is something to validate
    let validator = if partitions.iter().any(|(_, records)| !records.is_empty()) {
        Some(SchemaValidator::new(schema)?)
    } else {
        None
    };

    let mut results = AuditResultSet::new();
    for (source, records) in partitions {
        let result = match &validator {
            Some(validator) => {
                SourceAuditor::new(validator, config, today).audit(source, &records)?
            }
            None => {
                info!("0 records for source {}", source);
                SourceAuditResult::empty(source.as_str())
            }
        };
        results.add(result);
    }

    results.compute_ranks();
    Ok(results)
}

/// Load the configured dataset and schema, audit them and save the results.
///
/// With `rows`, only the first `rows` records of the dataset are kept,
/// before the type filter.
pub fn run(config: &AuditConfig, rows: Option<usize>) -> Result<AuditRun> {
    let started = Instant::now();

    info!("Loading dataset from {}", config.paths.dataset.display());
    let mut dataset = Dataset::from_json_file(&config.paths.dataset)?;
    if let Some(rows) = rows {
        dataset.truncate(rows);
        debug!("Dataset limited to its first {} records", rows);
    }
    dataset.retain_type(&config.market_type);

    info!("Loading schema from {}", config.paths.schema.display());
    let schema_text = std::fs::read_to_string(&config.paths.schema)
        .context(format!("Reading schema {}", config.paths.schema.display()))?;
    let schema: Value = serde_json::from_str(&schema_text)?;

    let today = Local::now().date_naive();
    let results = audit_markets(&dataset, &schema, config, today)?;

    results.save_json(&config.paths.results)?;
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(
        "Audited {} sources in {}ms, results saved to {}",
        results.len(),
        duration_ms,
        config.paths.results.display()
    );

    Ok(AuditRun {
        results,
        num_records: dataset.len(),
        output: config.paths.results.clone(),
        duration_ms,
    })
}
