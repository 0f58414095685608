//! Detectors working on a whole source at once.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::dataset::{PUBLICATION_DATE, Record, RecordTable};
use crate::error::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of rows equal to another row on every column but `excluded`.
///
/// Both rows of a matching pair are counted.
pub fn count_duplicated_rows(table: &RecordTable, excluded: &[String]) -> Result<usize> {
    let mask = table.duplicated_mask(excluded)?;
    let duplicated: Vec<&str> = mask
        .iter()
        .zip(table.uids())
        .filter(|(flagged, _)| **flagged)
        .map(|(_, uid)| uid.as_deref().unwrap_or(""))
        .collect();

    debug!(
        "{} duplicated rows found, uids: {:?}",
        duplicated.len(),
        duplicated
    );
    Ok(duplicated.len())
}

/// Days elapsed between the most recent publication date and `today`.
///
/// Only exact `YYYY-MM-DD` values take part. Returns `None` when the table
/// has no such value.
pub fn days_since_last_publication(table: &RecordTable, today: NaiveDate) -> Result<Option<i64>> {
    let Some(dates) = table.text_column(PUBLICATION_DATE)? else {
        return Ok(None);
    };

    let last = dates
        .iter()
        .flatten()
        .filter_map(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
        .max();

    let Some(last) = last else {
        debug!("No parseable publication date");
        return Ok(None);
    };

    let delta = (today - last).num_days();
    debug!("Last publication: {}, {} days ago", last, delta);
    Ok(Some(delta))
}

/// Number of rows holding an extreme value in at least one of `columns`.
///
/// On each column, values are taken as absolute numbers and a row is
/// extreme when it exceeds the column mean by more than `stdev_multiplier`
/// sample standard deviations. Missing or non-numeric cells are ignored.
pub fn count_outlier_rows(
    table: &RecordTable,
    columns: &[String],
    stdev_multiplier: f64,
) -> Result<usize> {
    let mut flagged: BTreeSet<usize> = BTreeSet::new();

    for name in columns {
        let Some(values) = table.numeric_column(name)? else {
            warn!("Column '{}' not found, skipped for extreme values", name);
            continue;
        };

        let present: Vec<(usize, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(row, v)| v.map(|v| (row, v.abs())))
            .collect();
        if present.len() < 2 {
            continue;
        }

        let n = present.len() as f64;
        let mean = present.iter().map(|(_, v)| v).sum::<f64>() / n;
        let variance = present.iter().map(|(_, v)| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let threshold = stdev_multiplier * variance.sqrt();

        flagged.extend(
            present
                .iter()
                .filter(|(_, v)| v - mean > threshold)
                .map(|(row, _)| *row),
        );
    }

    // A row sharing its uid with another flagged row counts once
    let uids = table.uids();
    let mut keys: BTreeSet<String> = BTreeSet::new();
    for row in flagged {
        let key = match &uids[row] {
            Some(uid) => uid.clone(),
            None => format!("#{}", row),
        };
        keys.insert(key);
    }

    debug!("{} rows with extreme values found, uids: {:?}", keys.len(), keys);
    Ok(keys.len())
}

/// Number of records whose `uid` is carried by at least one other record.
///
/// Every occurrence counts, so two records sharing a uid count for two.
/// Records without a uid are ignored.
pub fn count_non_unique_identifiers(records: &[Record]) -> usize {
    let uids: Vec<String> = records.iter().filter_map(Record::uid).collect();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for uid in &uids {
        *occurrences.entry(uid.as_str()).or_default() += 1;
    }
    uids.iter().filter(|uid| occurrences[uid.as_str()] > 1).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(Record::from).collect()
    }

    fn table(values: Vec<Value>) -> RecordTable {
        RecordTable::from_records(&records(values)).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ==================== count_duplicated_rows tests ====================

    #[test]
    fn test_count_duplicated_rows_counts_both_sides() {
        let t = table(vec![
            json!({"uid": "1", "id": "A", "objet": "Voirie", "montant": 100}),
            json!({"uid": "2", "id": "B", "objet": "Voirie", "montant": 100}),
            json!({"uid": "3", "id": "C", "objet": "Voirie", "montant": 100}),
            json!({"uid": "4", "id": "D", "objet": "Eclairage", "montant": 100}),
        ]);
        assert_eq!(count_duplicated_rows(&t, &["id".to_string()]).unwrap(), 3);
        assert_eq!(count_duplicated_rows(&t, &[]).unwrap(), 0);
    }

    // ==================== days_since_last_publication tests ====================

    #[test]
    fn test_days_since_last_publication() {
        let t = table(vec![
            json!({"uid": "1", "datePublicationDonnees": "2024-01-01"}),
            json!({"uid": "2", "datePublicationDonnees": "2024-03-01"}),
            json!({"uid": "3"}),
        ]);
        let days = days_since_last_publication(&t, date(2024, 3, 11)).unwrap();
        assert_eq!(days, Some(10));
    }

    #[test]
    fn test_days_since_last_publication_ignores_other_formats() {
        let t = table(vec![
            json!({"uid": "1", "datePublicationDonnees": "2024-01-01"}),
            json!({"uid": "2", "datePublicationDonnees": "2024-05-01T10:00:00"}),
            json!({"uid": "3", "datePublicationDonnees": "01/06/2024"}),
        ]);
        let days = days_since_last_publication(&t, date(2024, 1, 31)).unwrap();
        assert_eq!(days, Some(30));
    }

    #[test]
    fn test_days_since_last_publication_without_dates() {
        let t = table(vec![json!({"uid": "1", "montant": 10})]);
        assert_eq!(
            days_since_last_publication(&t, date(2024, 1, 1)).unwrap(),
            None
        );

        let t = table(vec![json!({"uid": "1", "datePublicationDonnees": "inconnue"})]);
        assert_eq!(
            days_since_last_publication(&t, date(2024, 1, 1)).unwrap(),
            None
        );
    }

    // ==================== count_outlier_rows tests ====================

    fn outlier_table() -> RecordTable {
        let mut values: Vec<Value> = (0..20)
            .map(|i| json!({"uid": format!("m{}", i), "montant": 1000, "dureeMois": 12}))
            .collect();
        values.push(json!({"uid": "big", "montant": 1_000_000, "dureeMois": 12}));
        values.push(json!({"uid": "long", "montant": 1000, "dureeMois": "1200"}));
        values.push(json!({"uid": "neg", "montant": -1_000_000, "dureeMois": 1200}));
        table(values)
    }

    #[test]
    fn test_count_outlier_rows_deduplicates_rows() {
        let t = outlier_table();
        let columns = vec!["montant".to_string(), "dureeMois".to_string()];
        // "neg" is extreme on both columns, through its absolute amount
        assert_eq!(count_outlier_rows(&t, &columns, 3.0).unwrap(), 3);
    }

    #[test]
    fn test_count_outlier_rows_single_column() {
        let t = outlier_table();
        assert_eq!(
            count_outlier_rows(&t, &["dureeMois".to_string()], 3.0).unwrap(),
            2
        );
    }

    #[test]
    fn test_count_outlier_rows_skips_missing_columns() {
        let t = outlier_table();
        assert_eq!(
            count_outlier_rows(&t, &["valeurGlobale".to_string()], 3.0).unwrap(),
            0
        );
    }

    #[test]
    fn test_count_outlier_rows_uniform_values() {
        let t = table(vec![
            json!({"uid": "1", "montant": 500}),
            json!({"uid": "2", "montant": 500}),
        ]);
        assert_eq!(count_outlier_rows(&t, &["montant".to_string()], 3.0).unwrap(), 0);

        let t = table(vec![json!({"uid": "1", "montant": 500})]);
        assert_eq!(count_outlier_rows(&t, &["montant".to_string()], 3.0).unwrap(), 0);
    }

    // ==================== count_non_unique_identifiers tests ====================

    #[test]
    fn test_count_non_unique_identifiers() {
        let recs = records(vec![
            json!({"uid": "a"}),
            json!({"uid": "a"}),
            json!({"uid": "b"}),
            json!({"uid": "c"}),
            json!({"uid": "c"}),
            json!({"uid": "c"}),
            json!({"objet": "sans uid"}),
            json!({"objet": "sans uid"}),
        ]);
        assert_eq!(count_non_unique_identifiers(&recs), 5);
        assert_eq!(count_non_unique_identifiers(&[]), 0);
    }
}
