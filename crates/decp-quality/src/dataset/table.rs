//! Columnar view of one source's records.
//!
//! Records are flattened the way a JSON normalizer does it: nested objects
//! become dotted column names (`acheteur.id`), arrays are kept as JSON text.
//! Every column is stored as text; numeric views are obtained by casting.
//! The `uid` field is not a column, it indexes the rows.

use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::record::{Record, UID, value_to_text};
use crate::error::{Result, ResultExt};

/// In-memory table backing the dataset-level detectors.
pub struct RecordTable {
    df: DataFrame,
    /// Same columns holding each cell as serialized JSON, so that `100` and
    /// `"100"` stay distinct when comparing rows.
    cells: DataFrame,
    uids: Vec<Option<String>>,
}

impl RecordTable {
    /// Build a table from records, one row per record in order.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let height = records.len();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut names: Vec<String> = Vec::new();
        let mut text: Vec<Vec<Option<String>>> = Vec::new();
        let mut json: Vec<Vec<Option<String>>> = Vec::new();

        for (row, record) in records.iter().enumerate() {
            let mut fields = Vec::new();
            flatten_into("", record.fields(), &mut fields);
            for (name, value) in fields {
                if name == UID {
                    continue;
                }
                let col = match index.get(&name) {
                    Some(&col) => col,
                    None => {
                        let col = names.len();
                        index.insert(name.clone(), col);
                        names.push(name);
                        text.push(vec![None; height]);
                        json.push(vec![None; height]);
                        col
                    }
                };
                if let Some(value) = value {
                    text[col][row] = Some(value_to_text(value));
                    json[col][row] = Some(value.to_string());
                }
            }
        }

        let df = build_frame(&names, text).context("Building record table")?;
        let cells = build_frame(&names, json).context("Building record cells")?;
        let uids = records.iter().map(Record::uid).collect();

        Ok(Self { df, cells, uids })
    }

    /// Number of records, including records that only carry a `uid`.
    pub fn num_rows(&self) -> usize {
        self.uids.len()
    }

    /// Row identifiers, aligned with the rows.
    pub fn uids(&self) -> &[Option<String>] {
        &self.uids
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Per-row flag telling whether the row equals another row on every
    /// column not listed in `excluded`. Both sides of a match are flagged.
    pub fn duplicated_mask(&self, excluded: &[String]) -> Result<Vec<bool>> {
        let include: Vec<String> = self
            .column_names()
            .into_iter()
            .filter(|name| !excluded.contains(name))
            .collect();

        if include.is_empty() || self.df.height() == 0 {
            return Ok(vec![false; self.num_rows()]);
        }

        let mask = self
            .cells
            .select(include)
            .context("Selecting duplicate detection columns")?
            .is_duplicated()
            .context("Detecting duplicated rows")?;

        Ok(mask.into_iter().map(|v| v.unwrap_or(false)).collect())
    }

    /// Column cast to floats; text that does not parse becomes `None`.
    ///
    /// Returns `None` if the column does not exist.
    pub fn numeric_column(&self, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        let Ok(column) = self.df.column(name) else {
            return Ok(None);
        };
        let series = column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .context(format!("Casting column '{}' to numbers", name))?;
        let values = series.f64()?.into_iter().collect();
        Ok(Some(values))
    }

    /// Column as text. Returns `None` if the column does not exist.
    pub fn text_column(&self, name: &str) -> Result<Option<Vec<Option<String>>>> {
        let Ok(column) = self.df.column(name) else {
            return Ok(None);
        };
        let values = column
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(Some(values))
    }
}

fn build_frame(names: &[String], columns: Vec<Vec<Option<String>>>) -> PolarsResult<DataFrame> {
    let columns = names
        .iter()
        .zip(columns)
        .map(|(name, values)| Column::from(Series::new(name.as_str().into(), values)))
        .collect();
    DataFrame::new(columns)
}

fn flatten_into<'a>(
    prefix: &str,
    fields: &'a Map<String, Value>,
    row: &mut Vec<(String, Option<&'a Value>)>,
) {
    for (key, value) in fields {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(&name, nested, row),
            Value::Null => row.push((name, None)),
            other => row.push((name, Some(other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(Record::from).collect()
    }

    #[test]
    fn test_from_records_flattens_nested_objects() {
        let table = RecordTable::from_records(&records(vec![
            json!({"uid": "1", "acheteur": {"id": "213500238"}, "titulaires": [{"id": "a"}]}),
            json!({"uid": "2", "montant": 10}),
        ]))
        .unwrap();

        let names = table.column_names();
        assert_eq!(names, vec!["acheteur.id", "titulaires", "montant"]);
        assert!(!table.has_column("uid"));
        assert_eq!(table.num_rows(), 2);

        let buyer = table.text_column("acheteur.id").unwrap().unwrap();
        assert_eq!(buyer, vec![Some("213500238".to_string()), None]);
    }

    #[test]
    fn test_num_rows_without_columns() {
        let table =
            RecordTable::from_records(&records(vec![json!({"uid": "1"}), json!({"uid": "2"})]))
                .unwrap();
        assert_eq!(table.num_rows(), 2);
        assert!(table.column_names().is_empty());
        assert_eq!(table.duplicated_mask(&[]).unwrap(), vec![false, false]);
    }

    #[test]
    fn test_numeric_column_drops_unparseable_text() {
        let table = RecordTable::from_records(&records(vec![
            json!({"uid": "1", "montant": 1500}),
            json!({"uid": "2", "montant": "2500.5"}),
            json!({"uid": "3", "montant": "inconnu"}),
            json!({"uid": "4"}),
        ]))
        .unwrap();

        let values = table.numeric_column("montant").unwrap().unwrap();
        assert_eq!(values, vec![Some(1500.0), Some(2500.5), None, None]);
        assert!(table.numeric_column("dureeMois").unwrap().is_none());
    }

    #[test]
    fn test_duplicated_mask_ignores_uid_and_excluded_columns() {
        let table = RecordTable::from_records(&records(vec![
            json!({"uid": "1", "id": "A", "objet": "Voirie", "montant": 100}),
            json!({"uid": "2", "id": "B", "objet": "Voirie", "montant": 100}),
            json!({"uid": "3", "id": "C", "objet": "Voirie", "montant": 200}),
        ]))
        .unwrap();

        let mask = table.duplicated_mask(&["id".to_string()]).unwrap();
        assert_eq!(mask, vec![true, true, false]);

        let mask = table.duplicated_mask(&[]).unwrap();
        assert_eq!(mask, vec![false, false, false]);
    }

    #[test]
    fn test_duplicated_mask_distinguishes_number_from_text() {
        let table = RecordTable::from_records(&records(vec![
            json!({"uid": "1", "montant": 100}),
            json!({"uid": "2", "montant": "100"}),
        ]))
        .unwrap();

        assert_eq!(table.duplicated_mask(&[]).unwrap(), vec![false, false]);
        let values = table.numeric_column("montant").unwrap().unwrap();
        assert_eq!(values, vec![Some(100.0), Some(100.0)]);
    }

    #[test]
    fn test_from_records_aligns_sparse_columns() {
        let table = RecordTable::from_records(&records(vec![
            json!({"uid": "1", "objet": "Voirie"}),
            json!({"uid": "2", "montant": 10, "objet": null}),
            json!({"montant": 20, "nature": "Marché", "objet": "Eclairage"}),
        ]))
        .unwrap();

        assert_eq!(table.column_names(), vec!["objet", "montant", "nature"]);
        assert_eq!(
            table.text_column("objet").unwrap().unwrap(),
            vec![Some("Voirie".to_string()), None, Some("Eclairage".to_string())]
        );
        assert_eq!(
            table.numeric_column("montant").unwrap().unwrap(),
            vec![None, Some(10.0), Some(20.0)]
        );
        assert_eq!(
            table.text_column("nature").unwrap().unwrap(),
            vec![None, None, Some("Marché".to_string())]
        );
        assert_eq!(table.uids(), &[Some("1".to_string()), Some("2".to_string()), None]);
    }
}
