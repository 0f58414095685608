use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, ResultExt};

pub const UID: &str = "uid";
pub const TYPE: &str = "_type";
pub const SOURCE: &str = "source";
pub const AMOUNT: &str = "montant";
pub const DURATION_MONTHS: &str = "dureeMois";
pub const NOTIFICATION_DATE: &str = "dateNotification";
pub const PUBLICATION_DATE: &str = "datePublicationDonnees";
pub const OBJECT: &str = "objet";

/// One procurement record ("marché") as a flat JSON mapping.
///
/// Accessors treat a `null` value like a missing key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Identifier rendered as text; non-string identifiers use their JSON form.
    pub fn uid(&self) -> Option<String> {
        self.get(UID).map(value_to_text)
    }

    pub fn record_type(&self) -> Option<&str> {
        self.get(TYPE).and_then(Value::as_str)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(SOURCE).and_then(Value::as_str)
    }

    /// Amount in euros; numeric text is accepted.
    pub fn amount(&self) -> Option<f64> {
        self.get(AMOUNT).and_then(value_to_number)
    }

    pub fn duration_months(&self) -> Option<f64> {
        self.get(DURATION_MONTHS).and_then(value_to_number)
    }

    pub fn notification_date(&self) -> Option<String> {
        self.get(NOTIFICATION_DATE).map(value_to_text)
    }

    pub fn publication_date(&self) -> Option<String> {
        self.get(PUBLICATION_DATE).map(value_to_text)
    }

    pub fn object(&self) -> Option<&str> {
        self.get(OBJECT).and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self { fields: Map::new() },
        }
    }
}

/// Text form of a JSON value: strings unquoted, everything else as JSON.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Consolidated dataset: `{"marches": [record, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub marches: Vec<Record>,
}

impl Dataset {
    pub fn new(marches: Vec<Record>) -> Self {
        Self { marches }
    }

    /// Load a UTF-8 JSON dataset file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).context(format!("Reading dataset {}", path.display()))?;
        let dataset: Dataset = serde_json::from_slice(&bytes)?;
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.marches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marches.is_empty()
    }

    /// Keep only the first `rows` records.
    pub fn truncate(&mut self, rows: usize) {
        self.marches.truncate(rows);
    }

    /// Keep only records whose `_type` equals `market_type`, ignoring case.
    ///
    /// Records without a `_type` are dropped.
    pub fn retain_type(&mut self, market_type: &str) {
        let wanted = market_type.to_lowercase();
        let num_total = self.marches.len();
        let available_types: BTreeSet<&str> = self
            .marches
            .iter()
            .filter_map(Record::record_type)
            .collect();
        debug!("Values of the _type column: {:?}", available_types);
        debug!("Filtering the _type column on '{}'", market_type);

        self.marches.retain(|record| {
            record
                .record_type()
                .is_some_and(|t| t.to_lowercase() == wanted)
        });
        debug!(
            "Filtering went from {} to {} records",
            num_total,
            self.marches.len()
        );
    }

    /// Records whose `source` equals `source`, ignoring case, in dataset order.
    pub fn records_for_source(&self, source: &str) -> Vec<Record> {
        let wanted = source.to_lowercase();
        self.marches
            .iter()
            .filter(|record| record.source().is_some_and(|s| s.to_lowercase() == wanted))
            .cloned()
            .collect()
    }
}
