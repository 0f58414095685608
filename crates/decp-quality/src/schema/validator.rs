use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::dataset::Record;
use crate::error::{AuditError, Result};

/// Name of the schema definition describing a valid market record.
pub const MARKET_DEFINITION: &str = "marche";

/// Keywords whose violation reveals a nested, per-branch error tree that is
/// not broken down any further.
const COMBINATOR_KEYWORDS: [&str; 3] = ["anyOf", "oneOf", "allOf"];

/// One violated rule of the market schema branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationDetail {
    pub message: String,
    /// Schema keyword that failed (`required`, `pattern`, `enum`...).
    pub validator: String,
}

/// Every rule a record broke, plus the distinct keywords involved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordViolations {
    pub errors: Vec<ViolationDetail>,
    pub failed_validators: BTreeSet<String>,
}

/// Violations keyed by record `uid`. Records that validate are absent.
pub type SchemaViolations = HashMap<String, RecordViolations>;

/// Compiled schema able to explain why records are not valid markets.
///
/// Validation runs in two levels: a record is first checked against every
/// `anyOf` branch of `marches.items`; only when no branch accepts it are the
/// violations of the market branch collected. Violations from sibling
/// branches (other record kinds) are never reported.
pub struct SchemaValidator {
    item_validator: Validator,
    market_validator: Validator,
    market_branch: usize,
}

impl SchemaValidator {
    /// Compile the validators for `schema`.
    ///
    /// Fails with [`AuditError::Configuration`] when `marches.items.anyOf` is
    /// missing or has no branch referencing the market definition.
    pub fn new(schema: &Value) -> Result<Self> {
        let branches = item_branches(schema)?;
        let market_branch = locate_market_branch(branches)?;
        let market_ref = branches[market_branch]
            .get("$ref")
            .cloned()
            .unwrap_or(Value::Null);

        let draft = detect_draft(schema);
        debug!(
            "Compiling schema ({:?}), market branch at anyOf index {}",
            draft, market_branch
        );

        let item_schema = rooted_schema(schema, "anyOf", Value::Array(branches.clone()));
        let market_schema = rooted_schema(
            schema,
            "allOf",
            Value::Array(vec![Value::Object(Map::from_iter([(
                "$ref".to_string(),
                market_ref,
            )]))]),
        );

        Ok(Self {
            item_validator: compile(&item_schema, draft)?,
            market_validator: compile(&market_schema, draft)?,
            market_branch,
        })
    }

    /// Index of the market branch within `marches.items.anyOf`.
    pub fn market_branch(&self) -> usize {
        self.market_branch
    }

    /// Collect the market-branch violations of every invalid record.
    ///
    /// An empty input returns an empty mapping without running validation.
    /// When two records share a `uid`, the later one's violations win.
    pub fn validate(&self, records: &[Record]) -> SchemaViolations {
        let mut violations = SchemaViolations::new();
        if records.is_empty() {
            return violations;
        }

        for record in records {
            let instance = record.to_value();
            if self.item_validator.is_valid(&instance) {
                continue;
            }

            let uid = record.uid().unwrap_or_default();
            let mut result = RecordViolations::default();

            for error in self.market_validator.iter_errors(&instance) {
                let schema_path = error.schema_path().to_string();
                let Some(keyword) = keyword_of(&schema_path) else {
                    warn!(
                        "Unexpected quality defects may have been omitted (record {}, schema path '{}')",
                        uid, schema_path
                    );
                    continue;
                };
                if COMBINATOR_KEYWORDS.contains(&keyword) {
                    warn!(
                        "Unexpected quality defects may have been omitted (record {}, nested '{}')",
                        uid, keyword
                    );
                }
                result.failed_validators.insert(keyword.to_string());
                result.errors.push(ViolationDetail {
                    message: error.to_string(),
                    validator: keyword.to_string(),
                });
            }

            if result.errors.is_empty() {
                warn!(
                    "Unexpected quality defects may have been omitted (record {} matches no record kind)",
                    uid
                );
            }
            violations.insert(uid, result);
        }

        violations
    }
}

/// Validate `records` against `schema` in one call.
///
/// Returns an empty mapping for an empty input without reading the schema.
pub fn audit_against_schema(records: &[Record], schema: &Value) -> Result<SchemaViolations> {
    if records.is_empty() {
        return Ok(SchemaViolations::new());
    }
    Ok(SchemaValidator::new(schema)?.validate(records))
}

fn item_branches(schema: &Value) -> Result<&Vec<Value>> {
    schema
        .pointer("/properties/marches/items/anyOf")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AuditError::Configuration(
                "schema has no properties.marches.items.anyOf list".to_string(),
            )
        })
}

/// Index of the `anyOf` branch referencing the market definition.
///
/// If several branches match, the last one is used.
pub fn locate_market_branch(branches: &[Value]) -> Result<usize> {
    let targets = [
        format!("#/definitions/{}", MARKET_DEFINITION),
        format!("#/$defs/{}", MARKET_DEFINITION),
    ];
    branches
        .iter()
        .rposition(|branch| {
            branch
                .get("$ref")
                .and_then(Value::as_str)
                .is_some_and(|r| targets.iter().any(|t| t == r))
        })
        .ok_or_else(|| {
            AuditError::Configuration(format!(
                "cannot find #/definitions/{} in properties.marches.items.anyOf",
                MARKET_DEFINITION
            ))
        })
}

/// Draft announced by `$schema`; draft-04 when absent or unknown.
fn detect_draft(schema: &Value) -> Draft {
    let declared = schema.get("$schema").and_then(Value::as_str).unwrap_or("");
    if declared.contains("draft-07") {
        Draft::Draft7
    } else if declared.contains("draft-06") {
        Draft::Draft6
    } else {
        Draft::Draft4
    }
}

/// A schema document keeping the root's definitions, whose top level is a
/// single combinator keyword.
fn rooted_schema(root: &Value, keyword: &str, body: Value) -> Value {
    let mut document = Map::new();
    for key in ["$schema", "definitions", "$defs"] {
        if let Some(value) = root.get(key) {
            document.insert(key.to_string(), value.clone());
        }
    }
    document.insert(keyword.to_string(), body);
    Value::Object(document)
}

fn compile(schema: &Value, draft: Draft) -> Result<Validator> {
    jsonschema::options()
        .with_draft(draft)
        .should_validate_formats(false)
        .build(schema)
        .map_err(|e| AuditError::InvalidSchema(e.to_string()))
}

/// Last keyword segment of a schema path such as
/// `/allOf/0/$ref/properties/montant/minimum`.
fn keyword_of(schema_path: &str) -> Option<&str> {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.chars().all(|c| c.is_ascii_digit()))
}
