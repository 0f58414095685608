//! Schema conformance of procurement records.
//!
//! [`SchemaValidator`] reports, per record `uid`, the rules of the market
//! definition a record breaks. [`classify_keyword`] maps the violated schema
//! keywords onto the quality defects they reveal.

mod validator;

pub use validator::{
    MARKET_DEFINITION, RecordViolations, SchemaValidator, SchemaViolations, ViolationDetail,
    audit_against_schema, locate_market_branch,
};

/// Kind of defect revealed by a violated schema keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    /// Malformed value (`minLength`, `maxLength`, `pattern`).
    Format,
    /// Value outside the allowed set or range (`enum`, `minimum`, `maximum`).
    Value,
    /// Missing field (`required`); counts as missing data and unfilled value.
    Missing,
    /// Any other keyword; not counted.
    Unclassified,
}

pub fn classify_keyword(keyword: &str) -> KeywordClass {
    match keyword {
        "minLength" | "maxLength" | "pattern" => KeywordClass::Format,
        "enum" | "minimum" | "maximum" => KeywordClass::Value,
        "required" => KeywordClass::Missing,
        _ => KeywordClass::Unclassified,
    }
}
