//! Error types for the quality audit.
//!
//! Every fallible operation of the library returns [`AuditError`]. Errors are
//! serializable so the CLI can print them as JSON next to its `--json` output.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the audit engine.
#[derive(Error, Debug)]
pub enum AuditError {
    /// The JSON Schema does not have the expected `anyOf`/definition layout.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A date field could not be parsed as `YYYY-MM-DD`.
    #[error("Invalid date '{value}': {reason}")]
    DateFormat { value: String, reason: String },

    /// No audit result exists for the requested source.
    #[error("No audit results for source '{0}'")]
    NotFound(String),

    /// The JSON Schema could not be compiled.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A persisted audit artifact does not have the expected shape.
    #[error("Invalid audit artifact: {0}")]
    InvalidArtifact(String),

    /// An audit result was assembled without exactly one measure per dimension.
    #[error("Invalid measures: {0}")]
    InvalidMeasures(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error (only with the "download" feature).
    #[cfg(feature = "download")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AuditError>,
    },
}

impl AuditError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AuditError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code, used by the CLI's JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::DateFormat { .. } => "DATE_FORMAT_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidSchema(_) => "INVALID_SCHEMA",
            Self::InvalidArtifact(_) => "INVALID_ARTIFACT",
            Self::InvalidMeasures(_) => "INVALID_MEASURES",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Toml(_) => "TOML_ERROR",
            #[cfg(feature = "download")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error leaves the audit run able to continue.
    ///
    /// Only a failed lookup is recoverable; every other error aborts the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for AuditError {
    fn from(err: ConfigValidationError) -> Self {
        AuditError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AuditError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AuditError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AuditError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AuditError::Io(e).with_context(context))
    }
}
