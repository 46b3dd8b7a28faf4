//! Error types
//!
//! Field-level problems (`DocumentError`, `TransformError`) never escape
//! [`crate::extract`]; they are folded into the manifest. The rest are
//! returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while querying a document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// Selector could not be parsed
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// Backend-specific lookup failure (live pages, remote drivers)
    #[error("document backend error: {0}")]
    Backend(String),
}

/// Failure inside a post-processing step
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("pattern `{pattern}` did not match `{input}`")]
    NoMatch { pattern: String, input: String },

    #[error("pattern `{pattern}` has no capture group {group}")]
    MissingGroup { pattern: String, group: usize },
}

/// Invalid field configuration. Always a programming error, never document drift.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("field set is empty")]
    Empty,

    #[error("field name is empty")]
    EmptyName,

    #[error("duplicate field name `{0}`")]
    DuplicateField(String),

    #[error("field `{0}` has no selector candidates")]
    NoSelectors(String),

    #[error("field `{0}` has parts but cardinality `single`")]
    CompositeNotMany(String),

    #[error("composite field `{field}` has an unnamed sub-field")]
    EmptySubFieldName { field: String },

    #[error("composite field `{field}` declares sub-field `{sub_field}` twice")]
    DuplicateSubField { field: String, sub_field: String },

    #[error("sub-field `{field}.{sub_field}` has no selector candidates")]
    NoSubSelectors { field: String, sub_field: String },

    #[error(
        "sub-field `{field}.{sub_field}` has malformed selector `{selector}`: {reason}"
    )]
    MalformedSubSelector {
        field: String,
        sub_field: String,
        selector: String,
        reason: String,
    },

    #[error("default of field `{field}` does not fit cardinality `{cardinality}`")]
    DefaultShape { field: String, cardinality: String },

    /// Unmatched optional `many` fields resolve to an empty value
    #[error("`many` field `{0}` can only have an empty default")]
    ManyDefault(String),

    #[error("failed to parse field set: {0}")]
    Parse(String),
}

/// Failure raised by a reveal-more trigger
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("reveal control failed: {0}")]
    Trigger(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Crate-level error for callers that mix concerns (CLI, FFI)
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("failed to read field set {path}: {source}")]
    FieldsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
