use thiserror::Error;

use crate::data::schema::ColumnType;

// ---------------------------------------------------------------------------
// Decoding: one line → DecodedRecord
// ---------------------------------------------------------------------------

/// Failure to turn a delimited line into a [`crate::data::model::DecodedRecord`].
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The line does not split into exactly the schema's column count.
    #[error("expected {expected} fields, found {found}")]
    SchemaMismatch { expected: usize, found: usize },

    /// A non-empty field could not be coerced to its declared type.
    #[error("column {index} ({column}): '{value}' is not a valid {kind}")]
    InvalidField {
        index: usize,
        column: &'static str,
        kind: ColumnType,
        value: String,
    },

    /// The input holds a second record after the first line.
    #[error("expected a single line, found more records after it")]
    MultipleRecords,

    #[error("splitting line: {0}")]
    Csv(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// Projection: DecodedRecord → tensors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    /// Class code outside the vocabulary range.
    #[error("pitch code {code} is outside the vocabulary of {classes} classes")]
    Encoding { code: i32, classes: usize },

    /// A projected position does not hold the type the schema declares.
    #[error("column {index} ({column}) does not hold a {expected} value")]
    ColumnType {
        index: usize,
        column: &'static str,
        expected: ColumnType,
    },
}

// ---------------------------------------------------------------------------
// Loading: file / reader → records
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("header mismatch at column {index}: expected '{expected}', found '{found}'")]
    Header {
        index: usize,
        expected: &'static str,
        found: String,
    },

    #[error("line {line}: {source}")]
    Decode {
        line: u64,
        #[source]
        source: DecodeError,
    },

    #[error("line {line}: {source}")]
    Projection {
        line: u64,
        #[source]
        source: ProjectionError,
    },

    #[error("dataset error: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
