use thiserror::Error;

/// Raised while building the telemetry store. Fatal at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to read telemetry file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Telemetry dataset is malformed: {0}")]
    Malformed(String),

    #[error("Record {index} is not a JSON object")]
    NotAnObject { index: usize },

    /// Missing field or wrong field type, as reported by the decoder.
    #[error("Record {index} is invalid: {message}")]
    InvalidRecord { index: usize, message: String },

    #[error("Record {index} field `{field}` is out of range: {value}")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// A record reached aggregation with a value load validation should have rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidDataError {
    #[error("Record has non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}
