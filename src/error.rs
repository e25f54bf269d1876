//! Error types for the solar exporter.
//!
//! Each component gets its own typed error so the poll loop can tell a
//! transient portal failure apart from a broken local store.

use thiserror::Error;

/// Result type alias using our custom error types.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type that encompasses all application errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("configuration error")]
    Config(#[from] ConfigError),

    /// Portal communication and parsing errors
    #[error("provider error")]
    Provider(#[from] ProviderError),

    /// Local daily series storage errors
    #[error("storage error")]
    Storage(#[from] StorageError),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable parsing failed
    #[error("failed to parse environment variables: {0}")]
    EnvParse(String),

    /// Required configuration value is missing
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// Configuration value is invalid
    #[error("invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },

    /// Sites file could not be read or decoded
    #[error("failed to load sites file '{path}': {message}")]
    File { path: String, message: String },
}

/// Errors raised by a provider protocol client during one poll.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP transport failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Login rejected or login response had an unexpected shape
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Portal answered with a non-success status
    #[error("unexpected HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// Response body did not match the expected schema
    #[error("failed to parse response")]
    Parse(#[from] ParseError),
}

/// Response schema errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Body is not the JSON we expected
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Array response held no elements
    #[error("empty array in response: {0}")]
    EmptyArray(String),

    /// Portal reported an error in an otherwise well-formed body
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A magnitude string could not be normalized
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Errors from parsing a string-encoded magnitude such as `"12.3 kWh"`.
#[derive(Error, Debug, PartialEq)]
pub enum FormatError {
    /// Nothing numeric left after stripping the unit
    #[error("no numeric value in '{0}'")]
    NoNumber(String),

    /// Remaining literal is not a decimal number
    #[error("failed to parse number from '{text}': {message}")]
    InvalidNumber { text: String, message: String },
}

/// Daily series store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite reported an error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Aggregation query against an empty series
    #[error("no records found")]
    NotFound,

    /// Store file or directory could not be prepared
    #[error("failed to open store at {path}: {message}")]
    Open { path: String, message: String },

    /// Connection mutex was poisoned by a panicking holder
    #[error("store connection lock poisoned")]
    Poisoned,

    /// Value that SQLite cannot keep as a REAL
    #[error("refusing to store non-finite value {value} for {date}")]
    NonFinite { date: String, value: f64 },
}

/// Errors ending one poll cycle.
#[derive(Error, Debug)]
pub enum PollError {
    /// Provider failed to deliver a status
    #[error("failed to fetch status")]
    Provider(#[from] ProviderError),

    /// Aggregation could not read or write the store
    #[error("failed to aggregate")]
    Storage(#[from] StorageError),

    /// Whole cycle exceeded its time budget
    #[error("cycle timed out after {0} seconds")]
    Timeout(u64),
}

impl ConfigError {
    /// Creates a new environment parse error.
    pub fn env_parse(err: impl std::fmt::Display) -> Self {
        Self::EnvParse(err.to_string())
    }

    /// Creates a new missing configuration error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }

    /// Creates a new invalid configuration error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a sites file error.
    pub fn file(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::File {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl ProviderError {
    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Creates an error from a non-success HTTP status and response body.
    pub fn http_status(status: reqwest::StatusCode, body: String) -> Self {
        Self::HttpStatus {
            status: status.as_u16(),
            message: body,
        }
    }

    /// Whether the portal told us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 429, .. })
    }
}

impl ParseError {
    /// Creates an empty array error.
    pub fn empty_array(what: impl Into<String>) -> Self {
        Self::EmptyArray(what.into())
    }

    /// Creates an unexpected response error.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse(message.into())
    }
}

impl FormatError {
    /// Creates a number parse error.
    pub fn invalid_number(text: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::InvalidNumber {
            text: text.into(),
            message: err.to_string(),
        }
    }
}

impl StorageError {
    /// Creates an open error.
    pub fn open(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Open {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl PollError {
    /// Whether this failure comes from the local store rather than the portal.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
