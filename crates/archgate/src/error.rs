//! Error types for archgate operations.
//!
//! Errors fall into two groups:
//!
//! - **Configuration errors**: the configuration could not be read or is
//!   structurally invalid (bad pattern, duplicate package).
//! - **Protocol errors**: the event stream driving a session violated the
//!   session's preconditions (a reference before any package was entered).
//!
//! Architecture violations are *not* errors. They are expected outcomes of a
//! validation run and surface as [`Finding`](crate::Finding) values instead.

use thiserror::Error;

/// Result type for archgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for archgate operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A line of an event stream could not be decoded
    #[error("invalid event on line {line}: {source}")]
    InvalidEvent {
        /// 1-based line number
        line: usize,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },

    /// A whitelist pattern could not be parsed
    #[error("invalid package pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern text
        pattern: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// The same package was declared more than once
    #[error("package '{0}' is declared more than once")]
    DuplicatePackage(String),

    /// A reference was observed before any package was entered
    #[error("reference observed with no current package")]
    NoCurrentPackage,

    /// An event was offered to a session that has no configuration
    #[error("no dependency configuration available")]
    MissingConfiguration,
}
