//! Error types for glreview.

use thiserror::Error;

/// Main error type for glreview operations.
///
/// The `Display` text of each variant is what a tool caller sees, so
/// variants that wrap a collaborator's message print it unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection, DNS, or TLS failure before a response arrived
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// GitLab answered with a non-200 status
    #[error("GitLab API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Response body was not the JSON shape we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// `git` could not report the current branch
    #[error("{0}")]
    Branch(String),

    /// A tool was called with missing or malformed arguments
    #[error("{0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Result type alias for glreview operations.
pub type Result<T> = std::result::Result<T, Error>;
