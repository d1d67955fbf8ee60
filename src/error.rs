/// Error types for cell generation and record-count aggregation

use thiserror::Error;

/// Errors surfaced by `seeh3`.
///
/// Geometry and cell generation never fail (degenerate input yields empty
/// cell sets); everything here is either rejected input or a failed
/// exchange with the aggregation service.
#[derive(Error, Debug)]
pub enum SeeH3Error {
    /// Bounding box literal or other request parameter could not be parsed.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Network-level failure talking to the aggregation service.
    #[error("Aggregation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Aggregation service answered with a non-success HTTP status.
    #[error("Aggregation service returned HTTP {status}: {body}")]
    ServiceStatus { status: u16, body: String },

    /// Aggregation response was not the expected JSON shape.
    #[error("Malformed aggregation response: {0}")]
    MalformedResponse(String),

    /// Aggregation service reported an exception inside an otherwise valid response.
    #[error("Aggregation service error: {0}")]
    ServiceException(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for `seeh3` operations.
pub type Result<T> = std::result::Result<T, SeeH3Error>;
