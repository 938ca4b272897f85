//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur during HTTP request parsing.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP method in the request is not supported.
    #[error("Unsupported method ('{0}')")]
    InvalidMethod(String),

    /// The request target is not an origin-form path.
    #[error("Invalid request target: {0}")]
    InvalidPath(String),

    /// The request line is malformed (wrong format or missing components).
    #[error("Bad request syntax ('{0}')")]
    MalformedRequestLine(String),

    /// The HTTP version in the request is not supported.
    #[error("Bad request version ('{0}')")]
    InvalidVersion(String),

    /// A header line has no colon separator.
    #[error("Invalid header format: {0}")]
    InvalidHeaderFormat(String),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,
}
