//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;
use crate::server::response::{HttpResponse, StatusCode};

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error, either on the socket or while reading a served file.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// Requested resource not found. Carries the message shown to the client.
    #[error("{0}")]
    NotFound(String),

    /// The method is recognized but not served, or not recognized at all.
    #[error("Unsupported method ('{0}')")]
    UnsupportedMethod(String),

    /// The request head did not fit in the read buffer.
    #[error("Request head exceeds {0} bytes")]
    RequestTooLarge(usize),
}

impl Error {
    /// The status code this error is answered with.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::ParseError(ParserError::InvalidMethod(_)) | Error::UnsupportedMethod(_) => {
                StatusCode::NotImplemented
            }
            Error::ParseError(_) | Error::RequestTooLarge(_) => StatusCode::BadRequest,
            Error::NotFound(_) => StatusCode::NotFound,
            Error::IoError(_) => StatusCode::InternalServerError,
        }
    }

    /// Build the response sent to the client for this error.
    ///
    /// Server errors are answered with the error text as a plain-text body
    /// when `expose_details` is set, and with the bare reason phrase
    /// otherwise.
    pub fn to_response(&self, expose_details: bool) -> HttpResponse {
        let status = self.status();
        match self {
            Error::ParseError(e) => HttpResponse::error_page(status, &e.to_string()),
            Error::NotFound(message) => HttpResponse::error_page(status, message),
            Error::UnsupportedMethod(_) | Error::RequestTooLarge(_) => HttpResponse::error_page(status, &self.to_string()),
            Error::IoError(_) => {
                let body = if expose_details {
                    self.to_string()
                } else {
                    status.reason_phrase().to_string()
                };
                HttpResponse::new(status)
                    .with_content_type("text/plain; charset=utf-8")
                    .with_body_string(body)
            }
        }
    }
}
