//! Error types for the SimpleVOC client

use std::io;
use thiserror::Error;

use crate::translator::PREFIX_NOT_FOUND;

/// Errors that can occur when talking to a SimpleVOC server
#[derive(Error, Debug)]
pub enum Error {
    /// A required argument (key or prefix) was empty. Raised before any I/O.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The server answered with a structured failure
    #[error("Store error (status {status}): {message}")]
    Store {
        /// HTTP status code, informational only
        status: u16,
        /// Message from the server's error body, verbatim
        message: String,
    },

    /// The server's response could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The outgoing request could not be built
    #[error("HTTP error: {0}")]
    Http(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// The server-supplied message, if this is a store error
    pub fn store_message(&self) -> Option<&str> {
        match self {
            Error::Store { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True if the server signalled that no key matches a prefix
    pub fn is_prefix_not_found(&self) -> bool {
        self.store_message() == Some(PREFIX_NOT_FOUND)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;
