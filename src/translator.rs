//! Classification of failed exchanges
//!
//! A SimpleVOC error response is a JSON object carrying a `message`. The
//! status code is kept for diagnostics but never used to classify.

use http::StatusCode;
use serde::Deserialize;

use crate::error::Error;

/// Message the server uses when a prefix lookup matches no keys
pub const PREFIX_NOT_FOUND: &str = "prefix not found";

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Turn a non-success response into an [`Error`].
///
/// A body without a string `message` field yields
/// [`Error::MalformedResponse`], never a store error.
pub fn translate(status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => Error::Store {
            status: status.as_u16(),
            message: parsed.message,
        },
        Err(e) => Error::MalformedResponse(format!(
            "unreadable error body (status {}): {}",
            status.as_u16(),
            e
        )),
    }
}
