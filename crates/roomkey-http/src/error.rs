//! Mapping of reqwest failures and error bodies onto roomkey errors.

use std::time::Duration;

use serde::Deserialize;

use roomkey_core::error::{StatusError, TransportError};

/// Error body as sent by the booking API.
///
/// `message` is a string for most errors and a list of strings for
/// validation failures.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorBody {
    pub(crate) fn into_status_error(self, status: u16) -> StatusError {
        let message = self.message.map(|m| match m {
            ErrorMessage::One(message) => message,
            ErrorMessage::Many(messages) => messages.join(", "),
        });
        StatusError::new(status, self.error, message)
    }
}

/// Build a status error from a raw error body.
pub(crate) fn status_error(status: u16, body: &[u8]) -> StatusError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.into_status_error(status),
        Err(_) => StatusError::bare(status),
    }
}

/// Classify a reqwest failure.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}
