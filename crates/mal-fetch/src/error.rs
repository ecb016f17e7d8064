//! Classified errors returned by every fetch.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for fetch and provider operations
pub type Result<T> = std::result::Result<T, MalError>;

/// What went wrong, coarse enough for callers to branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Unexpected HTTP status, or a transport failure that is not retried
    NonOkStatus,
    /// The body arrived but could not be decoded
    BadPayload,
    /// Explicit absence; only set by consumers that reinterpret a 404
    NotFound,
    /// Retryable network failure that ran out of retries
    TransportTransient,
    /// The queue refused admission
    CapacityExceeded,
}

impl ErrorKind {
    /// Numeric code shipped to API clients
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::NonOkStatus => 0,
            ErrorKind::BadPayload => 1,
            ErrorKind::NotFound => 2,
            ErrorKind::TransportTransient => 3,
            ErrorKind::CapacityExceeded => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NonOkStatus => "non_ok_status",
            ErrorKind::BadPayload => "bad_payload",
            ErrorKind::NotFound => "not_found",
            ErrorKind::TransportTransient => "transport_transient",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
        }
    }
}

/// Failure of a fetch, as seen by callers.
///
/// Carries only the classification; the HTTP response and body stay inside
/// the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("Error {} (status {}): {}", .kind.code(), .status_code, .message)]
pub struct MalError {
    pub message: String,
    /// HTTP status, 0 when no response was received
    pub status_code: u16,
    pub url: Option<String>,
    pub kind: ErrorKind,
}

impl MalError {
    pub fn new(
        message: impl Into<String>,
        status_code: u16,
        url: Option<String>,
        kind: ErrorKind,
    ) -> Self {
        Self {
            message: message.into(),
            status_code,
            url,
            kind,
        }
    }

    /// Error for a non-200 response
    pub fn from_status(status: StatusCode, url: &str) -> Self {
        Self::new(
            status.canonical_reason().unwrap_or("Unknown status"),
            status.as_u16(),
            Some(url.to_string()),
            ErrorKind::NonOkStatus,
        )
    }

    /// Error for a body that could not be decoded
    pub fn bad_payload(url: &str, message: impl Into<String>) -> Self {
        Self::new(message, 200, Some(url.to_string()), ErrorKind::BadPayload)
    }

    pub fn not_found(url: &str) -> Self {
        Self::new("Not Found", 404, Some(url.to_string()), ErrorKind::NotFound)
    }

    pub(crate) fn capacity_exceeded(max_depth: usize) -> Self {
        Self::new(
            format!("queue is full ({} tasks pending or running)", max_depth),
            0,
            None,
            ErrorKind::CapacityExceeded,
        )
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
            || (self.kind == ErrorKind::NonOkStatus && self.status_code == 404)
    }

    /// Reclassify a plain 404 as `NotFound`.
    ///
    /// The fetcher never does this itself; providers call it where a missing
    /// page means "no such entity".
    pub fn into_not_found(mut self) -> Self {
        if self.kind == ErrorKind::NonOkStatus && self.status_code == 404 {
            self.kind = ErrorKind::NotFound;
        }
        self
    }
}
