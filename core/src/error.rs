//! Error types for the JSON client.
//!
//! # Design
//! `ApiError` is a closed set: every way a `perform` call can fail lands in
//! exactly one variant, so callers can match exhaustively. Transport-level
//! causes are classified separately in `TransportError` and wrapped into
//! `ApiError::TransportFailed`, except cancellation, which always surfaces
//! as `ApiError::Cancelled`.

use bytes::Bytes;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by `JsonClient` and `RequestDescriptor`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Base URL, path and query items did not compose into an absolute URL.
    /// Carries the string that was attempted.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request payload could not be serialized to JSON.
    #[error("request body encoding failed: {0}")]
    EncodingFailed(#[source] serde_json::Error),

    /// Connectivity, timeout, or any other transport-internal failure.
    #[error("transport failed: {0}")]
    TransportFailed(#[source] TransportError),

    /// The caller cancelled the in-flight call.
    #[error("request cancelled")]
    Cancelled,

    /// The server answered outside the 2xx band.
    #[error("HTTP {status}")]
    UnsuccessfulStatus { status: u16, body: Option<Bytes> },

    /// The response body did not decode into the expected shape.
    #[error("decoding failed: {source}")]
    DecodingFailed {
        #[source]
        source: serde_json::Error,
        body: Option<Bytes>,
    },
}

impl ApiError {
    /// The status code for `UnsuccessfulStatus`, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnsuccessfulStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw response body kept for diagnostics, if any.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            ApiError::UnsuccessfulStatus { body, .. } | ApiError::DecodingFailed { body, .. } => {
                body.as_ref()
            }
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::TransportFailed(TransportError::Timeout))
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => ApiError::Cancelled,
            other => ApiError::TransportFailed(other),
        }
    }
}

/// Failures reported by a `Transport` before any response was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(#[source] BoxError),

    /// The request could not be built, e.g. an invalid header name or
    /// value. Nothing was sent and resending cannot help.
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] BoxError),

    /// The transport observed a cancellation of the in-flight call.
    #[error("request cancelled by transport")]
    Cancelled,

    #[error("{0}")]
    Other(#[source] BoxError),
}

impl TransportError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        TransportError::Other(err.into())
    }

    /// Whether sending the same request again could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::InvalidRequest(_) | TransportError::Cancelled)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(Box::new(err))
        } else if err.is_connect() {
            TransportError::Connect(Box::new(err))
        } else {
            TransportError::Other(Box::new(err))
        }
    }
}

/// Empty bodies are not worth carrying around as diagnostics.
pub(crate) fn diagnostic_body(body: Bytes) -> Option<Bytes> {
    (!body.is_empty()).then_some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_cancellation_maps_to_cancelled() {
        let err = ApiError::from(TransportError::Cancelled);
        assert!(matches!(err, ApiError::Cancelled));
    }

    #[test]
    fn timeout_is_a_transport_failure() {
        let err = ApiError::from(TransportError::Timeout);
        assert!(matches!(err, ApiError::TransportFailed(TransportError::Timeout)));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "transport failed: request timed out");
    }

    #[test]
    fn unsuccessful_status_exposes_code_and_body() {
        let err = ApiError::UnsuccessfulStatus {
            status: 404,
            body: Some(Bytes::from_static(b"missing")),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.body().map(|b| &b[..]), Some(&b"missing"[..]));
        assert_eq!(err.to_string(), "HTTP 404");
    }

    #[test]
    fn malformed_requests_are_not_transient() {
        assert!(!TransportError::InvalidRequest("bad header".into()).is_transient());
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::other("reset").is_transient());
    }

    #[test]
    fn empty_bodies_are_dropped() {
        assert_eq!(diagnostic_body(Bytes::new()), None);
        assert_eq!(diagnostic_body(Bytes::from_static(b"x")), Some(Bytes::from_static(b"x")));
    }
}
