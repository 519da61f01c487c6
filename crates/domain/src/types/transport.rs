//! Raw transport types exchanged between a transport adapter and the
//! normalizer.
//!
//! These describe what came off the wire as plain data, so normalization and
//! retry logic stay testable without a socket.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::impl_domain_enum_conversions;

/// A response as read from the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value with a case-insensitive name match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

/// Why a request produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailureKind {
    /// The per-request deadline elapsed.
    Timeout,
    /// Connection refused, DNS failure, TLS handshake failure.
    Connect,
    /// The request could not be built or sent.
    Request,
    /// The response body could not be read.
    Body,
    /// The transport was torn down or never initialized.
    Closed,
    /// Anything the adapter could not classify.
    Other,
}

impl_domain_enum_conversions!(TransportFailureKind {
    Timeout => "timeout",
    Connect => "connect",
    Request => "request",
    Body => "body",
    Closed => "closed",
    Other => "other",
});

/// A transport-level failure with the underlying message preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportFailureKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportFailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportFailureKind::Connect, message)
    }

    pub fn closed() -> Self {
        Self::new(
            TransportFailureKind::Closed,
            "client not initialized: connection pool is closed",
        )
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let response = RawResponse::new(429, "").with_header("Retry-After", "30");
        assert_eq!(response.header("retry-after"), Some("30"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn closed_failure_mentions_initialization() {
        let failure = TransportFailure::closed();
        assert_eq!(failure.kind, TransportFailureKind::Closed);
        assert!(failure.to_string().starts_with("closed failure"));
        assert!(failure.message.contains("not initialized"));
    }
}
