//! The uniform result envelope for one logical request.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ErrorKind;

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    /// Decoded JSON document.
    Json(Value),
    /// Raw text when the body was not JSON (or was empty).
    Text(String),
}

impl Payload {
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Json(value) => value.is_null(),
            Self::Text(text) => text.trim().is_empty(),
        }
    }
}

/// Where a failure was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureOrigin {
    /// The upstream answered with a non-success status or an unusable body.
    Response,
    /// The request never got a response (connect, DNS, timeout, body read).
    Transport,
    /// Local contract failure: pool closed, task panicked. Never retried.
    Client,
}

/// A terminal or intermediate failure with enough context to render a
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    pub details: Option<Value>,
    pub origin: FailureOrigin,
    /// Parsed `Retry-After` header, when the upstream sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<Duration>,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>, origin: FailureOrigin) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            details: None,
            origin,
            retry_after: None,
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub const fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub const fn is_transport(&self) -> bool {
        matches!(self.origin, FailureOrigin::Transport)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(status) = self.status_code {
            write!(f, " | Status: {status}")?;
        }
        write!(f, " | Kind: {}", self.kind)
    }
}

impl std::error::Error for Failure {}

/// Outcome of one logical request: exactly one of success or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success { status_code: u16, payload: Payload },
    Failure(Failure),
}

impl Outcome {
    pub const fn success(status_code: u16, payload: Payload) -> Self {
        Self::Success { status_code, payload }
    }

    pub const fn failure(failure: Failure) -> Self {
        Self::Failure(failure)
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub const fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. } => Some(*status_code),
            Self::Failure(failure) => failure.status_code,
        }
    }

    pub const fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure(_) => None,
        }
    }

    pub const fn failure_ref(&self) -> Option<&Failure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.failure_ref().map(|f| f.kind)
    }

    /// The balance value of a normalized balance response.
    pub fn balance(&self) -> Option<f64> {
        self.payload()?.as_json()?.get("balance")?.as_f64()
    }

    pub fn into_result(self) -> Result<Payload, Failure> {
        match self {
            Self::Success { payload, .. } => Ok(payload),
            Self::Failure(failure) => Err(failure),
        }
    }
}
