//! Conversions from external infrastructure errors into domain values.
//!
//! `reqwest` failures that happen while talking to the upstream become
//! [`TransportFailure`]s so they flow through normalization like any other
//! outcome. Failures while setting the transport up become [`AdflowError`]s.

use adflow_domain::{AdflowError, TransportFailure, TransportFailureKind};
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AdflowError);

impl From<InfraError> for AdflowError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AdflowError> for InfraError {
    fn from(value: AdflowError) -> Self {
        Self(value)
    }
}

/// Extension trait for classifying a transport error by what went wrong on
/// the wire.
pub trait IntoTransportFailure {
    fn into_transport_failure(self) -> TransportFailure;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportFailure */
/* -------------------------------------------------------------------------- */

impl IntoTransportFailure for HttpError {
    fn into_transport_failure(self) -> TransportFailure {
        let kind = if self.is_timeout() {
            TransportFailureKind::Timeout
        } else if self.is_connect() {
            TransportFailureKind::Connect
        } else if self.is_body() || self.is_decode() {
            TransportFailureKind::Body
        } else if self.is_request() || self.is_builder() || self.is_redirect() {
            TransportFailureKind::Request
        } else {
            TransportFailureKind::Other
        };

        TransportFailure::new(kind, describe(&self))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AdflowError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let message = describe(&value);
        if value.is_builder() {
            return Self(AdflowError::Config(format!("HTTP client could not be built: {message}")));
        }
        Self(AdflowError::Network(message))
    }
}

/// Error text with its source chain, which is where reqwest keeps the useful
/// part ("connection refused", "dns error").
fn describe(err: &HttpError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
