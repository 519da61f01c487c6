//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::impl_domain_enum_conversions;

/// Main error type for Adflow.
///
/// Only construction-time and contract problems are reported this way.
/// Upstream HTTP and transport failures are values of
/// [`Outcome::Failure`](crate::Outcome) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AdflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Client not initialized: {0}")]
    NotInitialized(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Adflow operations
pub type Result<T> = std::result::Result<T, AdflowError>;

/// Typed failure kinds produced by the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 400: malformed request body or parameters
    Validation,
    /// 401: invalid or missing credential
    Authentication,
    /// 403: credential lacks permission
    Authorization,
    /// 404: resource or endpoint absent
    NotFound,
    /// 408 or a transport deadline
    Timeout,
    /// 429: upstream throttling
    RateLimited,
    /// 5xx
    Server,
    /// Anything else, including unexpected transport failures
    Generic,
}

impl_domain_enum_conversions!(ErrorKind {
    Validation => "validation",
    Authentication => "authentication",
    Authorization => "authorization",
    NotFound => "not_found",
    Timeout => "timeout",
    RateLimited => "rate_limited",
    Server => "server",
    Generic => "generic",
});

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Validation,
        Self::Authentication,
        Self::Authorization,
        Self::NotFound,
        Self::Timeout,
        Self::RateLimited,
        Self::Server,
        Self::Generic,
    ];

    /// Whether the kind is retried by the default policy.
    ///
    /// `Generic` is listed as transient, but the retry policy additionally
    /// requires a transport origin for it.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Server | Self::Generic)
    }
}
