//! # Adflow Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest-backed `HttpTransport` that owns the connection pool
//! - Conversions from reqwest errors into transport failures
//! - Configuration loading from the environment and JSON/TOML files
//! - Tracing subscriber setup
//! - The advertiser API client built on top of all of the above
//!
//! ## Architecture
//! - Implements the `Transport` port defined in `adflow-core`
//! - Depends on `adflow-domain` and `adflow-core`
//! - Contains all "impure" code (network, environment, files)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{AccountInfo, AdvertiserClient, HealthReport};
pub use http::{HttpTransport, HttpTransportBuilder};
pub use observability::init_tracing;
