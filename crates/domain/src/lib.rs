//! # Adflow Domain
//!
//! Value types shared by every Adflow crate.
//!
//! This crate contains:
//! - Request descriptors and the `Outcome` result envelope
//! - The error taxonomy kinds and the domain error type
//! - Retry policy and batch result types
//! - Configuration structures and constants
//! - Campaign and statistics payload types
//!
//! ## Architecture
//! - No dependencies on other Adflow crates
//! - No I/O; everything here is a plain value

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
