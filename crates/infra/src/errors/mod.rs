//! Error translation at the infrastructure boundary.

pub mod conversions;

pub use conversions::{InfraError, IntoTransportFailure};
