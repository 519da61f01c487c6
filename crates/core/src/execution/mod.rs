//! Single-request execution
//!
//! This module provides the ports a transport adapter implements and the
//! retrying executor built on top of them.

pub mod executor;
pub mod ports;

pub use executor::{ExecutorStats, RetryingExecutor};
pub use ports::{RequestExecutor, Transport};
