//! Advertiser API surface.
//!
//! A thin layer of request builders over the retrying executor and the batch
//! orchestrator. Every call answers with an [`Outcome`](adflow_domain::Outcome);
//! nothing here retries or classifies on its own.

pub mod client;
pub mod health;

pub use client::AdvertiserClient;
pub use health::{AccountInfo, HealthReport};
