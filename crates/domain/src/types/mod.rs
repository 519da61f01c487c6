//! Domain types and models

pub mod batch;
pub mod campaign;
pub mod outcome;
pub mod request;
pub mod retry;
pub mod statistics;
pub mod transport;

pub use batch::{BatchItem, BatchResult};
pub use campaign::{CampaignBulkAction, CampaignRate, Collection};
pub use outcome::{Failure, FailureOrigin, Outcome, Payload};
pub use request::{HttpMethod, Request};
pub use retry::{RetryPolicy, RetryPolicyBuilder};
pub use statistics::StatisticsQuery;
pub use transport::{RawResponse, TransportFailure, TransportFailureKind};
