//! Batch fan-out over a [`RequestExecutor`].
//!
//! Every item runs on its own task behind a shared semaphore, so the number of
//! requests in flight never exceeds the configured limit. Results come back in
//! input order whatever the completion order was.

use std::any::Any;
use std::sync::Arc;

use adflow_domain::constants::DEFAULT_BATCH_CONCURRENCY;
use adflow_domain::{BatchItem, BatchResult, ErrorKind, Failure, FailureOrigin, Outcome, Request};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{error, info, instrument};

use crate::execution::RequestExecutor;

pub struct BatchOrchestrator<E: ?Sized> {
    executor: Arc<E>,
    concurrency_limit: usize,
}

impl<E: ?Sized> Clone for BatchOrchestrator<E> {
    fn clone(&self) -> Self {
        Self { executor: Arc::clone(&self.executor), concurrency_limit: self.concurrency_limit }
    }
}

impl<E> BatchOrchestrator<E>
where
    E: RequestExecutor + ?Sized + 'static,
{
    /// Orchestrator with the default limit of concurrent requests.
    pub fn new(executor: Arc<E>) -> Self {
        Self { executor, concurrency_limit: DEFAULT_BATCH_CONCURRENCY }
    }

    /// Limit is clamped to at least one.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Lift the limit entirely: every item is dispatched at once.
    #[must_use]
    pub const fn unbounded(mut self) -> Self {
        self.concurrency_limit = Semaphore::MAX_PERMITS;
        self
    }

    pub const fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    /// Execute every item and pair each outcome with its identifier.
    ///
    /// Never fails as a whole. An item whose task panics gets a `Generic`
    /// client-side failure; its siblings are unaffected.
    #[instrument(skip(self, items), fields(items = items.len(), limit = self.concurrency_limit))]
    pub async fn execute_batch<I>(&self, items: Vec<(I, Request)>) -> BatchResult<I>
    where
        I: Send + 'static,
    {
        if items.is_empty() {
            return BatchResult::new(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut ids = Vec::with_capacity(items.len());
        let mut handles = Vec::with_capacity(items.len());

        for (id, request) in items {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            ids.push(id);
            handles.push(tokio::spawn(async move {
                // never closed while the batch is running
                let _permit = semaphore.acquire_owned().await.ok();
                executor.execute(&request).await
            }));
        }

        let joined = join_all(handles).await;
        let items: Vec<BatchItem<I>> = ids
            .into_iter()
            .zip(joined)
            .map(|(id, joined)| {
                let outcome = joined.unwrap_or_else(crashed_item);
                BatchItem::new(id, outcome)
            })
            .collect();

        let result = BatchResult::new(items);
        info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "batch complete"
        );
        result
    }
}

fn crashed_item(err: JoinError) -> Outcome {
    let message = if err.is_panic() {
        let payload = err.into_panic();
        format!("batch item panicked: {}", panic_message(payload.as_ref()))
    } else {
        format!("batch item did not complete: {err}")
    };
    error!(%message, "batch item task failed");
    Outcome::failure(Failure::new(ErrorKind::Generic, message, FailureOrigin::Client))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
