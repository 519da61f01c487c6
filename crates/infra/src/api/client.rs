//! Advertiser API client.

use std::sync::Arc;

use adflow_core::{
    BatchOrchestrator, CircuitBreaker, CircuitState, ExecutorStats, RequestExecutor,
    RetryingExecutor, TokenBucket,
};
use adflow_domain::constants::{BALANCE_PATH, CAMPAIGNS_PATH, COLLECTIONS_PATH, STATISTICS_PATH};
use adflow_domain::{
    AdflowError, BatchItem, BatchResult, CampaignBulkAction, CampaignRate, ClientConfig,
    Collection, ErrorKind, Failure, FailureOrigin, Outcome, Request, Result, StatisticsQuery,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use super::health::{AccountInfo, HealthReport};
use crate::http::HttpTransport;

type Executor = RetryingExecutor<HttpTransport>;

/// Client for the advertiser API.
///
/// Owns one connection pool, one retrying executor and one batch
/// orchestrator. Inputs that cannot form a valid request are answered with a
/// client-side `Failure` without touching the network.
pub struct AdvertiserClient {
    executor: Arc<Executor>,
    orchestrator: BatchOrchestrator<Executor>,
    config: ClientConfig,
}

impl AdvertiserClient {
    /// Validate `config` and build the pool, executor and orchestrator.
    ///
    /// # Errors
    /// Returns `AdflowError::Config` for invalid configuration.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let transport = HttpTransport::from_config(&config)?;
        let mut executor = RetryingExecutor::new(transport, config.retry_policy()?)
            .with_default_timeout(config.timeout());
        if config.rate_limit.enabled {
            let limiter = TokenBucket::from_settings(&config.rate_limit);
            executor = executor.with_rate_limiter(limiter);
        }
        if config.circuit_breaker.enabled {
            let breaker = CircuitBreaker::from_settings(&config.circuit_breaker);
            executor = executor.with_circuit_breaker(breaker);
        }
        let executor = Arc::new(executor);
        let orchestrator = BatchOrchestrator::new(Arc::clone(&executor))
            .with_concurrency_limit(config.batch.concurrency_limit);

        info!(
            base_url = %config.base_url_trimmed(),
            max_attempts = config.retry.max_attempts,
            concurrency = config.batch.concurrency_limit,
            rate_limit = config.rate_limit.enabled,
            circuit_breaker = config.circuit_breaker.enabled,
            "advertiser client connected"
        );

        Ok(Self { executor, orchestrator, config })
    }

    /// Release the connection pool. Later calls fail fast with a client-side
    /// `Generic` failure.
    pub fn shutdown(&self) {
        self.executor.transport().close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.executor.transport().is_closed()
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> ExecutorStats {
        self.executor.stats()
    }

    /// Circuit breaker state, or `None` when the breaker is disabled.
    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.executor.circuit_state()
    }

    pub const fn orchestrator(&self) -> &BatchOrchestrator<Executor> {
        &self.orchestrator
    }

    /// Run an arbitrary request through the executor.
    pub async fn execute(&self, request: &Request) -> Outcome {
        self.executor.execute(request).await
    }

    /* ---------------------------------------------------------------------- */
    /* Balance and campaigns */
    /* ---------------------------------------------------------------------- */

    /// `Success` carries `{"balance": <number>}`.
    pub async fn get_balance(&self) -> Outcome {
        self.send(Request::get(BALANCE_PATH)).await
    }

    pub async fn list_campaigns<K, V>(&self, filters: impl IntoIterator<Item = (K, V)>) -> Outcome
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = Request::get(CAMPAIGNS_PATH).map(|request| {
            filters.into_iter().fold(request, |request, (key, value)| request.with_query(key, value))
        });
        self.send(request).await
    }

    pub async fn get_campaign(&self, campaign_id: u64) -> Outcome {
        self.send(campaign_request(campaign_id)).await
    }

    pub async fn create_campaign<T: Serialize + ?Sized>(&self, campaign: &T) -> Outcome {
        self.send(Request::post(CAMPAIGNS_PATH).and_then(|r| r.with_json(campaign))).await
    }

    pub async fn update_campaign<T: Serialize + ?Sized>(
        &self,
        campaign_id: u64,
        update: &T,
    ) -> Outcome {
        self.send(update_request(campaign_id, update)).await
    }

    pub async fn start_campaigns(&self, campaign_ids: Vec<u64>) -> Outcome {
        self.send(bulk_request("play", campaign_ids)).await
    }

    pub async fn stop_campaigns(&self, campaign_ids: Vec<u64>) -> Outcome {
        self.send(bulk_request("stop", campaign_ids)).await
    }

    /* ---------------------------------------------------------------------- */
    /* Statistics and rates */
    /* ---------------------------------------------------------------------- */

    /// The query is validated before anything is sent.
    pub async fn get_statistics(&self, query: &StatisticsQuery) -> Outcome {
        let request = query
            .validate()
            .and_then(|()| Request::post(STATISTICS_PATH))
            .and_then(|request| request.with_json(query));
        self.send(request).await
    }

    pub async fn get_campaign_rates(&self, campaign_id: u64, only_active: bool) -> Outcome {
        self.send(rates_request(campaign_id, "rates", only_active)).await
    }

    pub async fn set_campaign_rates(&self, campaign_id: u64, rates: &[CampaignRate]) -> Outcome {
        let request = if rates.is_empty() {
            Err(AdflowError::InvalidInput("at least one rate is required".into()))
        } else {
            Request::put(format!("{CAMPAIGNS_PATH}/{campaign_id}/rates/"))
                .and_then(|request| request.with_json(&json!({ "rates": rates })))
        };
        self.send(request).await
    }

    pub async fn get_zone_rates(&self, campaign_id: u64, only_active: bool) -> Outcome {
        self.send(rates_request(campaign_id, "zone-rates", only_active)).await
    }

    /// Targeting reference data, e.g. the country list.
    pub async fn get_collection<K, V>(
        &self,
        collection: Collection,
        query: impl IntoIterator<Item = (K, V)>,
    ) -> Outcome
    where
        K: Into<String>,
        V: Into<String>,
    {
        let request = Request::get(format!("{COLLECTIONS_PATH}/{collection}")).map(|request| {
            query.into_iter().fold(request, |request, (key, value)| request.with_query(key, value))
        });
        self.send(request).await
    }

    /* ---------------------------------------------------------------------- */
    /* Batches */
    /* ---------------------------------------------------------------------- */

    /// One `get_campaign` per id, in input order.
    #[instrument(skip(self, campaign_ids), fields(count = campaign_ids.len()))]
    pub async fn batch_get_campaigns(&self, campaign_ids: &[u64]) -> BatchResult<u64> {
        let requests = campaign_ids.iter().map(|&id| (id, campaign_request(id))).collect();
        self.run_batch(requests).await
    }

    /// One `update_campaign` per `(id, update)` pair, in input order.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn batch_update_campaigns<T: Serialize>(
        &self,
        updates: &[(u64, T)],
    ) -> BatchResult<u64> {
        let requests = updates.iter().map(|(id, update)| (*id, update_request(*id, update))).collect();
        self.run_batch(requests).await
    }

    /* ---------------------------------------------------------------------- */
    /* Health */
    /* ---------------------------------------------------------------------- */

    /// Probe the balance endpoint and report it with the executor counters.
    pub async fn health_check(&self) -> HealthReport {
        let outcome = self.get_balance().await;
        let stats = self.stats();
        match (outcome.balance(), outcome.failure_ref()) {
            (Some(balance), _) => HealthReport::healthy(balance, stats),
            (None, Some(failure)) => {
                warn!(kind = %failure.kind, "health check failed");
                HealthReport::unhealthy(failure.to_string(), stats)
            }
            (None, None) => HealthReport::unhealthy("balance missing from response", stats),
        }
    }

    /// Balance, campaign total and counters in one summary.
    pub async fn account_info(&self) -> AccountInfo {
        let balance = self.get_balance().await.balance();
        let total_campaigns = self
            .list_campaigns([("page_size", "1")])
            .await
            .payload()
            .and_then(|payload| payload.as_json())
            .and_then(campaign_total);
        AccountInfo::new(balance, total_campaigns, self.stats())
    }

    async fn send(&self, request: Result<Request>) -> Outcome {
        match request {
            Ok(request) => self.executor.execute(&request).await,
            Err(err) => rejected(err),
        }
    }

    /// Fan out the buildable requests; the rest keep their slot with a
    /// client-side failure.
    async fn run_batch(&self, requests: Vec<(u64, Result<Request>)>) -> BatchResult<u64> {
        let mut slots: Vec<Option<BatchItem<u64>>> = Vec::with_capacity(requests.len());
        let mut runnable = Vec::new();

        for (position, (id, request)) in requests.into_iter().enumerate() {
            match request {
                Ok(request) => {
                    slots.push(None);
                    runnable.push(((position, id), request));
                }
                Err(err) => slots.push(Some(BatchItem::new(id, rejected(err)))),
            }
        }

        for item in self.orchestrator.execute_batch(runnable).await {
            let (position, id) = item.id;
            slots[position] = Some(BatchItem::new(id, item.outcome));
        }

        BatchResult::new(slots.into_iter().flatten().collect())
    }
}

impl Drop for AdvertiserClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn campaign_request(campaign_id: u64) -> Result<Request> {
    Request::get(format!("{CAMPAIGNS_PATH}/{campaign_id}"))
}

fn update_request<T: Serialize + ?Sized>(campaign_id: u64, update: &T) -> Result<Request> {
    Request::patch(format!("{CAMPAIGNS_PATH}/{campaign_id}")).and_then(|r| r.with_json(update))
}

fn bulk_request(action: &str, campaign_ids: Vec<u64>) -> Result<Request> {
    let body = CampaignBulkAction::new(campaign_ids)?;
    Request::put(format!("{CAMPAIGNS_PATH}/{action}"))?.with_json(&body)
}

fn rates_request(campaign_id: u64, kind: &str, only_active: bool) -> Result<Request> {
    Ok(Request::get(format!("{CAMPAIGNS_PATH}/{campaign_id}/{kind}/"))?
        .with_query("only_active", if only_active { "1" } else { "0" }))
}

fn campaign_total(body: &Value) -> Option<u64> {
    ["/data/total", "/result/total", "/total"]
        .iter()
        .find_map(|pointer| body.pointer(pointer))
        .and_then(Value::as_u64)
}

/// Outcome for a request that could not be built.
fn rejected(err: AdflowError) -> Outcome {
    let kind = match err {
        AdflowError::InvalidInput(_) => ErrorKind::Validation,
        _ => ErrorKind::Generic,
    };
    warn!(error = %err, "request rejected before sending");
    Outcome::failure(Failure::new(kind, err.to_string(), FailureOrigin::Client))
}
