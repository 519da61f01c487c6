//! Balance probe
//!
//! Loads configuration (environment, `.env`, or an `adflow.{json,toml}`
//! file), runs a health check and then fetches a few campaigns as a batch.
//!
//! ```bash
//! ADFLOW_API_TOKEN=... cargo run -p adflow-infra --example balance_probe -- 101 102 103
//! ```

use adflow_infra::{config, init_tracing, AdvertiserClient};
use anyhow::Context;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load().context("loading adflow configuration")?;
    init_tracing(&config.log);

    let campaign_ids = std::env::args()
        .skip(1)
        .map(|arg| arg.parse::<u64>().with_context(|| format!("invalid campaign id: {arg}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let client = AdvertiserClient::connect(config).context("connecting client")?;

    let report = client.health_check().await;
    if report.healthy {
        info!(balance = ?report.balance, "upstream healthy");
    } else {
        warn!(error = ?report.error, "upstream unhealthy");
    }

    if !campaign_ids.is_empty() {
        let result = client.batch_get_campaigns(&campaign_ids).await;
        for item in &result {
            match item.outcome.failure_ref() {
                None => info!(campaign_id = item.id, "campaign fetched"),
                Some(failure) => warn!(campaign_id = item.id, %failure, "campaign lookup failed"),
            }
        }
        info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            "batch finished"
        );
    }

    let stats = client.stats();
    info!(
        requests = stats.requests,
        errors = stats.errors,
        attempts = stats.attempts,
        error_rate = stats.error_rate(),
        "session summary"
    );

    client.shutdown();
    Ok(())
}
