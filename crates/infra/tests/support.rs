//! Shared helpers for infra integration tests.

#![allow(dead_code)]

use adflow_domain::ClientConfig;
use adflow_infra::AdvertiserClient;
use wiremock::MockServer;

pub const TOKEN: &str = "integration-token";

/// Config pointed at `server` with millisecond backoff so retry tests stay
/// fast on the wall clock.
pub fn fast_config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(TOKEN).with_base_url(server.uri());
    config.timeout_secs = 5;
    config.retry.base_delay_ms = 10;
    config.retry.max_delay_ms = 40;
    config
}

pub fn client(server: &MockServer) -> AdvertiserClient {
    AdvertiserClient::connect(fast_config(server)).expect("client should connect")
}

/// Number of requests the mock server saw for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}
