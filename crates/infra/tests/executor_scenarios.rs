//! End-to-end executor behavior against a mock upstream.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use adflow_domain::{ClientConfig, ErrorKind, FailureOrigin, Payload, StatisticsQuery};
use adflow_core::CircuitState;
use adflow_infra::AdvertiserClient;
use serde_json::json;
use support::{client, fast_config, hits, TOKEN};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn balance_quoted_number_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adv/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"500.25\""))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).get_balance().await;

    assert!(outcome.is_success());
    assert_eq!(outcome.balance(), Some(500.25));
}

#[tokio::test]
async fn server_errors_are_attempted_max_attempts_times() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adv/campaigns/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    let started = Instant::now();
    let outcome = client.get_campaign(1).await;

    let failure = outcome.failure_ref().expect("terminal failure");
    assert_eq!(failure.kind, ErrorKind::Server);
    assert_eq!(failure.status_code, Some(500));
    assert_eq!(failure.message, "db down");
    assert_eq!(hits(&server, "/adv/campaigns/1").await, 3);
    // backoff of 10ms then 20ms
    assert!(started.elapsed() >= Duration::from_millis(30));

    let stats = client.stats();
    assert_eq!((stats.requests, stats.errors, stats.attempts), (1, 1, 3));
}

#[tokio::test]
async fn batch_keeps_input_order_with_mixed_results() {
    let server = MockServer::start().await;
    for id in [1, 3] {
        Mock::given(method("GET"))
            .and(path(format!("/adv/campaigns/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": id})))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/adv/campaigns/2"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "no such campaign"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).batch_get_campaigns(&[1, 2, 3]).await;

    assert_eq!(result.len(), 3);
    let items = result.into_items();
    assert_eq!(items.iter().map(|item| item.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(items[0].outcome.is_success());
    assert_eq!(items[1].outcome.kind(), Some(ErrorKind::NotFound));
    assert_eq!(items[1].outcome.failure_ref().unwrap().message, "no such campaign");
    assert!(items[2].outcome.is_success());
    assert_eq!(items[2].outcome.payload(), Some(&Payload::Json(json!({"id": 3}))));
}

#[tokio::test]
async fn rate_limited_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/adv/statistics"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .expect(1)
        .mount(&server)
        .await;

    let query = StatisticsQuery::new("2024-01-01 00:00:00", "2024-01-31 23:59:59");
    let outcome = client(&server).get_statistics(&query).await;

    let failure = outcome.failure_ref().expect("rate limited failure");
    assert_eq!(failure.kind, ErrorKind::RateLimited);
    assert_eq!(failure.retry_after, Some(Duration::from_secs(12)));
    assert_eq!(hits(&server, "/adv/statistics").await, 1);
}

#[tokio::test]
async fn not_found_is_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(path("/adv/campaigns/404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).get_campaign(404).await;

    assert_eq!(outcome.kind(), Some(ErrorKind::NotFound));
    assert_eq!(outcome.status_code(), Some(404));
}

#[tokio::test]
async fn recovers_after_transient_server_error() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    Mock::given(method("GET"))
        .and(path("/adv/campaigns"))
        .respond_with(move |_req: &wiremock::Request| -> ResponseTemplate {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"result": []}))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let outcome = client(&server).list_campaigns([("page", "1")]).await;

    assert!(outcome.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn slow_upstream_times_out_and_is_retried() {
    let server = MockServer::start().await;
    Mock::given(path("/adv/balance"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = fast_config(&server);
    config.timeout_secs = 1;
    config.retry.max_attempts = 2;
    let client = AdvertiserClient::connect(config).unwrap();

    let outcome = client.get_balance().await;

    let failure = outcome.failure_ref().expect("timeout failure");
    assert_eq!(failure.kind, ErrorKind::Timeout);
    assert_eq!(failure.origin, FailureOrigin::Transport);
    assert_eq!(client.stats().attempts, 2);
}

#[tokio::test]
async fn every_call_carries_required_headers() {
    let server = MockServer::start().await;
    Mock::given(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.get_campaign(5).await.is_success());
    assert!(client.start_campaigns(vec![5]).await.is_success());
}

#[tokio::test]
async fn unreachable_upstream_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = ClientConfig::new(TOKEN).with_base_url(format!("http://{addr}"));
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 2;
    let client = AdvertiserClient::connect(config).unwrap();

    let outcome = client.get_balance().await;

    let failure = outcome.failure_ref().expect("transport failure");
    assert_eq!(failure.kind, ErrorKind::Generic);
    assert_eq!(failure.origin, FailureOrigin::Transport);
    assert!(failure.details.as_ref().unwrap()["error"].is_string());
    assert_eq!(client.stats().attempts, 3);
}

#[tokio::test]
async fn open_circuit_stops_hitting_a_failing_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adv/campaigns/5"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = fast_config(&server);
    config.circuit_breaker.enabled = true;
    config.circuit_breaker.failure_threshold = 2;
    let client = AdvertiserClient::connect(config).expect("client should connect");
    assert_eq!(client.circuit_state(), Some(CircuitState::Closed));

    let outcome = client.get_campaign(5).await;
    assert_eq!(outcome.failure_ref().map(|f| f.origin), Some(FailureOrigin::Client));
    assert_eq!(client.circuit_state(), Some(CircuitState::Open));

    let outcome = client.get_campaign(5).await;
    let failure = outcome.failure_ref().expect("refused locally");
    assert_eq!(failure.kind, ErrorKind::Generic);
    assert_eq!(failure.origin, FailureOrigin::Client);
    assert_eq!(hits(&server, "/adv/campaigns/5").await, 2);
}

#[tokio::test]
async fn rate_limited_client_still_completes_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/adv/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"10\""))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = fast_config(&server);
    config.rate_limit.enabled = true;
    let client = AdvertiserClient::connect(config).expect("client should connect");

    for _ in 0..3 {
        assert_eq!(client.get_balance().await.balance(), Some(10.0));
    }
    assert_eq!(client.circuit_state(), None);
}
