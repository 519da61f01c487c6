//! Response normalizer: raw transport results into one [`Outcome`] shape.
//!
//! HTTP success always yields `Success`, whatever the body looks like. The
//! balance endpoint is the only special case: it answers with a bare quoted
//! number instead of a JSON object.

use std::time::Duration;

use adflow_domain::constants::BALANCE_PATH;
use adflow_domain::{
    ErrorKind, Failure, FailureOrigin, Outcome, Payload, RawResponse, Request, TransportFailure,
    TransportFailureKind,
};
use serde_json::{json, Value};

use crate::taxonomy::classify_response;

const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// Normalize a response that made it back from the upstream.
pub fn normalize(request: &Request, response: RawResponse) -> Outcome {
    let status = response.status;

    if SUCCESS_STATUSES.contains(&status) {
        if is_balance_endpoint(request) {
            return normalize_balance(status, &response.body);
        }
        return Outcome::success(status, decode_body(&response.body));
    }

    let body = decode_body(&response.body);
    let (kind, message) = classify_response(status, &body);
    let mut failure = Failure::new(kind, message, FailureOrigin::Response).with_status(status);

    match body {
        Payload::Json(Value::Null) => {}
        Payload::Json(value) => failure = failure.with_details(value),
        Payload::Text(text) if !text.trim().is_empty() => {
            failure = failure.with_details(json!({ "body": text }));
        }
        Payload::Text(_) => {}
    }

    if let Some(delay) = response.header("retry-after").and_then(parse_retry_after) {
        failure = failure.with_retry_after(delay);
    }

    Outcome::failure(failure)
}

/// Normalize a request that never produced a response.
pub fn normalize_transport_failure(request: &Request, failure: &TransportFailure) -> Outcome {
    let details = json!({ "error": failure.message, "transport": failure.kind.to_string() });

    let failure = match failure.kind {
        TransportFailureKind::Timeout => Failure::new(
            ErrorKind::Timeout,
            format!("Request timeout: {} {}", request.method(), request.path()),
            FailureOrigin::Transport,
        ),
        TransportFailureKind::Closed => {
            Failure::new(ErrorKind::Generic, failure.message.clone(), FailureOrigin::Client)
        }
        TransportFailureKind::Connect
        | TransportFailureKind::Request
        | TransportFailureKind::Body
        | TransportFailureKind::Other => Failure::new(
            ErrorKind::Generic,
            format!("Client error: {}", failure.message),
            FailureOrigin::Transport,
        ),
    };

    Outcome::failure(failure.with_details(details))
}

fn is_balance_endpoint(request: &Request) -> bool {
    request.endpoint() == BALANCE_PATH
}

fn normalize_balance(status: u16, body: &str) -> Outcome {
    let trimmed = body.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    match unquoted.parse::<f64>() {
        Ok(balance) if balance.is_finite() => {
            Outcome::success(status, Payload::Json(json!({ "balance": balance })))
        }
        _ => Outcome::failure(
            Failure::new(
                ErrorKind::Generic,
                format!("Balance response is not a number: {trimmed}"),
                FailureOrigin::Response,
            )
            .with_status(status)
            .with_details(json!({ "body": body })),
        ),
    }
}

fn decode_body(body: &str) -> Payload {
    if body.trim().is_empty() {
        return Payload::Text(body.to_string());
    }
    serde_json::from_str::<Value>(body)
        .map_or_else(|_| Payload::Text(body.to_string()), Payload::Json)
}

fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
