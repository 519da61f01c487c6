//! Error taxonomy: status code to [`ErrorKind`], body to human message.
//!
//! Everything here is a pure function. The status code alone decides the
//! kind; the body is only mined for a message.

use adflow_domain::{ErrorKind, Payload};
use serde_json::Value;

/// Map an HTTP status code to its error kind.
pub const fn classify(status_code: u16) -> ErrorKind {
    match status_code {
        400 => ErrorKind::Validation,
        401 => ErrorKind::Authentication,
        403 => ErrorKind::Authorization,
        404 => ErrorKind::NotFound,
        408 => ErrorKind::Timeout,
        429 => ErrorKind::RateLimited,
        500..=u16::MAX => ErrorKind::Server,
        _ => ErrorKind::Generic,
    }
}

/// Pull a human-readable message out of an error body.
///
/// Order: an `errors` list joined with `"; "`, then `error`, then `message`,
/// else the whole body as text. Null and empty fields are skipped.
pub fn extract_message(body: &Payload) -> String {
    match body {
        Payload::Text(text) => text.trim().to_string(),
        Payload::Json(Value::Object(map)) => {
            if let Some(errors) = map.get("errors").filter(|v| has_content(v)) {
                return match errors {
                    Value::Array(items) => {
                        items.iter().map(value_to_text).collect::<Vec<_>>().join("; ")
                    }
                    other => value_to_text(other),
                };
            }
            ["error", "message"]
                .iter()
                .find_map(|key| map.get(*key).filter(|v| has_content(v)))
                .map_or_else(|| Value::Object(map.clone()).to_string(), value_to_text)
        }
        Payload::Json(other) => value_to_text(other),
    }
}

/// Classify a failed response and describe it.
///
/// Falls back to the canonical per-status message when the body says
/// nothing useful.
pub fn classify_response(status_code: u16, body: &Payload) -> (ErrorKind, String) {
    let kind = classify(status_code);
    let message = extract_message(body);
    if message.is_empty() || message == "null" {
        (kind, default_message(status_code))
    } else {
        (kind, message)
    }
}

/// Canonical message for a status code.
pub fn default_message(status_code: u16) -> String {
    let known = match status_code {
        400 => "Bad Request - Check your request parameters",
        401 => "Unauthorized - Invalid API token",
        403 => "Forbidden - Insufficient permissions or token limitations",
        404 => "Not Found - Endpoint or resource doesn't exist",
        408 => "Request Timeout - Request took too long to complete",
        429 => "Too Many Requests - Rate limit exceeded",
        500 => "Internal Server Error - upstream server issue",
        502 => "Bad Gateway - upstream server temporarily unavailable",
        503 => "Service Unavailable - upstream maintenance",
        504 => "Gateway Timeout - upstream server timeout",
        _ => return format!("HTTP Error {status_code}"),
    };
    known.to_string()
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
