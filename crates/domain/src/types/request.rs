//! Request descriptors handed to the executor.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{AdflowError, Result};
use crate::impl_domain_enum_conversions;

/// HTTP method accepted by the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl_domain_enum_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

/// Immutable description of one logical call against the upstream.
///
/// The body is already serialized; the executor never inspects it. A `None`
/// timeout means "use the executor's configured default".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Option<String>,
    timeout: Option<Duration>,
}

impl Request {
    /// Create a request for an upstream-relative path.
    ///
    /// # Errors
    /// Returns `AdflowError::InvalidInput` when `path` is empty.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(AdflowError::InvalidInput("request path must not be empty".into()));
        }

        let path =
            if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") };

        Ok(Self { method, path, query: Vec::new(), body: None, timeout: None })
    }

    pub fn get(path: impl Into<String>) -> Result<Self> {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Result<Self> {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Result<Self> {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Result<Self> {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Result<Self> {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append a query parameter. Insertion order is kept on the wire.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a pre-serialized body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `payload` as JSON and attach it as the body.
    ///
    /// # Errors
    /// Returns `AdflowError::Serialization` if the payload cannot be encoded.
    pub fn with_json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self> {
        let body = serde_json::to_string(payload)
            .map_err(|e| AdflowError::Serialization(e.to_string()))?;
        Ok(self.with_body(body))
    }

    /// Override the executor's default timeout for this request only.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Path with any trailing `/` and query string removed, used for endpoint
    /// matching.
    pub fn endpoint(&self) -> &str {
        let without_query = self.path.split('?').next().unwrap_or(&self.path);
        let trimmed = without_query.trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(Request::get(""), Err(AdflowError::InvalidInput(_))));
        assert!(matches!(Request::get("   "), Err(AdflowError::InvalidInput(_))));
    }

    #[test]
    fn missing_leading_slash_is_added() {
        let request = Request::get("adv/balance").unwrap();
        assert_eq!(request.path(), "/adv/balance");
    }

    #[test]
    fn query_keeps_insertion_order() {
        let request = Request::get("/adv/campaigns")
            .unwrap()
            .with_query("page_size", "10")
            .with_query("status", "6")
            .with_query("page", "2");

        let keys: Vec<_> = request.query().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["page_size", "status", "page"]);
    }

    #[test]
    fn json_body_is_serialized_once() {
        let request =
            Request::put("/adv/campaigns/play").unwrap().with_json(&json!({"campaign_ids": [1, 2]}));
        let request = request.unwrap();
        assert_eq!(request.method(), HttpMethod::Put);
        assert_eq!(request.body(), Some(r#"{"campaign_ids":[1,2]}"#));
    }

    #[test]
    fn endpoint_strips_query_and_trailing_slash() {
        assert_eq!(Request::get("/adv/balance/").unwrap().endpoint(), "/adv/balance");
        assert_eq!(Request::get("/adv/balance?x=1").unwrap().endpoint(), "/adv/balance");
        assert_eq!(Request::get("/").unwrap().endpoint(), "/");
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert!("HEAD".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn timeout_defaults_to_none() {
        let request = Request::get("/adv/balance").unwrap();
        assert_eq!(request.timeout(), None);
        let request = request.with_timeout(Duration::from_secs(5));
        assert_eq!(request.timeout(), Some(Duration::from_secs(5)));
    }
}
