use std::time::Duration;

use adflow_core::Transport;
use adflow_domain::constants::{
    CONTENT_TYPE_JSON, DEFAULT_POOL_IDLE_TIMEOUT_SECS, DEFAULT_POOL_MAX_IDLE_PER_HOST,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use adflow_domain::{
    AdflowError, ClientConfig, HttpMethod, RawResponse, Request, Result, TransportFailure,
    TransportFailureKind,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;
use url::Url;

use crate::errors::{InfraError, IntoTransportFailure};

/// HTTP transport that owns the connection pool.
///
/// One wire attempt per `send`; retry and interpretation belong to the
/// executor. After [`close`](Self::close) every send fails with a `Closed`
/// transport failure.
pub struct HttpTransport {
    client: RwLock<Option<ReqwestClient>>,
    base_url: String,
}

impl HttpTransport {
    /// Start building a transport for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(base_url)
    }

    /// Transport configured from a validated [`ClientConfig`].
    ///
    /// # Errors
    /// Returns `AdflowError::Config` if the token cannot be used as a header
    /// or the pool cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder(config.base_url_trimmed())
            .bearer_token(&config.api_token)
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.pool.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool.idle_timeout_secs))
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Release the connection pool. Idempotent.
    pub fn close(&self) {
        if self.client.write().take().is_some() {
            debug!(base_url = %self.base_url, "http transport closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }

    fn url_for(&self, request: &Request) -> std::result::Result<Url, TransportFailure> {
        let raw = format!("{}{}", self.base_url, request.path());
        let mut url = Url::parse(&raw).map_err(|err| {
            TransportFailure::new(TransportFailureKind::Request, format!("invalid URL {raw}: {err}"))
        })?;
        if !request.query().is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query().iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportFailure> {
        let client = self.client.read().clone().ok_or_else(TransportFailure::closed)?;
        let url = self.url_for(request)?;

        debug!(method = %request.method(), %url, "sending HTTP request");

        let mut builder = client.request(reqwest_method(request.method()), url).timeout(timeout);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_owned());
        }

        let response = builder.send().await.map_err(IntoTransportFailure::into_transport_failure)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let body = response.text().await.map_err(IntoTransportFailure::into_transport_failure)?;

        debug!(status, bytes = body.len(), "received HTTP response");
        Ok(RawResponse { status, headers, body })
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
    user_agent: String,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    default_headers: HeaderMap,
}

impl HttpTransportBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Pool-wide ceiling; per-request timeouts still apply underneath it.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    #[must_use]
    pub const fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// # Errors
    /// Returns `AdflowError::Config` for a token that is not a valid header
    /// value or when reqwest refuses the configuration.
    pub fn build(self) -> Result<HttpTransport> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));

        if let Some(token) = &self.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                AdflowError::Config("API token contains characters not allowed in a header".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.extend(self.default_headers);

        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .pool_idle_timeout(self.pool_idle_timeout)
            .no_proxy()
            .build()
            .map_err(|err| AdflowError::from(InfraError::from(err)))?;

        Ok(HttpTransport { client: RwLock::new(Some(client)), base_url: self.base_url })
    }
}
