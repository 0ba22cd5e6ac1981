//! JSON-over-HTTP client shared by all collaborator adapters.
//!
//! Each collaborator (mapping providers, search, geocoder, proposer) is a
//! plain endpoint accepting a JSON body. This client handles the API key
//! header, the request timeout, a concurrency cap, and the mapping of HTTP
//! statuses to [`ClientError`] variants.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;

/// Default maximum concurrent requests per collaborator.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors from a collaborator HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network failure, connect error or transport timeout
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or missing API key
    #[error("unauthorized (check the API key)")]
    Unauthorized,

    #[error("rate limited by collaborator")]
    RateLimited,

    /// Unexpected HTTP status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Body did not match the expected shape
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Invalid client setup (bad header value, closed semaphore)
    #[error("client error: {0}")]
    Setup(String),
}

impl ClientError {
    /// Worth retrying with the same request.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) | ClientError::RateLimited => true,
            ClientError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Endpoint configuration for one collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Endpoint URL
    pub base_url: String,
    /// Sent as `x-api-key` when present
    pub api_key: Option<String>,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Rate-limited JSON client for one endpoint.
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl JsonClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| ClientError::Setup("invalid API key format".to_string()))?;
            headers.insert("x-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// POST `body` as JSON to `path` and decode the JSON answer.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ClientError::Setup("semaphore closed".to_string()))?;

        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ClientError::Json {
            message: e.to_string(),
            body: Some(text.chars().take(500).collect()),
        })
    }
}
