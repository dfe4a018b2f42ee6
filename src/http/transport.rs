//! One HTTP request/response cycle against the inventory API.

use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use std::time::{Duration, Instant};

use super::error::ApiError;
use super::outcome::{Outcome, classify, classify_transport_error, parse_retry_after};
use crate::config::ClientConfig;

/// Header carrying the account identifier.
pub const ACCOUNT_HEADER: &str = "api-auth-accountid";

/// Header carrying the application key.
pub const KEY_HEADER: &str = "api-auth-applicationkey";

/// Ordered query parameters, sent in insertion order.
pub type QueryParams = Vec<(String, String)>;

/// Immutable description of one call: resource path, filters and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    path: String,
    params: QueryParams,
    paging: Option<Paging>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub limit: u32,
}

impl RequestDescriptor {
    pub fn new(path: impl Into<String>, params: QueryParams) -> Self {
        Self {
            path: path.into(),
            params,
            paging: None,
        }
    }

    /// Same request for a given page (1-based) of `limit` records.
    pub fn with_page(self, page: u32, limit: u32) -> Self {
        Self {
            paging: Some(Paging { page, limit }),
            ..self
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    /// Filters followed by `Page` and `Limit` when paged.
    pub fn query_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs: Vec<(&str, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        if let Some(paging) = self.paging {
            pairs.push(("Page", paging.page.to_string()));
            pairs.push(("Limit", paging.limit.to_string()));
        }
        pairs
    }
}

/// Executes exactly one network call and classifies the result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Outcome;
}

/// reqwest-backed transport with the session's credentials attached to every
/// request.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    account_hint: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCOUNT_HEADER, header_value(config.account_id(), "account id")?);
        let mut key = header_value(config.api_key(), "application key")?;
        key.set_sensitive(true);
        headers.insert(KEY_HEADER, key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("cin7-fetch/", env!("CIN7_FETCH_VERSION")))
            .build()
            .map_err(|e| ApiError::NetworkError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            account_hint: config.credential_hint(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, request), fields(path = request.path()))]
    async fn execute(&self, request: &RequestDescriptor) -> Outcome {
        let url = format!("{}{}", self.base_url, request.path());
        let page = request.paging().map(|p| p.page);
        let started = Instant::now();

        let result = self
            .client
            .get(&url)
            .query(&request.query_pairs())
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "GET {} page={:?} status=network elapsed_ms={} error={}",
                    request.path(),
                    page,
                    started.elapsed().as_millis(),
                    e
                );
                return classify_transport_error(&e);
            }
        };

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    "GET {} page={:?} status={} elapsed_ms={} error=body read failed: {}",
                    request.path(),
                    page,
                    status.as_u16(),
                    started.elapsed().as_millis(),
                    e
                );
                return classify_transport_error(&e);
            }
        };

        let elapsed_ms = started.elapsed().as_millis();
        if status.is_success() {
            info!(
                "GET {} page={:?} status={} elapsed_ms={}",
                request.path(),
                page,
                status.as_u16(),
                elapsed_ms
            );
        } else {
            warn!(
                "GET {} page={:?} status={} elapsed_ms={}",
                request.path(),
                page,
                status.as_u16(),
                elapsed_ms
            );
        }

        classify(status, retry_after, &body, request.path(), &self.account_hint)
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|_| {
        ApiError::MissingCredentials(format!("{} contains characters not allowed in a header", what))
    })
}
