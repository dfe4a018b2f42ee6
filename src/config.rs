//! Client credentials and session tuning.
//!
//! Credentials are looked up per client index from the environment
//! (`CLIENT_{n}_NAME`, `CLIENT_{n}_ACCOUNT_ID`, `CLIENT_{n}_API_KEY`), the
//! same layout the `.env` file uses. Nothing in the engine reads the
//! environment itself; it only receives a [`ClientConfig`].

use std::fmt;
use std::time::Duration;

use crate::http::ApiError;
use crate::http::governor::{DEFAULT_CALLS_PER_MINUTE, interval_for};
use crate::http::paginator::{DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE};
use crate::http::retry::RetryPolicy;
use crate::runtime::Runtime;

/// Production API root.
pub const DEFAULT_API_URL: &str = "https://inventory.dearsystems.com/ExternalApi/v2";

/// Environment variable overriding the API root.
pub const API_URL_ENV: &str = "CIN7_API_URL";

/// Highest client index checked by [`ClientConfig::discover`].
pub const MAX_CLIENTS: u32 = 20;

/// Default per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials of one account plus the endpoint they are used against.
#[derive(Clone)]
pub struct ClientConfig {
    name: Option<String>,
    account_id: String,
    api_key: String,
    base_url: String,
}

impl ClientConfig {
    /// Fails fast when either credential is blank.
    pub fn new(
        name: Option<String>,
        account_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let account_id = account_id.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();

        if account_id.is_empty() {
            return Err(ApiError::MissingCredentials(
                "account id must not be empty".to_string(),
            ));
        }
        if api_key.is_empty() {
            return Err(ApiError::MissingCredentials(
                "application key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            name: name.filter(|n| !n.trim().is_empty()),
            account_id,
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Loads client number `index` from the environment.
    #[tracing::instrument(skip(runtime))]
    pub fn from_env<R: Runtime + ?Sized>(runtime: &R, index: u32) -> Result<Self, ApiError> {
        let prefix = format!("CLIENT_{}_", index);
        let name = runtime.env_var(&format!("{}NAME", prefix)).ok();
        let account_id = runtime
            .env_var(&format!("{}ACCOUNT_ID", prefix))
            .unwrap_or_default();
        let api_key = runtime
            .env_var(&format!("{}API_KEY", prefix))
            .unwrap_or_default();

        let config = Self::new(name, account_id, api_key).map_err(|_| {
            ApiError::MissingCredentials(format!(
                "client {} is not configured. Set {}ACCOUNT_ID and {}API_KEY in the environment or .env file",
                index, prefix, prefix
            ))
        })?;

        Ok(match runtime.env_var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => config.with_base_url(url.trim()),
            _ => config,
        })
    }

    /// Client indexes with an account id set, with their display names.
    pub fn discover<R: Runtime + ?Sized>(runtime: &R) -> Vec<(u32, String)> {
        (1..=MAX_CLIENTS)
            .filter_map(|index| {
                runtime
                    .env_var(&format!("CLIENT_{}_ACCOUNT_ID", index))
                    .ok()
                    .filter(|id| !id.trim().is_empty())?;
                let name = runtime
                    .env_var(&format!("CLIENT_{}_NAME", index))
                    .unwrap_or_else(|_| format!("Client {}", index));
                Some((index, name))
            })
            .collect()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Configured name, or the masked account id.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.credential_hint())
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Account id shortened to its first 8 characters, for messages.
    pub fn credential_hint(&self) -> String {
        let shown: String = self.account_id.chars().take(8).collect();
        format!("{}****", shown)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("name", &self.name)
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Pacing, retry and paging knobs of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub min_interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub max_pages: u32,
    pub page_size: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            min_interval: interval_for(DEFAULT_CALLS_PER_MINUTE),
            request_timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SessionOptions {
    /// Defaults with spacing derived from a per-minute call budget.
    pub fn per_minute(calls: u32) -> Self {
        Self::default().with_min_interval(interval_for(calls))
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}
