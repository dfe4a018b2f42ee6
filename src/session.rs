//! One authenticated context per credential pair.
//!
//! A [`Session`] owns the rate governor, the retry policy and a diagnostics
//! call log. Every call it issues, whether a single lookup, a count or one
//! page of a paginated fetch, goes through [`Session::execute`], so the
//! minimum spacing holds across all operations sharing the session.

use log::{debug, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, SessionOptions};
use crate::http::governor::RateGovernor;
use crate::http::outcome::{Outcome, OutcomeKind, Page, Record};
use crate::http::retry::Decision;
use crate::http::transport::{HttpTransport, RequestDescriptor, Transport};
use crate::http::{ApiError, paginator};

/// Call log entries kept for diagnostics; older ones are dropped.
const CALL_LOG_CAPACITY: usize = 1000;

/// One attempt as seen by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub path: String,
    pub page: Option<u32>,
    pub attempt: u32,
    pub outcome: OutcomeKind,
    /// Wait scheduled before the next attempt, if one was retried.
    pub backoff: Option<Duration>,
}

#[derive(Debug, Default)]
struct CallLog {
    total_calls: u64,
    entries: VecDeque<CallRecord>,
}

pub struct Session {
    config: ClientConfig,
    options: SessionOptions,
    transport: Arc<dyn Transport>,
    governor: RateGovernor,
    log: Mutex<CallLog>,
    cancel: CancellationToken,
}

impl Session {
    /// Session over HTTPS with the given credentials.
    pub fn new(config: ClientConfig, options: SessionOptions) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config, options.request_timeout)?;
        Ok(Self::with_transport(config, options, Arc::new(transport)))
    }

    /// Session over any transport; used to drive the engine without network.
    pub fn with_transport(
        config: ClientConfig,
        options: SessionOptions,
        transport: Arc<dyn Transport>,
    ) -> Self {
        debug!("Initialized session for {}", config.display_name());
        Self {
            governor: RateGovernor::new(options.min_interval),
            config,
            options,
            transport,
            log: Mutex::new(CallLog::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Token that stops in-flight operations at the next page or retry
    /// boundary once cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), ApiError> {
        if self.cancel.is_cancelled() {
            Err(ApiError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Number of transport calls issued so far.
    pub fn total_calls(&self) -> u64 {
        self.lock_log().total_calls
    }

    /// Most recent attempts, oldest first.
    pub fn call_log(&self) -> Vec<CallRecord> {
        self.lock_log().entries.iter().cloned().collect()
    }

    /// Issues `request` through the governor, retrying transient failures.
    #[tracing::instrument(skip(self, request), fields(path = request.path()))]
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<Page, ApiError> {
        let retry = self.options.retry;
        let mut attempt = 1;

        loop {
            self.check_cancelled()?;
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                _ = self.governor.acquire() => {}
            }

            let outcome = self.transport.execute(request).await;
            let kind = outcome.kind();
            let failure = match outcome {
                Outcome::Success(page) => {
                    self.record(request, attempt, kind, None);
                    return Ok(page);
                }
                Outcome::Failure(failure) => failure,
            };

            debug!(
                "{}: attempt {}/{} failed: {}",
                request.path(),
                attempt,
                retry.max_retries + 1,
                failure
            );

            match retry.should_retry(attempt, failure) {
                Decision::Wait(delay) => {
                    self.record(request, attempt, kind, Some(delay));
                    warn!(
                        "{}: attempt {}/{} failed, retrying in {:?}...",
                        request.path(),
                        attempt,
                        retry.max_retries + 1,
                        delay
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Decision::GiveUp(error) => {
                    self.record(request, attempt, kind, None);
                    return Err(error);
                }
            }
        }
    }

    /// Single-entity lookup.
    pub async fn fetch_one(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Record, ApiError> {
        let request = RequestDescriptor::new(path, params.to_vec());
        self.execute(&request).await?.into_record()
    }

    /// Every record matching `params`, using the session's page size.
    pub async fn fetch_all(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Vec<Record>, ApiError> {
        paginator::fetch_all(self, path, params, self.options.page_size).await
    }

    /// Matching record count from one minimal page.
    ///
    /// Endpoints that do not report a total are counted by fetching every
    /// page instead.
    #[tracing::instrument(skip(self, params))]
    pub async fn count(&self, path: &str, params: &[(String, String)]) -> Result<u64, ApiError> {
        let request = RequestDescriptor::new(path, params.to_vec()).with_page(1, 1);
        let page = self.execute(&request).await?;

        match page.meta.reported_total() {
            Some(total) => Ok(total),
            None => {
                warn!(
                    "{} does not report a total; fetching all records to count them",
                    path
                );
                Ok(self.fetch_all(path, params).await?.len() as u64)
            }
        }
    }

    fn record(
        &self,
        request: &RequestDescriptor,
        attempt: u32,
        outcome: OutcomeKind,
        backoff: Option<Duration>,
    ) {
        let mut log = self.lock_log();
        log.total_calls += 1;
        if log.entries.len() == CALL_LOG_CAPACITY {
            log.entries.pop_front();
        }
        log.entries.push_back(CallRecord {
            path: request.path().to_string(),
            page: request.paging().map(|p| p.page),
            attempt,
            outcome,
            backoff,
        });
    }

    fn lock_log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
