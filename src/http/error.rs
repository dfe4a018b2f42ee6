//! Error taxonomy for calls against the inventory API.

use std::fmt;

/// Broad grouping of an [`ApiError`], telling the caller what kind of action
/// can fix it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fix credentials or request parameters; retrying will not help.
    Configuration,
    /// Temporary condition; the same request may succeed later.
    Transient,
    /// The API answered in a way this client cannot make sense of.
    Upstream,
    /// The caller asked for the operation to stop.
    Cancelled,
}

/// Errors produced by the transport, retry and pagination layers.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Session construction without a usable account id or application key
    MissingCredentials(String),
    /// HTTP 400 (or a request that could not be built)
    InvalidParameters(String),
    /// HTTP 403
    AuthenticationFailed { account_hint: String, message: String },
    /// HTTP 404
    NotFound(String),
    /// Any status without a dedicated classification
    UnexpectedStatus { status: u16, message: String },
    /// HTTP 429 (transient)
    RateLimited(String),
    /// HTTP 500/502/503/504 (transient)
    ServerError { status: u16, message: String },
    /// Connection failure or timeout (transient)
    NetworkError(String),
    /// 2xx with a body that is not the expected JSON shape
    MalformedResponse(String),
    /// A transient failure outlived the retry budget.
    RetriesExhausted { attempts: u32, last: Box<ApiError> },
    /// The upstream kept returning full pages past the page ceiling.
    PaginationBoundExceeded { max_pages: u32, records: usize },
    /// The upstream ran out of pages before reaching its own reported total.
    IncompleteResult { expected: u64, received: usize },
    /// Cooperative cancellation was observed.
    Cancelled,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::MissingCredentials(_)
            | ApiError::InvalidParameters(_)
            | ApiError::AuthenticationFailed { .. }
            | ApiError::NotFound(_) => ErrorCategory::Configuration,
            ApiError::RateLimited(_)
            | ApiError::ServerError { .. }
            | ApiError::NetworkError(_)
            | ApiError::RetriesExhausted { .. } => ErrorCategory::Transient,
            ApiError::UnexpectedStatus { .. }
            | ApiError::MalformedResponse(_)
            | ApiError::PaginationBoundExceeded { .. }
            | ApiError::IncompleteResult { .. } => ErrorCategory::Upstream,
            ApiError::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// True for the kinds the retry policy is allowed to absorb.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited(_) | ApiError::ServerError { .. } | ApiError::NetworkError(_)
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingCredentials(msg) => write!(f, "Missing credentials: {}", msg),
            ApiError::InvalidParameters(msg) => {
                write!(
                    f,
                    "Invalid parameters: {}. Check the filter values sent to the API.",
                    msg
                )
            }
            ApiError::AuthenticationFailed {
                account_hint,
                message,
            } => {
                write!(
                    f,
                    "Authentication failed for account {}: {}. Check the account ID and application key.",
                    account_hint, message
                )
            }
            ApiError::NotFound(what) => write!(f, "Endpoint or resource not found: {}", what),
            ApiError::UnexpectedStatus { status, message } => {
                write!(
                    f,
                    "Unexpected status {}: {}. The API answered in a way this client does not handle; this is not a credentials problem.",
                    status, message
                )
            }
            ApiError::RateLimited(msg) => write!(f, "Rate limit exceeded: {}", msg),
            ApiError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            ApiError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ApiError::MalformedResponse(msg) => {
                write!(
                    f,
                    "Malformed response: {}. The API returned data in a shape this client cannot read; retrying will not help.",
                    msg
                )
            }
            ApiError::RetriesExhausted { attempts, last } => {
                write!(
                    f,
                    "Gave up after {} attempts: {}. The API may be temporarily unavailable, try again later.",
                    attempts, last
                )
            }
            ApiError::PaginationBoundExceeded { max_pages, records } => {
                write!(
                    f,
                    "Pagination stopped at the {} page limit with {} records fetched; the API never returned a final page.",
                    max_pages, records
                )
            }
            ApiError::IncompleteResult { expected, received } => {
                write!(
                    f,
                    "Incomplete result: the API reported {} records but only {} were returned.",
                    expected, received
                )
            }
            ApiError::Cancelled => write!(f, "Operation cancelled"),
        }
    }
}

impl std::error::Error for ApiError {}
