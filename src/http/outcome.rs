//! Classification of a single HTTP attempt into success, transient failure
//! or fatal failure.

use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

use super::error::ApiError;

/// One record as returned by the API: a JSON object.
pub type Record = Map<String, Value>;

/// Key under which list endpoints report the number of matching records.
pub const TOTAL_KEY: &str = "Total";

/// Longest server-provided message carried into an error.
const MAX_MESSAGE_LEN: usize = 300;

/// Paging facts derived from one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageMetadata {
    /// Matching record count, when the endpoint reports one
    pub total: Option<u64>,
    /// Records carried by this response
    pub returned: usize,
}

impl PageMetadata {
    pub fn from_payload(payload: &Value) -> Self {
        let total = payload.get(TOTAL_KEY).and_then(Value::as_u64);
        let returned = record_array(payload).map(Vec::len).unwrap_or(0);
        Self { total, returned }
    }

    /// Total usable for termination and counting.
    ///
    /// The upstream sometimes sends `Total: 0` next to actual rows; that is
    /// treated as no total at all.
    pub fn reported_total(&self) -> Option<u64> {
        self.total.filter(|t| *t > 0 || self.returned == 0)
    }
}

/// A successful response body together with its paging metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub payload: Value,
    pub meta: PageMetadata,
}

impl Page {
    pub fn new(payload: Value) -> Self {
        let meta = PageMetadata::from_payload(&payload);
        Self { payload, meta }
    }

    /// Records of a list response.
    ///
    /// List endpoints answer either with a bare array or with an object
    /// holding `Total` and one array whose key varies per endpoint. An object
    /// with no array at all is only accepted as an empty page when it
    /// reports a total of zero.
    pub fn into_records(self) -> Result<Vec<Record>, ApiError> {
        let items = match self.payload {
            Value::Array(items) => items,
            Value::Object(mut map) => {
                let key = map
                    .iter()
                    .find(|(k, v)| k.as_str() != TOTAL_KEY && v.is_array())
                    .map(|(k, _)| k.clone());
                match key.and_then(|k| map.remove(&k)) {
                    Some(Value::Array(items)) => items,
                    _ if self.meta.total == Some(0) => Vec::new(),
                    _ => {
                        let keys: Vec<&String> = map.keys().collect();
                        return Err(ApiError::MalformedResponse(format!(
                            "no record array in response (keys: {:?})",
                            keys
                        )));
                    }
                }
            }
            other => {
                return Err(ApiError::MalformedResponse(format!(
                    "expected an array or object, got {}",
                    json_kind(&other)
                )));
            }
        };

        items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                other => Err(ApiError::MalformedResponse(format!(
                    "expected record objects, got {}",
                    json_kind(&other)
                ))),
            })
            .collect()
    }

    /// The payload of a single-entity lookup.
    pub fn into_record(self) -> Result<Record, ApiError> {
        match self.payload {
            Value::Object(record) => Ok(record),
            other => Err(ApiError::MalformedResponse(format!(
                "expected a single record object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Why an attempt did not produce a [`Page`].
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Worth retrying. `retry_after` is the server's own suggestion, if any.
    Retryable {
        error: ApiError,
        retry_after: Option<Duration>,
    },
    /// Will fail again on retry without caller intervention.
    Fatal(ApiError),
}

impl Failure {
    pub fn error(&self) -> &ApiError {
        match self {
            Failure::Retryable { error, .. } | Failure::Fatal(error) => error,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error().fmt(f)
    }
}

/// Classified result of one transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Page),
    Failure(Failure),
}

impl Outcome {
    pub fn retryable(error: ApiError, retry_after: Option<Duration>) -> Self {
        Outcome::Failure(Failure::Retryable { error, retry_after })
    }

    pub fn fatal(error: ApiError) -> Self {
        Outcome::Failure(Failure::Fatal(error))
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success(_) => OutcomeKind::Success,
            Outcome::Failure(Failure::Retryable { .. }) => OutcomeKind::Retryable,
            Outcome::Failure(Failure::Fatal(_)) => OutcomeKind::Fatal,
        }
    }
}

/// Payload-free tag of an [`Outcome`], kept in the session call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Retryable,
    Fatal,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "success"),
            OutcomeKind::Retryable => write!(f, "retryable"),
            OutcomeKind::Fatal => write!(f, "fatal"),
        }
    }
}

/// Classifies an HTTP response.
///
/// `account_hint` is a masked form of the account id; the application key is
/// never passed in here.
pub fn classify(
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
    path: &str,
    account_hint: &str,
) -> Outcome {
    match status.as_u16() {
        200..=299 => match serde_json::from_str::<Value>(body) {
            Ok(payload) => Outcome::Success(Page::new(payload)),
            Err(e) => Outcome::fatal(ApiError::MalformedResponse(format!(
                "{} returned invalid JSON: {}",
                path, e
            ))),
        },
        400 => Outcome::fatal(ApiError::InvalidParameters(server_message(body, status))),
        403 => Outcome::fatal(ApiError::AuthenticationFailed {
            account_hint: account_hint.to_string(),
            message: server_message(body, status),
        }),
        404 => Outcome::fatal(ApiError::NotFound(path.to_string())),
        429 => Outcome::retryable(
            ApiError::RateLimited(server_message(body, status)),
            retry_after,
        ),
        500 | 502 | 503 | 504 => Outcome::retryable(
            ApiError::ServerError {
                status: status.as_u16(),
                message: server_message(body, status),
            },
            None,
        ),
        other => Outcome::fatal(ApiError::UnexpectedStatus {
            status: other,
            message: server_message(body, status),
        }),
    }
}

/// Classifies an error raised before a status code was available.
pub fn classify_transport_error(error: &reqwest::Error) -> Outcome {
    if error.is_builder() {
        return Outcome::fatal(ApiError::InvalidParameters(format!(
            "request could not be built: {}",
            error
        )));
    }

    let kind = if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    Outcome::retryable(ApiError::NetworkError(format!("{}: {}", kind, error)), None)
}

/// Parses a `Retry-After` header given in whole seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Extracts a readable message from an error body.
///
/// The API reports failures as `[{"ErrorCode": 400, "Exception": "..."}]`;
/// anything else is passed through as trimmed text.
fn server_message(body: &str, status: StatusCode) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        let entry = match &v {
            Value::Array(items) => items.first().cloned(),
            Value::Object(_) => Some(v.clone()),
            _ => None,
        }?;
        entry
            .get("Exception")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    let message = from_json.unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no message")
            .to_string();
    }
    truncate(message)
}

fn truncate(mut message: String) -> String {
    if message.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push_str("...");
    }
    message
}

fn record_array(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .iter()
            .find(|(k, v)| k.as_str() != TOTAL_KEY && v.is_array())
            .and_then(|(_, v)| v.as_array()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
