//! Rate-limited, retrying, paginating access to the inventory API.

pub mod error;
pub mod governor;
pub mod outcome;
pub mod paginator;
pub mod retry;
pub mod transport;

pub use error::{ApiError, ErrorCategory};
pub use outcome::{Outcome, OutcomeKind, Page, PageMetadata, Record};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, RequestDescriptor, Transport};
