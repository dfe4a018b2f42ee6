pub mod config;
pub mod http;
pub mod query;
pub mod runtime;
pub mod session;

pub use config::{ClientConfig, SessionOptions};
pub use http::{ApiError, ErrorCategory};
pub use query::Cin7Client;
pub use session::Session;
