//! Business-level operations over a [`Session`].
//!
//! List operations go through the paginator, detail lookups and counts are
//! single governed calls. Everything shares the session's rate governor.

pub mod counts;
pub mod filters;
mod inventory;
mod master;
mod purchases;
mod sales;

use anyhow::{Context, Result};
use log::debug;

use crate::config::{ClientConfig, SessionOptions};
use crate::http::ApiError;
use crate::http::outcome::Record;
use crate::session::Session;

pub use counts::{CountGroup, StatusCount};
pub use filters::{
    AssemblyStatus, FulfilmentStatus, InvoiceStatus, ProductionStatus, PurchaseFilter,
    ReceivingStatus, SaleFilter, SaleStatus, StageStatus, StatusFilter, TaskStatus,
    TransferStatus,
};

pub struct Cin7Client {
    session: Session,
}

impl Cin7Client {
    pub fn new(config: ClientConfig, options: SessionOptions) -> Result<Self> {
        let name = config.display_name();
        let session = Session::new(config, options)
            .with_context(|| format!("Failed to set up API session for {}", name))?;
        Ok(Self::from_session(session))
    }

    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Display name of the account this client talks to.
    pub fn name(&self) -> String {
        self.session.config().display_name()
    }

    async fn list(&self, what: &str, path: &str, params: &[(String, String)]) -> Result<Vec<Record>> {
        debug!("Listing {} from {}", what, path);
        self.session
            .fetch_all(path, params)
            .await
            .with_context(|| format!("Failed to fetch {}", what))
    }

    async fn detail(&self, what: &str, path: &str, key: &str, id: &str) -> Result<Record> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidParameters(format!("{} must not be empty", key)))
                .with_context(|| format!("Failed to fetch {}", what));
        }

        self.session
            .fetch_one(path, &[(key.to_string(), id.to_string())])
            .await
            .with_context(|| format!("Failed to fetch {} {}", what, id))
    }
}
