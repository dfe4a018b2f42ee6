use anyhow::Result;
use chrono::NaiveDate;

use super::Cin7Client;
use super::filters::{Params, PurchaseFilter};
use crate::http::outcome::Record;

pub(crate) const PURCHASE_LIST: &str = "/purchaseList";
const PURCHASE: &str = "/purchase";
const PURCHASE_CREDIT_NOTE_LIST: &str = "/purchaseCreditNoteList";

impl Cin7Client {
    /// Purchase orders matching `filter`.
    #[tracing::instrument(skip(self))]
    pub async fn purchase_list(&self, filter: &PurchaseFilter) -> Result<Vec<Record>> {
        self.list("purchases", PURCHASE_LIST, &filter.to_params())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn purchase_detail(&self, purchase_id: &str) -> Result<Record> {
        self.detail("purchase", PURCHASE, "ID", purchase_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn purchase_credit_notes(&self, since: Option<NaiveDate>) -> Result<Vec<Record>> {
        let params = Params::new().since(since).build();
        self.list("purchase credit notes", PURCHASE_CREDIT_NOTE_LIST, &params)
            .await
    }
}
