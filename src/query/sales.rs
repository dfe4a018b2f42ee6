use anyhow::Result;
use chrono::NaiveDate;

use super::Cin7Client;
use super::filters::{Params, SaleFilter};
use crate::http::outcome::Record;

pub(crate) const SALE_LIST: &str = "/saleList";
const SALE: &str = "/sale";
const SALE_CREDIT_NOTE_LIST: &str = "/saleCreditNoteList";
const SALE_CREDIT_NOTE: &str = "/sale/creditnote";

impl Cin7Client {
    /// Sale orders matching `filter`.
    #[tracing::instrument(skip(self))]
    pub async fn sale_list(&self, filter: &SaleFilter) -> Result<Vec<Record>> {
        self.list("sales", SALE_LIST, &filter.to_params()).await
    }

    /// Full sale by its `ID`.
    #[tracing::instrument(skip(self))]
    pub async fn sale_detail(&self, sale_id: &str) -> Result<Record> {
        self.detail("sale", SALE, "ID", sale_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn sale_credit_notes(&self, since: Option<NaiveDate>) -> Result<Vec<Record>> {
        let params = Params::new().since(since).build();
        self.list("sale credit notes", SALE_CREDIT_NOTE_LIST, &params)
            .await
    }

    /// Credit note of the sale with `SaleID`.
    #[tracing::instrument(skip(self))]
    pub async fn sale_credit_note_detail(&self, sale_id: &str) -> Result<Record> {
        self.detail("sale credit note", SALE_CREDIT_NOTE, "SaleID", sale_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::filters::{FulfilmentStatus, StageStatus};
    use super::super::test_support::client_for;
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_sale_list_sends_filters_and_pages() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/saleList")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("OrderStatus".into(), "AUTHORISED".into()),
                Matcher::UrlEncoded("FulFilmentStatus".into(), "NOT FULFILLED".into()),
                Matcher::UrlEncoded("ModifiedSince".into(), "2024-06-01".into()),
                Matcher::UrlEncoded("Page".into(), "1".into()),
                Matcher::UrlEncoded("Limit".into(), "100".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Total": 2, "SaleList": [{"SaleID": "a"}, {"SaleID": "b"}]}"#)
            .create_async()
            .await;

        let filter = SaleFilter {
            order_status: Some(StageStatus::Authorised),
            fulfilment_status: Some(FulfilmentStatus::NotFulfilled),
            modified_since: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        };
        let sales = client_for(&server.url()).sale_list(&filter).await.unwrap();

        mock.assert_async().await;
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[1]["SaleID"], "b");
    }

    #[tokio::test]
    async fn test_sale_detail() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/sale")
            .match_query(Matcher::UrlEncoded("ID".into(), "abc-123".into()))
            .with_status(200)
            .with_body(r#"{"ID": "abc-123", "Customer": "Acme"}"#)
            .create_async()
            .await;

        let sale = client_for(&server.url())
            .sale_detail("abc-123")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(sale["Customer"], "Acme");
    }

    #[tokio::test]
    async fn test_sale_credit_note_detail_not_found() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/sale/creditnote")
            .match_query(Matcher::UrlEncoded("SaleID".into(), "missing".into()))
            .with_status(404)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .sale_credit_note_detail("missing")
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("not found"));
        assert!(matches!(
            err.downcast_ref::<crate::http::ApiError>(),
            Some(crate::http::ApiError::NotFound(_))
        ));
    }
}
