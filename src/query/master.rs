//! Products, stock availability, contacts and reference data.

use anyhow::Result;
use chrono::NaiveDate;

use super::Cin7Client;
use super::filters::Params;
use crate::http::outcome::Record;

const PRODUCT: &str = "/product";
const PRODUCT_AVAILABILITY: &str = "/ref/productavailability";
const CUSTOMER: &str = "/customer";
const SUPPLIER: &str = "/supplier";
pub(crate) const LOCATION: &str = "/ref/location";
const PAYMENT_TERM: &str = "/ref/paymentterm";
const TAX_RULE: &str = "/ref/taxrule";

impl Cin7Client {
    /// Product master data, optionally narrowed by SKU or name.
    #[tracing::instrument(skip(self))]
    pub async fn products(
        &self,
        sku: Option<&str>,
        name: Option<&str>,
        since: Option<NaiveDate>,
    ) -> Result<Vec<Record>> {
        let params = Params::new()
            .text("SKU", sku)
            .text("Name", name)
            .since(since)
            .build();
        self.list("products", PRODUCT, &params).await
    }

    /// On hand, allocated and available quantities per product and location.
    #[tracing::instrument(skip(self))]
    pub async fn product_availability(
        &self,
        sku: Option<&str>,
        location: Option<&str>,
    ) -> Result<Vec<Record>> {
        let params = Params::new()
            .text("SKU", sku)
            .text("Location", location)
            .build();
        self.list("product availability", PRODUCT_AVAILABILITY, &params)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn customers(
        &self,
        name: Option<&str>,
        since: Option<NaiveDate>,
    ) -> Result<Vec<Record>> {
        let params = Params::new().text("Name", name).since(since).build();
        self.list("customers", CUSTOMER, &params).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn suppliers(
        &self,
        name: Option<&str>,
        since: Option<NaiveDate>,
    ) -> Result<Vec<Record>> {
        let params = Params::new().text("Name", name).since(since).build();
        self.list("suppliers", SUPPLIER, &params).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn locations(&self) -> Result<Vec<Record>> {
        self.list("locations", LOCATION, &[]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn payment_terms(&self) -> Result<Vec<Record>> {
        self.list("payment terms", PAYMENT_TERM, &[]).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn tax_rules(&self) -> Result<Vec<Record>> {
        self.list("tax rules", TAX_RULE, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_products_filters() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/product")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("SKU".into(), "WID-01".into()),
                Matcher::UrlEncoded("ModifiedSince".into(), "2023-12-31".into()),
                Matcher::UrlEncoded("Limit".into(), "100".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"Total": 1, "Products": [{"SKU": "WID-01", "Name": "Widget"}]}"#)
            .create_async()
            .await;

        let products = client_for(&server.url())
            .products(Some("WID-01"), None, NaiveDate::from_ymd_opt(2023, 12, 31))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(products[0]["Name"], "Widget");
    }

    #[tokio::test]
    async fn test_product_availability_by_location() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/ref/productavailability")
            .match_query(Matcher::UrlEncoded("Location".into(), "Main Warehouse".into()))
            .with_status(200)
            .with_body(
                r#"{"Total": 2, "ProductAvailabilityList": [
                    {"SKU": "A", "OnHand": 4},
                    {"SKU": "B", "OnHand": -1}
                ]}"#,
            )
            .create_async()
            .await;

        let rows = client_for(&server.url())
            .product_availability(None, Some("Main Warehouse"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["OnHand"], -1);
    }

    #[tokio::test]
    async fn test_locations_bare_array() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/ref/location")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"Name": "Main"}, {"Name": "Overflow"}]"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let locations = client.locations().await.unwrap();

        assert_eq!(locations.len(), 2);
        assert_eq!(client.session().total_calls(), 1);
    }

    #[tokio::test]
    async fn test_forbidden_reports_account_hint_only() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/ref/taxrule")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let err = client_for(&server.url()).tax_rules().await.unwrap_err();
        let message = format!("{:#}", err);

        assert!(message.contains("acct-123****"));
        assert!(!message.contains("secret-key"));
    }
}
