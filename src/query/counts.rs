//! Batches of named status counts, one count query each.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::fmt;

use super::Cin7Client;
use super::filters::{
    AssemblyStatus, COMBINED_INVOICE_STATUS, COMBINED_RECEIVING_STATUS, FULFILMENT_STATUS,
    FulfilmentStatus, InvoiceStatus, ORDER_STATUS, ProductionStatus, QUOTE_STATUS,
    ReceivingStatus, STATUS, SaleStatus, StageStatus, TransferStatus,
};
use super::inventory::{FINISHED_GOODS_LIST, PRODUCTION_ORDER_LIST, STOCK_TRANSFER_LIST};
use super::purchases::PURCHASE_LIST;
use super::sales::SALE_LIST;

/// One named count within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub name: &'static str,
    pub count: u64,
}

/// Definition of one count: the list endpoint and its filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub name: &'static str,
    pub path: &'static str,
    pub filter: Vec<(&'static str, &'static str)>,
}

fn query(
    name: &'static str,
    path: &'static str,
    filter: &[(&'static str, &'static str)],
) -> CountQuery {
    CountQuery {
        name,
        path,
        filter: filter.to_vec(),
    }
}

pub fn sale_counts() -> Vec<CountQuery> {
    vec![
        query("draft_quotes", SALE_LIST, &[(QUOTE_STATUS, StageStatus::Draft.as_str())]),
        query(
            "authorised_quotes_no_so",
            SALE_LIST,
            &[
                (QUOTE_STATUS, StageStatus::Authorised.as_str()),
                (ORDER_STATUS, StageStatus::NotAvailable.as_str()),
            ],
        ),
        query("backordered", SALE_LIST, &[(STATUS, SaleStatus::Backordered.as_str())]),
        query(
            "awaiting_fulfilment",
            SALE_LIST,
            &[
                (ORDER_STATUS, StageStatus::Authorised.as_str()),
                (FULFILMENT_STATUS, FulfilmentStatus::NotFulfilled.as_str()),
            ],
        ),
        query(
            "orders_to_bill",
            SALE_LIST,
            &[
                (ORDER_STATUS, StageStatus::Authorised.as_str()),
                (COMBINED_INVOICE_STATUS, InvoiceStatus::NotAvailable.as_str()),
            ],
        ),
        query(
            "fulfilled_not_invoiced",
            SALE_LIST,
            &[
                (FULFILMENT_STATUS, FulfilmentStatus::Fulfilled.as_str()),
                (COMBINED_INVOICE_STATUS, InvoiceStatus::NotInvoiced.as_str()),
            ],
        ),
        query(
            "invoiced_not_fulfilled",
            SALE_LIST,
            &[
                (COMBINED_INVOICE_STATUS, InvoiceStatus::Authorised.as_str()),
                (FULFILMENT_STATUS, FulfilmentStatus::NotFulfilled.as_str()),
            ],
        ),
    ]
}

pub fn purchase_counts() -> Vec<CountQuery> {
    vec![
        query("draft", PURCHASE_LIST, &[(ORDER_STATUS, StageStatus::Draft.as_str())]),
        query("authorised", PURCHASE_LIST, &[(ORDER_STATUS, StageStatus::Authorised.as_str())]),
        query(
            "authorised_not_invoiced",
            PURCHASE_LIST,
            &[
                (ORDER_STATUS, StageStatus::Authorised.as_str()),
                (COMBINED_INVOICE_STATUS, InvoiceStatus::NotInvoiced.as_str()),
            ],
        ),
        query(
            "authorised_not_received",
            PURCHASE_LIST,
            &[
                (ORDER_STATUS, StageStatus::Authorised.as_str()),
                (COMBINED_RECEIVING_STATUS, ReceivingStatus::NotReceived.as_str()),
            ],
        ),
        query(
            "fully_invoiced_not_received",
            PURCHASE_LIST,
            &[
                (COMBINED_INVOICE_STATUS, InvoiceStatus::Authorised.as_str()),
                (COMBINED_RECEIVING_STATUS, ReceivingStatus::NotReceived.as_str()),
            ],
        ),
        query(
            "fully_received_not_invoiced",
            PURCHASE_LIST,
            &[
                (COMBINED_RECEIVING_STATUS, ReceivingStatus::Received.as_str()),
                (COMBINED_INVOICE_STATUS, InvoiceStatus::NotInvoiced.as_str()),
            ],
        ),
    ]
}

pub fn assembly_counts() -> Vec<CountQuery> {
    vec![
        query("draft", FINISHED_GOODS_LIST, &[(STATUS, AssemblyStatus::Draft.as_str())]),
        query("authorised", FINISHED_GOODS_LIST, &[(STATUS, AssemblyStatus::Authorised.as_str())]),
        query("in_progress", FINISHED_GOODS_LIST, &[(STATUS, AssemblyStatus::InProgress.as_str())]),
    ]
}

pub fn production_counts() -> Vec<CountQuery> {
    vec![
        query("draft", PRODUCTION_ORDER_LIST, &[(STATUS, ProductionStatus::Draft.as_str())]),
        query("planned", PRODUCTION_ORDER_LIST, &[(STATUS, ProductionStatus::Planned.as_str())]),
        query("released", PRODUCTION_ORDER_LIST, &[(STATUS, ProductionStatus::Released.as_str())]),
        query(
            "in_progress",
            PRODUCTION_ORDER_LIST,
            &[(STATUS, ProductionStatus::InProgress.as_str())],
        ),
    ]
}

pub fn transfer_counts() -> Vec<CountQuery> {
    vec![
        query("draft", STOCK_TRANSFER_LIST, &[(STATUS, TransferStatus::Draft.as_str())]),
        query("in_transit", STOCK_TRANSFER_LIST, &[(STATUS, TransferStatus::InTransit.as_str())]),
    ]
}

/// The count batches available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountGroup {
    Sales,
    Purchases,
    Assemblies,
    Production,
    Transfers,
}

impl CountGroup {
    pub const ALL: &'static [CountGroup] = &[
        CountGroup::Sales,
        CountGroup::Purchases,
        CountGroup::Assemblies,
        CountGroup::Production,
        CountGroup::Transfers,
    ];

    pub fn queries(self) -> Vec<CountQuery> {
        match self {
            CountGroup::Sales => sale_counts(),
            CountGroup::Purchases => purchase_counts(),
            CountGroup::Assemblies => assembly_counts(),
            CountGroup::Production => production_counts(),
            CountGroup::Transfers => transfer_counts(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CountGroup::Sales => "sales",
            CountGroup::Purchases => "purchases",
            CountGroup::Assemblies => "assemblies",
            CountGroup::Production => "production",
            CountGroup::Transfers => "transfers",
        }
    }
}

impl fmt::Display for CountGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Cin7Client {
    /// Matching record count of `path` without fetching the records.
    #[tracing::instrument(skip(self, params))]
    pub async fn count(&self, path: &str, params: &[(String, String)]) -> Result<u64> {
        self.session
            .count(path, params)
            .await
            .with_context(|| format!("Failed to count records at {}", path))
    }

    /// Runs every count of `group` in order.
    #[tracing::instrument(skip(self))]
    pub async fn status_counts(&self, group: CountGroup) -> Result<Vec<StatusCount>> {
        info!("Fetching {} status counts...", group);

        let queries = group.queries();
        let mut counts = Vec::with_capacity(queries.len());
        for q in queries {
            let params: Vec<(String, String)> = q
                .filter
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let count = self
                .count(q.path, &params)
                .await
                .with_context(|| format!("Failed to fetch {} count '{}'", group, q.name))?;
            counts.push(StatusCount {
                name: q.name,
                count,
            });
        }
        Ok(counts)
    }

    pub async fn sale_status_counts(&self) -> Result<Vec<StatusCount>> {
        self.status_counts(CountGroup::Sales).await
    }

    pub async fn purchase_status_counts(&self) -> Result<Vec<StatusCount>> {
        self.status_counts(CountGroup::Purchases).await
    }

    pub async fn assembly_status_counts(&self) -> Result<Vec<StatusCount>> {
        self.status_counts(CountGroup::Assemblies).await
    }

    pub async fn production_status_counts(&self) -> Result<Vec<StatusCount>> {
        self.status_counts(CountGroup::Production).await
    }

    pub async fn transfer_status_counts(&self) -> Result<Vec<StatusCount>> {
        self.status_counts(CountGroup::Transfers).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_group_sizes() {
        assert_eq!(sale_counts().len(), 7);
        assert_eq!(purchase_counts().len(), 6);
        assert_eq!(assembly_counts().len(), 3);
        assert_eq!(production_counts().len(), 4);
        assert_eq!(transfer_counts().len(), 2);
    }

    #[test]
    fn test_count_names_are_unique_per_group() {
        for group in CountGroup::ALL {
            let queries = group.queries();
            let mut names: Vec<&str> = queries.iter().map(|q| q.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), queries.len(), "{}", group);
        }
    }

    #[test]
    fn test_status_count_serializes_name_and_count() {
        let count = StatusCount {
            name: "backordered",
            count: 9,
        };
        assert_eq!(
            serde_json::to_value(&count).unwrap(),
            serde_json::json!({"name": "backordered", "count": 9})
        );
    }

    #[tokio::test]
    async fn test_transfer_counts_one_call_each() {
        let mut server = mockito::Server::new_async().await;

        let draft = server
            .mock("GET", "/stockTransferList")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Status".into(), "DRAFT".into()),
                Matcher::UrlEncoded("Page".into(), "1".into()),
                Matcher::UrlEncoded("Limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"Total": 12, "StockTransferList": [{"TaskID": "x"}]}"#)
            .expect(1)
            .create_async()
            .await;
        let in_transit = server
            .mock("GET", "/stockTransferList")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Status".into(), "IN TRANSIT".into()),
                Matcher::UrlEncoded("Limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"Total": 3, "StockTransferList": [{"TaskID": "y"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let counts = client.transfer_status_counts().await.unwrap();

        draft.assert_async().await;
        in_transit.assert_async().await;
        assert_eq!(
            counts,
            vec![
                StatusCount {
                    name: "draft",
                    count: 12
                },
                StatusCount {
                    name: "in_transit",
                    count: 3
                },
            ]
        );
        assert_eq!(client.session().total_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_count_names_the_query() {
        let mut server = mockito::Server::new_async().await;

        let _m = server
            .mock("GET", "/finishedGoodsList")
            .match_query(Matcher::Any)
            .with_status(418)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .assembly_status_counts()
            .await
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("assemblies count 'draft'"));
        assert!(message.contains("Unexpected status 418"));
    }
}
