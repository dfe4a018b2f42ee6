//! Stock adjustments, stock takes, transfers, assemblies and production
//! orders. Detail lookups of the first four are keyed by `TaskID`.

use anyhow::Result;

use super::Cin7Client;
use super::filters::{AssemblyStatus, ProductionStatus, StatusFilter, TaskStatus, TransferStatus};
use crate::http::outcome::Record;

const STOCK_ADJUSTMENT_LIST: &str = "/stockadjustmentList";
const STOCK_ADJUSTMENT: &str = "/stockadjustment";
const STOCK_TAKE_LIST: &str = "/stockTakeList";
const STOCK_TAKE: &str = "/stocktake";
pub(crate) const STOCK_TRANSFER_LIST: &str = "/stockTransferList";
const STOCK_TRANSFER: &str = "/stockTransfer";
pub(crate) const FINISHED_GOODS_LIST: &str = "/finishedGoodsList";
const FINISHED_GOODS: &str = "/finishedGoods";
pub(crate) const PRODUCTION_ORDER_LIST: &str = "/production/orderList";
const PRODUCTION_ORDER: &str = "/production/order";

const TASK_ID: &str = "TaskID";

/// Stock adjustments and takes are listed as completed unless asked otherwise.
fn completed_by_default(filter: &StatusFilter<TaskStatus>) -> StatusFilter<TaskStatus> {
    StatusFilter {
        status: filter.status.or(Some(TaskStatus::Completed)),
        modified_since: filter.modified_since,
    }
}

impl Cin7Client {
    #[tracing::instrument(skip(self))]
    pub async fn stock_adjustments(
        &self,
        filter: &StatusFilter<TaskStatus>,
    ) -> Result<Vec<Record>> {
        let params = completed_by_default(filter).to_params();
        self.list("stock adjustments", STOCK_ADJUSTMENT_LIST, &params)
            .await
    }

    /// Adjustment lines with quantities and costs.
    #[tracing::instrument(skip(self))]
    pub async fn stock_adjustment_detail(&self, task_id: &str) -> Result<Record> {
        self.detail("stock adjustment", STOCK_ADJUSTMENT, TASK_ID, task_id)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stock_takes(&self, filter: &StatusFilter<TaskStatus>) -> Result<Vec<Record>> {
        let params = completed_by_default(filter).to_params();
        self.list("stock takes", STOCK_TAKE_LIST, &params).await
    }

    /// Counted quantities and discrepancies of one stock take.
    #[tracing::instrument(skip(self))]
    pub async fn stock_take_detail(&self, task_id: &str) -> Result<Record> {
        self.detail("stock take", STOCK_TAKE, TASK_ID, task_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stock_transfers(
        &self,
        filter: &StatusFilter<TransferStatus>,
    ) -> Result<Vec<Record>> {
        self.list("stock transfers", STOCK_TRANSFER_LIST, &filter.to_params())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn stock_transfer_detail(&self, task_id: &str) -> Result<Record> {
        self.detail("stock transfer", STOCK_TRANSFER, TASK_ID, task_id)
            .await
    }

    /// Assemblies.
    #[tracing::instrument(skip(self))]
    pub async fn finished_goods(
        &self,
        filter: &StatusFilter<AssemblyStatus>,
    ) -> Result<Vec<Record>> {
        self.list("assemblies", FINISHED_GOODS_LIST, &filter.to_params())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn finished_goods_detail(&self, task_id: &str) -> Result<Record> {
        self.detail("assembly", FINISHED_GOODS, TASK_ID, task_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn production_orders(
        &self,
        filter: &StatusFilter<ProductionStatus>,
    ) -> Result<Vec<Record>> {
        self.list("production orders", PRODUCTION_ORDER_LIST, &filter.to_params())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn production_order_detail(&self, order_id: &str) -> Result<Record> {
        self.detail("production order", PRODUCTION_ORDER, "ID", order_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::client_for;
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_stock_adjustments_default_to_completed() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/stockadjustmentList")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Status".into(), "COMPLETED".into()),
                Matcher::UrlEncoded("Page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"Total": 1, "StockAdjustmentList": [{"TaskID": "t1"}]}"#)
            .create_async()
            .await;

        let adjustments = client_for(&server.url())
            .stock_adjustments(&StatusFilter::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(adjustments.len(), 1);
    }

    #[tokio::test]
    async fn test_stock_takes_keep_explicit_status() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/stockTakeList")
            .match_query(Matcher::UrlEncoded("Status".into(), "DRAFT".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let takes = client_for(&server.url())
            .stock_takes(&StatusFilter::status(TaskStatus::Draft))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(takes.is_empty());
    }

    #[tokio::test]
    async fn test_stock_transfer_detail_uses_task_id() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/stockTransfer")
            .match_query(Matcher::UrlEncoded("TaskID".into(), "t-9".into()))
            .with_status(200)
            .with_body(r#"{"TaskID": "t-9", "Status": "IN TRANSIT"}"#)
            .create_async()
            .await;

        let transfer = client_for(&server.url())
            .stock_transfer_detail("t-9")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(transfer["Status"], "IN TRANSIT");
    }

    #[tokio::test]
    async fn test_production_orders_send_camel_case_status() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/production/orderList")
            .match_query(Matcher::UrlEncoded("Status".into(), "InProgress".into()))
            .with_status(200)
            .with_body(r#"{"Total": 0, "ProductionOrderList": []}"#)
            .create_async()
            .await;

        let orders = client_for(&server.url())
            .production_orders(&StatusFilter::status(ProductionStatus::InProgress))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(orders.is_empty());
    }
}
