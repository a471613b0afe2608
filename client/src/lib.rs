//! Typed HTTP client for the Retail Ops Platform API
//!
//! Inputs run through the same checks as the backend before a request is
//! sent, and every failure comes back as an [`ApiError`].

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::{ApiError, ApiResult, InsufficientStock};

use shared::{
    validate_create_store, validate_create_transfer, validate_create_trip, validate_dispute,
    validate_receive, CreateStoreInput, CreateTransferInput, CreateTripInput, CreatedId,
    DisputeTransferInput, ItemResponse, ItemsResponse, JourneyView, PriceListOption, ReceiptItem,
    ReceiptRow, ReceiveTransferInput, SaleListRow, SaleStatus, StatusFilter, StockTransfer, Store,
    StoreMini, TransferGroup, TransferScope, TransferStatus, Trip, Warehouse, WarehouseKind,
};

/// Filters of `GET /pricelists`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Filters of `GET /warehouses`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<WarehouseKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub include_system: bool,
}

/// Filters of `GET /sales`
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SaleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Filters of `GET /pos/receipts`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Filters of the transfer lists
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransferStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<TransferScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Limit {
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
}

/// Retail Ops API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:3000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &body);
            tracing::debug!(status = status.as_u16(), code = %err.code(), "API call rejected");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<Q: Serialize, T: DeserializeOwned>(&self, path: &str, query: &Q) -> ApiResult<T> {
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn get_items<Q: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Q,
    ) -> ApiResult<Vec<T>> {
        let response: ItemsResponse<T> = self.get(path, query).await?;
        Ok(response.items)
    }

    // ------------------------------------------------------------------------
    // Directories
    // ------------------------------------------------------------------------

    pub async fn list_price_lists(&self, filter: &PriceListFilter) -> ApiResult<Vec<PriceListOption>> {
        self.get_items("/pricelists", filter).await
    }

    pub async fn list_warehouses(&self, filter: &WarehouseFilter) -> ApiResult<Vec<Warehouse>> {
        self.get_items("/warehouses", filter).await
    }

    pub async fn list_stores(&self, limit: Option<i64>) -> ApiResult<Vec<StoreMini>> {
        self.get_items("/stores", &Limit { limit }).await
    }

    /// Create a store; the code is upper-cased like the server does
    pub async fn create_store(&self, mut input: CreateStoreInput) -> ApiResult<Store> {
        input.code = input.code.trim().to_uppercase();
        input.name = input.name.trim().to_string();
        validate_create_store(&input)?;
        let response: ItemResponse<Store> = self.post("/stores", &input).await?;
        Ok(response.item)
    }

    // ------------------------------------------------------------------------
    // Sales and POS
    // ------------------------------------------------------------------------

    pub async fn list_sales(&self, filter: &SaleFilter) -> ApiResult<Vec<SaleListRow>> {
        self.get_items("/sales", filter).await
    }

    pub async fn list_receipts(&self, filter: &ReceiptFilter) -> ApiResult<Vec<ReceiptRow>> {
        self.get_items("/pos/receipts", filter).await
    }

    pub async fn get_receipt(&self, id: Uuid) -> ApiResult<ReceiptItem> {
        let response: ItemResponse<ReceiptItem> =
            self.fetch(&format!("/pos/receipts/{}", id)).await?;
        Ok(response.item)
    }

    // ------------------------------------------------------------------------
    // Delivery trips
    // ------------------------------------------------------------------------

    pub async fn list_trips(&self, limit: Option<i64>) -> ApiResult<Vec<Trip>> {
        self.get_items("/delivery-trips", &Limit { limit }).await
    }

    pub async fn create_trip(&self, input: &CreateTripInput) -> ApiResult<Uuid> {
        validate_create_trip(input)?;
        let response: ItemResponse<CreatedId> = self.post("/delivery-trips", input).await?;
        Ok(response.item.id)
    }

    // ------------------------------------------------------------------------
    // Stock transfers
    // ------------------------------------------------------------------------

    pub async fn list_transfers(&self, filter: &TransferFilter) -> ApiResult<Vec<StockTransfer>> {
        self.get_items("/stock-transfers", filter).await
    }

    /// Transfer list with journey legs folded together
    pub async fn list_transfer_groups(&self, filter: &TransferFilter) -> ApiResult<Vec<TransferGroup>> {
        self.get_items("/stock-transfers/grouped", filter).await
    }

    /// Create a transfer; a journey through TRANSIT comes back as two legs
    pub async fn create_transfer(&self, input: &CreateTransferInput) -> ApiResult<Vec<StockTransfer>> {
        validate_create_transfer(input)?;
        let response: ItemsResponse<StockTransfer> = self.post("/stock-transfers", input).await?;
        Ok(response.items)
    }

    pub async fn get_transfer(&self, id: Uuid) -> ApiResult<StockTransfer> {
        let response: ItemResponse<StockTransfer> =
            self.fetch(&format!("/stock-transfers/{}", id)).await?;
        Ok(response.item)
    }

    pub async fn get_journey(&self, journey_id: Uuid) -> ApiResult<JourneyView> {
        let response: ItemResponse<JourneyView> = self
            .fetch(&format!("/stock-transfers/journeys/{}", journey_id))
            .await?;
        Ok(response.item)
    }

    pub async fn ship_transfer(&self, id: Uuid) -> ApiResult<StockTransfer> {
        self.transfer_action(id, "ship", &serde_json::json!({})).await
    }

    pub async fn receive_transfer(&self, id: Uuid, input: &ReceiveTransferInput) -> ApiResult<StockTransfer> {
        validate_receive(input)?;
        self.transfer_action(id, "receive", input).await
    }

    pub async fn cancel_transfer(&self, id: Uuid) -> ApiResult<StockTransfer> {
        self.transfer_action(id, "cancel", &serde_json::json!({})).await
    }

    pub async fn dispute_transfer(&self, id: Uuid, input: &DisputeTransferInput) -> ApiResult<StockTransfer> {
        validate_dispute(input)?;
        self.transfer_action(id, "dispute", input).await
    }

    async fn transfer_action<B: Serialize>(&self, id: Uuid, action: &str, body: &B) -> ApiResult<StockTransfer> {
        let response: ItemResponse<StockTransfer> = self
            .post(&format!("/stock-transfers/{}/{}", id, action), body)
            .await?;
        Ok(response.item)
    }
}
