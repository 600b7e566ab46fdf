use std::sync::Arc;

use crate::api::{ApiClient, OrdersApi, PartiesApi, ProductsApi};
use crate::cart::{CartStore, JsonFileCartStore};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::services::{
    InvoiceAttachmentService, OrderStatusService, StockValidator, SubmissionService,
};

/// Wires the resource APIs and services together from one configuration.
/// Everything inside is cheap to clone and shares one HTTP transport.
#[derive(Clone)]
pub struct FulfillmentClient {
    pub orders: OrdersApi,
    pub products: ProductsApi,
    pub parties: PartiesApi,
    pub stock: StockValidator,
    pub status: OrderStatusService,
    pub attachments: InvoiceAttachmentService,
    pub submission: SubmissionService,
}

impl FulfillmentClient {
    pub fn new(config: &AppConfig) -> Result<Self, ServiceError> {
        let api = ApiClient::new(config)?;
        Ok(Self::from_api(
            api,
            config.page_size,
            config.catalog_fallback_pages,
        ))
    }

    /// Assembles the service graph from an already-built transport. Used by
    /// tests to point everything at a mock server.
    pub fn from_api(api: ApiClient, page_size: u64, catalog_fallback_pages: u64) -> Self {
        let orders = OrdersApi::new(api.clone());
        let products = ProductsApi::new(api.clone(), page_size, catalog_fallback_pages);
        let parties = PartiesApi::new(api);
        let stock = StockValidator::new(products.clone());
        let attachments = InvoiceAttachmentService::new(orders.clone(), parties.clone());
        let status = OrderStatusService::new(orders.clone(), attachments.clone());
        let submission = SubmissionService::new(
            orders.clone(),
            stock.clone(),
            status.clone(),
            attachments.clone(),
        );
        Self {
            orders,
            products,
            parties,
            stock,
            status,
            attachments,
            submission,
        }
    }

    /// Opens the persisted cart for this configuration's profile directory.
    pub fn open_cart(&self, config: &AppConfig) -> Result<CartStore, ServiceError> {
        CartStore::open(Arc::new(JsonFileCartStore::new(config.cart_storage_path())))
    }
}
