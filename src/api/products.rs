use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::envelope::{parse_entity, parse_list, Paginated};
use super::ApiClient;
use crate::errors::ServiceError;
use crate::models::product::Product;

/// One requested line of a stock check.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequestLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Server verdict for one line of `/products/check-stock`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLineVerdict {
    pub product_id: Uuid,
    pub sufficient: bool,
    #[serde(default)]
    pub available: i32,
}

/// Read-only `/products` surface: the authoritative stock check plus the
/// listing used by the client-side search fallback. Catalog CRUD lives
/// elsewhere.
#[derive(Clone, Debug)]
pub struct ProductsApi {
    client: ApiClient,
    page_size: u64,
    fallback_page_cap: u64,
}

impl ProductsApi {
    pub fn new(client: ApiClient, page_size: u64, fallback_page_cap: u64) -> Self {
        Self {
            client,
            page_size,
            fallback_page_cap,
        }
    }

    /// Authoritative availability check for the requested quantities.
    pub async fn check_stock(
        &self,
        lines: &[StockRequestLine],
    ) -> Result<Vec<StockLineVerdict>, ServiceError> {
        let body = serde_json::json!({ "items": lines });
        let value = self
            .client
            .send_json(Method::POST, "products/check-stock", &body)
            .await?;
        parse_entity("products/check-stock", value)
    }

    pub async fn list(
        &self,
        page: u64,
        search: Option<&str>,
    ) -> Result<Paginated<Product>, ServiceError> {
        let mut params = vec![
            ("page", page.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(term) = search {
            params.push(("search", term.to_string()));
        }
        let value = self.client.get("products", &params).await?;
        parse_list("products", value)
    }

    /// Product search with client-side fallback: when the server-side search
    /// matches nothing, fetch up to `fallback_page_cap` pages of the full
    /// catalog and filter locally by name/SKU substring, case-insensitively.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, ServiceError> {
        let first = self.list(1, Some(term)).await?;
        if !first.data.is_empty() {
            return Ok(first.data);
        }

        debug!(term, "server-side search empty; falling back to bounded catalog scan");
        let mut found = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.list(page, None).await?;
            let exhausted = batch.data.is_empty() || !batch.has_more(page);
            found.extend(batch.data.into_iter().filter(|p| p.matches_term(term)));
            if exhausted || page >= self.fallback_page_cap {
                break;
            }
            page += 1;
        }
        Ok(found)
    }
}
