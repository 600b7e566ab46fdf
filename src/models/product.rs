use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product as the backend lists it.
///
/// Only the fields the fulfillment flows read are modeled; catalog CRUD is
/// handled elsewhere. `stock` is the locally known availability at fetch time
/// and is advisory only; the server re-checks at order-write time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
    pub company_id: Uuid,
}

impl Product {
    /// Case-insensitive name/SKU substring match, used by the client-side
    /// catalog search fallback.
    pub fn matches_term(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        if self.name.to_lowercase().contains(&needle) {
            return true;
        }
        self.sku
            .as_deref()
            .map(|sku| sku.to_lowercase().contains(&needle))
            .unwrap_or(false)
    }
}
