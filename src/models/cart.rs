use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::Product;

/// One line of the client-held basket. Every item in a cart shares the
/// cart's `company_id`; the store enforces that invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub company_id: Uuid,
    /// Stock known at selection time; advisory only.
    #[serde(default)]
    pub known_stock: Option<i32>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_price: product.price,
            quantity,
            company_id: product.company_id,
            known_stock: Some(product.stock),
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The persisted cart shape: `{ items, companyId }` under a fixed storage
/// key, readable and writable by any concurrently open view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
}

impl CartState {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::subtotal).sum()
    }
}

/// A product selection as it enters the submission pipeline: either lifted
/// from the cart (public flow) or composed directly in an order view
/// (internal flow). Carries the catalog price at selection time so invoice
/// fallback lines never depend on later catalog edits.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionLine {
    pub product_id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub known_stock: Option<i32>,
}

impl From<&CartItem> for SelectionLine {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            sku: item.sku.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            known_stock: item.known_stock,
        }
    }
}

/// Clamps a requested quantity to `[1, stock]`. Quantities are always put
/// through this before being sent to the backend. A non-positive stock still
/// yields 1; preflight validation rejects the line instead.
pub fn clamp_quantity(requested: i32, stock: i32) -> i32 {
    requested.max(1).min(stock.max(1))
}

/// Parses a quantity text field. An empty (or unparseable) input is 0 while
/// the user is typing, so the field can be cleared.
pub fn parse_quantity_input(raw: &str) -> i32 {
    raw.trim().parse::<i32>().unwrap_or(0).max(0)
}

/// Final coercion at blur/submit time: a field left empty (0) becomes 1.
pub fn finalize_quantity_input(transient: i32) -> i32 {
    if transient == 0 {
        1
    } else {
        transient
    }
}
