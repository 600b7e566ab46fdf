use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

/// Backends are sloppy about numerics: prices arrive as numbers, strings or
/// garbage. A malformed or missing value is zero, never a parse failure that
/// would sink the whole order payload.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.to_string().parse().unwrap_or(Decimal::ZERO),
        Value::String(s) => s.trim().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    })
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().unwrap_or(0).clamp(0, i32::MAX as i64) as i32,
        Value::String(s) => s.trim().parse::<i32>().unwrap_or(0).max(0),
        _ => 0,
    })
}

/// Lifecycle of a client order: linear, non-cyclic, created in `Received`
/// and terminal (for this crate) at `Sent`. Regressions are not part of the
/// machine; see `OrderStatusService` for how they are handled.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString, EnumIter, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Received,
    InProcess,
    Sent,
}

impl OrderStatus {
    /// Whether `next` is reachable by moving forward along the lifecycle.
    /// Skipping ahead (`received -> sent`) is allowed; staying put is not a
    /// transition.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        next > self
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Sent
    }
}

/// How a payment was registered. Recorded as metadata only, no gateway
/// integration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// One line of a committed order. `unit_price` and the `name`/`sku` snapshot
/// are captured at order time so later catalog edits never change the order
/// retroactively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: i32,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl OrderItem {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A backend-owned order. The client holds this as a cached copy for display
/// and issues commands against it; the backend is the source of truth.
///
/// `id` is server-assigned and may be absent immediately after creation;
/// `order_code` is the human-readable fallback lookup key. `company` and
/// `customer` are carried as raw JSON because their field names vary across
/// deployments; the invoice normalizer resolves them through its precedence
/// table.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub order_code: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub invoice_url: Option<String>,
    #[serde(default)]
    pub invoice_filename: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub company: Option<Value>,
    #[serde(default)]
    pub customer: Option<Value>,
}

impl Order {
    /// Human-usable reference: the order code when the server provided one,
    /// the id otherwise.
    pub fn reference(&self) -> Option<String> {
        self.order_code
            .clone()
            .or_else(|| self.id.map(|id| id.to_string()))
    }

    /// Conventional name for the rendered invoice document.
    pub fn invoice_filename(&self) -> String {
        match self.reference() {
            Some(reference) => format!("factura-{reference}.pdf"),
            None => "factura.pdf".to_string(),
        }
    }

    pub fn has_invoice(&self) -> bool {
        self.invoice_url.is_some()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }
}
