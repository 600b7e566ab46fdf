//! Invoice document building.
//!
//! [`normalize`] turns an order (plus whatever company/customer detail could
//! be fetched) into a canonical [`InvoiceRecord`]; [`render`] turns that
//! record into a PDF. The record is ephemeral; only the rendered document
//! and its upload metadata persist, as fields on the order.

pub mod render;
pub mod words;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::models::cart::SelectionLine;
use crate::models::order::{Order, PaymentMethod};

/// Canonical party block (issuer or customer) on an invoice.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceParty {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl InvoiceLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Canonical, render-ready invoice data.
#[derive(Clone, Debug, Default)]
pub struct InvoiceRecord {
    pub code: Option<String>,
    pub status: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub issuer: InvoiceParty,
    pub customer: InvoiceParty,
    pub lines: Vec<InvoiceLine>,
}

impl InvoiceRecord {
    /// No tax is modeled: the total is the subtotal.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(InvoiceLine::subtotal).sum()
    }
}

/// Data for the companion payment-receipt document.
#[derive(Clone, Debug)]
pub struct PaymentReceipt {
    pub order_code: Option<String>,
    pub amount: Decimal,
    pub method: Option<PaymentMethod>,
    pub received_at: Option<DateTime<Utc>>,
    pub payer: InvoiceParty,
}

/// One canonical party field and the source keys that may carry it, ranked
/// by precedence. Deployments name these differently; the table makes the
/// fallback order explicit and testable.
struct FieldRule {
    keys: &'static [&'static str],
    assign: fn(&mut InvoiceParty, String),
}

const COMPANY_RULES: &[FieldRule] = &[
    FieldRule {
        keys: &["tradeName", "legalName", "name"],
        assign: |p, v| p.name = Some(v),
    },
    FieldRule {
        keys: &["taxId", "nif", "cif", "vatNumber"],
        assign: |p, v| p.tax_id = Some(v),
    },
    FieldRule {
        keys: &["fiscalAddress", "address"],
        assign: |p, v| p.address = Some(v),
    },
    FieldRule {
        keys: &["phone", "phoneNumber"],
        assign: |p, v| p.phone = Some(v),
    },
    FieldRule {
        keys: &["email", "contactEmail"],
        assign: |p, v| p.email = Some(v),
    },
];

const CUSTOMER_RULES: &[FieldRule] = &[
    FieldRule {
        keys: &["fullName", "name", "tradeName"],
        assign: |p, v| p.name = Some(v),
    },
    FieldRule {
        keys: &["taxId", "nif", "dni"],
        assign: |p, v| p.tax_id = Some(v),
    },
    FieldRule {
        keys: &["address"],
        assign: |p, v| p.address = Some(v),
    },
    FieldRule {
        keys: &["phone", "phoneNumber", "mobile"],
        assign: |p, v| p.phone = Some(v),
    },
    FieldRule {
        keys: &["email"],
        assign: |p, v| p.email = Some(v),
    },
];

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Resolves a party from ranked source objects: for each field, the first
/// source that carries any of the field's keys (in key order) wins.
fn resolve_party(sources: &[Option<&Value>], rules: &[FieldRule]) -> InvoiceParty {
    let mut party = InvoiceParty::default();
    for rule in rules {
        let resolved = sources.iter().flatten().find_map(|source| {
            rule.keys
                .iter()
                .find_map(|key| source.get(key).and_then(non_empty_string))
        });
        if let Some(value) = resolved {
            (rule.assign)(&mut party, value);
        }
    }
    party
}

/// Inputs beyond the order itself: session company detail, a best-effort
/// fetched customer, and the original client selection for the
/// empty-items fallback.
#[derive(Clone, Debug, Default)]
pub struct NormalizeContext<'a> {
    pub session_company: Option<&'a Value>,
    pub fetched_customer: Option<&'a Value>,
    pub fallback_lines: Option<&'a [SelectionLine]>,
}

/// Builds the canonical invoice record for an order.
///
/// Company precedence: `order.company`, then the session company. Customer
/// precedence: `order.customer`, then the fetched customer. Items come from
/// the order; a just-created order that has none yet falls back to the
/// original selection, priced at selection time.
pub fn normalize(order: &Order, ctx: &NormalizeContext<'_>) -> InvoiceRecord {
    let issuer = resolve_party(
        &[order.company.as_ref(), ctx.session_company],
        COMPANY_RULES,
    );
    let customer = resolve_party(
        &[order.customer.as_ref(), ctx.fetched_customer],
        CUSTOMER_RULES,
    );

    let mut lines: Vec<InvoiceLine> = order
        .items
        .iter()
        .map(|item| InvoiceLine {
            description: item
                .name
                .clone()
                .unwrap_or_else(|| item.product_id.to_string()),
            quantity: item.quantity.max(0),
            unit_price: item.unit_price,
        })
        .collect();

    if lines.is_empty() {
        if let Some(fallback) = ctx.fallback_lines {
            lines = fallback
                .iter()
                .map(|line| InvoiceLine {
                    description: line.name.clone(),
                    quantity: line.quantity.max(0),
                    unit_price: line.unit_price,
                })
                .collect();
        }
    }

    InvoiceRecord {
        code: order.reference(),
        status: order.status.to_string(),
        issued_at: order.created_at,
        issuer,
        customer,
        lines,
    }
}
