use reqwest::multipart::{Form, Part};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::envelope::{parse_entity, parse_list, Paginated};
use super::ApiClient;
use crate::errors::ServiceError;
use crate::models::order::{Order, OrderStatus, PaymentMethod};

/// Line item as sent on create/update.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Create/update body for `/client-orders`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub company_id: Uuid,
    pub items: Vec<OrderItemPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// Body for `/client-orders/{id}/confirm`. `paid: false` registers the full
/// amount as outstanding debt.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayload {
    pub paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

impl ConfirmPayload {
    /// A positive amount is a payment; zero (or no) amount registers debt.
    /// `{paid: true, amount: 0}` is never produced.
    pub fn for_amount(amount: Option<Decimal>, method: Option<PaymentMethod>) -> Self {
        match amount {
            Some(amount) if amount > Decimal::ZERO => Self {
                paid: true,
                amount: Some(amount),
                payment_method: method,
            },
            _ => Self {
                paid: false,
                amount: None,
                payment_method: None,
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub company_id: Option<Uuid>,
}

/// `/client-orders` resource.
#[derive(Clone, Debug)]
pub struct OrdersApi {
    client: ApiClient,
}

impl OrdersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &OrderListQuery) -> Result<Paginated<Order>, ServiceError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(page) = query.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if let Some(company_id) = query.company_id {
            params.push(("companyId", company_id.to_string()));
        }
        let value = self.client.get("client-orders", &params).await?;
        parse_list("client-orders", value)
    }

    pub async fn get(&self, id: Uuid) -> Result<Order, ServiceError> {
        let value = self
            .client
            .get(&format!("client-orders/{id}"), &[])
            .await?;
        parse_entity("client-orders/{id}", value)
    }

    pub async fn create(&self, payload: &OrderPayload) -> Result<Order, ServiceError> {
        let value = self
            .client
            .send_json(Method::POST, "client-orders", payload)
            .await?;
        parse_entity("client-orders", value)
    }

    pub async fn update(&self, id: Uuid, payload: &OrderPayload) -> Result<Order, ServiceError> {
        let value = self
            .client
            .send_json(Method::PATCH, &format!("client-orders/{id}"), payload)
            .await?;
        parse_entity("client-orders/{id}", value)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let value = self
            .client
            .send_json(
                Method::PATCH,
                &format!("client-orders/{id}/status"),
                &serde_json::json!({ "status": status }),
            )
            .await?;
        // Some deployments answer the status write with an empty body.
        if value.is_null() {
            return Ok(Order {
                id: Some(id),
                status,
                ..Order::default()
            });
        }
        parse_entity("client-orders/{id}/status", value)
    }

    pub async fn confirm(&self, id: Uuid, payload: &ConfirmPayload) -> Result<(), ServiceError> {
        self.client
            .send_json(Method::POST, &format!("client-orders/{id}/confirm"), payload)
            .await?;
        Ok(())
    }

    /// Uploads the rendered invoice document, replacing any existing
    /// attachment on the order.
    pub async fn upload_invoice(
        &self,
        id: Uuid,
        document: Vec<u8>,
        filename: &str,
    ) -> Result<Order, ServiceError> {
        let part = Part::bytes(document)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .part("file", part)
            .text("filename", filename.to_string());
        let value = self
            .client
            .send_multipart(&format!("client-orders/{id}/invoice"), form)
            .await?;
        if value.is_null() {
            return Ok(Order {
                id: Some(id),
                invoice_filename: Some(filename.to_string()),
                ..Order::default()
            });
        }
        parse_entity("client-orders/{id}/invoice", value)
    }

    pub async fn delete_invoice(&self, id: Uuid) -> Result<(), ServiceError> {
        self.client
            .delete(&format!("client-orders/{id}/invoice"))
            .await?;
        Ok(())
    }

    /// Identifier-resolution fallback: looks an order up by its
    /// server-generated code and returns the first exact match. The backend
    /// does not guarantee code uniqueness; candidate count is logged so
    /// collisions are visible.
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, order_code: &str) -> Result<Option<Order>, ServiceError> {
        let page = self
            .list(&OrderListQuery {
                search: Some(order_code.to_string()),
                ..OrderListQuery::default()
            })
            .await?;

        let matches: Vec<&Order> = page
            .data
            .iter()
            .filter(|order| order.order_code.as_deref() == Some(order_code))
            .collect();
        if matches.len() > 1 {
            debug!(
                order_code,
                candidates = matches.len(),
                "multiple orders share this code; taking the first"
            );
        }
        Ok(matches.first().map(|order| (*order).clone()))
    }
}
