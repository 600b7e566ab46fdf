use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::{OrdersApi, PartiesApi};
use crate::errors::ServiceError;
use crate::invoice::{self, render, NormalizeContext};
use crate::models::cart::SelectionLine;
use crate::models::order::Order;

/// Upload metadata of the invoice document currently attached to an order.
#[derive(Clone, Debug)]
pub struct InvoiceAttachment {
    pub url: Option<String>,
    pub filename: String,
}

/// Manages the rendered invoice document attached to an order: upload,
/// delete, regenerate. An order holds at most one attachment; uploads
/// replace, they never accumulate versions.
#[derive(Clone, Debug)]
pub struct InvoiceAttachmentService {
    orders: OrdersApi,
    parties: PartiesApi,
}

impl InvoiceAttachmentService {
    pub fn new(orders: OrdersApi, parties: PartiesApi) -> Self {
        Self { orders, parties }
    }

    /// Uploads a rendered document, overwriting any prior attachment
    /// reference on the order.
    #[instrument(skip(self, document), fields(order_id = %order_id, filename = %filename))]
    pub async fn upload(
        &self,
        order_id: Uuid,
        document: Vec<u8>,
        filename: &str,
    ) -> Result<InvoiceAttachment, ServiceError> {
        let updated = self
            .orders
            .upload_invoice(order_id, document, filename)
            .await?;
        info!(order_id = %order_id, filename, "invoice attached");
        Ok(InvoiceAttachment {
            url: updated.invoice_url,
            filename: updated
                .invoice_filename
                .unwrap_or_else(|| filename.to_string()),
        })
    }

    /// Removes the attachment. Destructive and irreversible from the
    /// client's side; interactive front ends must confirm first.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete(&self, order_id: Uuid) -> Result<(), ServiceError> {
        self.orders.delete_invoice(order_id).await?;
        info!(order_id = %order_id, "invoice attachment deleted");
        Ok(())
    }

    /// Re-fetches the authoritative order, rebuilds and re-renders the
    /// invoice and replaces the attachment. Used when order data changed
    /// after the first invoice was produced.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn regenerate(&self, order_id: Uuid) -> Result<InvoiceAttachment, ServiceError> {
        let order = self.orders.get(order_id).await?;
        self.generate_and_upload(&order, None, None).await
    }

    /// Normalizes, renders and uploads the invoice for the given order
    /// snapshot. Customer detail is fetched best-effort when the order does
    /// not embed it; a fetch failure only loses detail, never the invoice.
    pub async fn generate_and_upload(
        &self,
        order: &Order,
        fallback_lines: Option<&[SelectionLine]>,
        session_company: Option<&Value>,
    ) -> Result<InvoiceAttachment, ServiceError> {
        let order_id = order
            .id
            .ok_or_else(|| ServiceError::ValidationError("order has no id".to_string()))?;

        let fetched_customer = match (&order.customer, order.customer_id) {
            (None, Some(customer_id)) => match self.parties.customer(customer_id).await {
                Ok(detail) => Some(detail),
                Err(e) => {
                    warn!(error = %e, customer_id = %customer_id, "customer detail unavailable for invoice");
                    None
                }
            },
            _ => None,
        };

        let ctx = NormalizeContext {
            session_company,
            fetched_customer: fetched_customer.as_ref(),
            fallback_lines,
        };
        let record = invoice::normalize(order, &ctx);
        let document = render::render_invoice(&record)?;
        let filename = order.invoice_filename();
        self.upload(order_id, document, &filename).await
    }
}
