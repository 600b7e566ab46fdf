use tracing::{info, instrument, warn};

use crate::api::OrdersApi;
use crate::errors::ServiceError;
use crate::models::order::{Order, OrderStatus};
use crate::services::attachments::{InvoiceAttachment, InvoiceAttachmentService};
use crate::services::pipeline::SubmissionWarning;

/// Result of a status transition. Status and invoicing are independent
/// facts: a failed auto-invoice shows up as `invoice_warning` while the
/// status change itself stands.
#[derive(Debug)]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
    pub invoice: Option<InvoiceAttachment>,
    pub invoice_warning: Option<SubmissionWarning>,
}

/// Drives the `received -> in_process -> sent` lifecycle and owns its one
/// side effect: the first arrival at `sent` on an order without an invoice
/// triggers generation and upload, exactly once.
#[derive(Clone, Debug)]
pub struct OrderStatusService {
    orders: OrdersApi,
    attachments: InvoiceAttachmentService,
}

impl OrderStatusService {
    pub fn new(orders: OrdersApi, attachments: InvoiceAttachmentService) -> Self {
        Self {
            orders,
            attachments,
        }
    }

    /// Persists the new status first, then fires the auto-invoice when the
    /// order just reached `sent` without an attachment.
    ///
    /// Transitions the machine does not define (regressions, no-ops) are
    /// passed through as direct unguarded writes (the backend may reject
    /// them) and never fire side effects.
    #[instrument(skip(self, order), fields(order_id = ?order.id, next = %next))]
    pub async fn set_status(
        &self,
        order: &Order,
        next: OrderStatus,
    ) -> Result<StatusChange, ServiceError> {
        let order_id = order
            .id
            .ok_or_else(|| ServiceError::ValidationError("order has no id".to_string()))?;

        let previous = order.status;
        let defined = previous.can_advance_to(next);
        if !defined {
            warn!(
                %previous,
                %next,
                "transition not defined by the lifecycle; writing unguarded"
            );
        }

        let updated = self.orders.update_status(order_id, next).await?;
        info!(order_id = %order_id, %previous, %next, "order status updated");

        // The write response can be thinner than what we already hold; keep
        // the richer snapshot for invoicing and display.
        let mut snapshot = if updated.items.is_empty() && !order.items.is_empty() {
            order.clone()
        } else {
            updated
        };
        snapshot.status = next;
        if snapshot.id.is_none() {
            snapshot.id = Some(order_id);
        }

        let mut change = StatusChange {
            previous,
            invoice: None,
            invoice_warning: None,
            order: snapshot,
        };

        if defined && next == OrderStatus::Sent && !change.order.has_invoice() {
            match self
                .attachments
                .generate_and_upload(&change.order, None, None)
                .await
            {
                Ok(attachment) => {
                    change.order.invoice_url = attachment.url.clone();
                    change.order.invoice_filename = Some(attachment.filename.clone());
                    change.invoice = Some(attachment);
                }
                Err(e) => {
                    // The status change stands regardless.
                    warn!(error = %e, order_id = %order_id, "auto-invoice on sent failed");
                    change.invoice_warning =
                        Some(SubmissionWarning::InvoiceAttachment(e.to_string()));
                }
            }
        }

        Ok(change)
    }
}
