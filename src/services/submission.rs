//! The order submission orchestrator.
//!
//! Both checkout flows (cart-driven and the internal order-composition view)
//! converge here. The pipeline is a strict sequence of awaited stages (see
//! [`crate::services::pipeline`]) where each stage's fatal/non-fatal policy
//! is decided before moving on, and no stage undoes a prior one. The backend
//! does not wrap any of this in a transaction; stages 5 onward tolerate the
//! order row already being committed.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::api::orders::{ConfirmPayload, OrderItemPayload, OrderPayload, OrdersApi};
use crate::errors::ServiceError;
use crate::models::cart::{clamp_quantity, SelectionLine};
use crate::models::order::{Order, OrderItem, OrderStatus, PaymentMethod};
use crate::services::attachments::{InvoiceAttachment, InvoiceAttachmentService};
use crate::services::pipeline::{Stage, StageOutcome, SubmissionReport, SubmissionWarning, STAGES};
use crate::services::status::OrderStatusService;
use crate::services::stock::{StockAssessment, StockValidator};

/// Payment to register at confirm time. An amount of zero registers the
/// order as outstanding debt rather than a zero payment.
#[derive(Clone, Debug)]
pub struct PaymentInstruction {
    pub amount: Decimal,
    pub method: Option<PaymentMethod>,
}

/// Everything a submission needs. The target company comes from the session
/// context (internal flow) or the cart (public flow), never guessed.
#[derive(Clone, Debug, Default)]
pub struct OrderSubmission {
    pub company_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub items: Vec<SelectionLine>,
    pub description: Option<String>,
    pub payment: Option<PaymentInstruction>,
    /// Transition the order straight to `sent` after saving.
    pub mark_as_sent: bool,
    /// Set when editing an existing order: switches stage 3 to the update
    /// path and makes identifier resolution trivial.
    pub existing_order_id: Option<Uuid>,
    /// Session company detail, used as the invoice issuer fallback.
    pub session_company: Option<Value>,
}

/// Mutable state threaded through the stage runner.
struct SubmissionContext {
    input: OrderSubmission,
    warnings: Vec<SubmissionWarning>,
    /// Response of the create/update write (stage 3).
    persisted: Option<Order>,
    resolved_id: Option<Uuid>,
    /// Identifier resolution failed: the order row exists server-side but
    /// stages 5-8 cannot address it and are skipped.
    degraded: bool,
    /// Authoritative order (stage 7), or the best snapshot in hand.
    full_order: Option<Order>,
    invoice: Option<InvoiceAttachment>,
    /// Invoice generation already ran (inside the status transition); a
    /// failed non-fatal stage is reported once, not retried.
    invoice_attempted: bool,
}

impl SubmissionContext {
    fn new(input: OrderSubmission) -> Self {
        Self {
            input,
            warnings: Vec::new(),
            persisted: None,
            resolved_id: None,
            degraded: false,
            full_order: None,
            invoice: None,
            invoice_attempted: false,
        }
    }

    /// The freshest order snapshot available, with the resolved id injected
    /// and missing items backfilled from the original selection so invoice
    /// generation always has lines to work with.
    fn best_snapshot(&self) -> Option<Order> {
        let base = self.full_order.as_ref().or(self.persisted.as_ref())?;
        let mut snapshot = base.clone();
        if snapshot.id.is_none() {
            snapshot.id = self.resolved_id;
        }
        if snapshot.items.is_empty() {
            snapshot.items = self
                .input
                .items
                .iter()
                .map(|line| OrderItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    name: Some(line.name.clone()),
                    sku: line.sku.clone(),
                })
                .collect();
        }
        if snapshot.company_id.is_none() {
            snapshot.company_id = self.input.company_id;
        }
        if snapshot.customer_id.is_none() {
            snapshot.customer_id = self.input.customer_id;
        }
        Some(snapshot)
    }

    fn order_code(&self) -> Option<String> {
        self.full_order
            .as_ref()
            .and_then(|o| o.order_code.clone())
            .or_else(|| self.persisted.as_ref().and_then(|o| o.order_code.clone()))
    }

    fn into_report(self) -> SubmissionReport {
        let order_code = self.order_code();
        SubmissionReport {
            order_id: self.resolved_id,
            order_code,
            order: self.best_snapshot(),
            invoice: self.invoice,
            warnings: self.warnings,
        }
    }
}

/// Runs the submission pipeline. Construct once and reuse; cheap to clone.
#[derive(Clone, Debug)]
pub struct SubmissionService {
    orders: OrdersApi,
    stock: StockValidator,
    status: OrderStatusService,
    attachments: InvoiceAttachmentService,
}

impl SubmissionService {
    pub fn new(
        orders: OrdersApi,
        stock: StockValidator,
        status: OrderStatusService,
        attachments: InvoiceAttachmentService,
    ) -> Self {
        Self {
            orders,
            stock,
            status,
            attachments,
        }
    }

    /// Submits an order through the staged pipeline.
    ///
    /// Fatal outcomes (local validation, authoritative stock shortfall) stop
    /// the run before the order write; every later failure is accumulated as
    /// a warning on the report; the order itself is never considered failed
    /// once the write has committed.
    #[instrument(skip(self, submission), fields(company_id = ?submission.company_id, item_count = submission.items.len()))]
    pub async fn submit(
        &self,
        submission: OrderSubmission,
    ) -> Result<SubmissionReport, ServiceError> {
        let mut ctx = SubmissionContext::new(submission);

        for stage in STAGES {
            match self.run_stage(stage, &mut ctx).await {
                StageOutcome::Completed => debug!(%stage, "stage completed"),
                StageOutcome::Skipped(reason) => debug!(%stage, reason, "stage skipped"),
                StageOutcome::Warning(warning) => {
                    warn!(%stage, %warning, "stage failed non-fatally");
                    ctx.warnings.push(warning);
                }
                StageOutcome::Fatal(e) => {
                    error!(%stage, error = %e, "submission aborted");
                    return Err(e);
                }
            }
        }

        Ok(ctx.into_report())
    }

    async fn run_stage(&self, stage: Stage, ctx: &mut SubmissionContext) -> StageOutcome {
        match stage {
            Stage::Preflight => Self::preflight(ctx),
            Stage::StockCheck => self.stock_check(ctx).await,
            Stage::Persist => self.persist(ctx).await,
            Stage::ResolveIdentifier => self.resolve_identifier(ctx).await,
            Stage::Confirm => self.confirm(ctx).await,
            Stage::Transition => self.transition(ctx).await,
            Stage::Refresh => self.refresh(ctx).await,
            Stage::Invoice => self.invoice(ctx).await,
        }
    }

    /// Stage 1: local validation, before any network call.
    fn preflight(ctx: &mut SubmissionContext) -> StageOutcome {
        if ctx.input.company_id.is_none() {
            return StageOutcome::Fatal(ServiceError::ValidationError(
                "no company selected for the order".to_string(),
            ));
        }
        if ctx.input.items.is_empty() {
            return StageOutcome::Fatal(ServiceError::ValidationError(
                "the order has no items".to_string(),
            ));
        }
        for line in &ctx.input.items {
            if line.quantity < 1 {
                return StageOutcome::Fatal(ServiceError::ValidationError(format!(
                    "\"{}\": quantity must be at least 1",
                    line.name
                )));
            }
            if let Some(stock) = line.known_stock {
                if line.quantity > stock {
                    return StageOutcome::Fatal(ServiceError::ValidationError(format!(
                        "\"{}\": quantity {} exceeds known stock {}",
                        line.name, line.quantity, stock
                    )));
                }
            }
        }
        StageOutcome::Completed
    }

    /// Stage 2: authoritative stock check. A shortfall is fatal; an
    /// unreachable validator degrades to a warning because the backend
    /// re-validates at write time anyway.
    async fn stock_check(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        match self.stock.check(&ctx.input.items).await {
            StockAssessment::Unverified { reason } => {
                StageOutcome::Warning(SubmissionWarning::StockUnverified(reason))
            }
            assessment @ StockAssessment::Confirmed(_) => {
                let shortfalls = assessment.shortfalls();
                if shortfalls.is_empty() {
                    StageOutcome::Completed
                } else {
                    StageOutcome::Fatal(ServiceError::insufficient_stock(
                        &shortfalls,
                        &ctx.input.items,
                    ))
                }
            }
        }
    }

    /// Stage 3: the order write. Create, or update when editing.
    async fn persist(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        let payload = Self::payload_for(&ctx.input);
        let result = match ctx.input.existing_order_id {
            Some(id) => self.orders.update(id, &payload).await,
            None => self.orders.create(&payload).await,
        };
        match result {
            Ok(order) => {
                ctx.persisted = Some(order);
                StageOutcome::Completed
            }
            Err(e) => StageOutcome::Fatal(e),
        }
    }

    /// Stage 4: pin down the order id. The create response may omit it; the
    /// order code is the fallback lookup key. Unresolvable is NOT failure
    /// (the row is committed server-side) but stages 5-8 are skipped.
    async fn resolve_identifier(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        if let Some(id) = ctx.input.existing_order_id {
            ctx.resolved_id = Some(id);
            return StageOutcome::Completed;
        }
        if let Some(id) = ctx.persisted.as_ref().and_then(|o| o.id) {
            ctx.resolved_id = Some(id);
            return StageOutcome::Completed;
        }

        let order_code = ctx.persisted.as_ref().and_then(|o| o.order_code.clone());
        if let Some(code) = &order_code {
            match self.orders.find_by_code(code).await {
                Ok(Some(found)) if found.id.is_some() => {
                    ctx.resolved_id = found.id;
                    // The listing row is also our best snapshot so far.
                    ctx.persisted = Some(found);
                    return StageOutcome::Completed;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, code, "order lookup by code failed");
                }
            }
        }

        ctx.degraded = true;
        StageOutcome::Warning(SubmissionWarning::IdentifierUnresolved { order_code })
    }

    /// Stage 5: register payment or debt.
    async fn confirm(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        if ctx.degraded {
            return StageOutcome::Skipped("identifier unresolved");
        }
        let Some(payment) = &ctx.input.payment else {
            return StageOutcome::Skipped("no payment instruction");
        };
        let Some(id) = ctx.resolved_id else {
            return StageOutcome::Skipped("no order id");
        };

        let payload = ConfirmPayload::for_amount(Some(payment.amount), payment.method);
        match self.orders.confirm(id, &payload).await {
            Ok(()) => StageOutcome::Completed,
            Err(e) => StageOutcome::Warning(SubmissionWarning::PaymentConfirmation(e.to_string())),
        }
    }

    /// Stage 6: optional transition straight to `sent`. Delegates to the
    /// status state machine, which may auto-invoice.
    async fn transition(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        if ctx.degraded {
            return StageOutcome::Skipped("identifier unresolved");
        }
        if !ctx.input.mark_as_sent {
            return StageOutcome::Skipped("not requested");
        }
        let Some(snapshot) = ctx.best_snapshot() else {
            return StageOutcome::Skipped("no order snapshot");
        };

        match self.status.set_status(&snapshot, OrderStatus::Sent).await {
            Ok(change) => {
                // Any invoice outcome inside the transition counts as the
                // one invoice attempt for this submission.
                if change.invoice.is_some() || change.invoice_warning.is_some() {
                    ctx.invoice_attempted = true;
                }
                ctx.invoice = change.invoice;
                if let Some(warning) = change.invoice_warning {
                    ctx.warnings.push(warning);
                }
                ctx.full_order = Some(change.order);
                StageOutcome::Completed
            }
            Err(e) => StageOutcome::Warning(SubmissionWarning::StatusTransition(e.to_string())),
        }
    }

    /// Stage 7: fetch the authoritative order back. Invoice generation needs
    /// fully-populated company/customer/item data the write responses may
    /// not carry; on failure we fall back to the snapshot already in hand.
    async fn refresh(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        if ctx.degraded {
            return StageOutcome::Skipped("identifier unresolved");
        }
        let Some(id) = ctx.resolved_id else {
            return StageOutcome::Skipped("no order id");
        };
        match self.orders.get(id).await {
            Ok(order) => {
                ctx.full_order = Some(order);
                StageOutcome::Completed
            }
            Err(e) => StageOutcome::Warning(SubmissionWarning::OrderRefresh(e.to_string())),
        }
    }

    /// Stage 8: invoice generation and upload.
    async fn invoice(&self, ctx: &mut SubmissionContext) -> StageOutcome {
        if ctx.degraded {
            return StageOutcome::Skipped("identifier unresolved");
        }
        if ctx.invoice_attempted {
            return StageOutcome::Skipped("already attempted during status transition");
        }
        let Some(order) = ctx.best_snapshot() else {
            return StageOutcome::Skipped("no usable order");
        };
        if order.has_invoice() {
            return StageOutcome::Skipped("invoice already attached");
        }

        ctx.invoice_attempted = true;
        match self
            .attachments
            .generate_and_upload(
                &order,
                Some(&ctx.input.items),
                ctx.input.session_company.as_ref(),
            )
            .await
        {
            Ok(attachment) => {
                if let Some(full) = ctx.full_order.as_mut() {
                    full.invoice_url = attachment.url.clone();
                    full.invoice_filename = Some(attachment.filename.clone());
                }
                ctx.invoice = Some(attachment);
                StageOutcome::Completed
            }
            Err(e) => StageOutcome::Warning(SubmissionWarning::InvoiceAttachment(e.to_string())),
        }
    }

    /// Quantities are clamped to `[1, known stock]` before being sent.
    fn payload_for(input: &OrderSubmission) -> OrderPayload {
        let items = input
            .items
            .iter()
            .map(|line| OrderItemPayload {
                product_id: line.product_id,
                quantity: match line.known_stock {
                    Some(stock) => clamp_quantity(line.quantity, stock),
                    None => line.quantity.max(1),
                },
                unit_price: line.unit_price,
                name: Some(line.name.clone()),
                sku: line.sku.clone(),
            })
            .collect();
        OrderPayload {
            // Preflight guarantees presence; a default UUID never reaches
            // the wire.
            company_id: input.company_id.unwrap_or_default(),
            items,
            description: input.description.clone(),
            customer_id: input.customer_id,
            payment_method: input.payment.as_ref().and_then(|p| p.method),
        }
    }
}
