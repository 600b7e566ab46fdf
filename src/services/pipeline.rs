//! Stage/outcome vocabulary for the order submission pipeline.
//!
//! The orchestrator is an explicit ordered list of stages run by a single
//! runner: a `Fatal` outcome stops the run before any further write, a
//! `Warning` is accumulated and never undoes a prior stage, and `Skipped`
//! records why a stage did not apply. This replaces scattered
//! log-and-continue branching with one composable control structure.

use strum::Display;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::order::Order;
use crate::services::attachments::InvoiceAttachment;

/// The pipeline's stages, in execution order. Each is a distinct failure
/// domain with its own fatal/non-fatal policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Preflight,
    StockCheck,
    Persist,
    ResolveIdentifier,
    Confirm,
    Transition,
    Refresh,
    Invoice,
}

pub const STAGES: [Stage; 8] = [
    Stage::Preflight,
    Stage::StockCheck,
    Stage::Persist,
    Stage::ResolveIdentifier,
    Stage::Confirm,
    Stage::Transition,
    Stage::Refresh,
    Stage::Invoice,
];

/// Result of running one stage.
#[derive(Debug)]
pub enum StageOutcome {
    Completed,
    Skipped(&'static str),
    /// Stops the pipeline; the caller sees a single actionable error and no
    /// write has happened beyond what earlier stages already committed.
    Fatal(ServiceError),
    /// Recorded and surfaced, but the pipeline continues and nothing is
    /// rolled back.
    Warning(SubmissionWarning),
}

/// Non-fatal failures a submission can accumulate.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SubmissionWarning {
    #[error("stock could not be verified ({0}); the server re-checks at write time")]
    StockUnverified(String),

    #[error("the order was saved but its identifier could not be resolved; payment, status and invoicing were skipped")]
    IdentifierUnresolved { order_code: Option<String> },

    #[error("payment confirmation failed: {0}")]
    PaymentConfirmation(String),

    #[error("status transition failed: {0}")]
    StatusTransition(String),

    #[error("could not fetch the saved order back: {0}")]
    OrderRefresh(String),

    #[error("invoice generation or upload failed: {0}")]
    InvoiceAttachment(String),
}

/// Final report of a submission: the order reference that was committed plus
/// everything that went sideways on the way.
#[derive(Debug, Default)]
pub struct SubmissionReport {
    pub order_id: Option<Uuid>,
    pub order_code: Option<String>,
    pub order: Option<Order>,
    pub invoice: Option<InvoiceAttachment>,
    pub warnings: Vec<SubmissionWarning>,
}

impl SubmissionReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Composite user-facing summary: success, or "created, but X failed".
    pub fn summary(&self) -> String {
        let reference = self
            .order_code
            .clone()
            .or_else(|| self.order_id.map(|id| id.to_string()))
            .unwrap_or_else(|| "pedido".to_string());
        if self.warnings.is_empty() {
            format!("{reference}: guardado correctamente")
        } else {
            let details = self
                .warnings
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            format!("{reference}: guardado, pero {details}")
        }
    }
}
