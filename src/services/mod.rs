//! Fulfillment services over the backend REST surface.

pub mod attachments;
pub mod pipeline;
pub mod status;
pub mod stock;
pub mod submission;

pub use attachments::{InvoiceAttachment, InvoiceAttachmentService};
pub use pipeline::{Stage, StageOutcome, SubmissionReport, SubmissionWarning};
pub use status::{OrderStatusService, StatusChange};
pub use stock::{StockAssessment, StockCheckResult, StockValidator};
pub use submission::{OrderSubmission, PaymentInstruction, SubmissionService};
