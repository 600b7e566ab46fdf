use std::collections::HashMap;

use tracing::{instrument, warn};
use uuid::Uuid;

use crate::api::products::{ProductsApi, StockRequestLine};
use crate::errors::ServiceError;
use crate::models::cart::SelectionLine;

/// One line of a completed stock check, requested and available merged.
#[derive(Clone, Debug)]
pub struct StockCheckResult {
    pub product_id: Uuid,
    pub requested: i32,
    pub available: i32,
    pub sufficient: bool,
}

/// Outcome of an availability check. The check is advisory to callers (it
/// can preempt submission with a precise message) but the backend remains
/// authoritative and re-validates at order-write time, which is why a
/// transport failure degrades instead of blocking.
#[derive(Clone, Debug)]
pub enum StockAssessment {
    Confirmed(Vec<StockCheckResult>),
    /// The check could not be performed; proceed at the caller's risk.
    Unverified { reason: String },
}

impl StockAssessment {
    pub fn shortfalls(&self) -> Vec<&StockCheckResult> {
        match self {
            StockAssessment::Confirmed(lines) => {
                lines.iter().filter(|line| !line.sufficient).collect()
            }
            StockAssessment::Unverified { .. } => Vec::new(),
        }
    }
}

/// Server round-trip confirming requested quantities before commit.
/// Independent of the cart so both checkout flows can reuse it.
#[derive(Clone, Debug)]
pub struct StockValidator {
    products: ProductsApi,
}

impl StockValidator {
    pub fn new(products: ProductsApi) -> Self {
        Self { products }
    }

    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn check(&self, lines: &[SelectionLine]) -> StockAssessment {
        let request: Vec<StockRequestLine> = lines
            .iter()
            .map(|line| StockRequestLine {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect();

        let verdicts = match self.products.check_stock(&request).await {
            Ok(verdicts) => verdicts,
            Err(e) => {
                warn!(error = %e, "stock check unavailable; proceeding unverified");
                return StockAssessment::Unverified {
                    reason: e.to_string(),
                };
            }
        };

        let requested_by_id: HashMap<Uuid, i32> = request
            .iter()
            .map(|line| (line.product_id, line.quantity))
            .collect();

        let results = verdicts
            .into_iter()
            .map(|verdict| StockCheckResult {
                requested: requested_by_id
                    .get(&verdict.product_id)
                    .copied()
                    .unwrap_or(0),
                product_id: verdict.product_id,
                available: verdict.available,
                sufficient: verdict.sufficient,
            })
            .collect();
        StockAssessment::Confirmed(results)
    }
}

/// Itemized message for a blocked submission, e.g.
/// `"Monitor" (pedido 5, disponible 3)`.
pub fn shortfall_message(shortfalls: &[&StockCheckResult], lines: &[SelectionLine]) -> String {
    let names: HashMap<Uuid, &str> = lines
        .iter()
        .map(|line| (line.product_id, line.name.as_str()))
        .collect();
    shortfalls
        .iter()
        .map(|result| {
            let name = names
                .get(&result.product_id)
                .copied()
                .unwrap_or("producto desconocido");
            format!(
                "\"{name}\" (pedido {}, disponible {})",
                result.requested, result.available
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceError {
    pub(crate) fn insufficient_stock(
        shortfalls: &[&StockCheckResult],
        lines: &[SelectionLine],
    ) -> Self {
        ServiceError::InsufficientStock(shortfall_message(shortfalls, lines))
    }
}
