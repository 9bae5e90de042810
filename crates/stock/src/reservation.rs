use serde::{Deserialize, Serialize};

use restoq_core::{DomainError, DomainResult, ItemCode, OrderId};

/// Intent to consume surplus for one target order item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub target_order_id: OrderId,
    pub target_item_index: u32,
    pub item_code: ItemCode,
    pub quantity_requested: i64,
}

impl ReservationRequest {
    /// Reject before any mutation happens.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity_requested <= 0 {
            return Err(DomainError::validation(
                "quantity requested must be positive",
            ));
        }
        Ok(())
    }
}

/// One order's contribution to a fulfilled reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContribution {
    pub source_order_id: OrderId,
    pub quantity_taken: i64,
}

/// Outcome of consuming surplus.
///
/// Invariants: `quantity_fulfilled + remaining_shortfall == quantity
/// requested` and `sum(sources.quantity_taken) == quantity_fulfilled`.
/// A non-zero shortfall is a reported outcome, not an error; the caller
/// decides whether to proceed partially or purchase the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationResult {
    pub quantity_fulfilled: i64,
    pub sources: Vec<SourceContribution>,
    pub remaining_shortfall: i64,
}

impl ReservationResult {
    pub fn is_complete(&self) -> bool {
        self.remaining_shortfall == 0
    }

    /// Total taken across all contributing orders.
    pub fn total_taken(&self) -> i64 {
        self.sources.iter().map(|s| s.quantity_taken).sum()
    }
}
