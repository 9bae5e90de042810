use serde::{Deserialize, Serialize};

/// Order-item fulfillment lifecycle.
///
/// The stock-driven portion (`pending`/`purchased_partial`/`purchased`) is
/// owned by [`derive_status`]; `quoted` and everything past `purchased` are
/// advanced by external signals (price set, NF attached, tracking code set)
/// and are never regressed by stock logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Pending,
    Quoted,
    PurchasedPartial,
    Purchased,
    InSeparation,
    InTransit,
    Delivered,
}

impl FulfillmentStatus {
    /// Position in the lifecycle, used for monotonicity checks.
    pub fn rank(self) -> u8 {
        match self {
            FulfillmentStatus::Pending => 0,
            FulfillmentStatus::Quoted => 1,
            FulfillmentStatus::PurchasedPartial => 2,
            FulfillmentStatus::Purchased => 3,
            FulfillmentStatus::InSeparation => 4,
            FulfillmentStatus::InTransit => 5,
            FulfillmentStatus::Delivered => 6,
        }
    }

    /// Stages set by collaborators outside the fulfillment core.
    pub fn is_external_signal(self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Quoted
                | FulfillmentStatus::InSeparation
                | FulfillmentStatus::InTransit
                | FulfillmentStatus::Delivered
        )
    }
}

/// Derive an order item's status from its quantities.
///
/// Pure and total: every combination of non-negative inputs maps to exactly
/// one status, and no input panics. Stages past `purchased` belong to
/// downstream collaborators and pass through untouched; `quoted` is likewise
/// preserved while nothing has been satisfied yet.
pub fn derive_status(
    current: FulfillmentStatus,
    required_quantity: i64,
    purchased_quantity: i64,
    reserved_from_stock_quantity: i64,
) -> FulfillmentStatus {
    if current.rank() > FulfillmentStatus::Purchased.rank() {
        return current;
    }

    let total_satisfied = purchased_quantity.saturating_add(reserved_from_stock_quantity);

    if total_satisfied == 0 {
        return if current == FulfillmentStatus::Quoted {
            FulfillmentStatus::Quoted
        } else {
            FulfillmentStatus::Pending
        };
    }

    if total_satisfied >= required_quantity {
        FulfillmentStatus::Purchased
    } else {
        FulfillmentStatus::PurchasedPartial
    }
}
