use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restoq_core::{DomainError, DomainResult, ItemCode, OrderId};

/// A fungible quantity of one item code held as reusable surplus.
///
/// Every unit is tagged with the order that produced it, so consumption can
/// report provenance and rollbacks can restore exactly what was taken.
///
/// Invariant: `quantity > 0`. A unit that reaches zero is removed from its
/// ledger entry, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUnit {
    pub item_code: ItemCode,
    pub quantity: i64,
    pub source_order_id: OrderId,
    pub created_at: DateTime<Utc>,
}

impl StockUnit {
    pub fn new(
        item_code: ItemCode,
        quantity: i64,
        source_order_id: OrderId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation(
                "stock unit quantity must be positive",
            ));
        }
        Ok(Self {
            item_code,
            quantity,
            source_order_id,
            created_at,
        })
    }
}
