use restoq_core::ItemCode;
use restoq_orders::OrderItem;
use restoq_stock::SourceContribution;

use crate::store::{LedgerStore, StoreError};

/// Read-only view composition for presentation.
///
/// Every method produces a fresh snapshot from the store; nothing is cached
/// and nothing mutates, so calls are safe to repeat and to run concurrently
/// with reservations. Reads deliberately skip the reservation lock.
#[derive(Debug)]
pub struct FulfillmentQueryService<L> {
    ledgers: L,
}

impl<L> FulfillmentQueryService<L> {
    pub fn new(ledgers: L) -> Self {
        Self { ledgers }
    }
}

impl<L> FulfillmentQueryService<L>
where
    L: LedgerStore,
{
    /// Quantity the item still needs beyond purchases and reservations.
    pub fn shortfall(&self, item: &OrderItem) -> i64 {
        item.shortfall()
    }

    /// Total surplus currently available for an item code.
    pub fn available(&self, item_code: &ItemCode) -> Result<i64, StoreError> {
        Ok(self.ledgers.load_entry(item_code)?.available())
    }

    /// Which orders contributed the available surplus, in FIFO order.
    pub fn sources(&self, item_code: &ItemCode) -> Result<Vec<SourceContribution>, StoreError> {
        Ok(self.ledgers.load_entry(item_code)?.sources())
    }

    /// Pre-fill value for a reservation form: no more than the item still
    /// needs, no more than the ledger can give.
    pub fn suggested_reservation_quantity(
        &self,
        item: &OrderItem,
        item_code: &ItemCode,
    ) -> Result<i64, StoreError> {
        Ok(item.shortfall().min(self.available(item_code)?))
    }
}
