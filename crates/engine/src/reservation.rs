//! Reservation orchestration.
//!
//! `ReservationEngine` turns a reservation request into a ledger debit plus
//! an order-item update as one logical transaction:
//!
//! ```text
//! Request
//!   ↓
//! 1. Validate (reject before any mutation)
//!   ↓
//! 2. Acquire the per-item-code lock
//!   ↓
//! 3. Debit the ledger entry, persist it
//!   ↓
//! 4. Apply the fulfilled quantity to the target order item, re-derive status
//!   ↓
//! 5. Persist the order item
//!   ↓
//! 6. Publish events (after persistence; at-least-once)
//! ```
//!
//! Any failure after step 3 re-credits the debited units by restoring the
//! pre-debit entry, so no stock is ever lost to a failed reservation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use restoq_core::{DomainError, ItemCode, OrderId};
use restoq_events::{Event, EventBus, EventEnvelope};
use restoq_orders::{FulfillmentStatus, OrderItemEvent, OrderItemKey, StatusChanged};
use restoq_stock::{
    LedgerEntry, ReservationRequest, ReservationResult, StockEvent, SurplusConsumed,
    SurplusCredited,
};

use crate::lock::LockRegistry;
use crate::store::{LedgerStore, OrderItemStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// A request value failed validation (deterministic, nothing mutated).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// The order item referenced by the request does not exist. Any ledger
    /// debit already performed has been re-credited.
    #[error("reservation target not found")]
    TargetNotFound,

    /// The storage collaborator detected a concurrent modification; retry
    /// the whole operation, never part of it.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The storage collaborator failed; no partial ledger mutation remains.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Publication failed after a successful commit (at-least-once; the
    /// state change stands, consumers may see the event on a retry).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvariantViolation(msg) => EngineError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::NotFound => EngineError::TargetNotFound,
            DomainError::Conflict(msg) => EngineError::Conflict(msg),
        }
    }
}

/// Orchestrates surplus consumption against the ledger and the target
/// order item.
///
/// Generic over the persistence collaborators and the event bus so tests
/// wire in-memory implementations and deployments can swap backends without
/// touching domain code.
#[derive(Debug)]
pub struct ReservationEngine<L, O, B> {
    ledgers: L,
    orders: O,
    bus: B,
    locks: LockRegistry,
}

impl<L, O, B> ReservationEngine<L, O, B> {
    pub fn new(ledgers: L, orders: O, bus: B) -> Self {
        Self {
            ledgers,
            orders,
            bus,
            locks: LockRegistry::new(),
        }
    }
}

impl<L, O, B> ReservationEngine<L, O, B>
where
    L: LedgerStore,
    O: OrderItemStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Consume surplus for one target order item.
    ///
    /// Partial fulfillment is a reported outcome, not an error: the caller
    /// inspects `remaining_shortfall` and decides whether to purchase the
    /// rest. Stock is consumed exactly once per call; retry de-duplication
    /// is the caller's responsibility.
    pub fn reserve(
        &self,
        request: &ReservationRequest,
        occurred_at: DateTime<Utc>,
    ) -> Result<ReservationResult, EngineError> {
        request.validate()?;

        let lock = self.locks.for_item(&request.item_code);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let original = self.ledgers.load_entry(&request.item_code)?;
        let mut entry = original.clone();
        let result = entry.debit(request.quantity_requested)?;
        self.ledgers.save_entry(&request.item_code, entry)?;

        let key = OrderItemKey {
            order_id: request.target_order_id,
            item_index: request.target_item_index,
        };
        let mut item = match self.orders.load_item(&key) {
            Ok(Some(item)) => item,
            Ok(None) => {
                self.recredit(&request.item_code, original)?;
                return Err(EngineError::TargetNotFound);
            }
            Err(e) => {
                self.recredit(&request.item_code, original)?;
                return Err(e.into());
            }
        };

        if item.item_code() != &request.item_code {
            self.recredit(&request.item_code, original)?;
            return Err(EngineError::Validation(format!(
                "target item is for '{}' but the reservation is for '{}'",
                item.item_code(),
                request.item_code
            )));
        }

        let previous = item.status();
        if let Err(e) = item.apply_reservation(result.quantity_fulfilled) {
            self.recredit(&request.item_code, original)?;
            return Err(e.into());
        }
        let current = item.status();

        if let Err(e) = self.orders.save_item(item) {
            self.recredit(&request.item_code, original)?;
            return Err(e.into());
        }

        tracing::info!(
            item_code = %request.item_code,
            target_order_id = %request.target_order_id,
            fulfilled = result.quantity_fulfilled,
            shortfall = result.remaining_shortfall,
            "surplus reserved"
        );

        self.publish(
            request.item_code.as_str(),
            &StockEvent::SurplusConsumed(SurplusConsumed {
                item_code: request.item_code.clone(),
                target_order_id: request.target_order_id,
                target_item_index: request.target_item_index,
                quantity_fulfilled: result.quantity_fulfilled,
                remaining_shortfall: result.remaining_shortfall,
                sources: result.sources.clone(),
                occurred_at,
            }),
        )?;
        if current != previous {
            self.publish_status_change(key, previous, current, occurred_at)?;
        }

        Ok(result)
    }

    /// Record reusable surplus produced by an order (finalized with excess,
    /// cancelled, or reduced). Crediting is always this explicit operation;
    /// it is never inferred from quantity edits.
    pub fn credit_surplus(
        &self,
        item_code: &ItemCode,
        quantity: i64,
        source_order_id: OrderId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let lock = self.locks.for_item(item_code);
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut entry = self.ledgers.load_entry(item_code)?;
        entry.credit(quantity, source_order_id, occurred_at)?;
        self.ledgers.save_entry(item_code, entry)?;

        tracing::info!(
            item_code = %item_code,
            quantity,
            source_order_id = %source_order_id,
            "surplus credited"
        );

        self.publish(
            item_code.as_str(),
            &StockEvent::SurplusCredited(SurplusCredited {
                item_code: item_code.clone(),
                quantity,
                source_order_id,
                occurred_at,
            }),
        )
    }

    /// Adjust an order item's purchased quantity and re-derive its status.
    pub fn record_purchase(
        &self,
        key: &OrderItemKey,
        delta: i64,
        occurred_at: DateTime<Utc>,
    ) -> Result<FulfillmentStatus, EngineError> {
        self.mutate_item(key, occurred_at, |item| item.record_purchase(delta))
    }

    /// Accept an externally-driven stage signal (quoted, in separation,
    /// in transit, delivered) for an order item.
    pub fn apply_stage_signal(
        &self,
        key: &OrderItemKey,
        stage: FulfillmentStatus,
        occurred_at: DateTime<Utc>,
    ) -> Result<FulfillmentStatus, EngineError> {
        self.mutate_item(key, occurred_at, |item| item.apply_stage_signal(stage))
    }

    /// Serialize an order-item mutation under the item's per-code lock so it
    /// cannot interleave with a reservation against the same code.
    fn mutate_item(
        &self,
        key: &OrderItemKey,
        occurred_at: DateTime<Utc>,
        apply: impl FnOnce(&mut restoq_orders::OrderItem) -> Result<(), DomainError>,
    ) -> Result<FulfillmentStatus, EngineError> {
        let probe = self
            .orders
            .load_item(key)?
            .ok_or(EngineError::TargetNotFound)?;
        let lock = self.locks.for_item(probe.item_code());
        let _guard = lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        // Reload under the lock; the probe may be stale.
        let mut item = self
            .orders
            .load_item(key)?
            .ok_or(EngineError::TargetNotFound)?;
        let previous = item.status();
        apply(&mut item)?;
        let current = item.status();
        self.orders.save_item(item)?;

        if current != previous {
            self.publish_status_change(*key, previous, current, occurred_at)?;
        }
        Ok(current)
    }

    fn publish_status_change(
        &self,
        key: OrderItemKey,
        previous: FulfillmentStatus,
        current: FulfillmentStatus,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.publish(
            &key.order_id.to_string(),
            &OrderItemEvent::StatusChanged(StatusChanged {
                order_id: key.order_id,
                item_index: key.item_index,
                previous,
                current,
                occurred_at,
            }),
        )
    }

    /// Restore the pre-debit entry so the debited units are visible again.
    fn recredit(&self, item_code: &ItemCode, original: LedgerEntry) -> Result<(), StoreError> {
        tracing::warn!(item_code = %item_code, "re-crediting ledger after failed reservation");
        self.ledgers
            .save_entry(item_code, original)
            .inspect_err(|e| {
                tracing::error!(
                    item_code = %item_code,
                    error = %e,
                    "ledger rollback failed; surplus stays short until the entry is replayed"
                );
            })
    }

    fn publish<E>(&self, stream: &str, event: &E) -> Result<(), EngineError>
    where
        E: Event + Serialize,
    {
        let payload =
            serde_json::to_value(event).map_err(|e| EngineError::Publish(e.to_string()))?;
        let envelope = EventEnvelope::new(Uuid::now_v7(), stream, event.event_type(), payload);
        self.bus
            .publish(envelope)
            .map_err(|e| EngineError::Publish(format!("{e:?}")))
    }
}
