//! Persistence collaborator contracts and in-memory implementations.
//!
//! Each call is atomic on its own (single-document semantics); the engine
//! layers the per-item-code lock on top and never asks the store for
//! multi-document transactions.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use restoq_core::ItemCode;
use restoq_orders::{OrderItem, OrderItemKey};
use restoq_stock::LedgerEntry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage backend reported a failure.
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn poisoned(msg: impl Into<String>) -> Self {
        Self::Poisoned(msg.into())
    }
}

/// Ledger persistence collaborator.
pub trait LedgerStore: Send + Sync {
    /// Load the ledger entry for an item code.
    ///
    /// Codes with no recorded surplus yield an empty entry, not an error.
    fn load_entry(&self, item_code: &ItemCode) -> Result<LedgerEntry, StoreError>;

    /// Replace the stored entry for an item code.
    fn save_entry(&self, item_code: &ItemCode, entry: LedgerEntry) -> Result<(), StoreError>;
}

/// Order-item persistence collaborator.
pub trait OrderItemStore: Send + Sync {
    fn load_item(&self, key: &OrderItemKey) -> Result<Option<OrderItem>, StoreError>;

    fn save_item(&self, item: OrderItem) -> Result<(), StoreError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn load_entry(&self, item_code: &ItemCode) -> Result<LedgerEntry, StoreError> {
        (**self).load_entry(item_code)
    }

    fn save_entry(&self, item_code: &ItemCode, entry: LedgerEntry) -> Result<(), StoreError> {
        (**self).save_entry(item_code, entry)
    }
}

impl<S> OrderItemStore for Arc<S>
where
    S: OrderItemStore + ?Sized,
{
    fn load_item(&self, key: &OrderItemKey) -> Result<Option<OrderItem>, StoreError> {
        (**self).load_item(key)
    }

    fn save_item(&self, item: OrderItem) -> Result<(), StoreError> {
        (**self).save_item(item)
    }
}

/// In-memory ledger store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    entries: RwLock<HashMap<ItemCode, LedgerEntry>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn load_entry(&self, item_code: &ItemCode) -> Result<LedgerEntry, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::poisoned("ledger store"))?;
        Ok(entries
            .get(item_code)
            .cloned()
            .unwrap_or_else(|| LedgerEntry::new(item_code.clone())))
    }

    fn save_entry(&self, item_code: &ItemCode, entry: LedgerEntry) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::poisoned("ledger store"))?;

        // Exhausted entries are removed rather than stored empty.
        if entry.is_empty() {
            entries.remove(item_code);
        } else {
            entries.insert(item_code.clone(), entry);
        }
        Ok(())
    }
}

/// In-memory order-item store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderItemStore {
    items: RwLock<HashMap<OrderItemKey, OrderItem>>,
}

impl InMemoryOrderItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderItemStore for InMemoryOrderItemStore {
    fn load_item(&self, key: &OrderItemKey) -> Result<Option<OrderItem>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::poisoned("order item store"))?;
        Ok(items.get(key).cloned())
    }

    fn save_item(&self, item: OrderItem) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::poisoned("order item store"))?;
        items.insert(item.key(), item);
        Ok(())
    }
}
