use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use restoq_core::ItemCode;

/// Registry handing out one mutex per item code.
///
/// The ledger entry for an item code is the shared mutable resource. Its
/// mutex is held across debit, order-item update and persistence so that
/// concurrent reservations and credits against the same code observe them
/// as a single atomic step. Different item codes never contend.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: RwLock<HashMap<ItemCode, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or lazily create) the lock for an item code.
    pub fn for_item(&self, item_code: &ItemCode) -> Arc<Mutex<()>> {
        if let Ok(locks) = self.locks.read() {
            if let Some(lock) = locks.get(item_code) {
                return Arc::clone(lock);
            }
        }

        let mut locks = match self.locks.write() {
            Ok(guard) => guard,
            // A poisoned registry only means a writer panicked while
            // inserting; the map itself is still usable.
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(locks.entry(item_code.clone()).or_default())
    }
}
