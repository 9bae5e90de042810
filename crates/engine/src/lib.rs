//! Fulfillment engine: persistence collaborators, per-item-code locking,
//! reservation orchestration and read-only queries.

pub mod lock;
pub mod query;
pub mod reservation;
pub mod store;


pub use lock::LockRegistry;
pub use query::FulfillmentQueryService;
pub use reservation::{EngineError, ReservationEngine};
pub use store::{
    InMemoryLedgerStore, InMemoryOrderItemStore, LedgerStore, OrderItemStore, StoreError,
};
