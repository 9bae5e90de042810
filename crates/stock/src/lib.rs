//! Stock ledger domain module.
//!
//! This crate contains the bookkeeping rules for reusable surplus stock,
//! implemented purely as deterministic domain logic (no IO, no locking;
//! the engine crate owns the per-item-code discipline).

pub mod event;
pub mod ledger;
pub mod reservation;
pub mod unit;

pub use event::{StockEvent, SurplusConsumed, SurplusCredited};
pub use ledger::LedgerEntry;
pub use reservation::{ReservationRequest, ReservationResult, SourceContribution};
pub use unit::StockUnit;
