//! `restoq-events` — event abstractions and the in-process bus.
//!
//! State is persisted first, events are published second; everything in this
//! crate is distribution mechanics, not storage.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
