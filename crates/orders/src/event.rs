use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restoq_core::OrderId;
use restoq_events::Event;

use crate::status::FulfillmentStatus;

/// Event: StatusChanged.
///
/// Emitted whenever a quantity mutation or stage signal moves an order
/// item's status. Notification collaborators decide from `current` whether
/// to surface anything to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub item_index: u32,
    pub previous: FulfillmentStatus,
    pub current: FulfillmentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderItemEvent {
    StatusChanged(StatusChanged),
}

impl Event for OrderItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderItemEvent::StatusChanged(_) => "orders.item.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderItemEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}
