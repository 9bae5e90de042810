use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restoq_core::{ItemCode, OrderId};
use restoq_events::Event;

use crate::reservation::SourceContribution;

/// Event: SurplusCredited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurplusCredited {
    pub item_code: ItemCode,
    pub quantity: i64,
    pub source_order_id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SurplusConsumed.
///
/// Carries the full provenance of the debit so audit consumers never have to
/// reconstruct it from ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurplusConsumed {
    pub item_code: ItemCode,
    pub target_order_id: OrderId,
    pub target_item_index: u32,
    pub quantity_fulfilled: i64,
    pub remaining_shortfall: i64,
    pub sources: Vec<SourceContribution>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    SurplusCredited(SurplusCredited),
    SurplusConsumed(SurplusConsumed),
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::SurplusCredited(_) => "stock.surplus.credited",
            StockEvent::SurplusConsumed(_) => "stock.surplus.consumed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::SurplusCredited(e) => e.occurred_at,
            StockEvent::SurplusConsumed(e) => e.occurred_at,
        }
    }
}
