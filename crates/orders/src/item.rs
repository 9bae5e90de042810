use serde::{Deserialize, Serialize};

use restoq_core::{DomainError, DomainResult, ItemCode, OrderId};

use crate::status::{FulfillmentStatus, derive_status};

/// Locator of one line inside an order, the unit the persistence
/// collaborator loads and saves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderItemKey {
    pub order_id: OrderId,
    pub item_index: u32,
}

/// One requested line of a purchase order.
///
/// `status` is derived from the three quantities whenever one of them moves;
/// it is never written directly once stock logic is involved. External
/// collaborators advance the later stages through [`OrderItem::apply_stage_signal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    order_id: OrderId,
    item_index: u32,
    item_code: ItemCode,
    required_quantity: i64,
    purchased_quantity: i64,
    reserved_from_stock_quantity: i64,
    status: FulfillmentStatus,
}

impl OrderItem {
    pub fn new(
        order_id: OrderId,
        item_index: u32,
        item_code: ItemCode,
        required_quantity: i64,
    ) -> DomainResult<Self> {
        if required_quantity < 0 {
            return Err(DomainError::validation(
                "required quantity cannot be negative",
            ));
        }
        Ok(Self {
            order_id,
            item_index,
            item_code,
            required_quantity,
            purchased_quantity: 0,
            reserved_from_stock_quantity: 0,
            status: FulfillmentStatus::Pending,
        })
    }

    pub fn key(&self) -> OrderItemKey {
        OrderItemKey {
            order_id: self.order_id,
            item_index: self.item_index,
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn item_index(&self) -> u32 {
        self.item_index
    }

    pub fn item_code(&self) -> &ItemCode {
        &self.item_code
    }

    pub fn required_quantity(&self) -> i64 {
        self.required_quantity
    }

    pub fn purchased_quantity(&self) -> i64 {
        self.purchased_quantity
    }

    pub fn reserved_from_stock_quantity(&self) -> i64 {
        self.reserved_from_stock_quantity
    }

    pub fn status(&self) -> FulfillmentStatus {
        self.status
    }

    /// Quantity still unsatisfied by purchase or reservation.
    pub fn shortfall(&self) -> i64 {
        (self.required_quantity - self.purchased_quantity - self.reserved_from_stock_quantity)
            .max(0)
    }

    /// Add fulfilled surplus to this item and re-derive its status.
    ///
    /// A zero quantity is accepted (a fully short reservation changes
    /// nothing); negative quantities are rejected before mutation.
    pub fn apply_reservation(&mut self, quantity_fulfilled: i64) -> DomainResult<()> {
        if quantity_fulfilled < 0 {
            return Err(DomainError::validation(
                "reserved quantity cannot be negative",
            ));
        }
        self.reserved_from_stock_quantity += quantity_fulfilled;
        self.recompute_status();
        Ok(())
    }

    /// Adjust the purchased quantity and re-derive status.
    pub fn record_purchase(&mut self, delta: i64) -> DomainResult<()> {
        if delta == 0 {
            return Err(DomainError::validation("purchase delta cannot be zero"));
        }
        let new_quantity = self.purchased_quantity + delta;
        if new_quantity < 0 {
            return Err(DomainError::invariant(
                "purchased quantity cannot go negative",
            ));
        }
        self.purchased_quantity = new_quantity;
        self.recompute_status();
        Ok(())
    }

    /// Accept an externally-driven stage (quoted, in separation, in transit,
    /// delivered). Stage signals are monotonic: moving backwards is an
    /// invariant violation, re-applying the current stage is a no-op.
    pub fn apply_stage_signal(&mut self, stage: FulfillmentStatus) -> DomainResult<()> {
        if !stage.is_external_signal() {
            return Err(DomainError::validation(
                "status is derived from quantities and cannot be set directly",
            ));
        }
        if stage.rank() < self.status.rank() {
            return Err(DomainError::invariant("stage signals cannot move backwards"));
        }
        self.status = stage;
        Ok(())
    }

    fn recompute_status(&mut self) {
        self.status = derive_status(
            self.status,
            self.required_quantity,
            self.purchased_quantity,
            self.reserved_from_stock_quantity,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_item(required: i64) -> OrderItem {
        OrderItem::new(
            OrderId::new(),
            0,
            ItemCode::new("X-100").unwrap(),
            required,
        )
        .unwrap()
    }

    #[test]
    fn new_item_starts_pending() {
        let item = test_item(6);
        assert_eq!(item.status(), FulfillmentStatus::Pending);
        assert_eq!(item.shortfall(), 6);
    }

    #[test]
    fn rejects_negative_requirement() {
        let err = OrderItem::new(OrderId::new(), 0, ItemCode::new("X-100").unwrap(), -1)
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn reservation_moves_status_through_partial_to_purchased() {
        let mut item = test_item(6);

        item.apply_reservation(2).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::PurchasedPartial);
        assert_eq!(item.shortfall(), 4);

        item.apply_reservation(4).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Purchased);
        assert_eq!(item.shortfall(), 0);
    }

    #[test]
    fn purchase_and_reservation_combine() {
        let mut item = test_item(10);
        item.record_purchase(4).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::PurchasedPartial);

        item.apply_reservation(6).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Purchased);
        assert_eq!(item.purchased_quantity(), 4);
        assert_eq!(item.reserved_from_stock_quantity(), 6);
    }

    #[test]
    fn zero_fulfillment_changes_nothing() {
        let mut item = test_item(6);
        item.apply_reservation(0).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Pending);
        assert_eq!(item.reserved_from_stock_quantity(), 0);
    }

    #[test]
    fn negative_reservation_is_rejected() {
        let mut item = test_item(6);
        let err = item.apply_reservation(-1).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn purchase_cannot_go_negative() {
        let mut item = test_item(6);
        item.record_purchase(3).unwrap();
        let err = item.record_purchase(-4).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("cannot go negative") => {}
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
        assert_eq!(item.purchased_quantity(), 3);
    }

    #[test]
    fn reducing_purchases_to_zero_reverts_to_pending() {
        let mut item = test_item(6);
        item.record_purchase(6).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Purchased);

        item.record_purchase(-6).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Pending);
    }

    #[test]
    fn stage_signals_advance_monotonically() {
        let mut item = test_item(6);
        item.apply_stage_signal(FulfillmentStatus::Quoted).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Quoted);

        item.record_purchase(6).unwrap();
        item.apply_stage_signal(FulfillmentStatus::InSeparation)
            .unwrap();
        item.apply_stage_signal(FulfillmentStatus::InTransit).unwrap();
        item.apply_stage_signal(FulfillmentStatus::Delivered).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Delivered);

        let err = item
            .apply_stage_signal(FulfillmentStatus::InTransit)
            .unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("backwards") => {}
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn derived_stages_cannot_be_signalled() {
        let mut item = test_item(6);
        let err = item
            .apply_stage_signal(FulfillmentStatus::Purchased)
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("derived") => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn quoted_survives_stock_mutations_until_satisfied() {
        let mut item = test_item(6);
        item.apply_stage_signal(FulfillmentStatus::Quoted).unwrap();

        // A fully short reservation leaves the quote in place.
        item.apply_reservation(0).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::Quoted);

        item.apply_reservation(2).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::PurchasedPartial);
    }

    #[test]
    fn later_stages_are_not_downgraded_by_quantity_changes() {
        let mut item = test_item(6);
        item.record_purchase(6).unwrap();
        item.apply_stage_signal(FulfillmentStatus::InTransit).unwrap();

        item.record_purchase(-6).unwrap();
        assert_eq!(item.status(), FulfillmentStatus::InTransit);
    }
}
