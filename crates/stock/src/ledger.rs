use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use restoq_core::{DomainError, DomainResult, ItemCode, OrderId};

use crate::reservation::{ReservationResult, SourceContribution};
use crate::unit::StockUnit;

/// FIFO sequence of surplus units for a single item code.
///
/// Insertion order is surplus-creation order; consumption always starts at
/// the front. This is the unit of persistence (`load_entry`/`save_entry`)
/// and, guarded by the per-item-code lock in the engine, the unit of
/// atomicity for debits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    item_code: ItemCode,
    units: Vec<StockUnit>,
}

impl LedgerEntry {
    pub fn new(item_code: ItemCode) -> Self {
        Self {
            item_code,
            units: Vec::new(),
        }
    }

    pub fn item_code(&self) -> &ItemCode {
        &self.item_code
    }

    pub fn units(&self) -> &[StockUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total live surplus. Never negative: units are validated positive on
    /// entry and removed the moment they reach zero.
    pub fn available(&self) -> i64 {
        self.units.iter().map(|u| u.quantity).sum()
    }

    /// Provenance view: which order contributed how much, in FIFO order.
    ///
    /// Computed fresh on every call; safe to re-request at any time.
    pub fn sources(&self) -> Vec<SourceContribution> {
        self.units
            .iter()
            .map(|u| SourceContribution {
                source_order_id: u.source_order_id,
                quantity_taken: u.quantity,
            })
            .collect()
    }

    /// Append a new surplus unit.
    pub fn credit(
        &mut self,
        quantity: i64,
        source_order_id: OrderId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let unit = StockUnit::new(self.item_code.clone(), quantity, source_order_id, created_at)?;
        self.units.push(unit);
        Ok(())
    }

    /// Consume up to `quantity` from the front of the sequence.
    ///
    /// Partially consumed units are reduced in place; fully consumed units
    /// are removed. Exhausting the entry is not an error: the unfilled rest
    /// is reported as `remaining_shortfall`.
    pub fn debit(&mut self, quantity: i64) -> DomainResult<ReservationResult> {
        if quantity <= 0 {
            return Err(DomainError::validation("debit quantity must be positive"));
        }

        let mut remaining = quantity;
        let mut sources = Vec::new();
        let mut drained = 0;

        for unit in self.units.iter_mut() {
            if remaining == 0 {
                break;
            }
            let taken = unit.quantity.min(remaining);
            unit.quantity -= taken;
            remaining -= taken;
            sources.push(SourceContribution {
                source_order_id: unit.source_order_id,
                quantity_taken: taken,
            });
            if unit.quantity == 0 {
                drained += 1;
            }
        }

        // Fully consumed units form a prefix under FIFO consumption.
        self.units.drain(..drained);

        Ok(ReservationResult {
            quantity_fulfilled: quantity - remaining,
            sources,
            remaining_shortfall: remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> ItemCode {
        ItemCode::new("X-100").unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn entry_with(units: &[(OrderId, i64)]) -> LedgerEntry {
        let mut entry = LedgerEntry::new(code());
        for (order, qty) in units {
            entry.credit(*qty, *order, test_time()).unwrap();
        }
        entry
    }

    #[test]
    fn credit_rejects_non_positive_quantity() {
        let mut entry = LedgerEntry::new(code());
        for qty in [0, -3] {
            let err = entry.credit(qty, OrderId::new(), test_time()).unwrap_err();
            match err {
                DomainError::Validation(msg) if msg.contains("must be positive") => {}
                other => panic!("expected Validation error, got {other:?}"),
            }
        }
        assert!(entry.is_empty());
    }

    #[test]
    fn debit_rejects_non_positive_quantity() {
        let mut entry = entry_with(&[(OrderId::new(), 5)]);
        let err = entry.debit(0).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation error, got {other:?}"),
        }
        assert_eq!(entry.available(), 5);
    }

    #[test]
    fn small_debit_touches_only_the_oldest_unit() {
        let (a, b, c) = (OrderId::new(), OrderId::new(), OrderId::new());
        let mut entry = entry_with(&[(a, 5), (b, 3), (c, 4)]);

        let result = entry.debit(2).unwrap();

        assert_eq!(result.quantity_fulfilled, 2);
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].source_order_id, a);
        // Partial consumption reduces the unit in place.
        assert_eq!(entry.units()[0].source_order_id, a);
        assert_eq!(entry.units()[0].quantity, 3);
        assert_eq!(entry.available(), 10);
    }

    #[test]
    fn large_debit_spans_units_in_fifo_order() {
        let (a, b, c) = (OrderId::new(), OrderId::new(), OrderId::new());
        let mut entry = entry_with(&[(a, 5), (b, 3), (c, 4)]);

        // More than A+B: consumes all of A, all of B, part of C.
        let result = entry.debit(9).unwrap();

        assert_eq!(result.quantity_fulfilled, 9);
        assert_eq!(
            result
                .sources
                .iter()
                .map(|s| (s.source_order_id, s.quantity_taken))
                .collect::<Vec<_>>(),
            vec![(a, 5), (b, 3), (c, 1)]
        );
        assert_eq!(entry.units().len(), 1);
        assert_eq!(entry.units()[0].source_order_id, c);
        assert_eq!(entry.units()[0].quantity, 3);
    }

    #[test]
    fn full_fulfillment_scenario() {
        let (a, b) = (OrderId::new(), OrderId::new());
        let mut entry = entry_with(&[(a, 5), (b, 3)]);

        let result = entry.debit(6).unwrap();

        assert_eq!(result.quantity_fulfilled, 6);
        assert_eq!(result.remaining_shortfall, 0);
        assert!(result.is_complete());
        assert_eq!(
            result
                .sources
                .iter()
                .map(|s| (s.source_order_id, s.quantity_taken))
                .collect::<Vec<_>>(),
            vec![(a, 5), (b, 1)]
        );
        assert_eq!(entry.units().len(), 1);
        assert_eq!(entry.units()[0].quantity, 2);
    }

    #[test]
    fn exhausting_debit_reports_shortfall() {
        let mut entry = entry_with(&[(OrderId::new(), 5), (OrderId::new(), 3)]);

        let result = entry.debit(10).unwrap();

        assert_eq!(result.quantity_fulfilled, 8);
        assert_eq!(result.remaining_shortfall, 2);
        assert!(!result.is_complete());
        assert!(entry.is_empty());
        assert_eq!(entry.available(), 0);
    }

    #[test]
    fn zero_quantity_units_never_remain() {
        let mut entry = entry_with(&[(OrderId::new(), 2), (OrderId::new(), 2)]);
        entry.debit(2).unwrap();
        assert!(entry.units().iter().all(|u| u.quantity > 0));
        entry.debit(2).unwrap();
        assert!(entry.is_empty());
    }

    #[test]
    fn available_is_idempotent() {
        let entry = entry_with(&[(OrderId::new(), 5), (OrderId::new(), 3)]);
        assert_eq!(entry.available(), entry.available());
        assert_eq!(entry.sources(), entry.sources());
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        /// credit (true) or debit (false), with a quantity.
        fn op_strategy() -> impl Strategy<Value = Vec<(bool, i64)>> {
            proptest::collection::vec((any::<bool>(), 1..200i64), 0..40)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: fulfilled + shortfall always equals the requested
            /// quantity, and the sources sum to the fulfilled quantity.
            #[test]
            fn debit_arithmetic_always_balances(ops in op_strategy()) {
                let mut entry = LedgerEntry::new(ItemCode::new("P-1").unwrap());
                for (is_credit, qty) in ops {
                    if is_credit {
                        entry.credit(qty, OrderId::new(), Utc::now()).unwrap();
                    } else {
                        let result = entry.debit(qty).unwrap();
                        prop_assert_eq!(
                            result.quantity_fulfilled + result.remaining_shortfall,
                            qty
                        );
                        prop_assert_eq!(result.total_taken(), result.quantity_fulfilled);
                    }
                }
            }

            /// Property: available() never goes negative and always equals
            /// the sum of live unit quantities.
            #[test]
            fn available_equals_live_unit_sum(ops in op_strategy()) {
                let mut entry = LedgerEntry::new(ItemCode::new("P-1").unwrap());
                for (is_credit, qty) in ops {
                    if is_credit {
                        entry.credit(qty, OrderId::new(), Utc::now()).unwrap();
                    } else {
                        entry.debit(qty).unwrap();
                    }
                    let live_sum: i64 = entry.units().iter().map(|u| u.quantity).sum();
                    prop_assert!(entry.available() >= 0);
                    prop_assert_eq!(entry.available(), live_sum);
                    prop_assert!(entry.units().iter().all(|u| u.quantity > 0));
                }
            }

            /// Property: consumption order matches credit order.
            #[test]
            fn sources_follow_credit_order(quantities in proptest::collection::vec(1..50i64, 1..10), debit_qty in 1..500i64) {
                let mut entry = LedgerEntry::new(ItemCode::new("P-1").unwrap());
                let mut orders = Vec::new();
                for qty in &quantities {
                    let order = OrderId::new();
                    orders.push(order);
                    entry.credit(*qty, order, Utc::now()).unwrap();
                }

                let result = entry.debit(debit_qty).unwrap();

                let touched: Vec<_> = result.sources.iter().map(|s| s.source_order_id).collect();
                prop_assert_eq!(&touched[..], &orders[..touched.len()]);
            }
        }
    }
}
