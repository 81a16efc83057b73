//! Inventory ledger tests
//!
//! Covers the append-only balance fold: signed contributions, order
//! independence, unknown-type handling, absolute stock corrections, and
//! low-stock selection.

use chrono::Utc;
use proptest::prelude::*;
use shared::ledger::{
    compute_balances, compute_sku_balances, low_stock, plan_stock_correction, signed_delta,
    LOW_STOCK_THRESHOLD,
};
use shared::models::{InventoryEvent, InventoryEventType};
use uuid::Uuid;

fn event(distributor: Uuid, sku: Uuid, event_type: &str, quantity: i64) -> InventoryEvent {
    InventoryEvent {
        id: Uuid::new_v4(),
        distributor_id: distributor,
        sku_id: sku,
        event_type: event_type.to_string(),
        quantity,
        event_date: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn inbound_types_add_and_outbound_types_subtract() {
        assert_eq!(signed_delta(InventoryEventType::In, 10), 10);
        assert_eq!(signed_delta(InventoryEventType::Opening, 10), 10);
        assert_eq!(signed_delta(InventoryEventType::Return, 10), 10);
        assert_eq!(signed_delta(InventoryEventType::Sent, 10), -10);
        assert_eq!(signed_delta(InventoryEventType::Sold, 10), -10);
    }

    #[test]
    fn balances_are_keyed_by_distributor_and_sku() {
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();
        let s = Uuid::new_v4();
        let events = vec![
            event(d1, s, "IN", 100),
            event(d2, s, "IN", 40),
            event(d1, s, "SOLD", 25),
        ];

        let report = compute_balances(&events);
        assert_eq!(report.balances[&(d1, s)], 75);
        assert_eq!(report.balances[&(d2, s)], 40);
    }

    #[test]
    fn unknown_event_types_warn_without_changing_balances() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let events = vec![
            event(d, s, "IN", 50),
            event(d, s, "SHRINKAGE", 30),
            event(d, s, "SOLD", 20),
        ];

        let report = compute_sku_balances(&events);
        assert_eq!(report.balances[&s], 30);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].event_type, "SHRINKAGE");
    }

    #[test]
    fn oversold_sku_reports_negative_balance() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let events = vec![event(d, s, "IN", 10), event(d, s, "SOLD", 18)];

        let report = compute_sku_balances(&events);
        assert_eq!(report.balances[&s], -8);
    }

    #[test]
    fn correction_appends_rather_than_rewriting() {
        // Lowering 40 -> 15 plans a SOLD 25, never an edit of history.
        let plan = plan_stock_correction(40, 15).unwrap();
        assert_eq!(plan.event_type, InventoryEventType::Sold);
        assert_eq!(plan.quantity, 25);

        // Raising -5 -> 0 recovers from an oversold state with an IN.
        let plan = plan_stock_correction(-5, 0).unwrap();
        assert_eq!(plan.event_type, InventoryEventType::In);
        assert_eq!(plan.quantity, 5);

        assert!(plan_stock_correction(7, 7).is_none());
    }

    #[test]
    fn low_stock_orders_worst_first() {
        let keys: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let balances = [
            (keys[0], 120),
            (keys[1], 3),
            (keys[2], -10),
            (keys[3], 49),
        ]
        .into_iter()
        .collect();

        let low = low_stock(&balances, LOW_STOCK_THRESHOLD, 2);
        assert_eq!(low.len(), 2);
        assert_eq!(low[0], (keys[2], -10));
        assert_eq!(low[1], (keys[1], 3));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn arb_event_type() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("IN"),
            Just("OPENING"),
            Just("SENT"),
            Just("SOLD"),
            Just("RETURN"),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The fold is a sum: permuting the ledger never changes balances.
        #[test]
        fn balance_is_independent_of_event_order(
            specs in prop::collection::vec((arb_event_type(), 1i64..1000), 1..40),
            seed in any::<u64>(),
        ) {
            let d = Uuid::new_v4();
            let s = Uuid::new_v4();
            let events: Vec<InventoryEvent> = specs
                .iter()
                .map(|(t, q)| event(d, s, t, *q))
                .collect();

            let mut shuffled = events.clone();
            // Deterministic shuffle driven by the seed.
            for i in (1..shuffled.len()).rev() {
                let j = (seed
                    .wrapping_add(i as u64)
                    .wrapping_mul(0x9E37_79B9_7F4A_7C15)
                    % (i as u64 + 1)) as usize;
                shuffled.swap(i, j);
            }

            prop_assert_eq!(
                compute_sku_balances(&events).balances,
                compute_sku_balances(&shuffled).balances
            );
        }

        /// Balance always equals inbound total minus outbound total.
        #[test]
        fn balance_matches_signed_sum(
            specs in prop::collection::vec((arb_event_type(), 1i64..1000), 0..40),
        ) {
            let d = Uuid::new_v4();
            let s = Uuid::new_v4();
            let events: Vec<InventoryEvent> = specs
                .iter()
                .map(|(t, q)| event(d, s, t, *q))
                .collect();

            let expected: i64 = events
                .iter()
                .map(|e| signed_delta(e.kind().unwrap(), e.quantity))
                .sum();

            let report = compute_sku_balances(&events);
            prop_assert_eq!(report.balances.get(&s).copied().unwrap_or(0), expected);
        }

        /// Applying the planned correction always lands exactly on target.
        #[test]
        fn correction_reaches_target(current in -5000i64..5000, target in 0i64..5000) {
            match plan_stock_correction(current, target) {
                Some(plan) => {
                    prop_assert!(plan.quantity > 0);
                    let landed = current + signed_delta(plan.event_type, plan.quantity);
                    prop_assert_eq!(landed, target);
                }
                None => prop_assert_eq!(current, target),
            }
        }

        /// Every selected entry is below threshold and the list is ascending.
        #[test]
        fn low_stock_selection_is_sound(
            balances in prop::collection::btree_map(any::<u64>(), -200i64..200, 0..30),
            threshold in -50i64..100,
            n in 0usize..10,
        ) {
            let low = low_stock(&balances, threshold, n);
            prop_assert!(low.len() <= n);
            for window in low.windows(2) {
                prop_assert!(window[0].1 <= window[1].1);
            }
            for (key, balance) in &low {
                prop_assert!(*balance < threshold);
                prop_assert_eq!(balances[key], *balance);
            }
        }
    }
}
