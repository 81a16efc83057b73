//! Inventory balance engine
//!
//! Derives point-in-time stock from the append-only event ledger. The fold
//! is commutative: balances depend only on the event set, never on insertion
//! order. Balances are signed and never clamped; a negative balance is an
//! unresolved inconsistency the caller decides how to display.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::{InventoryEvent, InventoryEventType};

/// Default threshold below which a balance counts as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 50;

/// An event whose type was outside the known set. Its contribution is zero;
/// it is surfaced so callers can log rather than silently miscount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType {
    pub event_id: Uuid,
    pub event_type: String,
}

/// Balances keyed by (distributor, SKU), with any unknown-type warnings.
#[derive(Debug, Clone, Default)]
pub struct BalanceReport {
    pub balances: BTreeMap<(Uuid, Uuid), i64>,
    pub warnings: Vec<UnknownEventType>,
}

/// Balances for a single distributor, keyed by SKU alone.
#[derive(Debug, Clone, Default)]
pub struct SkuBalanceReport {
    pub balances: BTreeMap<Uuid, i64>,
    pub warnings: Vec<UnknownEventType>,
}

/// Signed stock contribution of one event: positive for IN/OPENING/RETURN,
/// negative for SENT/SOLD.
pub fn signed_delta(kind: InventoryEventType, quantity: i64) -> i64 {
    if kind.is_inbound() {
        quantity
    } else {
        -quantity
    }
}

/// Fold events into (distributor, SKU) balances (global scope).
pub fn compute_balances<'a, I>(events: I) -> BalanceReport
where
    I: IntoIterator<Item = &'a InventoryEvent>,
{
    let mut report = BalanceReport::default();
    for event in events {
        let entry = report
            .balances
            .entry((event.distributor_id, event.sku_id))
            .or_insert(0);
        match event.kind() {
            Some(kind) => *entry += signed_delta(kind, event.quantity),
            None => report.warnings.push(UnknownEventType {
                event_id: event.id,
                event_type: event.event_type.clone(),
            }),
        }
    }
    report
}

/// Fold events into per-SKU balances (single-distributor scope). The caller
/// is responsible for having restricted the event set to one distributor.
pub fn compute_sku_balances<'a, I>(events: I) -> SkuBalanceReport
where
    I: IntoIterator<Item = &'a InventoryEvent>,
{
    let mut report = SkuBalanceReport::default();
    for event in events {
        let entry = report.balances.entry(event.sku_id).or_insert(0);
        match event.kind() {
            Some(kind) => *entry += signed_delta(kind, event.quantity),
            None => report.warnings.push(UnknownEventType {
                event_id: event.id,
                event_type: event.event_type.clone(),
            }),
        }
    }
    report
}

/// The single compensating event needed to move a balance to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockCorrection {
    pub event_type: InventoryEventType,
    pub quantity: i64,
}

/// Plan an absolute-stock correction: one IN event when raising, one SOLD
/// event when lowering, nothing when already at target. History is never
/// rewritten; the correction is always a fresh ledger entry.
pub fn plan_stock_correction(current: i64, target: i64) -> Option<StockCorrection> {
    if target == current {
        return None;
    }
    let event_type = if target > current {
        InventoryEventType::In
    } else {
        InventoryEventType::Sold
    };
    Some(StockCorrection {
        event_type,
        quantity: (target - current).abs(),
    })
}

/// Balances strictly below `threshold`, ascending by balance (key order
/// breaks ties), first `n`. Negative balances are included.
pub fn low_stock<K: Ord + Copy>(
    balances: &BTreeMap<K, i64>,
    threshold: i64,
    n: usize,
) -> Vec<(K, i64)> {
    let mut low: Vec<(K, i64)> = balances
        .iter()
        .filter(|(_, &balance)| balance < threshold)
        .map(|(&key, &balance)| (key, balance))
        .collect();
    low.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    low.truncate(n);
    low
}

/// Total stock per distributor, summed across SKUs.
pub fn distributor_stock_totals(report: &BalanceReport) -> BTreeMap<Uuid, i64> {
    let mut totals = BTreeMap::new();
    for (&(distributor_id, _), &balance) in &report.balances {
        *totals.entry(distributor_id).or_insert(0) += balance;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    #[test]
    fn balance_folds_signed_contributions() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let events = vec![
            event(d, s, "IN", 100),
            event(d, s, "SENT", 30),
            event(d, s, "SOLD", 10),
            event(d, s, "RETURN", 5),
        ];

        let report = compute_balances(&events);
        assert_eq!(report.balances.get(&(d, s)), Some(&65));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn balance_is_order_independent() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let events = vec![
            event(d, s, "OPENING", 40),
            event(d, s, "SOLD", 15),
            event(d, s, "IN", 25),
        ];
        let mut reversed = events.clone();
        reversed.reverse();

        assert_eq!(
            compute_balances(&events).balances,
            compute_balances(&reversed).balances
        );
    }

    #[test]
    fn unknown_type_contributes_zero_and_warns() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let events = vec![event(d, s, "IN", 10), event(d, s, "DAMAGED", 4)];

        let report = compute_balances(&events);
        assert_eq!(report.balances.get(&(d, s)), Some(&10));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].event_type, "DAMAGED");
    }

    #[test]
    fn balances_can_go_negative() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let report = compute_sku_balances(&[event(d, s, "SOLD", 7)]);
        assert_eq!(report.balances.get(&s), Some(&-7));
    }

    #[test]
    fn correction_plan_raises_with_in_and_lowers_with_sold() {
        assert_eq!(
            plan_stock_correction(10, 25),
            Some(StockCorrection {
                event_type: InventoryEventType::In,
                quantity: 15
            })
        );
        assert_eq!(
            plan_stock_correction(25, 10),
            Some(StockCorrection {
                event_type: InventoryEventType::Sold,
                quantity: 15
            })
        );
        assert_eq!(plan_stock_correction(25, 25), None);
    }

    #[test]
    fn correction_round_trips_to_target() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        let mut events = vec![event(d, s, "IN", 30), event(d, s, "SOLD", 12)];
        let current = compute_sku_balances(&events).balances[&s];

        let target = -4;
        let correction = plan_stock_correction(current, target).unwrap();
        events.push(event(d, s, correction.event_type.as_str(), correction.quantity));

        assert_eq!(compute_sku_balances(&events).balances[&s], target);
    }

    #[test]
    fn low_stock_filters_sorts_and_truncates() {
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let s3 = Uuid::new_v4();
        let s4 = Uuid::new_v4();
        let balances: BTreeMap<Uuid, i64> =
            [(s1, 60), (s2, 10), (s3, -5), (s4, 49)].into_iter().collect();

        let low = low_stock(&balances, LOW_STOCK_THRESHOLD, 5);
        let picked: Vec<i64> = low.iter().map(|(_, b)| *b).collect();
        assert_eq!(picked, vec![-5, 10, 49]);
        assert_eq!(low[0].0, s3);
    }

    #[test]
    fn distributor_totals_sum_across_skus() {
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();
        let s1 = Uuid::new_v4();
        let s2 = Uuid::new_v4();
        let events = vec![
            event(d1, s1, "IN", 10),
            event(d1, s2, "IN", 5),
            event(d2, s1, "SOLD", 3),
        ];

        let totals = distributor_stock_totals(&compute_balances(&events));
        assert_eq!(totals[&d1], 15);
        assert_eq!(totals[&d2], -3);
    }
}
