//! Sales financial aggregation tests
//!
//! Covers order pricing (cost strategies, commission rules, profit
//! identities), report rollups, ranking, and the report date range.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::finance::{
    collection_rate, commission_amount, price_order, referrer_earnings, rollup_by_channel,
    summarize, top_n, within_range, CommissionTable, OrderFinancials, SkuCost, SkuCostTable,
    SupermarketRollup,
};
use shared::models::{
    CommissionRule, CommissionType, CostStrategy, Order, OrderItem, PaymentStatus, SalesChannel,
};
use shared::types::DateRange;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn order(supermarket: Option<Uuid>, total: Decimal, received: Decimal, date: DateTime<Utc>) -> Order {
    Order {
        id: Uuid::new_v4(),
        distributor_id: Uuid::new_v4(),
        supermarket_id: supermarket,
        sales_channel: if supermarket.is_some() {
            SalesChannel::Supermarket
        } else {
            SalesChannel::Whatsapp
        },
        customer_name: supermarket.is_none().then(|| "Counter sale".to_string()),
        order_ref: "15-08-01".to_string(),
        total_amount: total,
        amount_received: received,
        payment_status: PaymentStatus::Pending,
        order_date: date,
        comments: None,
    }
}

fn item(order_id: Uuid, sku_id: Uuid, quantity: i64, price: Decimal) -> OrderItem {
    OrderItem {
        order_id,
        sku_id,
        quantity,
        price_per_unit: price,
        total_price: price * Decimal::from(quantity),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn cost_strategies_disagree_when_precalc_is_stale() {
        // 250g SKU priced at 80/kg: derived cost 20, stale precalc says 18.
        let cost = SkuCost {
            vendor_cost_per_kg: dec("80"),
            weight_grams: dec("250"),
            calculated_vendor_cost: dec("18"),
            packing_cost: dec("3"),
        };
        assert_eq!(cost.unit_cost(CostStrategy::PerKgFromWeight), dec("23"));
        assert_eq!(cost.unit_cost(CostStrategy::PrecalculatedPerUnit), dec("21"));
    }

    #[test]
    fn flat_commission_scales_with_quantity_not_revenue() {
        let rule = CommissionRule {
            kind: CommissionType::Flat,
            value: dec("1.50"),
        };
        assert_eq!(commission_amount(Some(rule), dec("9999"), 8), dec("12.00"));
    }

    #[test]
    fn direct_sale_pays_no_commission_regardless_of_rules() {
        let sku = Uuid::new_v4();
        let o = order(None, dec("200"), dec("0"), at(2026, 8, 10));
        let items = vec![item(o.id, sku, 4, dec("50"))];

        // A rule exists for this SKU at some supermarket, but the order has
        // no supermarket to match against.
        let commissions: CommissionTable = [(
            (Uuid::new_v4(), sku),
            CommissionRule {
                kind: CommissionType::Percentage,
                value: dec("50"),
            },
        )]
        .into_iter()
        .collect();

        let priced = price_order(
            &o,
            &items,
            &SkuCostTable::new(),
            &commissions,
            CostStrategy::PrecalculatedPerUnit,
        );
        assert_eq!(priced.commission, Decimal::ZERO);
    }

    #[test]
    fn revenue_comes_from_the_order_header() {
        // Header total 180 deliberately disagrees with the 200 of line
        // snapshots; the header wins.
        let sku = Uuid::new_v4();
        let o = order(None, dec("180"), dec("180"), at(2026, 8, 10));
        let items = vec![item(o.id, sku, 4, dec("50"))];

        let priced = price_order(
            &o,
            &items,
            &SkuCostTable::new(),
            &CommissionTable::new(),
            CostStrategy::PrecalculatedPerUnit,
        );
        assert_eq!(priced.revenue, dec("180"));
    }

    #[test]
    fn within_range_is_inclusive_on_both_ends() {
        let range = DateRange::resolve(Some("2026-08-01"), Some("2026-08-15"), at(2026, 8, 20));
        let inside = price(order(None, dec("10"), dec("10"), at(2026, 8, 15)));
        let outside = price(order(None, dec("10"), dec("10"), at(2026, 8, 16)));

        let priced = vec![inside, outside];
        let kept = within_range(&priced, &range);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].order_date, at(2026, 8, 15));
    }

    #[test]
    fn channel_rollup_sorts_by_sales_descending() {
        let priced = vec![
            price(order(None, dec("100"), dec("0"), at(2026, 8, 1))),
            price(order(Some(Uuid::new_v4()), dec("400"), dec("0"), at(2026, 8, 1))),
            price(order(None, dec("50"), dec("0"), at(2026, 8, 1))),
        ];

        let rollups = rollup_by_channel(&priced);
        assert_eq!(rollups[0].channel, SalesChannel::Supermarket);
        assert_eq!(rollups[0].sales, dec("400"));
        assert_eq!(rollups[1].channel, SalesChannel::Whatsapp);
        assert_eq!(rollups[1].sales, dec("150"));
    }

    #[test]
    fn top_n_keeps_at_most_n() {
        let rollups: Vec<SupermarketRollup> = (0..7)
            .map(|i| SupermarketRollup {
                supermarket_id: Uuid::new_v4(),
                name: format!("Store {i}"),
                sales: Decimal::from(i * 10),
                order_count: 1,
            })
            .collect();

        let ranked = top_n(rollups, 3, |s| s.sales, |s| s.name.as_str());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].sales, dec("60"));
    }

    #[test]
    fn referrer_earnings_round_half_percent() {
        assert_eq!(referrer_earnings(dec("4500"), dec("0.5")), dec("22.500"));
        assert_eq!(referrer_earnings(Decimal::ZERO, dec("5")), Decimal::ZERO);
    }

    fn price(o: Order) -> OrderFinancials {
        price_order(
            &o,
            &[],
            &SkuCostTable::new(),
            &CommissionTable::new(),
            CostStrategy::PrecalculatedPerUnit,
        )
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn arb_money() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// profit == (revenue - commission) - cost for any priced order.
        #[test]
        fn profit_identity_holds(
            total in arb_money(),
            received in arb_money(),
            lines in prop::collection::vec((1i64..100, arb_money(), arb_money()), 0..8),
            pct in 0u8..=100,
        ) {
            let supermarket = Uuid::new_v4();
            let o = order(Some(supermarket), total, received, at(2026, 8, 10));

            let mut items = Vec::new();
            let mut costs = SkuCostTable::new();
            let mut commissions = CommissionTable::new();
            for (qty, price, unit_cost) in &lines {
                let sku = Uuid::new_v4();
                items.push(item(o.id, sku, *qty, *price));
                costs.insert(sku, SkuCost {
                    calculated_vendor_cost: *unit_cost,
                    ..Default::default()
                });
                commissions.insert((supermarket, sku), CommissionRule {
                    kind: CommissionType::Percentage,
                    value: Decimal::from(pct),
                });
            }

            let priced = price_order(
                &o,
                &items,
                &costs,
                &commissions,
                CostStrategy::PrecalculatedPerUnit,
            );
            prop_assert_eq!(priced.net_revenue, priced.revenue - priced.commission);
            prop_assert_eq!(priced.profit, priced.net_revenue - priced.cost);
        }

        /// outstanding == sales - received, and counts match input size.
        #[test]
        fn summary_balances_its_own_figures(
            amounts in prop::collection::vec((arb_money(), arb_money()), 0..20),
        ) {
            let priced: Vec<OrderFinancials> = amounts
                .iter()
                .map(|(total, received)| {
                    price_order(
                        &order(None, *total, *received, at(2026, 8, 10)),
                        &[],
                        &SkuCostTable::new(),
                        &CommissionTable::new(),
                        CostStrategy::PrecalculatedPerUnit,
                    )
                })
                .collect();

            let totals = summarize(&priced);
            prop_assert_eq!(totals.order_count as usize, amounts.len());
            prop_assert_eq!(totals.outstanding, totals.sales - totals.received);

            let expected_sales: Decimal = amounts.iter().map(|(t, _)| *t).sum();
            prop_assert_eq!(totals.sales, expected_sales);
        }

        /// Collection rate stays within [0, 100] whenever received <= sales.
        #[test]
        fn collection_rate_is_bounded(sales in arb_money(), received in arb_money()) {
            let (sales, received) = if received > sales {
                (received, sales)
            } else {
                (sales, received)
            };
            let rate = collection_rate(sales, received);
            prop_assert!(rate >= Decimal::ZERO);
            prop_assert!(rate <= Decimal::from(100));
        }

        /// A percentage rule never charges more than the full line revenue.
        #[test]
        fn percentage_commission_never_exceeds_revenue(
            revenue in arb_money(),
            qty in 1i64..1000,
            pct in 0u8..=100,
        ) {
            let rule = CommissionRule {
                kind: CommissionType::Percentage,
                value: Decimal::from(pct),
            };
            let commission = commission_amount(Some(rule), revenue, qty);
            prop_assert!(commission >= Decimal::ZERO);
            prop_assert!(commission <= revenue);
        }
    }
}
