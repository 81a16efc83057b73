//! Sales financial aggregation
//!
//! Computes per-order cost, commission, net revenue, and profit from
//! fetched rows, then rolls the figures up by distributor, supermarket,
//! product, and sales channel. Nothing here is persisted; every report is
//! recomputed from source-of-truth rows on read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    CommissionRule, CommissionType, CostStrategy, Order, OrderItem, SalesChannel,
};
use crate::types::DateRange;

/// Cost inputs for one SKU. Missing cost rows default every field to zero;
/// that defaulting happens at the data-access boundary, not here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkuCost {
    pub vendor_cost_per_kg: Decimal,
    pub weight_grams: Decimal,
    pub calculated_vendor_cost: Decimal,
    pub packing_cost: Decimal,
}

impl SkuCost {
    /// Per-unit cost under the given resolution strategy. The two vendor
    /// components are alternatives; exactly one is applied, plus packing.
    pub fn unit_cost(&self, strategy: CostStrategy) -> Decimal {
        let vendor_component = match strategy {
            CostStrategy::PerKgFromWeight => {
                self.vendor_cost_per_kg / Decimal::from(1000) * self.weight_grams
            }
            CostStrategy::PrecalculatedPerUnit => self.calculated_vendor_cost,
        };
        vendor_component + self.packing_cost
    }
}

/// SKU id -> cost inputs.
pub type SkuCostTable = HashMap<Uuid, SkuCost>;

/// (supermarket, SKU) -> commission rule.
pub type CommissionTable = HashMap<(Uuid, Uuid), CommissionRule>;

/// Commission owed on one order line. No matching rule means zero.
pub fn commission_amount(
    rule: Option<CommissionRule>,
    line_revenue: Decimal,
    quantity: i64,
) -> Decimal {
    match rule {
        Some(rule) => match rule.kind {
            CommissionType::Percentage => line_revenue * rule.value / Decimal::from(100),
            CommissionType::Flat => rule.value * Decimal::from(quantity),
        },
        None => Decimal::ZERO,
    }
}

/// Resolved financial figures for one order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderFinancials {
    pub order_id: Uuid,
    pub order_ref: String,
    pub distributor_id: Uuid,
    pub supermarket_id: Option<Uuid>,
    pub sales_channel: SalesChannel,
    pub order_date: DateTime<Utc>,
    /// Order revenue: the header's authoritative `total_amount`.
    pub revenue: Decimal,
    pub received: Decimal,
    pub cost: Decimal,
    pub commission: Decimal,
    pub net_revenue: Decimal,
    pub profit: Decimal,
}

/// Price one order: line costs from the SKU cost table under `strategy`,
/// commissions from the (supermarket, SKU) rule table, revenue from the
/// order header. Item `price_per_unit` is the creation-time snapshot and is
/// used as-is.
pub fn price_order(
    order: &Order,
    items: &[OrderItem],
    costs: &SkuCostTable,
    commissions: &CommissionTable,
    strategy: CostStrategy,
) -> OrderFinancials {
    let mut cost = Decimal::ZERO;
    let mut commission = Decimal::ZERO;

    for item in items {
        let unit_cost = costs
            .get(&item.sku_id)
            .copied()
            .unwrap_or_default()
            .unit_cost(strategy);
        cost += unit_cost * Decimal::from(item.quantity);

        if let Some(supermarket_id) = order.supermarket_id {
            let rule = commissions.get(&(supermarket_id, item.sku_id)).copied();
            commission += commission_amount(rule, item.line_revenue(), item.quantity);
        }
    }

    let revenue = order.total_amount;
    let net_revenue = revenue - commission;
    OrderFinancials {
        order_id: order.id,
        order_ref: order.order_ref.clone(),
        distributor_id: order.distributor_id,
        supermarket_id: order.supermarket_id,
        sales_channel: order.sales_channel,
        order_date: order.order_date,
        revenue,
        received: order.amount_received,
        cost,
        commission,
        net_revenue,
        profit: net_revenue - cost,
    }
}

/// Keep only orders whose date falls inside the inclusive range.
pub fn within_range<'a>(
    priced: &'a [OrderFinancials],
    range: &DateRange,
) -> Vec<&'a OrderFinancials> {
    priced.iter().filter(|o| range.contains(o.order_date)).collect()
}

/// Summed figures over a set of priced orders.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SalesTotals {
    pub sales: Decimal,
    pub received: Decimal,
    pub profit: Decimal,
    /// sales - received; negative means overpayment, not clamped.
    pub outstanding: Decimal,
    pub order_count: u64,
}

impl SalesTotals {
    /// received / sales x 100, defined as zero when there are no sales.
    pub fn collection_rate(&self) -> Decimal {
        collection_rate(self.sales, self.received)
    }
}

/// received / sales x 100 with an explicit zero-denominator guard.
pub fn collection_rate(sales: Decimal, received: Decimal) -> Decimal {
    if sales.is_zero() {
        Decimal::ZERO
    } else {
        received / sales * Decimal::from(100)
    }
}

/// Fold priced orders into overall totals.
pub fn summarize<'a, I>(priced: I) -> SalesTotals
where
    I: IntoIterator<Item = &'a OrderFinancials>,
{
    let mut totals = SalesTotals::default();
    for order in priced {
        totals.sales += order.revenue;
        totals.received += order.received;
        totals.profit += order.profit;
        totals.order_count += 1;
    }
    totals.outstanding = totals.sales - totals.received;
    totals
}

/// Per-distributor rollup for the admin overview.
#[derive(Debug, Clone, Serialize)]
pub struct DistributorRollup {
    pub distributor_id: Uuid,
    pub name: String,
    pub sales: Decimal,
    pub profit: Decimal,
    pub order_count: u64,
    pub stock_count: i64,
}

/// Group priced orders by distributor. Every distributor in `names`
/// appears, even with no orders; stock counts come from the ledger engine.
pub fn rollup_by_distributor<'a, I>(
    priced: I,
    names: &HashMap<Uuid, String>,
    stock_counts: &std::collections::BTreeMap<Uuid, i64>,
) -> Vec<DistributorRollup>
where
    I: IntoIterator<Item = &'a OrderFinancials>,
{
    let mut sales: HashMap<Uuid, (Decimal, Decimal, u64)> = HashMap::new();
    for order in priced {
        let entry = sales.entry(order.distributor_id).or_default();
        entry.0 += order.revenue;
        entry.1 += order.profit;
        entry.2 += 1;
    }

    names
        .iter()
        .map(|(&id, name)| {
            let (s, p, c) = sales.get(&id).copied().unwrap_or_default();
            DistributorRollup {
                distributor_id: id,
                name: name.clone(),
                sales: s,
                profit: p,
                order_count: c,
                stock_count: stock_counts.get(&id).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Per-supermarket rollup.
#[derive(Debug, Clone, Serialize)]
pub struct SupermarketRollup {
    pub supermarket_id: Uuid,
    pub name: String,
    pub sales: Decimal,
    pub order_count: u64,
}

pub fn rollup_by_supermarket<'a, I>(
    priced: I,
    names: &HashMap<Uuid, String>,
) -> Vec<SupermarketRollup>
where
    I: IntoIterator<Item = &'a OrderFinancials>,
{
    let mut sales: HashMap<Uuid, (Decimal, u64)> = HashMap::new();
    for order in priced {
        if let Some(id) = order.supermarket_id {
            let entry = sales.entry(id).or_default();
            entry.0 += order.revenue;
            entry.1 += 1;
        }
    }

    sales
        .into_iter()
        .map(|(id, (s, c))| SupermarketRollup {
            supermarket_id: id,
            name: names.get(&id).cloned().unwrap_or_default(),
            sales: s,
            order_count: c,
        })
        .collect()
}

/// Product a SKU belongs to, for the product rollup.
#[derive(Debug, Clone)]
pub struct ProductRef {
    pub product_id: Uuid,
    pub name: String,
}

/// Per-product rollup across order items.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRollup {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

/// Sum quantity and snapshotted revenue of items whose SKU belongs to each
/// product. Items with no product mapping are skipped.
pub fn rollup_by_product<'a, I>(
    items: I,
    sku_products: &HashMap<Uuid, ProductRef>,
) -> Vec<ProductRollup>
where
    I: IntoIterator<Item = &'a OrderItem>,
{
    let mut rollups: HashMap<Uuid, ProductRollup> = HashMap::new();
    for item in items {
        let Some(product) = sku_products.get(&item.sku_id) else {
            continue;
        };
        let entry = rollups
            .entry(product.product_id)
            .or_insert_with(|| ProductRollup {
                product_id: product.product_id,
                name: product.name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
        entry.quantity += item.quantity;
        entry.revenue += item.line_revenue();
    }
    rollups.into_values().collect()
}

/// Per-channel revenue rollup.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelRollup {
    pub channel: SalesChannel,
    pub sales: Decimal,
}

pub fn rollup_by_channel<'a, I>(priced: I) -> Vec<ChannelRollup>
where
    I: IntoIterator<Item = &'a OrderFinancials>,
{
    let mut sales: HashMap<SalesChannel, Decimal> = HashMap::new();
    for order in priced {
        *sales.entry(order.sales_channel).or_default() += order.revenue;
    }
    let mut rollups: Vec<ChannelRollup> = sales
        .into_iter()
        .map(|(channel, sales)| ChannelRollup { channel, sales })
        .collect();
    rollups.sort_by(|a, b| b.sales.cmp(&a.sales).then(a.channel.as_str().cmp(b.channel.as_str())));
    rollups
}

/// Rank descending by a monetary metric with a stable name-ascending
/// tie-break, keeping the first `n`.
pub fn top_n<T>(
    mut items: Vec<T>,
    n: usize,
    metric: impl Fn(&T) -> Decimal,
    name: impl Fn(&T) -> &str,
) -> Vec<T> {
    items.sort_by(|a, b| metric(b).cmp(&metric(a)).then_with(|| name(a).cmp(name(b))));
    items.truncate(n);
    items
}

/// Referrer earnings: percentage of gross order amounts (not profit) from
/// the referrer's linked distributors.
pub fn referrer_earnings(total_sales: Decimal, commission_percentage: Decimal) -> Decimal {
    total_sales * commission_percentage / Decimal::from(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn order(
        distributor: Uuid,
        supermarket: Option<Uuid>,
        total: Decimal,
        received: Decimal,
    ) -> Order {
        Order {
            id: Uuid::new_v4(),
            distributor_id: distributor,
            supermarket_id: supermarket,
            sales_channel: if supermarket.is_some() {
                SalesChannel::Supermarket
            } else {
                SalesChannel::Whatsapp
            },
            customer_name: supermarket.is_none().then(|| "Walk-in".to_string()),
            order_ref: "01-01-01".to_string(),
            total_amount: total,
            amount_received: received,
            payment_status: PaymentStatus::Pending,
            order_date: Utc.with_ymd_and_hms(2026, 8, 10, 9, 0, 0).unwrap(),
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

    #[test]
    fn unit_cost_per_kg_strategy() {
        let cost = SkuCost {
            vendor_cost_per_kg: dec("40"),
            weight_grams: dec("500"),
            calculated_vendor_cost: dec("999"),
            packing_cost: dec("5"),
        };
        // 40/1000 * 500 + 5 = 25; the precalculated field must not leak in.
        assert_eq!(cost.unit_cost(CostStrategy::PerKgFromWeight), dec("25"));
    }

    #[test]
    fn unit_cost_precalculated_strategy() {
        let cost = SkuCost {
            vendor_cost_per_kg: dec("999"),
            weight_grams: dec("999"),
            calculated_vendor_cost: dec("20"),
            packing_cost: dec("5"),
        };
        assert_eq!(cost.unit_cost(CostStrategy::PrecalculatedPerUnit), dec("25"));
    }

    #[test]
    fn commission_branches() {
        let pct = CommissionRule {
            kind: CommissionType::Percentage,
            value: dec("10"),
        };
        let flat = CommissionRule {
            kind: CommissionType::Flat,
            value: dec("2"),
        };
        assert_eq!(commission_amount(Some(pct), dec("500"), 10), dec("50"));
        assert_eq!(commission_amount(Some(flat), dec("500"), 10), dec("20"));
        assert_eq!(commission_amount(None, dec("500"), 10), Decimal::ZERO);
    }

    #[test]
    fn priced_order_matches_worked_scenario() {
        // unit cost 20 + packing 5 = 25; qty 10 at 50 -> revenue 500,
        // cost 250; 10% rule -> commission 50; profit (500-50)-250 = 200.
        let distributor = Uuid::new_v4();
        let supermarket = Uuid::new_v4();
        let sku = Uuid::new_v4();
        let o = order(distributor, Some(supermarket), dec("500"), dec("300"));
        let items = vec![item(o.id, sku, 10, dec("50"))];

        let costs: SkuCostTable = [(
            sku,
            SkuCost {
                calculated_vendor_cost: dec("20"),
                packing_cost: dec("5"),
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();
        let commissions: CommissionTable = [(
            (supermarket, sku),
            CommissionRule {
                kind: CommissionType::Percentage,
                value: dec("10"),
            },
        )]
        .into_iter()
        .collect();

        let priced = price_order(
            &o,
            &items,
            &costs,
            &commissions,
            CostStrategy::PrecalculatedPerUnit,
        );
        assert_eq!(priced.cost, dec("250"));
        assert_eq!(priced.commission, dec("50"));
        assert_eq!(priced.net_revenue, dec("450"));
        assert_eq!(priced.profit, dec("200"));
        // Profit identity: profit == (total - commission) - cost
        assert_eq!(
            priced.profit,
            (priced.revenue - priced.commission) - priced.cost
        );
    }

    #[test]
    fn no_supermarket_means_no_commission() {
        let sku = Uuid::new_v4();
        let o = order(Uuid::new_v4(), None, dec("100"), dec("100"));
        let items = vec![item(o.id, sku, 2, dec("50"))];
        let commissions: CommissionTable = HashMap::new();

        let priced = price_order(
            &o,
            &items,
            &SkuCostTable::new(),
            &commissions,
            CostStrategy::PrecalculatedPerUnit,
        );
        assert_eq!(priced.commission, Decimal::ZERO);
        assert_eq!(priced.net_revenue, dec("100"));
    }

    #[test]
    fn collection_rate_guards_zero_sales() {
        assert_eq!(collection_rate(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(collection_rate(dec("200"), dec("50")), dec("25"));
    }

    #[test]
    fn totals_keep_negative_outstanding() {
        let o = order(Uuid::new_v4(), None, dec("100"), dec("120"));
        let priced = vec![price_order(
            &o,
            &[],
            &SkuCostTable::new(),
            &CommissionTable::new(),
            CostStrategy::PrecalculatedPerUnit,
        )];
        let totals = summarize(&priced);
        assert_eq!(totals.outstanding, dec("-20"));
    }

    #[test]
    fn top_n_breaks_ties_by_name_ascending() {
        let beta = DistributorRollup {
            distributor_id: Uuid::new_v4(),
            name: "Beta".to_string(),
            sales: dec("1000"),
            profit: Decimal::ZERO,
            order_count: 1,
            stock_count: 0,
        };
        let alpha = DistributorRollup {
            name: "Alpha".to_string(),
            ..beta.clone()
        };

        let ranked = top_n(vec![beta, alpha], 5, |d| d.sales, |d| d.name.as_str());
        assert_eq!(ranked[0].name, "Alpha");
        assert_eq!(ranked[1].name, "Beta");
    }

    #[test]
    fn rollup_profit_matches_sum_of_order_profits() {
        let distributor = Uuid::new_v4();
        let sku = Uuid::new_v4();
        let costs: SkuCostTable = [(
            sku,
            SkuCost {
                calculated_vendor_cost: dec("8"),
                packing_cost: dec("2"),
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();

        let orders: Vec<(Order, Vec<OrderItem>)> = (1..=3)
            .map(|i| {
                let o = order(distributor, None, dec("100") * Decimal::from(i), dec("50"));
                let items = vec![item(o.id, sku, i, dec("30"))];
                (o, items)
            })
            .collect();

        let priced: Vec<OrderFinancials> = orders
            .iter()
            .map(|(o, items)| {
                price_order(
                    o,
                    items,
                    &costs,
                    &CommissionTable::new(),
                    CostStrategy::PrecalculatedPerUnit,
                )
            })
            .collect();

        let expected: Decimal = priced.iter().map(|p| p.profit).sum();
        let names: HashMap<Uuid, String> =
            [(distributor, "Solo".to_string())].into_iter().collect();
        let rollups = rollup_by_distributor(&priced, &names, &BTreeMap::new());
        assert_eq!(rollups[0].profit, expected);
        assert_eq!(rollups[0].order_count, 3);
    }

    #[test]
    fn product_rollup_sums_quantity_and_snapshot_revenue() {
        let product = Uuid::new_v4();
        let sku_a = Uuid::new_v4();
        let sku_b = Uuid::new_v4();
        let mapping: HashMap<Uuid, ProductRef> = [
            (sku_a, ProductRef { product_id: product, name: "Masala".into() }),
            (sku_b, ProductRef { product_id: product, name: "Masala".into() }),
        ]
        .into_iter()
        .collect();

        let oid = Uuid::new_v4();
        let items = vec![item(oid, sku_a, 3, dec("40")), item(oid, sku_b, 2, dec("70"))];
        let rollups = rollup_by_product(&items, &mapping);
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].quantity, 5);
        assert_eq!(rollups[0].revenue, dec("260"));
    }

    #[test]
    fn referrer_earnings_use_gross_sales() {
        assert_eq!(referrer_earnings(dec("12000"), dec("2.5")), dec("300"));
    }
}
