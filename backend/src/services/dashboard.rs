//! Dashboard aggregation service
//!
//! Every figure is recomputed on read from source-of-truth rows: orders,
//! order items, pricing rules, SKU costs, and the inventory ledger. The
//! pure math lives in `shared::finance` and `shared::ledger`; this service
//! fetches rows, shapes the inputs, and assembles the role-specific views.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::inventory::InventoryEventRow;
use crate::services::orders::{OrderItemRow, OrderRow};
use shared::finance::{
    self, ChannelRollup, CommissionTable, DistributorRollup, OrderFinancials, ProductRef,
    ProductRollup, SalesTotals, SkuCost, SkuCostTable, SupermarketRollup,
};
use shared::ledger;
use shared::models::{
    CommissionRule, CommissionType, CostStrategy, InventoryEvent, OrderItem, Role,
};
use shared::types::DateRange;

/// Outstanding balance above which the distributor view raises an alert.
const OUTSTANDING_ALERT_THRESHOLD: i64 = 1000;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    low_stock_threshold: i64,
    top_n: usize,
}

/// One headline card on a dashboard. `value` is heterogeneous: currency
/// amounts, counts, and ready-formatted percentages all ride the same list.
#[derive(Debug, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: serde_json::Value,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<bool>,
}

/// The distributor's own dashboard
#[derive(Debug, Serialize)]
pub struct DistributorDashboard {
    pub role: Role,
    pub range: DateRange,
    pub stats: Vec<StatCard>,
    pub totals: SalesTotals,
    pub collection_rate: Decimal,
    pub recent_orders: Vec<OrderFinancials>,
}

/// One low-stock line in the admin inventory summary
#[derive(Debug, Serialize)]
pub struct LowStockEntry {
    pub distributor_id: Uuid,
    pub distributor_name: String,
    pub sku_id: Uuid,
    pub product_name: String,
    pub weight_label: String,
    pub balance: i64,
}

/// The admin dashboard
#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub role: Role,
    pub range: DateRange,
    pub stats: Vec<StatCard>,
    pub totals: SalesTotals,
    pub collection_rate: Decimal,
    pub top_distributors: Vec<DistributorRollup>,
    pub top_supermarkets: Vec<SupermarketRollup>,
    pub top_products: Vec<ProductRollup>,
    /// Revenue of the best-selling product, for scaling bar charts
    pub max_product_sales: Decimal,
    pub channel_sales: Vec<ChannelRollup>,
    pub distributor_overview: Vec<DistributorRollup>,
    pub low_stock: Vec<LowStockEntry>,
}

/// One linked distributor on the referrer dashboard
#[derive(Debug, Serialize)]
pub struct ReferrerDistributorLine {
    pub distributor_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub sales: Decimal,
    pub earnings: Decimal,
}

/// The referrer's earnings dashboard. Earnings are a percentage of gross
/// sales, not of profit.
#[derive(Debug, Serialize)]
pub struct ReferrerDashboard {
    pub role: Role,
    pub range: DateRange,
    pub commission_percentage: Decimal,
    pub total_sales: Decimal,
    pub total_earnings: Decimal,
    pub active_distributor_count: u64,
    pub distributors: Vec<ReferrerDistributorLine>,
}

/// Headline cards for the distributor view. The outstanding card carries
/// the alert flag when the balance crosses the threshold.
fn distributor_stat_cards(totals: &SalesTotals, collection_rate: Decimal) -> Vec<StatCard> {
    vec![
        StatCard {
            label: "Total Sales",
            value: serde_json::json!(totals.sales),
            format: "currency",
            alert: None,
        },
        StatCard {
            label: "Total Profit",
            value: serde_json::json!(totals.profit),
            format: "currency",
            alert: None,
        },
        StatCard {
            label: "Outstanding",
            value: serde_json::json!(totals.outstanding),
            format: "currency",
            alert: Some(totals.outstanding > Decimal::from(OUTSTANDING_ALERT_THRESHOLD)),
        },
        StatCard {
            label: "Collection Rate",
            value: serde_json::json!(format!("{}%", collection_rate.round_dp(1))),
            format: "percent",
            alert: None,
        },
    ]
}

/// Headline counts for the admin view.
fn admin_stat_cards(active_distributors: i64, products: i64, referrers: i64) -> Vec<StatCard> {
    vec![
        StatCard {
            label: "Active Distributors",
            value: serde_json::json!(active_distributors),
            format: "number",
            alert: None,
        },
        StatCard {
            label: "Total Products",
            value: serde_json::json!(products),
            format: "number",
            alert: None,
        },
        StatCard {
            label: "Referrers",
            value: serde_json::json!(referrers),
            format: "number",
            alert: None,
        },
    ]
}

#[derive(Debug, sqlx::FromRow)]
struct SkuCostRow {
    sku_id: Uuid,
    vendor_cost_per_kg: Decimal,
    weight_grams: Decimal,
    calculated_vendor_cost: Decimal,
    packing_cost: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CommissionRow {
    supermarket_id: Uuid,
    sku_id: Uuid,
    commission_type: String,
    commission_value: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct SkuProductRow {
    sku_id: Uuid,
    product_id: Uuid,
    product_name: String,
}

impl DashboardService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            low_stock_threshold: config.reporting.low_stock_threshold,
            top_n: config.reporting.top_n,
        }
    }

    /// Distributor view: own sales, collection rate, recent orders.
    ///
    /// Costs resolve from the product per-kg rate and SKU weight.
    pub async fn distributor_dashboard(
        &self,
        distributor_id: Uuid,
        range: DateRange,
    ) -> AppResult<DistributorDashboard> {
        let (priced, _) = self
            .price_orders(Some(distributor_id), CostStrategy::PerKgFromWeight)
            .await?;
        let in_range = finance::within_range(&priced, &range);

        let totals = finance::summarize(in_range.iter().copied());
        let collection_rate = totals.collection_rate();

        let mut recent: Vec<OrderFinancials> = in_range.into_iter().cloned().collect();
        recent.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        recent.truncate(5);

        Ok(DistributorDashboard {
            role: Role::Distributor,
            range,
            stats: distributor_stat_cards(&totals, collection_rate),
            totals,
            collection_rate,
            recent_orders: recent,
        })
    }

    /// Admin view: platform totals, rankings, channel split, and the
    /// inventory summary.
    ///
    /// Costs resolve from the precalculated per-unit figure on the SKU.
    pub async fn admin_dashboard(&self, range: DateRange) -> AppResult<AdminDashboard> {
        let (priced, items_by_order) = self
            .price_orders(None, CostStrategy::PrecalculatedPerUnit)
            .await?;
        let in_range = finance::within_range(&priced, &range);

        let totals = finance::summarize(in_range.iter().copied());
        let collection_rate = totals.collection_rate();

        let (active_distributors, products, referrers) = self.headline_counts().await?;

        let distributor_names = self.distributor_names().await?;
        let supermarket_names = self.supermarket_names().await?;
        let sku_products = self.sku_products().await?;

        // Stock counts and low-stock lines come from the full ledger, not
        // the date range; stock is a point-in-time figure.
        let ledger_report = self.ledger_report().await?;
        let stock_counts = ledger::distributor_stock_totals(&ledger_report);

        let distributor_overview = finance::rollup_by_distributor(
            in_range.iter().copied(),
            &distributor_names,
            &stock_counts,
        );
        let top_distributors = finance::top_n(
            distributor_overview.clone(),
            self.top_n,
            |d| d.sales,
            |d| d.name.as_str(),
        );

        let top_supermarkets = finance::top_n(
            finance::rollup_by_supermarket(in_range.iter().copied(), &supermarket_names),
            self.top_n,
            |s| s.sales,
            |s| s.name.as_str(),
        );

        let in_range_items: Vec<OrderItem> = in_range
            .iter()
            .flat_map(|o| items_by_order.get(&o.order_id).into_iter().flatten())
            .cloned()
            .collect();
        let product_rollups = finance::rollup_by_product(&in_range_items, &sku_products);
        let max_product_sales = product_rollups
            .iter()
            .map(|p| p.revenue)
            .max()
            .unwrap_or(Decimal::ZERO);
        let top_products =
            finance::top_n(product_rollups, self.top_n, |p| p.revenue, |p| p.name.as_str());

        let channel_sales = finance::rollup_by_channel(in_range.iter().copied());

        let low = ledger::low_stock(&ledger_report.balances, self.low_stock_threshold, self.top_n);
        let sku_names = self.sku_names().await?;
        let low_stock = low
            .into_iter()
            .map(|((distributor_id, sku_id), balance)| {
                let (product_name, weight_label) = sku_names
                    .get(&sku_id)
                    .cloned()
                    .unwrap_or_else(|| ("Unknown".to_string(), String::new()));
                LowStockEntry {
                    distributor_id,
                    distributor_name: distributor_names
                        .get(&distributor_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    sku_id,
                    product_name,
                    weight_label,
                    balance,
                }
            })
            .collect();

        Ok(AdminDashboard {
            role: Role::Admin,
            range,
            stats: admin_stat_cards(active_distributors, products, referrers),
            totals,
            collection_rate,
            top_distributors,
            top_supermarkets,
            top_products,
            max_product_sales,
            channel_sales,
            distributor_overview,
            low_stock,
        })
    }

    /// Referrer view: gross sales of linked distributors and the earned
    /// percentage.
    pub async fn referrer_dashboard(
        &self,
        referrer_id: Uuid,
        commission_percentage: Decimal,
        range: DateRange,
    ) -> AppResult<ReferrerDashboard> {
        let linked = sqlx::query_as::<_, (Uuid, String, bool)>(
            "SELECT id, name, is_active FROM distributors WHERE referrer_id = $1",
        )
        .bind(referrer_id)
        .fetch_all(&self.db)
        .await?;

        let mut distributors = Vec::with_capacity(linked.len());
        let mut total_sales = Decimal::ZERO;
        let mut active_distributor_count = 0u64;

        for (distributor_id, name, is_active) in linked {
            if is_active {
                active_distributor_count += 1;
            }

            let sales: Option<Decimal> = sqlx::query_scalar(
                r#"
                SELECT SUM(total_amount) FROM orders
                WHERE distributor_id = $1 AND order_date >= $2 AND order_date <= $3
                "#,
            )
            .bind(distributor_id)
            .bind(range.from)
            .bind(range.to)
            .fetch_one(&self.db)
            .await?;
            let sales = sales.unwrap_or(Decimal::ZERO);

            total_sales += sales;
            distributors.push(ReferrerDistributorLine {
                distributor_id,
                name,
                is_active,
                sales,
                earnings: finance::referrer_earnings(sales, commission_percentage),
            });
        }

        Ok(ReferrerDashboard {
            role: Role::Referrer,
            range,
            commission_percentage,
            total_sales,
            total_earnings: finance::referrer_earnings(total_sales, commission_percentage),
            active_distributor_count,
            distributors,
        })
    }

    /// Orders report as CSV, one row per priced order in the range.
    pub async fn orders_csv(&self, range: DateRange) -> AppResult<String> {
        let (priced, _) = self
            .price_orders(None, CostStrategy::PrecalculatedPerUnit)
            .await?;
        let mut in_range: Vec<&OrderFinancials> = finance::within_range(&priced, &range);
        in_range.sort_by(|a, b| a.order_date.cmp(&b.order_date));

        let distributor_names = self.distributor_names().await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "order_ref",
                "order_date",
                "distributor",
                "channel",
                "revenue",
                "received",
                "commission",
                "cost",
                "profit",
            ])
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;

        for order in in_range {
            writer
                .write_record([
                    order.order_ref.as_str(),
                    &order.order_date.format("%Y-%m-%d").to_string(),
                    distributor_names
                        .get(&order.distributor_id)
                        .map(String::as_str)
                        .unwrap_or("Unknown"),
                    order.sales_channel.as_str(),
                    &order.revenue.to_string(),
                    &order.received.to_string(),
                    &order.commission.to_string(),
                    &order.cost.to_string(),
                    &order.profit.to_string(),
                ])
                .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding: {}", e)))
    }

    /// Fetch and price orders, optionally restricted to one distributor.
    /// Returns the priced orders plus the item lines keyed by order id for
    /// product rollups.
    async fn price_orders(
        &self,
        distributor_id: Option<Uuid>,
        strategy: CostStrategy,
    ) -> AppResult<(Vec<OrderFinancials>, HashMap<Uuid, Vec<OrderItem>>)> {
        let orders = match distributor_id {
            Some(id) => sqlx::query_as::<_, OrderRow>(
                r#"
                SELECT id, distributor_id, supermarket_id, sales_channel, customer_name,
                       order_ref, total_amount, amount_received, payment_status, order_date, comments
                FROM orders
                WHERE distributor_id = $1
                "#,
            )
            .bind(id)
            .fetch_all(&self.db)
            .await?,
            None => sqlx::query_as::<_, OrderRow>(
                r#"
                SELECT id, distributor_id, supermarket_id, sales_channel, customer_name,
                       order_ref, total_amount, amount_received, payment_status, order_date, comments
                FROM orders
                "#,
            )
            .fetch_all(&self.db)
            .await?,
        };

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, sku_id, quantity, price_per_unit, total_price
            FROM order_items
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            items_by_order
                .entry(row.order_id)
                .or_default()
                .push(row.to_model());
        }

        let costs = self.sku_cost_table().await?;
        let commissions = self.commission_table().await?;

        let mut priced = Vec::with_capacity(orders.len());
        for row in &orders {
            let Some(order) = row.to_model() else {
                tracing::warn!(order_id = %row.id, "order with unrecognized channel or payment status skipped from reporting");
                continue;
            };
            let items = items_by_order.get(&row.id).cloned().unwrap_or_default();
            priced.push(finance::price_order(
                &order,
                &items,
                &costs,
                &commissions,
                strategy,
            ));
        }

        Ok((priced, items_by_order))
    }

    async fn sku_cost_table(&self) -> AppResult<SkuCostTable> {
        let rows = sqlx::query_as::<_, SkuCostRow>(
            r#"
            SELECT s.id AS sku_id, p.vendor_cost_per_kg, s.weight_grams,
                   s.calculated_vendor_cost, s.packing_cost
            FROM skus s
            JOIN products p ON p.id = s.product_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.sku_id,
                    SkuCost {
                        vendor_cost_per_kg: r.vendor_cost_per_kg,
                        weight_grams: r.weight_grams,
                        calculated_vendor_cost: r.calculated_vendor_cost,
                        packing_cost: r.packing_cost,
                    },
                )
            })
            .collect())
    }

    async fn commission_table(&self) -> AppResult<CommissionTable> {
        let rows = sqlx::query_as::<_, CommissionRow>(
            "SELECT supermarket_id, sku_id, commission_type, commission_value FROM pricing_rules",
        )
        .fetch_all(&self.db)
        .await?;

        let mut table = CommissionTable::new();
        for row in rows {
            let Some(kind) = CommissionType::parse(&row.commission_type) else {
                tracing::warn!(
                    supermarket_id = %row.supermarket_id,
                    sku_id = %row.sku_id,
                    commission_type = %row.commission_type,
                    "pricing rule with unknown commission type treated as no commission"
                );
                continue;
            };
            table.insert(
                (row.supermarket_id, row.sku_id),
                CommissionRule {
                    kind,
                    value: row.commission_value,
                },
            );
        }
        Ok(table)
    }

    async fn ledger_report(&self) -> AppResult<ledger::BalanceReport> {
        let rows = sqlx::query_as::<_, InventoryEventRow>(
            "SELECT id, distributor_id, sku_id, event_type, quantity, event_date FROM inventory_events",
        )
        .fetch_all(&self.db)
        .await?;

        let events: Vec<InventoryEvent> = rows.into_iter().map(Into::into).collect();
        let report = ledger::compute_balances(&events);
        for warning in &report.warnings {
            tracing::warn!(
                event_id = %warning.event_id,
                event_type = %warning.event_type,
                "inventory event with unknown type contributed zero to balances"
            );
        }
        Ok(report)
    }

    async fn headline_counts(&self) -> AppResult<(i64, i64, i64)> {
        let active_distributors: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM distributors WHERE is_active = TRUE")
                .fetch_one(&self.db)
                .await?;
        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;
        let referrers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM referrers")
            .fetch_one(&self.db)
            .await?;
        Ok((active_distributors, products, referrers))
    }

    async fn distributor_names(&self) -> AppResult<HashMap<Uuid, String>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM distributors")
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn supermarket_names(&self) -> AppResult<HashMap<Uuid, String>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM supermarkets")
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn sku_products(&self) -> AppResult<HashMap<Uuid, ProductRef>> {
        let rows = sqlx::query_as::<_, SkuProductRow>(
            r#"
            SELECT s.id AS sku_id, p.id AS product_id, p.name AS product_name
            FROM skus s
            JOIN products p ON p.id = s.product_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                (
                    r.sku_id,
                    ProductRef {
                        product_id: r.product_id,
                        name: r.product_name,
                    },
                )
            })
            .collect())
    }

    async fn sku_names(&self) -> AppResult<HashMap<Uuid, (String, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String)>(
            r#"
            SELECT s.id, p.name, s.weight_label
            FROM skus s
            JOIN products p ON p.id = s.product_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(sku_id, product_name, weight_label)| (sku_id, (product_name, weight_label)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn totals(sales: i64, received: i64, profit: i64) -> SalesTotals {
        SalesTotals {
            sales: Decimal::from(sales),
            received: Decimal::from(received),
            profit: Decimal::from(profit),
            outstanding: Decimal::from(sales - received),
            order_count: 1,
        }
    }

    #[test]
    fn distributor_cards_cover_the_four_headline_figures() {
        let t = totals(5000, 4000, 1200);
        let cards = distributor_stat_cards(&t, t.collection_rate());

        let labels: Vec<&str> = cards.iter().map(|c| c.label).collect();
        assert_eq!(
            labels,
            ["Total Sales", "Total Profit", "Outstanding", "Collection Rate"]
        );
        assert_eq!(cards[3].format, "percent");
        assert_eq!(cards[3].value, serde_json::json!("80.0%"));
    }

    #[test]
    fn outstanding_card_alerts_only_above_the_threshold() {
        let calm = totals(5000, 4500, 0);
        let cards = distributor_stat_cards(&calm, calm.collection_rate());
        assert_eq!(cards[2].alert, Some(false));

        let hot = totals(5000, 3000, 0);
        let cards = distributor_stat_cards(&hot, hot.collection_rate());
        assert_eq!(cards[2].alert, Some(true));
    }

    #[test]
    fn admin_cards_carry_the_platform_counts() {
        let cards = admin_stat_cards(7, 12, 3);
        assert_eq!(cards[0].label, "Active Distributors");
        assert_eq!(cards[0].value, serde_json::json!(7));
        assert_eq!(cards[1].value, serde_json::json!(12));
        assert_eq!(cards[2].value, serde_json::json!(3));
        assert!(cards.iter().all(|c| c.format == "number" && c.alert.is_none()));
    }

    #[test]
    fn distributor_dashboard_json_names_its_role_and_stats() {
        let t = totals(1000, 1000, 300);
        let dashboard = DistributorDashboard {
            role: Role::Distributor,
            range: DateRange::current_month(Utc::now()),
            stats: distributor_stat_cards(&t, t.collection_rate()),
            totals: t,
            collection_rate: Decimal::from(100),
            recent_orders: Vec::new(),
        };

        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["role"], "DISTRIBUTOR");
        assert_eq!(json["stats"].as_array().unwrap().len(), 4);
        assert_eq!(json["stats"][0]["label"], "Total Sales");
        // no alert key on cards that never alert
        assert!(json["stats"][0].get("alert").is_none());
    }
}
