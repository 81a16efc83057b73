//! Order service
//!
//! Orders are written header-plus-items in one transaction. The header
//! `total_amount` is computed from the lines at creation and is the
//! authoritative revenue figure from then on.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{Order, OrderItem, PaymentStatus, SalesChannel};
use shared::validation::{validate_non_negative_amount, validate_quantity};

#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// Order header as stored
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub supermarket_id: Option<Uuid>,
    pub sales_channel: String,
    pub customer_name: Option<String>,
    pub order_ref: String,
    pub total_amount: Decimal,
    pub amount_received: Decimal,
    pub payment_status: String,
    pub order_date: DateTime<Utc>,
    pub comments: Option<String>,
}

/// Order line as stored
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    pub order_id: Uuid,
    pub sku_id: Uuid,
    pub quantity: i64,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
}

/// Header plus lines, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

/// One line of an order creation request
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub sku_id: Uuid,
    pub quantity: i64,
    pub price_per_unit: Decimal,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub sales_channel: String,
    pub supermarket_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub amount_received: Decimal,
    pub payment_status: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

/// Input for updating an order's payment state
#[derive(Debug, Deserialize)]
pub struct UpdateOrderInput {
    pub amount_received: Decimal,
    pub payment_status: String,
    pub comments: Option<String>,
}

impl OrderRow {
    /// Typed view for the financial engines. Rows with channel or status
    /// strings outside the known sets are storage-level corruption and are
    /// rejected rather than guessed at.
    pub fn to_model(&self) -> Option<Order> {
        Some(Order {
            id: self.id,
            distributor_id: self.distributor_id,
            supermarket_id: self.supermarket_id,
            sales_channel: SalesChannel::parse(&self.sales_channel)?,
            customer_name: self.customer_name.clone(),
            order_ref: self.order_ref.clone(),
            total_amount: self.total_amount,
            amount_received: self.amount_received,
            payment_status: PaymentStatus::parse(&self.payment_status)?,
            order_date: self.order_date,
            comments: self.comments.clone(),
        })
    }
}

impl OrderItemRow {
    pub fn to_model(&self) -> OrderItem {
        OrderItem {
            order_id: self.order_id,
            sku_id: self.sku_id,
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            total_price: self.total_price,
        }
    }
}

/// Human-readable order reference: `DD-MM-NN` where NN is the 1-based
/// position of the order within the distributor's day.
pub fn format_order_ref(order_date: DateTime<Utc>, sequence: i64) -> String {
    format!(
        "{:02}-{:02}-{:02}",
        order_date.day(),
        order_date.month(),
        sequence
    )
}

/// Attempts at a same-day reference before giving up. Each retry recounts
/// the day's orders, so a lost race lands on the next free number.
const ORDER_REF_ATTEMPTS: u32 = 3;

/// True when the error is the uniqueness backstop on
/// (distributor, day, reference) rejecting a raced duplicate.
fn is_order_ref_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|name| name == "uq_orders_ref_per_day")
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate(input: &CreateOrderInput) -> AppResult<SalesChannel> {
        let channel = SalesChannel::parse(&input.sales_channel).ok_or_else(|| {
            AppError::validation("sales_channel", "Unknown sales channel")
        })?;

        if input.items.is_empty() {
            return Err(AppError::validation(
                "items",
                "An order requires at least one line item",
            ));
        }
        let mut seen_skus = std::collections::HashSet::with_capacity(input.items.len());
        for item in &input.items {
            if !seen_skus.insert(item.sku_id) {
                return Err(AppError::validation(
                    "items",
                    "Each SKU may appear on at most one line",
                ));
            }
            validate_quantity(item.quantity)
                .map_err(|msg| AppError::validation("quantity", msg))?;
            validate_non_negative_amount(item.price_per_unit)
                .map_err(|msg| AppError::validation("price_per_unit", msg))?;
        }
        validate_non_negative_amount(input.amount_received)
            .map_err(|msg| AppError::validation("amount_received", msg))?;

        match channel {
            SalesChannel::Supermarket => {
                if input.supermarket_id.is_none() {
                    return Err(AppError::validation(
                        "supermarket_id",
                        "Supermarket orders require a supermarket",
                    ));
                }
            }
            _ => {
                let named = input
                    .customer_name
                    .as_deref()
                    .map(|n| !n.trim().is_empty())
                    .unwrap_or(false);
                if !named {
                    return Err(AppError::validation(
                        "customer_name",
                        "Direct orders require a customer name",
                    ));
                }
            }
        }

        if let Some(status) = &input.payment_status {
            if PaymentStatus::parse(status).is_none() {
                return Err(AppError::validation(
                    "payment_status",
                    "Payment status must be PAID, PENDING, or CANCELLED",
                ));
            }
        }

        Ok(channel)
    }

    /// Create an order with its lines in one transaction.
    pub async fn create(
        &self,
        distributor_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderWithItems> {
        let channel = Self::validate(&input)?;

        if let Some(supermarket_id) = input.supermarket_id {
            let owner = sqlx::query_scalar::<_, Uuid>(
                "SELECT distributor_id FROM supermarkets WHERE id = $1",
            )
            .bind(supermarket_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supermarket".to_string()))?;
            if owner != distributor_id {
                return Err(AppError::InsufficientPermissions);
            }
        }

        let total_amount: Decimal = input
            .items
            .iter()
            .map(|item| item.price_per_unit * Decimal::from(item.quantity))
            .sum();

        let order_date = input.order_date.unwrap_or_else(Utc::now);
        let payment_status = input
            .payment_status
            .clone()
            .unwrap_or_else(|| PaymentStatus::Pending.as_str().to_string());

        // Concurrent creates can race to the same same-day sequence number.
        // The unique index rejects the loser, who recounts and retries on
        // the next free number.
        for attempt in 1..=ORDER_REF_ATTEMPTS {
            match self
                .try_insert(distributor_id, &input, channel, total_amount, order_date, &payment_status)
                .await
            {
                Ok(order) => return Ok(order),
                Err(AppError::Database(err)) if is_order_ref_conflict(&err) => {
                    tracing::warn!(
                        %distributor_id,
                        attempt,
                        "order reference collided with a concurrent create, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Err(AppError::DuplicateEntry(
            "order reference for this distributor and day".to_string(),
        ))
    }

    async fn try_insert(
        &self,
        distributor_id: Uuid,
        input: &CreateOrderInput,
        channel: SalesChannel,
        total_amount: Decimal,
        order_date: DateTime<Utc>,
        payment_status: &str,
    ) -> AppResult<OrderWithItems> {
        let mut tx = self.db.begin().await?;

        // Same-day sequence for this distributor, on the same UTC day the
        // uniqueness backstop is keyed on.
        let same_day = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE distributor_id = $1
              AND (order_date AT TIME ZONE 'UTC')::date = ($2 AT TIME ZONE 'UTC')::date
            "#,
        )
        .bind(distributor_id)
        .bind(order_date)
        .fetch_one(&mut *tx)
        .await?;

        let order_ref = format_order_ref(order_date, same_day + 1);

        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (distributor_id, supermarket_id, sales_channel, customer_name,
                                order_ref, total_amount, amount_received, payment_status,
                                order_date, comments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, distributor_id, supermarket_id, sales_channel, customer_name,
                      order_ref, total_amount, amount_received, payment_status, order_date, comments
            "#,
        )
        .bind(distributor_id)
        .bind(input.supermarket_id)
        .bind(channel.as_str())
        .bind(&input.customer_name)
        .bind(&order_ref)
        .bind(total_amount)
        .bind(input.amount_received)
        .bind(payment_status)
        .bind(order_date)
        .bind(&input.comments)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let row = sqlx::query_as::<_, OrderItemRow>(
                r#"
                INSERT INTO order_items (order_id, sku_id, quantity, price_per_unit, total_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING order_id, sku_id, quantity, price_per_unit, total_price
                "#,
            )
            .bind(order.id)
            .bind(item.sku_id)
            .bind(item.quantity)
            .bind(item.price_per_unit)
            .bind(item.price_per_unit * Decimal::from(item.quantity))
            .fetch_one(&mut *tx)
            .await?;
            items.push(row);
        }

        tx.commit().await?;

        Ok(OrderWithItems { order, items })
    }

    /// List a distributor's orders with lines, newest first
    pub async fn list_for_distributor(&self, distributor_id: Uuid) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, distributor_id, supermarket_id, sales_channel, customer_name,
                   order_ref, total_amount, amount_received, payment_status, order_date, comments
            FROM orders
            WHERE distributor_id = $1
            ORDER BY order_date DESC
            "#,
        )
        .bind(distributor_id)
        .fetch_all(&self.db)
        .await?;

        self.attach_items(orders).await
    }

    /// List every order on the platform (admin view)
    pub async fn list_all(&self) -> AppResult<Vec<OrderWithItems>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, distributor_id, supermarket_id, sales_channel, customer_name,
                   order_ref, total_amount, amount_received, payment_status, order_date, comments
            FROM orders
            ORDER BY order_date DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        self.attach_items(orders).await
    }

    /// Fetch one order with its lines
    pub async fn get(&self, order_id: Uuid) -> AppResult<OrderWithItems> {
        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, distributor_id, supermarket_id, sales_channel, customer_name,
                   order_ref, total_amount, amount_received, payment_status, order_date, comments
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, sku_id, quantity, price_per_unit, total_price
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(OrderWithItems { order, items })
    }

    /// Update payment state and comments on an order. Lines and totals are
    /// immutable after creation.
    pub async fn update(
        &self,
        order_id: Uuid,
        owner: Option<Uuid>,
        input: UpdateOrderInput,
    ) -> AppResult<OrderWithItems> {
        if PaymentStatus::parse(&input.payment_status).is_none() {
            return Err(AppError::validation(
                "payment_status",
                "Payment status must be PAID, PENDING, or CANCELLED",
            ));
        }
        validate_non_negative_amount(input.amount_received)
            .map_err(|msg| AppError::validation("amount_received", msg))?;

        let existing = self.get(order_id).await?;
        if let Some(distributor_id) = owner {
            if existing.order.distributor_id != distributor_id {
                return Err(AppError::InsufficientPermissions);
            }
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET amount_received = $2, payment_status = $3, comments = $4
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(input.amount_received)
        .bind(&input.payment_status)
        .bind(&input.comments)
        .execute(&self.db)
        .await?;

        self.get(order_id).await
    }

    /// Delete an order; lines cascade at the storage layer
    pub async fn delete(&self, order_id: Uuid, owner: Option<Uuid>) -> AppResult<()> {
        let existing = self.get(order_id).await?;
        if let Some(distributor_id) = owner {
            if existing.order.distributor_id != distributor_id {
                return Err(AppError::InsufficientPermissions);
            }
        }

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn attach_items(&self, orders: Vec<OrderRow>) -> AppResult<Vec<OrderWithItems>> {
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, sku_id, quantity, price_per_unit, total_price
            FROM order_items
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut by_order: std::collections::HashMap<Uuid, Vec<OrderItemRow>> =
            std::collections::HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderWithItems { order, items }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn order_ref_is_day_month_sequence() {
        let date = Utc.with_ymd_and_hms(2025, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(format_order_ref(date, 1), "07-03-01");
        assert_eq!(format_order_ref(date, 12), "07-03-12");
    }

    #[test]
    fn order_ref_does_not_truncate_large_sequences() {
        let date = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(format_order_ref(date, 150), "31-12-150");
    }

    #[test]
    fn conflict_detection_ignores_unrelated_database_errors() {
        assert!(!is_order_ref_conflict(&sqlx::Error::RowNotFound));
        assert!(!is_order_ref_conflict(&sqlx::Error::PoolClosed));
    }

    fn order_input(items: Vec<OrderItemInput>) -> CreateOrderInput {
        CreateOrderInput {
            sales_channel: "Whatsapp".to_string(),
            supermarket_id: None,
            customer_name: Some("Walk-in".to_string()),
            items,
            amount_received: Decimal::ZERO,
            payment_status: None,
            order_date: None,
            comments: None,
        }
    }

    fn line(sku_id: Uuid, quantity: i64) -> OrderItemInput {
        OrderItemInput {
            sku_id,
            quantity,
            price_per_unit: Decimal::from(50),
        }
    }

    #[test]
    fn a_sku_may_only_appear_on_one_line() {
        let sku = Uuid::new_v4();
        let input = order_input(vec![line(sku, 2), line(Uuid::new_v4(), 1), line(sku, 3)]);

        match OrderService::validate(&input) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "items"),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn distinct_skus_on_separate_lines_validate() {
        let input = order_input(vec![line(Uuid::new_v4(), 2), line(Uuid::new_v4(), 1)]);
        assert!(OrderService::validate(&input).is_ok());
    }
}
