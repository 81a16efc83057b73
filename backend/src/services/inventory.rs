//! Inventory ledger service
//!
//! The event table is append-only: stock is never stored as a counter, it
//! is derived on read by folding events. Corrections append compensating
//! events rather than editing history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::ledger::{
    self, BalanceReport, SkuBalanceReport, StockCorrection, UnknownEventType,
};
use shared::models::{InventoryEvent, InventoryEventType};
use shared::validation::validate_quantity;

#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Ledger row as stored. Mirrors `shared::models::InventoryEvent`, which
/// the balance engine consumes.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryEventRow {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub sku_id: Uuid,
    pub event_type: String,
    pub quantity: i64,
    pub event_date: DateTime<Utc>,
}

impl From<InventoryEventRow> for InventoryEvent {
    fn from(row: InventoryEventRow) -> Self {
        InventoryEvent {
            id: row.id,
            distributor_id: row.distributor_id,
            sku_id: row.sku_id,
            event_type: row.event_type,
            quantity: row.quantity,
            event_date: row.event_date,
        }
    }
}

/// Input for appending one ledger event
#[derive(Debug, Deserialize)]
pub struct AppendEventInput {
    pub sku_id: Uuid,
    pub event_type: String,
    pub quantity: i64,
    pub event_date: Option<DateTime<Utc>>,
}

/// One line of an inbound delivery
#[derive(Debug, Deserialize)]
pub struct DeliveryLine {
    pub sku_id: Uuid,
    pub quantity: i64,
}

/// Input for recording a multi-SKU delivery to a distributor
#[derive(Debug, Deserialize)]
pub struct DeliveryInput {
    pub distributor_id: Uuid,
    pub lines: Vec<DeliveryLine>,
    pub event_date: Option<DateTime<Utc>>,
}

/// Input for an absolute stock correction
#[derive(Debug, Deserialize)]
pub struct SetStockInput {
    pub distributor_id: Uuid,
    pub sku_id: Uuid,
    pub target_quantity: i64,
}

/// Per-SKU balance with display names, for the distributor's own view
#[derive(Debug, Clone, Serialize)]
pub struct SkuBalance {
    pub sku_id: Uuid,
    pub product_name: String,
    pub weight_label: String,
    pub balance: i64,
}

/// (distributor, SKU) balance with display names, for the admin view
#[derive(Debug, Clone, Serialize)]
pub struct GlobalBalance {
    pub distributor_id: Uuid,
    pub distributor_name: String,
    pub sku_id: Uuid,
    pub product_name: String,
    pub weight_label: String,
    pub balance: i64,
}

/// Outcome of an absolute stock correction
#[derive(Debug, Clone, Serialize)]
pub struct StockCorrectionResult {
    pub previous_balance: i64,
    pub new_balance: i64,
    /// The compensating event appended, if the balance actually moved
    pub event: Option<InventoryEventRow>,
}

#[derive(Debug, sqlx::FromRow)]
struct SkuNameRow {
    sku_id: Uuid,
    product_name: String,
    weight_label: String,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one event to a distributor's ledger
    pub async fn append_event(
        &self,
        distributor_id: Uuid,
        input: AppendEventInput,
    ) -> AppResult<InventoryEventRow> {
        let kind = InventoryEventType::parse(&input.event_type).ok_or_else(|| {
            AppError::validation(
                "event_type",
                "Event type must be one of IN, OPENING, RETURN, SENT, SOLD",
            )
        })?;
        validate_quantity(input.quantity)
            .map_err(|msg| AppError::validation("quantity", msg))?;

        self.insert_event(
            distributor_id,
            input.sku_id,
            kind,
            input.quantity,
            input.event_date.unwrap_or_else(Utc::now),
        )
        .await
    }

    /// Record an inbound delivery as a batch of IN events in one transaction
    pub async fn record_delivery(&self, input: DeliveryInput) -> AppResult<Vec<InventoryEventRow>> {
        if input.lines.is_empty() {
            return Err(AppError::validation(
                "lines",
                "A delivery requires at least one line",
            ));
        }
        for line in &input.lines {
            validate_quantity(line.quantity)
                .map_err(|msg| AppError::validation("quantity", msg))?;
        }

        let event_date = input.event_date.unwrap_or_else(Utc::now);
        let mut tx = self.db.begin().await?;

        let mut events = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let row = sqlx::query_as::<_, InventoryEventRow>(
                r#"
                INSERT INTO inventory_events (distributor_id, sku_id, event_type, quantity, event_date)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, distributor_id, sku_id, event_type, quantity, event_date
                "#,
            )
            .bind(input.distributor_id)
            .bind(line.sku_id)
            .bind(InventoryEventType::In.as_str())
            .bind(line.quantity)
            .bind(event_date)
            .fetch_one(&mut *tx)
            .await?;
            events.push(row);
        }

        tx.commit().await?;

        Ok(events)
    }

    /// A distributor's own per-SKU balances, including zero and negative
    /// balances so inconsistencies stay visible.
    pub async fn my_inventory(&self, distributor_id: Uuid) -> AppResult<Vec<SkuBalance>> {
        let rows = sqlx::query_as::<_, InventoryEventRow>(
            r#"
            SELECT id, distributor_id, sku_id, event_type, quantity, event_date
            FROM inventory_events
            WHERE distributor_id = $1
            "#,
        )
        .bind(distributor_id)
        .fetch_all(&self.db)
        .await?;

        let events: Vec<InventoryEvent> = rows.into_iter().map(Into::into).collect();
        let report: SkuBalanceReport = ledger::compute_sku_balances(&events);
        log_unknown_events(&report.warnings);

        let names = self.sku_names().await?;

        Ok(report
            .balances
            .iter()
            .map(|(&sku_id, &balance)| {
                let (product_name, weight_label) = names
                    .get(&sku_id)
                    .cloned()
                    .unwrap_or_else(|| ("Unknown".to_string(), String::new()));
                SkuBalance {
                    sku_id,
                    product_name,
                    weight_label,
                    balance,
                }
            })
            .collect())
    }

    /// Platform-wide balances for the admin view. Zero balances are
    /// filtered out here; pairs that net to nothing are noise at this
    /// scope.
    pub async fn global_inventory(&self) -> AppResult<Vec<GlobalBalance>> {
        let rows = sqlx::query_as::<_, InventoryEventRow>(
            "SELECT id, distributor_id, sku_id, event_type, quantity, event_date FROM inventory_events",
        )
        .fetch_all(&self.db)
        .await?;

        let events: Vec<InventoryEvent> = rows.into_iter().map(Into::into).collect();
        let report: BalanceReport = ledger::compute_balances(&events);
        log_unknown_events(&report.warnings);

        let names = self.sku_names().await?;
        let distributor_names = self.distributor_names().await?;

        Ok(report
            .balances
            .iter()
            .filter(|(_, &balance)| balance != 0)
            .map(|(&(distributor_id, sku_id), &balance)| {
                let (product_name, weight_label) = names
                    .get(&sku_id)
                    .cloned()
                    .unwrap_or_else(|| ("Unknown".to_string(), String::new()));
                GlobalBalance {
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
            .collect())
    }

    /// List a distributor's raw ledger, newest first
    pub async fn list_events(&self, distributor_id: Uuid) -> AppResult<Vec<InventoryEventRow>> {
        let rows = sqlx::query_as::<_, InventoryEventRow>(
            r#"
            SELECT id, distributor_id, sku_id, event_type, quantity, event_date
            FROM inventory_events
            WHERE distributor_id = $1
            ORDER BY event_date DESC, id DESC
            "#,
        )
        .bind(distributor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Move one (distributor, SKU) balance to an absolute target by
    /// appending a single compensating event. Already-at-target is a no-op.
    pub async fn set_absolute_stock(&self, input: SetStockInput) -> AppResult<StockCorrectionResult> {
        if input.target_quantity < 0 {
            return Err(AppError::validation(
                "target_quantity",
                "Target stock cannot be negative",
            ));
        }

        let rows = sqlx::query_as::<_, InventoryEventRow>(
            r#"
            SELECT id, distributor_id, sku_id, event_type, quantity, event_date
            FROM inventory_events
            WHERE distributor_id = $1 AND sku_id = $2
            "#,
        )
        .bind(input.distributor_id)
        .bind(input.sku_id)
        .fetch_all(&self.db)
        .await?;

        let events: Vec<InventoryEvent> = rows.into_iter().map(Into::into).collect();
        let report = ledger::compute_sku_balances(&events);
        log_unknown_events(&report.warnings);
        let current = report.balances.get(&input.sku_id).copied().unwrap_or(0);

        let event = match ledger::plan_stock_correction(current, input.target_quantity) {
            Some(StockCorrection {
                event_type,
                quantity,
            }) => Some(
                self.insert_event(
                    input.distributor_id,
                    input.sku_id,
                    event_type,
                    quantity,
                    Utc::now(),
                )
                .await?,
            ),
            None => None,
        };

        Ok(StockCorrectionResult {
            previous_balance: current,
            new_balance: input.target_quantity,
            event,
        })
    }

    async fn insert_event(
        &self,
        distributor_id: Uuid,
        sku_id: Uuid,
        kind: InventoryEventType,
        quantity: i64,
        event_date: DateTime<Utc>,
    ) -> AppResult<InventoryEventRow> {
        let row = sqlx::query_as::<_, InventoryEventRow>(
            r#"
            INSERT INTO inventory_events (distributor_id, sku_id, event_type, quantity, event_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, distributor_id, sku_id, event_type, quantity, event_date
            "#,
        )
        .bind(distributor_id)
        .bind(sku_id)
        .bind(kind.as_str())
        .bind(quantity)
        .bind(event_date)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    async fn sku_names(&self) -> AppResult<std::collections::HashMap<Uuid, (String, String)>> {
        let rows = sqlx::query_as::<_, SkuNameRow>(
            r#"
            SELECT s.id AS sku_id, p.name AS product_name, s.weight_label
            FROM skus s
            JOIN products p ON p.id = s.product_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.sku_id, (r.product_name, r.weight_label)))
            .collect())
    }

    async fn distributor_names(&self) -> AppResult<std::collections::HashMap<Uuid, String>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM distributors")
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().collect())
    }
}

fn log_unknown_events(warnings: &[UnknownEventType]) {
    for warning in warnings {
        tracing::warn!(
            event_id = %warning.event_id,
            event_type = %warning.event_type,
            "inventory event with unknown type contributed zero to balances"
        );
    }
}
