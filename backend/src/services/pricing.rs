//! Per-(supermarket, SKU) pricing and commission rules
//!
//! Rules are written as a batch upsert: the pricing form submits every SKU
//! row for one supermarket at once, and each (supermarket, SKU) pair keeps
//! at most one rule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::CommissionType;

#[derive(Clone)]
pub struct PricingService {
    db: PgPool,
}

/// A stored pricing rule
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PricingRule {
    pub id: Uuid,
    pub supermarket_id: Uuid,
    pub sku_id: Uuid,
    pub selling_price: Decimal,
    pub commission_type: String,
    pub commission_value: Decimal,
}

/// One rule within a batch upsert
#[derive(Debug, Deserialize)]
pub struct PricingRuleInput {
    pub sku_id: Uuid,
    pub selling_price: Decimal,
    pub commission_type: String,
    pub commission_value: Decimal,
}

/// Batch of rules for one supermarket
#[derive(Debug, Deserialize)]
pub struct UpsertPricingInput {
    pub rules: Vec<PricingRuleInput>,
}

impl PricingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upsert pricing rules for a supermarket in one transaction.
    pub async fn upsert(
        &self,
        supermarket_id: Uuid,
        input: UpsertPricingInput,
    ) -> AppResult<Vec<PricingRule>> {
        for rule in &input.rules {
            if CommissionType::parse(&rule.commission_type).is_none() {
                return Err(AppError::validation(
                    "commission_type",
                    "Commission type must be PERCENTAGE or FLAT",
                ));
            }
            if rule.selling_price < Decimal::ZERO || rule.commission_value < Decimal::ZERO {
                return Err(AppError::validation(
                    "selling_price",
                    "Prices and commission values cannot be negative",
                ));
            }
        }

        let mut tx = self.db.begin().await?;

        let mut stored = Vec::with_capacity(input.rules.len());
        for rule in &input.rules {
            let row = sqlx::query_as::<_, PricingRule>(
                r#"
                INSERT INTO pricing_rules (supermarket_id, sku_id, selling_price,
                                           commission_type, commission_value)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (supermarket_id, sku_id)
                DO UPDATE SET selling_price = EXCLUDED.selling_price,
                              commission_type = EXCLUDED.commission_type,
                              commission_value = EXCLUDED.commission_value
                RETURNING id, supermarket_id, sku_id, selling_price, commission_type, commission_value
                "#,
            )
            .bind(supermarket_id)
            .bind(rule.sku_id)
            .bind(rule.selling_price)
            .bind(&rule.commission_type)
            .bind(rule.commission_value)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;

        Ok(stored)
    }

    /// List pricing rules for one supermarket
    pub async fn list_for_supermarket(&self, supermarket_id: Uuid) -> AppResult<Vec<PricingRule>> {
        let rows = sqlx::query_as::<_, PricingRule>(
            r#"
            SELECT id, supermarket_id, sku_id, selling_price, commission_type, commission_value
            FROM pricing_rules
            WHERE supermarket_id = $1
            "#,
        )
        .bind(supermarket_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
