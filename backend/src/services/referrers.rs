//! Referrer management service
//!
//! Referrers introduce distributors and earn a percentage of the gross
//! sales those distributors generate. Provisioning follows the same
//! account-then-profile sequence as distributors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;
use shared::models::Role;
use shared::validation::{
    validate_commission_percentage, validate_email, validate_name, validate_password,
};

#[derive(Clone)]
pub struct ReferrerService {
    db: PgPool,
}

/// A referrer profile
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Referrer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Percentage of gross sales earned from introduced distributors
    pub commission_percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Input for onboarding a new referrer
#[derive(Debug, Deserialize)]
pub struct CreateReferrerInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub commission_percentage: Decimal,
}

/// Input for editing an existing referrer profile
#[derive(Debug, Deserialize)]
pub struct UpdateReferrerInput {
    pub name: String,
    pub phone: Option<String>,
    pub commission_percentage: Decimal,
}

impl ReferrerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Onboard a referrer: login account first, then the profile row.
    pub async fn create(&self, input: CreateReferrerInput) -> AppResult<Referrer> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        validate_email(&input.email).map_err(|msg| AppError::validation("email", msg))?;
        validate_password(&input.password).map_err(|msg| AppError::validation("password", msg))?;
        validate_commission_percentage(input.commission_percentage)
            .map_err(|msg| AppError::validation("commission_percentage", msg))?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&input.email)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.name)
        .bind(Role::Referrer.as_str())
        .fetch_one(&self.db)
        .await?;

        let profile = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO referrers (user_id, name, phone, commission_percentage)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(input.commission_percentage)
        .fetch_one(&self.db)
        .await;

        let referrer_id = match profile {
            Ok(id) => id,
            Err(e) => {
                // Roll back the orphaned login account
                if let Err(cleanup) = sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user_id)
                    .execute(&self.db)
                    .await
                {
                    tracing::error!(
                        user_id = %user_id,
                        error = %cleanup,
                        "failed to remove orphaned user after referrer profile insert failed"
                    );
                }
                return Err(AppError::DependentWriteFailure(format!(
                    "Referrer profile creation failed: {}",
                    e
                )));
            }
        };

        self.get(referrer_id).await
    }

    /// List all referrers, newest first
    pub async fn list(&self) -> AppResult<Vec<Referrer>> {
        let rows = sqlx::query_as::<_, Referrer>(
            r#"
            SELECT r.id, r.user_id, r.name, u.email, r.phone, r.commission_percentage, r.created_at
            FROM referrers r
            JOIN users u ON u.id = r.user_id
            ORDER BY r.created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Fetch one referrer by profile id
    pub async fn get(&self, referrer_id: Uuid) -> AppResult<Referrer> {
        sqlx::query_as::<_, Referrer>(
            r#"
            SELECT r.id, r.user_id, r.name, u.email, r.phone, r.commission_percentage, r.created_at
            FROM referrers r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            "#,
        )
        .bind(referrer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Referrer".to_string()))
    }

    /// Resolve the referrer profile backing a login account
    pub async fn get_by_user(&self, user_id: Uuid) -> AppResult<Referrer> {
        sqlx::query_as::<_, Referrer>(
            r#"
            SELECT r.id, r.user_id, r.name, u.email, r.phone, r.commission_percentage, r.created_at
            FROM referrers r
            JOIN users u ON u.id = r.user_id
            WHERE r.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::ProfileNotFound("Referrer"))
    }

    /// Update a referrer profile
    pub async fn update(&self, referrer_id: Uuid, input: UpdateReferrerInput) -> AppResult<Referrer> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        validate_commission_percentage(input.commission_percentage)
            .map_err(|msg| AppError::validation("commission_percentage", msg))?;

        let result = sqlx::query(
            r#"
            UPDATE referrers
            SET name = $2, phone = $3, commission_percentage = $4
            WHERE id = $1
            "#,
        )
        .bind(referrer_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(input.commission_percentage)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Referrer".to_string()));
        }

        self.get(referrer_id).await
    }
}
