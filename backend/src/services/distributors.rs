//! Distributor management service
//!
//! Creating a distributor provisions a login account first and then the
//! profile row. The two writes go to different concerns (auth vs domain),
//! so the profile failure path compensates by removing the fresh account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::hash_password;
use shared::models::Role;
use shared::validation::{validate_email, validate_name, validate_password};

#[derive(Clone)]
pub struct DistributorService {
    db: PgPool,
}

/// A distributor profile
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Distributor {
    pub id: Uuid,
    /// Login account backing this distributor
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub is_active: bool,
    /// Referrer who introduced this distributor, if any
    pub referrer_id: Option<Uuid>,
    pub referrer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for onboarding a new distributor
#[derive(Debug, Deserialize)]
pub struct CreateDistributorInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub referrer_id: Option<Uuid>,
}

/// Input for editing an existing distributor profile
#[derive(Debug, Deserialize)]
pub struct UpdateDistributorInput {
    pub name: String,
    pub location: Option<String>,
    pub contact_info: Option<String>,
    pub referrer_id: Option<Uuid>,
    pub is_active: bool,
}

const DISTRIBUTOR_COLUMNS: &str = r#"
    SELECT d.id, d.user_id, d.name, u.email, d.location, d.contact_info,
           d.is_active, d.referrer_id, r.name AS referrer_name, d.created_at
    FROM distributors d
    JOIN users u ON u.id = d.user_id
    LEFT JOIN referrers r ON r.id = d.referrer_id
"#;

impl DistributorService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Onboard a distributor: login account first, then the profile row.
    pub async fn create(&self, input: CreateDistributorInput) -> AppResult<Distributor> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        validate_email(&input.email).map_err(|msg| AppError::validation("email", msg))?;
        validate_password(&input.password).map_err(|msg| AppError::validation("password", msg))?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&input.email)
            .fetch_one(&self.db)
            .await?;
        if existing > 0 {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        if let Some(referrer_id) = input.referrer_id {
            let found =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM referrers WHERE id = $1")
                    .bind(referrer_id)
                    .fetch_one(&self.db)
                    .await?;
            if found == 0 {
                return Err(AppError::NotFound("Referrer".to_string()));
            }
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
        .bind(Role::Distributor.as_str())
        .fetch_one(&self.db)
        .await?;

        let profile = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO distributors (user_id, name, location, contact_info, referrer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.contact_info)
        .bind(input.referrer_id)
        .fetch_one(&self.db)
        .await;

        let distributor_id = match profile {
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
                        "failed to remove orphaned user after distributor profile insert failed"
                    );
                }
                return Err(AppError::DependentWriteFailure(format!(
                    "Distributor profile creation failed: {}",
                    e
                )));
            }
        };

        self.get(distributor_id).await
    }

    /// List all distributors, newest first
    pub async fn list(&self) -> AppResult<Vec<Distributor>> {
        let rows = sqlx::query_as::<_, Distributor>(&format!(
            "{} ORDER BY d.created_at DESC",
            DISTRIBUTOR_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Fetch one distributor by profile id
    pub async fn get(&self, distributor_id: Uuid) -> AppResult<Distributor> {
        sqlx::query_as::<_, Distributor>(&format!("{} WHERE d.id = $1", DISTRIBUTOR_COLUMNS))
            .bind(distributor_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Distributor".to_string()))
    }

    /// Resolve the distributor profile backing a login account
    pub async fn get_by_user(&self, user_id: Uuid) -> AppResult<Distributor> {
        sqlx::query_as::<_, Distributor>(&format!("{} WHERE d.user_id = $1", DISTRIBUTOR_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::ProfileNotFound("Distributor"))
    }

    /// Update a distributor profile
    pub async fn update(
        &self,
        distributor_id: Uuid,
        input: UpdateDistributorInput,
    ) -> AppResult<Distributor> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;

        if let Some(referrer_id) = input.referrer_id {
            let found =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM referrers WHERE id = $1")
                    .bind(referrer_id)
                    .fetch_one(&self.db)
                    .await?;
            if found == 0 {
                return Err(AppError::NotFound("Referrer".to_string()));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE distributors
            SET name = $2, location = $3, contact_info = $4, referrer_id = $5, is_active = $6
            WHERE id = $1
            "#,
        )
        .bind(distributor_id)
        .bind(&input.name)
        .bind(&input.location)
        .bind(&input.contact_info)
        .bind(input.referrer_id)
        .bind(input.is_active)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Distributor".to_string()));
        }

        // Keep the login account's active flag in step with the profile
        sqlx::query(
            "UPDATE users SET is_active = $2 WHERE id = (SELECT user_id FROM distributors WHERE id = $1)",
        )
        .bind(distributor_id)
        .bind(input.is_active)
        .execute(&self.db)
        .await?;

        self.get(distributor_id).await
    }
}
