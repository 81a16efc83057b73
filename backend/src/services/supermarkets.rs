//! Supermarket outlet service
//!
//! Supermarkets belong to a distributor. Distributors manage their own
//! outlets; admins can operate on any distributor's set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::OutletType;
use shared::validation::validate_name;

#[derive(Clone)]
pub struct SupermarketService {
    db: PgPool,
}

/// A supermarket or outlet served by a distributor
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Supermarket {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub name: String,
    pub area: Option<String>,
    pub location: Option<String>,
    pub contact_person: Option<String>,
    pub phone_no: Option<String>,
    pub outlet_type: Option<String>,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or updating a supermarket
#[derive(Debug, Deserialize)]
pub struct SupermarketInput {
    pub name: String,
    pub area: Option<String>,
    pub location: Option<String>,
    pub contact_person: Option<String>,
    pub phone_no: Option<String>,
    pub outlet_type: Option<String>,
    pub comments: Option<String>,
}

impl SupermarketService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate(input: &SupermarketInput) -> AppResult<()> {
        validate_name(&input.name).map_err(|msg| AppError::validation("name", msg))?;
        if let Some(outlet_type) = &input.outlet_type {
            if OutletType::parse(outlet_type).is_none() {
                return Err(AppError::validation(
                    "outlet_type",
                    "Outlet type must be Chain or Batch",
                ));
            }
        }
        Ok(())
    }

    /// Create a supermarket under the given distributor
    pub async fn create(
        &self,
        distributor_id: Uuid,
        input: SupermarketInput,
    ) -> AppResult<Supermarket> {
        Self::validate(&input)?;

        let row = sqlx::query_as::<_, Supermarket>(
            r#"
            INSERT INTO supermarkets (distributor_id, name, area, location, contact_person,
                                      phone_no, outlet_type, comments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, distributor_id, name, area, location, contact_person,
                      phone_no, outlet_type, comments, created_at
            "#,
        )
        .bind(distributor_id)
        .bind(&input.name)
        .bind(&input.area)
        .bind(&input.location)
        .bind(&input.contact_person)
        .bind(&input.phone_no)
        .bind(&input.outlet_type)
        .bind(&input.comments)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    /// List supermarkets for one distributor
    pub async fn list_for_distributor(&self, distributor_id: Uuid) -> AppResult<Vec<Supermarket>> {
        let rows = sqlx::query_as::<_, Supermarket>(
            r#"
            SELECT id, distributor_id, name, area, location, contact_person,
                   phone_no, outlet_type, comments, created_at
            FROM supermarkets
            WHERE distributor_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(distributor_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// List every supermarket on the platform (admin view)
    pub async fn list_all(&self) -> AppResult<Vec<Supermarket>> {
        let rows = sqlx::query_as::<_, Supermarket>(
            r#"
            SELECT id, distributor_id, name, area, location, contact_person,
                   phone_no, outlet_type, comments, created_at
            FROM supermarkets
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Fetch one supermarket
    pub async fn get(&self, supermarket_id: Uuid) -> AppResult<Supermarket> {
        sqlx::query_as::<_, Supermarket>(
            r#"
            SELECT id, distributor_id, name, area, location, contact_person,
                   phone_no, outlet_type, comments, created_at
            FROM supermarkets
            WHERE id = $1
            "#,
        )
        .bind(supermarket_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supermarket".to_string()))
    }

    /// Update a supermarket, enforcing distributor ownership when the
    /// caller is not an admin.
    pub async fn update(
        &self,
        supermarket_id: Uuid,
        owner: Option<Uuid>,
        input: SupermarketInput,
    ) -> AppResult<Supermarket> {
        Self::validate(&input)?;

        let existing = self.get(supermarket_id).await?;
        if let Some(distributor_id) = owner {
            if existing.distributor_id != distributor_id {
                return Err(AppError::InsufficientPermissions);
            }
        }

        let row = sqlx::query_as::<_, Supermarket>(
            r#"
            UPDATE supermarkets
            SET name = $2, area = $3, location = $4, contact_person = $5,
                phone_no = $6, outlet_type = $7, comments = $8
            WHERE id = $1
            RETURNING id, distributor_id, name, area, location, contact_person,
                      phone_no, outlet_type, comments, created_at
            "#,
        )
        .bind(supermarket_id)
        .bind(&input.name)
        .bind(&input.area)
        .bind(&input.location)
        .bind(&input.contact_person)
        .bind(&input.phone_no)
        .bind(&input.outlet_type)
        .bind(&input.comments)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    /// Delete a supermarket, enforcing distributor ownership when the
    /// caller is not an admin.
    pub async fn delete(&self, supermarket_id: Uuid, owner: Option<Uuid>) -> AppResult<()> {
        let existing = self.get(supermarket_id).await?;
        if let Some(distributor_id) = owner {
            if existing.distributor_id != distributor_id {
                return Err(AppError::InsufficientPermissions);
            }
        }

        sqlx::query("DELETE FROM supermarkets WHERE id = $1")
            .bind(supermarket_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
