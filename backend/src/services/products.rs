//! Product catalog service
//!
//! Products and their per-weight SKUs are managed together: a product is
//! always written with its full SKU set in one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::validation::validate_weight_grams;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// A product line
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    /// Raw vendor cost per kilogram, before packing
    pub vendor_cost_per_kg: Decimal,
    pub cgst_percent: Decimal,
    pub sgst_percent: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A sellable weight variant of a product
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Sku {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Human-readable weight, e.g. "500g"
    pub weight_label: String,
    pub weight_grams: Decimal,
    /// Vendor cost already resolved to a per-unit figure for this weight
    pub calculated_vendor_cost: Decimal,
    pub basic_price: Decimal,
    pub packing_cost: Decimal,
    pub min_selling_price: Decimal,
    pub mrp: Decimal,
}

/// Product with its SKU set, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithSkus {
    #[serde(flatten)]
    pub product: Product,
    pub skus: Vec<Sku>,
}

/// Input for a single SKU row within a product write
#[derive(Debug, Deserialize)]
pub struct SkuInput {
    /// Present when updating an existing SKU, absent for new ones
    pub id: Option<Uuid>,
    pub weight_label: String,
    pub weight_grams: Decimal,
    pub calculated_vendor_cost: Decimal,
    pub basic_price: Decimal,
    pub packing_cost: Decimal,
    pub min_selling_price: Decimal,
    pub mrp: Decimal,
}

/// Input for creating or updating a product with its SKUs
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub vendor_cost_per_kg: Decimal,
    pub cgst_percent: Decimal,
    pub sgst_percent: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub skus: Vec<SkuInput>,
}

fn default_active() -> bool {
    true
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate(input: &ProductInput) -> AppResult<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name is required"));
        }
        if input.skus.is_empty() {
            return Err(AppError::validation(
                "skus",
                "A product requires at least one SKU",
            ));
        }
        for sku in &input.skus {
            validate_weight_grams(sku.weight_grams)
                .map_err(|msg| AppError::validation("weight_grams", msg))?;
            if sku.weight_label.trim().is_empty() {
                return Err(AppError::validation(
                    "weight_label",
                    "SKU weight label is required",
                ));
            }
        }
        Ok(())
    }

    /// Create a product and its SKUs in one transaction
    pub async fn create(&self, input: ProductInput) -> AppResult<ProductWithSkus> {
        Self::validate(&input)?;

        let mut tx = self.db.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, category, description, vendor_cost_per_kg,
                                  cgst_percent, sgst_percent, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, category, description, is_active,
                      vendor_cost_per_kg, cgst_percent, sgst_percent, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.vendor_cost_per_kg)
        .bind(input.cgst_percent)
        .bind(input.sgst_percent)
        .bind(input.is_active)
        .fetch_one(&mut *tx)
        .await?;

        let mut skus = Vec::with_capacity(input.skus.len());
        for sku in &input.skus {
            skus.push(Self::insert_sku(&mut tx, product.id, sku).await?);
        }

        tx.commit().await?;

        Ok(ProductWithSkus { product, skus })
    }

    /// List all products with their SKUs, newest first
    pub async fn list(&self) -> AppResult<Vec<ProductWithSkus>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, description, is_active,
                   vendor_cost_per_kg, cgst_percent, sgst_percent, created_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let skus = sqlx::query_as::<_, Sku>(
            r#"
            SELECT id, product_id, weight_label, weight_grams, calculated_vendor_cost,
                   basic_price, packing_cost, min_selling_price, mrp
            FROM skus
            ORDER BY weight_grams ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut by_product: std::collections::HashMap<Uuid, Vec<Sku>> =
            std::collections::HashMap::new();
        for sku in skus {
            by_product.entry(sku.product_id).or_default().push(sku);
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let skus = by_product.remove(&product.id).unwrap_or_default();
                ProductWithSkus { product, skus }
            })
            .collect())
    }

    /// Fetch a single product with its SKUs
    pub async fn get(&self, product_id: Uuid) -> AppResult<ProductWithSkus> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, category, description, is_active,
                   vendor_cost_per_kg, cgst_percent, sgst_percent, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let skus = sqlx::query_as::<_, Sku>(
            r#"
            SELECT id, product_id, weight_label, weight_grams, calculated_vendor_cost,
                   basic_price, packing_cost, min_selling_price, mrp
            FROM skus
            WHERE product_id = $1
            ORDER BY weight_grams ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductWithSkus { product, skus })
    }

    /// Update a product, reconciling its SKU set.
    ///
    /// SKUs carrying an id are updated in place, SKUs without one are
    /// inserted, and SKUs missing from the input are deleted.
    pub async fn update(&self, product_id: Uuid, input: ProductInput) -> AppResult<ProductWithSkus> {
        Self::validate(&input)?;

        let mut tx = self.db.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, category = $3, description = $4, vendor_cost_per_kg = $5,
                cgst_percent = $6, sgst_percent = $7, is_active = $8
            WHERE id = $1
            RETURNING id, name, category, description, is_active,
                      vendor_cost_per_kg, cgst_percent, sgst_percent, created_at
            "#,
        )
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.description)
        .bind(input.vendor_cost_per_kg)
        .bind(input.cgst_percent)
        .bind(input.sgst_percent)
        .bind(input.is_active)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let kept_ids: Vec<Uuid> = input.skus.iter().filter_map(|s| s.id).collect();

        sqlx::query("DELETE FROM skus WHERE product_id = $1 AND id <> ALL($2)")
            .bind(product_id)
            .bind(&kept_ids)
            .execute(&mut *tx)
            .await?;

        let mut skus = Vec::with_capacity(input.skus.len());
        for sku in &input.skus {
            let row = match sku.id {
                Some(sku_id) => sqlx::query_as::<_, Sku>(
                    r#"
                    UPDATE skus
                    SET weight_label = $3, weight_grams = $4, calculated_vendor_cost = $5,
                        basic_price = $6, packing_cost = $7, min_selling_price = $8, mrp = $9
                    WHERE id = $1 AND product_id = $2
                    RETURNING id, product_id, weight_label, weight_grams, calculated_vendor_cost,
                              basic_price, packing_cost, min_selling_price, mrp
                    "#,
                )
                .bind(sku_id)
                .bind(product_id)
                .bind(&sku.weight_label)
                .bind(sku.weight_grams)
                .bind(sku.calculated_vendor_cost)
                .bind(sku.basic_price)
                .bind(sku.packing_cost)
                .bind(sku.min_selling_price)
                .bind(sku.mrp)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("SKU".to_string()))?,
                None => Self::insert_sku(&mut tx, product_id, sku).await?,
            };
            skus.push(row);
        }

        tx.commit().await?;

        Ok(ProductWithSkus { product, skus })
    }

    /// Delete a product and its SKUs
    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        Ok(())
    }

    async fn insert_sku(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        product_id: Uuid,
        sku: &SkuInput,
    ) -> AppResult<Sku> {
        let row = sqlx::query_as::<_, Sku>(
            r#"
            INSERT INTO skus (product_id, weight_label, weight_grams, calculated_vendor_cost,
                              basic_price, packing_cost, min_selling_price, mrp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, product_id, weight_label, weight_grams, calculated_vendor_cost,
                      basic_price, packing_cost, min_selling_price, mrp
            "#,
        )
        .bind(product_id)
        .bind(&sku.weight_label)
        .bind(sku.weight_grams)
        .bind(sku.calculated_vendor_cost)
        .bind(sku.basic_price)
        .bind(sku.packing_cost)
        .bind(sku.min_selling_price)
        .bind(sku.mrp)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }
}
