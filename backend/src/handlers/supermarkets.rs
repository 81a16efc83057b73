//! HTTP handlers for supermarkets and their pricing rules

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::{ownership, resolve_distributor};
use crate::middleware::CurrentUser;
use crate::services::pricing::{PricingRule, PricingService, UpsertPricingInput};
use crate::services::supermarkets::{Supermarket, SupermarketInput, SupermarketService};
use crate::services::DistributorService;
use crate::AppState;
use shared::models::Role;

#[derive(Debug, Deserialize)]
pub struct CreateSupermarketRequest {
    /// Admins must name the owning distributor; distributors own implicitly
    pub distributor_id: Option<Uuid>,
    #[serde(flatten)]
    pub supermarket: SupermarketInput,
}

/// Create a supermarket
pub async fn create_supermarket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<CreateSupermarketRequest>,
) -> AppResult<(StatusCode, Json<Supermarket>)> {
    let distributor_id = resolve_distributor(&state, &current_user, body.distributor_id).await?;
    let service = SupermarketService::new(state.db);
    let supermarket = service.create(distributor_id, body.supermarket).await?;
    Ok((StatusCode::CREATED, Json(supermarket)))
}

/// List supermarkets: admins see all, distributors see their own
pub async fn list_supermarkets(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Supermarket>>> {
    let service = SupermarketService::new(state.db.clone());
    let supermarkets = match current_user.0.role {
        Role::Admin => service.list_all().await?,
        Role::Distributor => {
            let distributors = DistributorService::new(state.db.clone());
            let own = distributors.get_by_user(current_user.0.user_id).await?;
            service.list_for_distributor(own.id).await?
        }
        Role::Referrer => return Err(AppError::InsufficientPermissions),
    };
    Ok(Json(supermarkets))
}

/// Update a supermarket
pub async fn update_supermarket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supermarket_id): Path<Uuid>,
    Json(input): Json<SupermarketInput>,
) -> AppResult<Json<Supermarket>> {
    let owner = ownership(&state, &current_user).await?;
    let service = SupermarketService::new(state.db);
    let supermarket = service.update(supermarket_id, owner, input).await?;
    Ok(Json(supermarket))
}

/// Delete a supermarket
pub async fn delete_supermarket(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supermarket_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let owner = ownership(&state, &current_user).await?;
    let service = SupermarketService::new(state.db);
    service.delete(supermarket_id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upsert the pricing rules for a supermarket
pub async fn upsert_pricing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supermarket_id): Path<Uuid>,
    Json(input): Json<UpsertPricingInput>,
) -> AppResult<Json<Vec<PricingRule>>> {
    let owner = ownership(&state, &current_user).await?;
    let supermarkets = SupermarketService::new(state.db.clone());
    let supermarket = supermarkets.get(supermarket_id).await?;
    if let Some(distributor_id) = owner {
        if supermarket.distributor_id != distributor_id {
            return Err(AppError::InsufficientPermissions);
        }
    }

    let service = PricingService::new(state.db);
    let rules = service.upsert(supermarket_id, input).await?;
    Ok(Json(rules))
}

/// List the pricing rules for a supermarket
pub async fn list_pricing(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supermarket_id): Path<Uuid>,
) -> AppResult<Json<Vec<PricingRule>>> {
    let owner = ownership(&state, &current_user).await?;
    let supermarkets = SupermarketService::new(state.db.clone());
    let supermarket = supermarkets.get(supermarket_id).await?;
    if let Some(distributor_id) = owner {
        if supermarket.distributor_id != distributor_id {
            return Err(AppError::InsufficientPermissions);
        }
    }

    let service = PricingService::new(state.db);
    let rules = service.list_for_supermarket(supermarket_id).await?;
    Ok(Json(rules))
}
