//! HTTP handlers for distributor management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::require_admin;
use crate::middleware::CurrentUser;
use crate::services::distributors::{
    CreateDistributorInput, Distributor, DistributorService, UpdateDistributorInput,
};
use crate::AppState;

/// Onboard a new distributor (admin only)
pub async fn create_distributor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDistributorInput>,
) -> AppResult<(StatusCode, Json<Distributor>)> {
    require_admin(&current_user)?;
    let service = DistributorService::new(state.db);
    let distributor = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(distributor)))
}

/// List all distributors (admin only)
pub async fn list_distributors(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Distributor>>> {
    require_admin(&current_user)?;
    let service = DistributorService::new(state.db);
    let distributors = service.list().await?;
    Ok(Json(distributors))
}

/// Fetch one distributor (admin only)
pub async fn get_distributor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(distributor_id): Path<Uuid>,
) -> AppResult<Json<Distributor>> {
    require_admin(&current_user)?;
    let service = DistributorService::new(state.db);
    let distributor = service.get(distributor_id).await?;
    Ok(Json(distributor))
}

/// Update a distributor profile (admin only)
pub async fn update_distributor(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(distributor_id): Path<Uuid>,
    Json(input): Json<UpdateDistributorInput>,
) -> AppResult<Json<Distributor>> {
    require_admin(&current_user)?;
    let service = DistributorService::new(state.db);
    let distributor = service.update(distributor_id, input).await?;
    Ok(Json(distributor))
}
