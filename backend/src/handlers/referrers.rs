//! HTTP handlers for referrer management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::require_admin;
use crate::middleware::CurrentUser;
use crate::services::referrers::{
    CreateReferrerInput, Referrer, ReferrerService, UpdateReferrerInput,
};
use crate::AppState;

/// Onboard a new referrer (admin only)
pub async fn create_referrer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateReferrerInput>,
) -> AppResult<(StatusCode, Json<Referrer>)> {
    require_admin(&current_user)?;
    let service = ReferrerService::new(state.db);
    let referrer = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(referrer)))
}

/// List all referrers (admin only)
pub async fn list_referrers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Referrer>>> {
    require_admin(&current_user)?;
    let service = ReferrerService::new(state.db);
    let referrers = service.list().await?;
    Ok(Json(referrers))
}

/// Update a referrer profile (admin only)
pub async fn update_referrer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(referrer_id): Path<Uuid>,
    Json(input): Json<UpdateReferrerInput>,
) -> AppResult<Json<Referrer>> {
    require_admin(&current_user)?;
    let service = ReferrerService::new(state.db);
    let referrer = service.update(referrer_id, input).await?;
    Ok(Json(referrer))
}
