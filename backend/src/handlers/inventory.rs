//! HTTP handlers for the inventory ledger

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{require_admin, resolve_distributor};
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AppendEventInput, DeliveryInput, GlobalBalance, InventoryEventRow, InventoryService,
    SetStockInput, SkuBalance, StockCorrectionResult,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventScope {
    /// Admins may inspect another distributor's ledger
    pub distributor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AppendEventRequest {
    pub distributor_id: Option<Uuid>,
    #[serde(flatten)]
    pub event: AppendEventInput,
}

/// The caller's own per-SKU balances
pub async fn my_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SkuBalance>>> {
    let distributor_id = resolve_distributor(&state, &current_user, None).await?;
    let service = InventoryService::new(state.db);
    let balances = service.my_inventory(distributor_id).await?;
    Ok(Json(balances))
}

/// Platform-wide balances (admin only)
pub async fn global_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<GlobalBalance>>> {
    require_admin(&current_user)?;
    let service = InventoryService::new(state.db);
    let balances = service.global_inventory().await?;
    Ok(Json(balances))
}

/// Append one ledger event
pub async fn append_event(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<AppendEventRequest>,
) -> AppResult<(StatusCode, Json<InventoryEventRow>)> {
    let distributor_id = resolve_distributor(&state, &current_user, body.distributor_id).await?;
    let service = InventoryService::new(state.db);
    let event = service.append_event(distributor_id, body.event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// List a ledger, newest first
pub async fn list_events(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(scope): Query<EventScope>,
) -> AppResult<Json<Vec<InventoryEventRow>>> {
    let distributor_id = resolve_distributor(&state, &current_user, scope.distributor_id).await?;
    let service = InventoryService::new(state.db);
    let events = service.list_events(distributor_id).await?;
    Ok(Json(events))
}

/// Record an inbound delivery to a distributor (admin only)
pub async fn record_delivery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DeliveryInput>,
) -> AppResult<(StatusCode, Json<Vec<InventoryEventRow>>)> {
    require_admin(&current_user)?;
    let service = InventoryService::new(state.db);
    let events = service.record_delivery(input).await?;
    Ok((StatusCode::CREATED, Json(events)))
}

/// Correct a balance to an absolute target (admin only)
pub async fn set_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SetStockInput>,
) -> AppResult<Json<StockCorrectionResult>> {
    require_admin(&current_user)?;
    let service = InventoryService::new(state.db);
    let result = service.set_absolute_stock(input).await?;
    Ok(Json(result))
}
