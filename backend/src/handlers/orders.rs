//! HTTP handlers for orders

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{ownership, resolve_distributor};
use crate::middleware::CurrentUser;
use crate::services::orders::{
    CreateOrderInput, OrderService, OrderWithItems, UpdateOrderInput,
};
use crate::AppState;
use shared::models::Role;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Admins must name the selling distributor; distributors own implicitly
    pub distributor_id: Option<Uuid>,
    #[serde(flatten)]
    pub order: CreateOrderInput,
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderWithItems>)> {
    let distributor_id = resolve_distributor(&state, &current_user, body.distributor_id).await?;
    let service = OrderService::new(state.db);
    let order = service.create(distributor_id, body.order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List orders: admins see all, distributors their own
pub async fn list_orders(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<OrderWithItems>>> {
    let service = OrderService::new(state.db.clone());
    let orders = match current_user.0.role {
        Role::Admin => service.list_all().await?,
        _ => {
            let distributor_id = resolve_distributor(&state, &current_user, None).await?;
            service.list_for_distributor(distributor_id).await?
        }
    };
    Ok(Json(orders))
}

/// Fetch one order with lines
pub async fn get_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    let owner = ownership(&state, &current_user).await?;
    let service = OrderService::new(state.db);
    let order = service.get(order_id).await?;
    if let Some(distributor_id) = owner {
        if order.order.distributor_id != distributor_id {
            return Err(crate::error::AppError::InsufficientPermissions);
        }
    }
    Ok(Json(order))
}

/// Update payment state and comments
pub async fn update_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<OrderWithItems>> {
    let owner = ownership(&state, &current_user).await?;
    let service = OrderService::new(state.db);
    let order = service.update(order_id, owner, input).await?;
    Ok(Json(order))
}

/// Delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let owner = ownership(&state, &current_user).await?;
    let service = OrderService::new(state.db);
    service.delete(order_id, owner).await?;
    Ok(StatusCode::NO_CONTENT)
}
