//! HTTP handlers for the Distribution Management Platform

pub mod auth;
pub mod dashboard;
pub mod distributors;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod referrers;
pub mod supermarkets;

pub use auth::login;
pub use dashboard::{dashboard, orders_csv};
pub use distributors::{
    create_distributor, get_distributor, list_distributors, update_distributor,
};
pub use health::health_check;
pub use inventory::{
    append_event, global_inventory, list_events, my_inventory, record_delivery, set_stock,
};
pub use orders::{create_order, delete_order, get_order, list_orders, update_order};
pub use products::{create_product, delete_product, get_product, list_products, update_product};
pub use referrers::{create_referrer, list_referrers, update_referrer};
pub use supermarkets::{
    create_supermarket, delete_supermarket, list_pricing, list_supermarkets, update_supermarket,
    upsert_pricing,
};

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::DistributorService;
use crate::AppState;
use shared::models::Role;

/// Reject non-admin callers.
pub(crate) fn require_admin(current_user: &CurrentUser) -> AppResult<()> {
    if current_user.0.is_admin() {
        Ok(())
    } else {
        Err(AppError::InsufficientPermissions)
    }
}

/// Resolve which distributor a call operates on: the caller's own profile
/// for distributors, an explicit id for admins.
pub(crate) async fn resolve_distributor(
    state: &AppState,
    current_user: &CurrentUser,
    explicit: Option<Uuid>,
) -> AppResult<Uuid> {
    match current_user.0.role {
        Role::Admin => explicit.ok_or_else(|| {
            AppError::validation("distributor_id", "Admin calls must name a distributor")
        }),
        Role::Distributor => {
            let service = DistributorService::new(state.db.clone());
            Ok(service.get_by_user(current_user.0.user_id).await?.id)
        }
        Role::Referrer => Err(AppError::InsufficientPermissions),
    }
}

/// Ownership guard for mutating calls: admins pass None (any row),
/// distributors pass their own profile id.
pub(crate) async fn ownership(
    state: &AppState,
    current_user: &CurrentUser,
) -> AppResult<Option<Uuid>> {
    match current_user.0.role {
        Role::Admin => Ok(None),
        Role::Distributor => {
            let service = DistributorService::new(state.db.clone());
            Ok(Some(service.get_by_user(current_user.0.user_id).await?.id))
        }
        Role::Referrer => Err(AppError::InsufficientPermissions),
    }
}
