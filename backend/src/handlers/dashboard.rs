//! HTTP handlers for the role-specific dashboards and reports

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::require_admin;
use crate::middleware::CurrentUser;
use crate::services::dashboard::{
    AdminDashboard, DashboardService, DistributorDashboard, ReferrerDashboard,
};
use crate::services::{DistributorService, ReferrerService};
use crate::AppState;
use shared::models::Role;
use shared::types::DateRange;

/// Optional ISO dates; a missing or malformed bound falls back to its side
/// of the current calendar month.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    fn resolve(&self) -> DateRange {
        DateRange::resolve(self.from.as_deref(), self.to.as_deref(), Utc::now())
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum DashboardResponse {
    Admin(AdminDashboard),
    Distributor(DistributorDashboard),
    Referrer(ReferrerDashboard),
}

/// Role-dispatched dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(range): Query<RangeQuery>,
) -> AppResult<Json<DashboardResponse>> {
    let range = range.resolve();
    let service = DashboardService::new(state.db.clone(), &state.config);

    let response = match current_user.0.role {
        Role::Admin => DashboardResponse::Admin(service.admin_dashboard(range).await?),
        Role::Distributor => {
            let distributors = DistributorService::new(state.db.clone());
            let own = distributors.get_by_user(current_user.0.user_id).await?;
            DashboardResponse::Distributor(service.distributor_dashboard(own.id, range).await?)
        }
        Role::Referrer => {
            let referrers = ReferrerService::new(state.db.clone());
            let own = referrers.get_by_user(current_user.0.user_id).await?;
            DashboardResponse::Referrer(
                service
                    .referrer_dashboard(own.id, own.commission_percentage, range)
                    .await?,
            )
        }
    };

    Ok(Json(response))
}

/// Orders report as CSV (admin only)
pub async fn orders_csv(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(range): Query<RangeQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current_user)?;
    let service = DashboardService::new(state.db.clone(), &state.config);
    let csv = service.orders_csv(range.resolve()).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"orders.csv\"",
            ),
        ],
        csv,
    ))
}
