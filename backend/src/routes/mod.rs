//! Route definitions for the Distribution Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - distributor management
        .nest("/distributors", distributor_routes())
        // Protected routes - referrer management
        .nest("/referrers", referrer_routes())
        // Protected routes - supermarkets and pricing
        .nest("/supermarkets", supermarket_routes())
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - orders
        .nest("/orders", order_routes())
        // Protected routes - dashboards and reports
        .nest("/dashboard", dashboard_routes())
        .nest("/reports", report_routes())
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(handlers::login))
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Distributor management routes (protected, admin-gated in handlers)
fn distributor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_distributors).post(handlers::create_distributor),
        )
        .route(
            "/:distributor_id",
            get(handlers::get_distributor).put(handlers::update_distributor),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Referrer management routes (protected, admin-gated in handlers)
fn referrer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_referrers).post(handlers::create_referrer),
        )
        .route("/:referrer_id", put(handlers::update_referrer))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supermarket and pricing routes (protected)
fn supermarket_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_supermarkets).post(handlers::create_supermarket),
        )
        .route(
            "/:supermarket_id",
            put(handlers::update_supermarket).delete(handlers::delete_supermarket),
        )
        .route(
            "/:supermarket_id/pricing",
            get(handlers::list_pricing).put(handlers::upsert_pricing),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory ledger routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/mine", get(handlers::my_inventory))
        .route("/global", get(handlers::global_inventory))
        .route(
            "/events",
            get(handlers::list_events).post(handlers::append_event),
        )
        .route("/deliveries", post(handlers::record_delivery))
        .route("/stock", put(handlers::set_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Dashboard routes (protected, role-dispatched)
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dashboard))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Report export routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/orders.csv", get(handlers::orders_csv))
        .route_layer(middleware::from_fn(auth_middleware))
}
