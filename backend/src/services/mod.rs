//! Business logic services for the Distribution Management Platform

pub mod auth;
pub mod dashboard;
pub mod distributors;
pub mod inventory;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod referrers;
pub mod supermarkets;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use distributors::DistributorService;
pub use inventory::InventoryService;
pub use orders::OrderService;
pub use pricing::PricingService;
pub use products::ProductService;
pub use referrers::ReferrerService;
pub use supermarkets::SupermarketService;
