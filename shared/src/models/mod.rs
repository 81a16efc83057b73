//! Domain types shared between the storage layer and the pure engines

pub mod costing;
pub mod inventory;
pub mod order;
pub mod party;
pub mod pricing;
pub mod user;

pub use costing::*;
pub use inventory::*;
pub use order::*;
pub use party::*;
pub use pricing::*;
pub use user::*;
