//! Shared types and domain logic for the Distribution Management Platform
//!
//! This crate contains the entity models, common types, validation helpers,
//! and the pure computation engines (inventory ledger fold and financial
//! aggregation) used by the backend. Nothing in here performs I/O.

pub mod finance;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
