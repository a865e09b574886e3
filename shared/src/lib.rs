//! Shared types and models for the Production Operations Tracking Platform
//!
//! This crate contains domain entities and validation helpers shared between
//! the backend and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
