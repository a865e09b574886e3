//! HTTP handlers for the Production Operations Tracking Platform

mod batch;
mod health;
mod lot;
mod processed;
mod supplier;

pub use batch::*;
pub use health::*;
pub use lot::*;
pub use processed::*;
pub use supplier::*;
