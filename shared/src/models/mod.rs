//! Domain models for the Production Operations Tracking Platform

mod batch;
mod lot;
mod processed;
mod supplier;

pub use batch::*;
pub use lot::*;
pub use processed::*;
pub use supplier::*;
