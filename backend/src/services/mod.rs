//! Business logic services for the Production Operations Tracking Platform

pub mod batch;
pub mod lot;
pub mod processed;
pub mod supplier;

pub use batch::BatchService;
pub use lot::LotService;
pub use processed::ProcessedGoodService;
pub use supplier::SupplierService;
