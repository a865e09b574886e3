//! Storage layer for the Production Operations Tracking Platform
//!
//! The batch workflow and registries sit behind the [`Store`] trait so the
//! backing technology is swappable: [`PgStore`] runs against PostgreSQL,
//! [`MemoryStore`] implements the same conditional-update contract in memory
//! for tests and local development.
//!
//! Conditional operations (`decrement_lot`, `transition_unlocked`,
//! `delete_batch_if_unlocked`) perform their check and write as one atomic
//! step; callers combine them into compensated multi-step workflows.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{
    ConsumptionRecord, Lot, LotKind, ProcessedGood, ProductionBatch, QaStatus, Supplier,
};

/// Input for creating a supplier
#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub notes: Option<String>,
}

/// Patch for updating a supplier
#[derive(Debug, Clone, Default)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub notes: Option<String>,
}

/// Input for creating a lot; `quantity_available` starts at
/// `quantity_received`
#[derive(Debug, Clone)]
pub struct NewLot {
    pub kind: LotKind,
    pub name: String,
    pub supplier_id: Option<Uuid>,
    pub quantity_received: Decimal,
    pub unit: String,
    pub received_date: NaiveDate,
    pub storage_notes: Option<String>,
}

/// Metadata-only patch for a lot; quantities are deliberately absent — the
/// only mutation path for `quantity_available` is the batch commit
#[derive(Debug, Clone, Default)]
pub struct LotMetadataPatch {
    pub name: Option<String>,
    pub supplier_id: Option<Option<Uuid>>,
    pub storage_notes: Option<String>,
}

/// Outcome of a conditional lot decrement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The expected availability matched and the decrement was applied
    Applied,
    /// Another writer changed the lot since it was read
    Conflict,
    /// The lot no longer exists
    Missing,
}

/// Input for creating a production batch (always pending and unlocked; the
/// store assigns the id and a unique batch reference)
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub batch_date: NaiveDate,
    pub responsible_party: String,
    pub product_type: String,
    pub output_quantity: Decimal,
    pub unit: String,
    pub notes: Option<String>,
}

/// Outcome of a conditional batch deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchDeleteOutcome {
    Deleted,
    Locked,
    Missing,
}

/// Input for creating a consumption record
#[derive(Debug, Clone)]
pub struct NewConsumption {
    pub batch_id: Uuid,
    pub lot_id: Uuid,
    pub lot_kind: LotKind,
    pub lot_name: String,
    pub quantity_consumed: Decimal,
    pub unit: String,
}

/// Input for creating a processed good
#[derive(Debug, Clone)]
pub struct NewProcessedGood {
    pub batch_id: Uuid,
    pub product_type: String,
    pub quantity_available: Decimal,
    pub unit: String,
    pub production_date: NaiveDate,
    pub qa_status: QaStatus,
}

/// Supplier registry operations
#[async_trait]
pub trait SupplierStore {
    async fn insert_supplier(&self, supplier: NewSupplier) -> AppResult<Supplier>;
    async fn get_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>>;
    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>>;
    async fn update_supplier(&self, id: Uuid, patch: SupplierPatch)
        -> AppResult<Option<Supplier>>;
    async fn delete_supplier(&self, id: Uuid) -> AppResult<bool>;
    /// Whether any lot still references this supplier
    async fn supplier_in_use(&self, id: Uuid) -> AppResult<bool>;
}

/// Lot registry and conditional inventory operations
#[async_trait]
pub trait LotStore {
    async fn insert_lot(&self, lot: NewLot) -> AppResult<Lot>;
    async fn get_lot(&self, id: Uuid) -> AppResult<Option<Lot>>;
    async fn list_lots(&self, kind: Option<LotKind>) -> AppResult<Vec<Lot>>;
    async fn update_lot_metadata(
        &self,
        id: Uuid,
        patch: LotMetadataPatch,
    ) -> AppResult<Option<Lot>>;
    async fn delete_lot(&self, id: Uuid) -> AppResult<bool>;

    /// Atomically subtract `amount` from the lot's available quantity,
    /// conditional on the availability still being `expected_available`
    async fn decrement_lot(
        &self,
        id: Uuid,
        amount: Decimal,
        expected_available: Decimal,
    ) -> AppResult<DecrementOutcome>;

    /// Add `amount` back to the lot's available quantity. Compensation-only:
    /// used to undo a decrement when a later step of the same unit of work
    /// failed.
    async fn restore_lot(&self, id: Uuid, amount: Decimal) -> AppResult<()>;
}

/// Production batch and consumption record operations
#[async_trait]
pub trait BatchStore {
    async fn insert_batch(&self, batch: NewBatch) -> AppResult<ProductionBatch>;
    async fn get_batch(&self, id: Uuid) -> AppResult<Option<ProductionBatch>>;
    async fn list_batches(&self) -> AppResult<Vec<ProductionBatch>>;

    /// Conditionally set QA status (and optionally the lock flag) only while
    /// the batch is unlocked. Returns the updated batch, or `None` if the
    /// batch was locked by a concurrent writer.
    async fn transition_unlocked(
        &self,
        id: Uuid,
        status: QaStatus,
        lock: bool,
    ) -> AppResult<Option<ProductionBatch>>;

    /// Compensation-only: put a batch back to `status`, unlocked, after a
    /// later step of the approval failed
    async fn revert_batch(&self, id: Uuid, status: QaStatus) -> AppResult<()>;

    async fn delete_batch_if_unlocked(&self, id: Uuid) -> AppResult<BatchDeleteOutcome>;

    /// Unconditional delete, used only while unwinding a failed commit
    async fn force_delete_batch(&self, id: Uuid) -> AppResult<()>;

    async fn insert_consumption(&self, record: NewConsumption) -> AppResult<ConsumptionRecord>;
    async fn list_consumptions(&self, batch_id: Uuid) -> AppResult<Vec<ConsumptionRecord>>;
    async fn delete_consumptions(&self, batch_id: Uuid) -> AppResult<()>;
}

/// Finished-goods inventory operations
#[async_trait]
pub trait ProcessedGoodStore {
    async fn insert_processed_good(&self, good: NewProcessedGood) -> AppResult<ProcessedGood>;
    async fn get_processed_good(&self, id: Uuid) -> AppResult<Option<ProcessedGood>>;
    async fn list_processed_goods(&self) -> AppResult<Vec<ProcessedGood>>;
}

/// Combined storage contract consumed by the services
pub trait Store:
    SupplierStore + LotStore + BatchStore + ProcessedGoodStore + Send + Sync
{
}

impl<T> Store for T where
    T: SupplierStore + LotStore + BatchStore + ProcessedGoodStore + Send + Sync
{
}
