//! In-memory storage fake
//!
//! Implements the same conditional-update contract as [`super::PgStore`]
//! under a single mutex, so every check-and-write pair is atomic with respect
//! to concurrent callers. Used by the test suite and for local runs without
//! a database. Failure injection on the decrement path exercises the
//! compensation logic that a live database would hit on connection loss.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{
    BatchDeleteOutcome, BatchStore, DecrementOutcome, LotMetadataPatch, LotStore, NewBatch,
    NewConsumption, NewLot, NewProcessedGood, NewSupplier, ProcessedGoodStore, SupplierPatch,
    SupplierStore,
};
use crate::error::{AppError, AppResult};
use shared::{
    format_batch_ref, ConsumptionRecord, Lot, LotKind, ProcessedGood, ProductionBatch, QaStatus,
    Supplier,
};

#[derive(Default)]
struct Inner {
    suppliers: HashMap<Uuid, Supplier>,
    lots: HashMap<Uuid, Lot>,
    batches: HashMap<Uuid, ProductionBatch>,
    consumptions: Vec<ConsumptionRecord>,
    goods: HashMap<Uuid, ProcessedGood>,
    batch_seq: i64,
    decrements_until_failure: Option<usize>,
}

/// In-memory implementation of the storage contract
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allow `n` further successful decrements, then fail every decrement
    /// with a storage error. Lets tests drive the commit saga into its
    /// unwind path at a chosen step.
    pub fn fail_decrements_after(&self, n: usize) {
        self.inner().decrements_until_failure = Some(n);
    }

    /// Clear any injected decrement failure
    pub fn clear_failures(&self) {
        self.inner().decrements_until_failure = None;
    }
}

#[async_trait]
impl SupplierStore for MemoryStore {
    async fn insert_supplier(&self, supplier: NewSupplier) -> AppResult<Supplier> {
        let now = Utc::now();
        let record = Supplier {
            id: Uuid::new_v4(),
            name: supplier.name,
            contact: supplier.contact,
            notes: supplier.notes,
            created_at: now,
            updated_at: now,
        };
        self.inner().suppliers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>> {
        Ok(self.inner().suppliers.get(&id).cloned())
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let mut suppliers: Vec<Supplier> = self.inner().suppliers.values().cloned().collect();
        suppliers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(suppliers)
    }

    async fn update_supplier(
        &self,
        id: Uuid,
        patch: SupplierPatch,
    ) -> AppResult<Option<Supplier>> {
        let mut inner = self.inner();
        let Some(supplier) = inner.suppliers.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            supplier.name = name;
        }
        if let Some(contact) = patch.contact {
            supplier.contact = Some(contact);
        }
        if let Some(notes) = patch.notes {
            supplier.notes = Some(notes);
        }
        supplier.updated_at = Utc::now();
        Ok(Some(supplier.clone()))
    }

    async fn delete_supplier(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.inner().suppliers.remove(&id).is_some())
    }

    async fn supplier_in_use(&self, id: Uuid) -> AppResult<bool> {
        Ok(self
            .inner()
            .lots
            .values()
            .any(|lot| lot.supplier_id == Some(id)))
    }
}

#[async_trait]
impl LotStore for MemoryStore {
    async fn insert_lot(&self, lot: NewLot) -> AppResult<Lot> {
        let now = Utc::now();
        let record = Lot {
            id: Uuid::new_v4(),
            kind: lot.kind,
            name: lot.name,
            supplier_id: lot.supplier_id,
            quantity_received: lot.quantity_received,
            quantity_available: lot.quantity_received,
            unit: lot.unit,
            received_date: lot.received_date,
            storage_notes: lot.storage_notes,
            created_at: now,
            updated_at: now,
        };
        self.inner().lots.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_lot(&self, id: Uuid) -> AppResult<Option<Lot>> {
        Ok(self.inner().lots.get(&id).cloned())
    }

    async fn list_lots(&self, kind: Option<LotKind>) -> AppResult<Vec<Lot>> {
        let mut lots: Vec<Lot> = self
            .inner()
            .lots
            .values()
            .filter(|lot| kind.map_or(true, |k| lot.kind == k))
            .cloned()
            .collect();
        lots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lots)
    }

    async fn update_lot_metadata(
        &self,
        id: Uuid,
        patch: LotMetadataPatch,
    ) -> AppResult<Option<Lot>> {
        let mut inner = self.inner();
        let Some(lot) = inner.lots.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            lot.name = name;
        }
        if let Some(supplier_id) = patch.supplier_id {
            lot.supplier_id = supplier_id;
        }
        if let Some(notes) = patch.storage_notes {
            lot.storage_notes = Some(notes);
        }
        lot.updated_at = Utc::now();
        Ok(Some(lot.clone()))
    }

    async fn delete_lot(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.inner().lots.remove(&id).is_some())
    }

    async fn decrement_lot(
        &self,
        id: Uuid,
        amount: Decimal,
        expected_available: Decimal,
    ) -> AppResult<DecrementOutcome> {
        let mut inner = self.inner();

        if let Some(remaining) = inner.decrements_until_failure {
            if remaining == 0 {
                return Err(AppError::Internal("injected storage failure".to_string()));
            }
            inner.decrements_until_failure = Some(remaining - 1);
        }

        let Some(lot) = inner.lots.get_mut(&id) else {
            return Ok(DecrementOutcome::Missing);
        };
        if lot.quantity_available != expected_available || amount > lot.quantity_available {
            return Ok(DecrementOutcome::Conflict);
        }
        lot.quantity_available -= amount;
        lot.updated_at = Utc::now();
        Ok(DecrementOutcome::Applied)
    }

    async fn restore_lot(&self, id: Uuid, amount: Decimal) -> AppResult<()> {
        let mut inner = self.inner();
        let Some(lot) = inner.lots.get_mut(&id) else {
            return Err(AppError::NotFound("Lot".to_string()));
        };
        lot.quantity_available += amount;
        lot.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn insert_batch(&self, batch: NewBatch) -> AppResult<ProductionBatch> {
        let mut inner = self.inner();
        inner.batch_seq += 1;
        let now = Utc::now();
        let record = ProductionBatch {
            id: Uuid::new_v4(),
            batch_ref: format_batch_ref(now.year(), inner.batch_seq),
            batch_date: batch.batch_date,
            responsible_party: batch.responsible_party,
            product_type: batch.product_type,
            output_quantity: batch.output_quantity,
            unit: batch.unit,
            qa_status: QaStatus::Pending,
            locked: false,
            notes: batch.notes,
            created_at: now,
            updated_at: now,
        };
        inner.batches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<Option<ProductionBatch>> {
        Ok(self.inner().batches.get(&id).cloned())
    }

    async fn list_batches(&self) -> AppResult<Vec<ProductionBatch>> {
        let mut batches: Vec<ProductionBatch> = self.inner().batches.values().cloned().collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(batches)
    }

    async fn transition_unlocked(
        &self,
        id: Uuid,
        status: QaStatus,
        lock: bool,
    ) -> AppResult<Option<ProductionBatch>> {
        let mut inner = self.inner();
        let Some(batch) = inner.batches.get_mut(&id) else {
            return Ok(None);
        };
        if batch.locked {
            return Ok(None);
        }
        batch.qa_status = status;
        batch.locked = lock;
        batch.updated_at = Utc::now();
        Ok(Some(batch.clone()))
    }

    async fn revert_batch(&self, id: Uuid, status: QaStatus) -> AppResult<()> {
        let mut inner = self.inner();
        let Some(batch) = inner.batches.get_mut(&id) else {
            return Err(AppError::NotFound("Batch".to_string()));
        };
        batch.qa_status = status;
        batch.locked = false;
        batch.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_batch_if_unlocked(&self, id: Uuid) -> AppResult<BatchDeleteOutcome> {
        let mut inner = self.inner();
        match inner.batches.get(&id) {
            None => Ok(BatchDeleteOutcome::Missing),
            Some(batch) if batch.locked => Ok(BatchDeleteOutcome::Locked),
            Some(_) => {
                inner.batches.remove(&id);
                inner.consumptions.retain(|c| c.batch_id != id);
                Ok(BatchDeleteOutcome::Deleted)
            }
        }
    }

    async fn force_delete_batch(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner();
        inner.batches.remove(&id);
        inner.consumptions.retain(|c| c.batch_id != id);
        Ok(())
    }

    async fn insert_consumption(&self, record: NewConsumption) -> AppResult<ConsumptionRecord> {
        let consumption = ConsumptionRecord {
            id: Uuid::new_v4(),
            batch_id: record.batch_id,
            lot_id: record.lot_id,
            lot_kind: record.lot_kind,
            lot_name: record.lot_name,
            quantity_consumed: record.quantity_consumed,
            unit: record.unit,
            created_at: Utc::now(),
        };
        self.inner().consumptions.push(consumption.clone());
        Ok(consumption)
    }

    async fn list_consumptions(&self, batch_id: Uuid) -> AppResult<Vec<ConsumptionRecord>> {
        Ok(self
            .inner()
            .consumptions
            .iter()
            .filter(|c| c.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn delete_consumptions(&self, batch_id: Uuid) -> AppResult<()> {
        self.inner().consumptions.retain(|c| c.batch_id != batch_id);
        Ok(())
    }
}

#[async_trait]
impl ProcessedGoodStore for MemoryStore {
    async fn insert_processed_good(&self, good: NewProcessedGood) -> AppResult<ProcessedGood> {
        let now = Utc::now();
        let record = ProcessedGood {
            id: Uuid::new_v4(),
            batch_id: good.batch_id,
            product_type: good.product_type,
            quantity_available: good.quantity_available,
            unit: good.unit,
            production_date: good.production_date,
            qa_status: good.qa_status,
            created_at: now,
            updated_at: now,
        };
        self.inner().goods.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_processed_good(&self, id: Uuid) -> AppResult<Option<ProcessedGood>> {
        Ok(self.inner().goods.get(&id).cloned())
    }

    async fn list_processed_goods(&self) -> AppResult<Vec<ProcessedGood>> {
        let mut goods: Vec<ProcessedGood> = self.inner().goods.values().cloned().collect();
        goods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(goods)
    }
}
