//! PostgreSQL storage implementation
//!
//! Conditional updates are single guarded statements so the check and the
//! write cannot be split by a concurrent writer.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
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

/// PostgreSQL-backed implementation of the storage contract
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn parse_kind(s: &str) -> AppResult<LotKind> {
    LotKind::from_str(s)
        .ok_or_else(|| AppError::Internal(format!("unknown lot kind '{}' in database", s)))
}

fn parse_status(s: &str) -> AppResult<QaStatus> {
    QaStatus::from_str(s)
        .ok_or_else(|| AppError::Internal(format!("unknown qa status '{}' in database", s)))
}

/// Database row for a supplier
#[derive(Debug, FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    contact: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            contact: row.contact,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a lot
#[derive(Debug, FromRow)]
struct LotRow {
    id: Uuid,
    kind: String,
    name: String,
    supplier_id: Option<Uuid>,
    quantity_received: Decimal,
    quantity_available: Decimal,
    unit: String,
    received_date: NaiveDate,
    storage_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LotRow> for Lot {
    type Error = AppError;

    fn try_from(row: LotRow) -> AppResult<Self> {
        Ok(Lot {
            id: row.id,
            kind: parse_kind(&row.kind)?,
            name: row.name,
            supplier_id: row.supplier_id,
            quantity_received: row.quantity_received,
            quantity_available: row.quantity_available,
            unit: row.unit,
            received_date: row.received_date,
            storage_notes: row.storage_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for a production batch
#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    batch_ref: String,
    batch_date: NaiveDate,
    responsible_party: String,
    product_type: String,
    output_quantity: Decimal,
    unit: String,
    qa_status: String,
    locked: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for ProductionBatch {
    type Error = AppError;

    fn try_from(row: BatchRow) -> AppResult<Self> {
        Ok(ProductionBatch {
            id: row.id,
            batch_ref: row.batch_ref,
            batch_date: row.batch_date,
            responsible_party: row.responsible_party,
            product_type: row.product_type,
            output_quantity: row.output_quantity,
            unit: row.unit,
            qa_status: parse_status(&row.qa_status)?,
            locked: row.locked,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for a consumption record
#[derive(Debug, FromRow)]
struct ConsumptionRow {
    id: Uuid,
    batch_id: Uuid,
    lot_id: Uuid,
    lot_kind: String,
    lot_name: String,
    quantity_consumed: Decimal,
    unit: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ConsumptionRow> for ConsumptionRecord {
    type Error = AppError;

    fn try_from(row: ConsumptionRow) -> AppResult<Self> {
        Ok(ConsumptionRecord {
            id: row.id,
            batch_id: row.batch_id,
            lot_id: row.lot_id,
            lot_kind: parse_kind(&row.lot_kind)?,
            lot_name: row.lot_name,
            quantity_consumed: row.quantity_consumed,
            unit: row.unit,
            created_at: row.created_at,
        })
    }
}

/// Database row for a processed good
#[derive(Debug, FromRow)]
struct ProcessedGoodRow {
    id: Uuid,
    batch_id: Uuid,
    product_type: String,
    quantity_available: Decimal,
    unit: String,
    production_date: NaiveDate,
    qa_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProcessedGoodRow> for ProcessedGood {
    type Error = AppError;

    fn try_from(row: ProcessedGoodRow) -> AppResult<Self> {
        Ok(ProcessedGood {
            id: row.id,
            batch_id: row.batch_id,
            product_type: row.product_type,
            quantity_available: row.quantity_available,
            unit: row.unit,
            production_date: row.production_date,
            qa_status: parse_status(&row.qa_status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SUPPLIER_COLUMNS: &str = "id, name, contact, notes, created_at, updated_at";
const LOT_COLUMNS: &str = "id, kind, name, supplier_id, quantity_received, quantity_available, \
                           unit, received_date, storage_notes, created_at, updated_at";
const BATCH_COLUMNS: &str = "id, batch_ref, batch_date, responsible_party, product_type, \
                             output_quantity, unit, qa_status, locked, notes, created_at, updated_at";
const CONSUMPTION_COLUMNS: &str =
    "id, batch_id, lot_id, lot_kind, lot_name, quantity_consumed, unit, created_at";
const GOOD_COLUMNS: &str = "id, batch_id, product_type, quantity_available, unit, \
                            production_date, qa_status, created_at, updated_at";

#[async_trait]
impl SupplierStore for PgStore {
    async fn insert_supplier(&self, supplier: NewSupplier) -> AppResult<Supplier> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "INSERT INTO suppliers (name, contact, notes) VALUES ($1, $2, $3) RETURNING {}",
            SUPPLIER_COLUMNS
        ))
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn get_supplier(&self, id: Uuid) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1",
            SUPPLIER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {} FROM suppliers ORDER BY created_at DESC",
            SUPPLIER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_supplier(
        &self,
        id: Uuid,
        patch: SupplierPatch,
    ) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            r#"
            UPDATE suppliers
            SET name = COALESCE($1, name),
                contact = COALESCE($2, contact),
                notes = COALESCE($3, notes)
            WHERE id = $4
            RETURNING {}
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(&patch.name)
        .bind(&patch.contact)
        .bind(&patch.notes)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete_supplier(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn supplier_in_use(&self, id: Uuid) -> AppResult<bool> {
        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM lots WHERE supplier_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(in_use)
    }
}

#[async_trait]
impl LotStore for PgStore {
    async fn insert_lot(&self, lot: NewLot) -> AppResult<Lot> {
        // quantity_available starts equal to quantity_received
        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            INSERT INTO lots (kind, name, supplier_id, quantity_received, quantity_available,
                              unit, received_date, storage_notes)
            VALUES ($1, $2, $3, $4, $4, $5, $6, $7)
            RETURNING {}
            "#,
            LOT_COLUMNS
        ))
        .bind(lot.kind.as_str())
        .bind(&lot.name)
        .bind(lot.supplier_id)
        .bind(lot.quantity_received)
        .bind(&lot.unit)
        .bind(lot.received_date)
        .bind(&lot.storage_notes)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn get_lot(&self, id: Uuid) -> AppResult<Option<Lot>> {
        let row = sqlx::query_as::<_, LotRow>(&format!(
            "SELECT {} FROM lots WHERE id = $1",
            LOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(TryFrom::try_from).transpose()
    }

    async fn list_lots(&self, kind: Option<LotKind>) -> AppResult<Vec<Lot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            SELECT {} FROM lots
            WHERE $1::varchar IS NULL OR kind = $1
            ORDER BY created_at DESC
            "#,
            LOT_COLUMNS
        ))
        .bind(kind.map(|k| k.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Lot::try_from).collect()
    }

    async fn update_lot_metadata(
        &self,
        id: Uuid,
        patch: LotMetadataPatch,
    ) -> AppResult<Option<Lot>> {
        // Two-level option for supplier_id: outer = whether to change,
        // inner = the new value (possibly NULL)
        let (set_supplier, supplier_id) = match patch.supplier_id {
            Some(value) => (true, value),
            None => (false, None),
        };

        let row = sqlx::query_as::<_, LotRow>(&format!(
            r#"
            UPDATE lots
            SET name = COALESCE($1, name),
                supplier_id = CASE WHEN $2 THEN $3 ELSE supplier_id END,
                storage_notes = COALESCE($4, storage_notes)
            WHERE id = $5
            RETURNING {}
            "#,
            LOT_COLUMNS
        ))
        .bind(&patch.name)
        .bind(set_supplier)
        .bind(supplier_id)
        .bind(&patch.storage_notes)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(TryFrom::try_from).transpose()
    }

    async fn delete_lot(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM lots WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn decrement_lot(
        &self,
        id: Uuid,
        amount: Decimal,
        expected_available: Decimal,
    ) -> AppResult<DecrementOutcome> {
        // Guarded single-statement CAS: the write only lands if availability
        // is still what the caller read
        let result = sqlx::query(
            r#"
            UPDATE lots
            SET quantity_available = quantity_available - $2
            WHERE id = $1 AND quantity_available = $3 AND quantity_available >= $2
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(expected_available)
        .execute(&self.db)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(DecrementOutcome::Applied);
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM lots WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        Ok(if exists {
            DecrementOutcome::Conflict
        } else {
            DecrementOutcome::Missing
        })
    }

    async fn restore_lot(&self, id: Uuid, amount: Decimal) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE lots SET quantity_available = quantity_available + $2 WHERE id = $1",
        )
        .bind(id)
        .bind(amount)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lot".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl BatchStore for PgStore {
    async fn insert_batch(&self, batch: NewBatch) -> AppResult<ProductionBatch> {
        let sequence = sqlx::query_scalar::<_, i64>("SELECT nextval('batch_ref_seq')")
            .fetch_one(&self.db)
            .await?;
        let batch_ref = format_batch_ref(Utc::now().year(), sequence);

        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            INSERT INTO production_batches (batch_ref, batch_date, responsible_party,
                                            product_type, output_quantity, unit, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(&batch_ref)
        .bind(batch.batch_date)
        .bind(&batch.responsible_party)
        .bind(&batch.product_type)
        .bind(batch.output_quantity)
        .bind(&batch.unit)
        .bind(&batch.notes)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn get_batch(&self, id: Uuid) -> AppResult<Option<ProductionBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM production_batches WHERE id = $1",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(TryFrom::try_from).transpose()
    }

    async fn list_batches(&self) -> AppResult<Vec<ProductionBatch>> {
        let rows = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM production_batches ORDER BY created_at DESC",
            BATCH_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductionBatch::try_from).collect()
    }

    async fn transition_unlocked(
        &self,
        id: Uuid,
        status: QaStatus,
        lock: bool,
    ) -> AppResult<Option<ProductionBatch>> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            r#"
            UPDATE production_batches
            SET qa_status = $2, locked = $3
            WHERE id = $1 AND locked = false
            RETURNING {}
            "#,
            BATCH_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(lock)
        .fetch_optional(&self.db)
        .await?;

        row.map(TryFrom::try_from).transpose()
    }

    async fn revert_batch(&self, id: Uuid, status: QaStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE production_batches SET qa_status = $2, locked = false WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Batch".to_string()));
        }

        Ok(())
    }

    async fn delete_batch_if_unlocked(&self, id: Uuid) -> AppResult<BatchDeleteOutcome> {
        let result = sqlx::query("DELETE FROM production_batches WHERE id = $1 AND locked = false")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(BatchDeleteOutcome::Deleted);
        }

        let locked = sqlx::query_scalar::<_, bool>(
            "SELECT locked FROM production_batches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(match locked {
            Some(_) => BatchDeleteOutcome::Locked,
            None => BatchDeleteOutcome::Missing,
        })
    }

    async fn force_delete_batch(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM production_batches WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn insert_consumption(&self, record: NewConsumption) -> AppResult<ConsumptionRecord> {
        let row = sqlx::query_as::<_, ConsumptionRow>(&format!(
            r#"
            INSERT INTO consumption_records (batch_id, lot_id, lot_kind, lot_name,
                                             quantity_consumed, unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            CONSUMPTION_COLUMNS
        ))
        .bind(record.batch_id)
        .bind(record.lot_id)
        .bind(record.lot_kind.as_str())
        .bind(&record.lot_name)
        .bind(record.quantity_consumed)
        .bind(&record.unit)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn list_consumptions(&self, batch_id: Uuid) -> AppResult<Vec<ConsumptionRecord>> {
        let rows = sqlx::query_as::<_, ConsumptionRow>(&format!(
            "SELECT {} FROM consumption_records WHERE batch_id = $1 ORDER BY created_at",
            CONSUMPTION_COLUMNS
        ))
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ConsumptionRecord::try_from).collect()
    }

    async fn delete_consumptions(&self, batch_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM consumption_records WHERE batch_id = $1")
            .bind(batch_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ProcessedGoodStore for PgStore {
    async fn insert_processed_good(&self, good: NewProcessedGood) -> AppResult<ProcessedGood> {
        let row = sqlx::query_as::<_, ProcessedGoodRow>(&format!(
            r#"
            INSERT INTO processed_goods (batch_id, product_type, quantity_available,
                                         unit, production_date, qa_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            GOOD_COLUMNS
        ))
        .bind(good.batch_id)
        .bind(&good.product_type)
        .bind(good.quantity_available)
        .bind(&good.unit)
        .bind(good.production_date)
        .bind(good.qa_status.as_str())
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn get_processed_good(&self, id: Uuid) -> AppResult<Option<ProcessedGood>> {
        let row = sqlx::query_as::<_, ProcessedGoodRow>(&format!(
            "SELECT {} FROM processed_goods WHERE id = $1",
            GOOD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(TryFrom::try_from).transpose()
    }

    async fn list_processed_goods(&self) -> AppResult<Vec<ProcessedGood>> {
        let rows = sqlx::query_as::<_, ProcessedGoodRow>(&format!(
            "SELECT {} FROM processed_goods ORDER BY created_at DESC",
            GOOD_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProcessedGood::try_from).collect()
    }
}
