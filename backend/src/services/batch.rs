//! Production batch workflow service
//!
//! Implements the inventory-consuming batch commit and the QA approval
//! transition. Both run as compensated units of work over the storage
//! contract's conditional updates: every decrement is a check-and-set
//! against the availability read earlier in the same operation, and any
//! failure mid-sequence unwinds the writes already applied so no partial
//! state is ever visible.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{
    BatchDeleteOutcome, DecrementOutcome, NewBatch, NewConsumption, NewProcessedGood, Store,
};
use shared::{
    validate_positive_quantity, validate_required_text, validate_unique_lot_ids,
    BatchWithConsumptions, Lot, LotKind, ProcessedGood, ProductionBatch, QaStatus,
};

/// Batch service for the production workflow
#[derive(Clone)]
pub struct BatchService {
    store: Arc<dyn Store>,
}

/// One consumption line of a commit request
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumptionLine {
    pub lot_id: Uuid,
    pub quantity: Decimal,
}

/// Input for committing a production batch
#[derive(Debug, Deserialize)]
pub struct CommitBatchInput {
    pub batch_date: NaiveDate,
    pub responsible_party: String,
    pub product_type: String,
    pub output_quantity: Decimal,
    pub unit: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub raw_materials: Vec<ConsumptionLine>,
    #[serde(default)]
    pub recurring_products: Vec<ConsumptionLine>,
}

/// A validated consumption line with the lot snapshot it was checked against
struct ConsumptionPlan {
    lot: Lot,
    quantity: Decimal,
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Commit a production batch: validate every consumption line against
    /// current availability, then create the batch row, decrement each lot
    /// and record each consumption. Fully succeeds or leaves no trace.
    pub async fn commit_batch(&self, input: CommitBatchInput) -> AppResult<BatchWithConsumptions> {
        self.validate_commit_input(&input)?;

        // Read each referenced lot and check sufficiency before any write.
        // The snapshots feed the conditional decrements below, so a lot that
        // changes between here and its decrement surfaces as a conflict
        // rather than a silent lost update.
        let mut plans = Vec::with_capacity(input.raw_materials.len() + input.recurring_products.len());
        for (kind, lines) in [
            (LotKind::RawMaterial, &input.raw_materials),
            (LotKind::RecurringProduct, &input.recurring_products),
        ] {
            for line in lines {
                let lot = self
                    .store
                    .get_lot(line.lot_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Lot {}", line.lot_id)))?;

                if lot.kind != kind {
                    return Err(AppError::Validation {
                        field: "lot_id".to_string(),
                        message: format!(
                            "Lot {} is a {} lot and cannot be consumed as {}",
                            lot.id, lot.kind, kind
                        ),
                    });
                }

                if line.quantity > lot.quantity_available {
                    return Err(AppError::InsufficientInventory {
                        lot_id: lot.id,
                        requested: line.quantity,
                        available: lot.quantity_available,
                    });
                }

                plans.push(ConsumptionPlan {
                    lot,
                    quantity: line.quantity,
                });
            }
        }

        let batch = self
            .store
            .insert_batch(NewBatch {
                batch_date: input.batch_date,
                responsible_party: input.responsible_party,
                product_type: input.product_type,
                output_quantity: input.output_quantity,
                unit: input.unit,
                notes: input.notes,
            })
            .await?;

        let mut applied: Vec<(Uuid, Decimal)> = Vec::new();
        if let Err(err) = self.apply_consumptions(batch.id, &plans, &mut applied).await {
            self.unwind_commit(batch.id, &applied).await;
            return Err(err);
        }

        let consumptions = self.store.list_consumptions(batch.id).await?;
        Ok(BatchWithConsumptions {
            batch,
            consumptions,
        })
    }

    /// Approve a pending (or previously rejected / held) batch: lock it and
    /// materialize exactly one processed good. Approval of an already-locked
    /// batch fails with `AlreadyLocked` and writes nothing.
    pub async fn approve(&self, batch_id: Uuid) -> AppResult<ProductionBatch> {
        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        if batch.locked {
            return Err(AppError::AlreadyLocked);
        }
        let prior_status = batch.qa_status;

        // Conditional on locked = false; a concurrent approve that won the
        // race leaves this returning None
        let approved = self
            .store
            .transition_unlocked(batch_id, QaStatus::Approved, true)
            .await?
            .ok_or(AppError::AlreadyLocked)?;

        match self
            .store
            .insert_processed_good(NewProcessedGood {
                batch_id: approved.id,
                product_type: approved.product_type.clone(),
                quantity_available: approved.output_quantity,
                unit: approved.unit.clone(),
                production_date: approved.batch_date,
                qa_status: approved.qa_status,
            })
            .await
        {
            Ok(_) => Ok(approved),
            Err(err) => {
                // Neither write may be visible alone: put the batch back to
                // its prior unlocked state before reporting the failure
                if let Err(revert_err) = self.store.revert_batch(batch_id, prior_status).await {
                    tracing::error!(
                        "Failed to revert batch {} after approval failure: {}",
                        batch_id,
                        revert_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Reject an unlocked batch. No side effects; a rejected batch may later
    /// be re-approved.
    pub async fn reject(&self, batch_id: Uuid) -> AppResult<ProductionBatch> {
        self.transition(batch_id, QaStatus::Rejected).await
    }

    /// Put an unlocked batch on hold
    pub async fn hold(&self, batch_id: Uuid) -> AppResult<ProductionBatch> {
        self.transition(batch_id, QaStatus::Hold).await
    }

    /// Delete a batch and its consumption records; refused once locked.
    /// Consumed lot quantities are not restored — consumption is the only
    /// mutation path for lot availability.
    pub async fn delete_batch(&self, batch_id: Uuid) -> AppResult<()> {
        match self.store.delete_batch_if_unlocked(batch_id).await? {
            BatchDeleteOutcome::Deleted => Ok(()),
            BatchDeleteOutcome::Locked => Err(AppError::BatchLocked),
            BatchDeleteOutcome::Missing => Err(AppError::NotFound("Batch".to_string())),
        }
    }

    /// Get a batch with its consumption records
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<BatchWithConsumptions> {
        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;
        let consumptions = self.store.list_consumptions(batch_id).await?;

        Ok(BatchWithConsumptions {
            batch,
            consumptions,
        })
    }

    /// List all batches
    pub async fn list_batches(&self) -> AppResult<Vec<ProductionBatch>> {
        self.store.list_batches().await
    }

    fn validate_commit_input(&self, input: &CommitBatchInput) -> AppResult<()> {
        if validate_required_text(&input.product_type).is_err() {
            return Err(AppError::Validation {
                field: "product_type".to_string(),
                message: "Product type cannot be empty".to_string(),
            });
        }
        if validate_required_text(&input.unit).is_err() {
            return Err(AppError::Validation {
                field: "unit".to_string(),
                message: "Unit cannot be empty".to_string(),
            });
        }
        if validate_required_text(&input.responsible_party).is_err() {
            return Err(AppError::Validation {
                field: "responsible_party".to_string(),
                message: "Responsible party cannot be empty".to_string(),
            });
        }
        if validate_positive_quantity(input.output_quantity).is_err() {
            return Err(AppError::Validation {
                field: "output_quantity".to_string(),
                message: "Output quantity must be positive".to_string(),
            });
        }

        for (field, lines) in [
            ("raw_materials", &input.raw_materials),
            ("recurring_products", &input.recurring_products),
        ] {
            for line in lines.iter() {
                if validate_positive_quantity(line.quantity).is_err() {
                    return Err(AppError::Validation {
                        field: field.to_string(),
                        message: format!(
                            "Consumed quantity for lot {} must be positive",
                            line.lot_id
                        ),
                    });
                }
            }

            let ids: Vec<Uuid> = lines.iter().map(|l| l.lot_id).collect();
            if validate_unique_lot_ids(&ids).is_err() {
                return Err(AppError::Validation {
                    field: field.to_string(),
                    message: "Duplicate lot reference in consumption list".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Decrement every planned lot and record its consumption, tracking the
    /// decrements that landed so the caller can unwind on failure
    async fn apply_consumptions(
        &self,
        batch_id: Uuid,
        plans: &[ConsumptionPlan],
        applied: &mut Vec<(Uuid, Decimal)>,
    ) -> AppResult<()> {
        for plan in plans {
            match self
                .store
                .decrement_lot(plan.lot.id, plan.quantity, plan.lot.quantity_available)
                .await?
            {
                DecrementOutcome::Applied => applied.push((plan.lot.id, plan.quantity)),
                DecrementOutcome::Conflict => return Err(AppError::ConcurrentModification),
                DecrementOutcome::Missing => {
                    return Err(AppError::NotFound(format!("Lot {}", plan.lot.id)))
                }
            }

            self.store
                .insert_consumption(NewConsumption {
                    batch_id,
                    lot_id: plan.lot.id,
                    lot_kind: plan.lot.kind,
                    lot_name: plan.lot.name.clone(),
                    quantity_consumed: plan.quantity,
                    unit: plan.lot.unit.clone(),
                })
                .await?;
        }

        Ok(())
    }

    /// Undo a partially-applied commit: restore every decrement that landed,
    /// then remove the consumption records and the batch row. Compensation
    /// failures are logged and do not mask the original error.
    async fn unwind_commit(&self, batch_id: Uuid, applied: &[(Uuid, Decimal)]) {
        for (lot_id, amount) in applied.iter().rev() {
            if let Err(err) = self.store.restore_lot(*lot_id, *amount).await {
                tracing::error!(
                    "Failed to restore {} to lot {} while unwinding batch {}: {}",
                    amount,
                    lot_id,
                    batch_id,
                    err
                );
            }
        }

        if let Err(err) = self.store.delete_consumptions(batch_id).await {
            tracing::error!(
                "Failed to delete consumption records while unwinding batch {}: {}",
                batch_id,
                err
            );
        }
        if let Err(err) = self.store.force_delete_batch(batch_id).await {
            tracing::error!("Failed to delete batch {} while unwinding: {}", batch_id, err);
        }
    }

    async fn transition(&self, batch_id: Uuid, status: QaStatus) -> AppResult<ProductionBatch> {
        let batch = self
            .store
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        if batch.locked {
            return Err(AppError::AlreadyLocked);
        }

        self.store
            .transition_unlocked(batch_id, status, false)
            .await?
            .ok_or(AppError::AlreadyLocked)
    }
}
