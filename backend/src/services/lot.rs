//! Inventory lot service
//!
//! Lots are created with their full received quantity available. After
//! creation the only operation that touches `quantity_available` is the
//! batch commit in [`super::BatchService`]; updates here are metadata-only
//! so no second mutation path can race the commit's conditional decrements.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{LotMetadataPatch, NewLot, Store};
use shared::{validate_positive_quantity, validate_required_text, Lot, LotKind};

/// Lot service for the raw-material and recurring-product registries
#[derive(Clone)]
pub struct LotService {
    store: Arc<dyn Store>,
}

/// Input for registering a received lot
#[derive(Debug, Deserialize)]
pub struct CreateLotInput {
    pub kind: LotKind,
    pub name: String,
    pub supplier_id: Option<Uuid>,
    pub quantity_received: Decimal,
    pub unit: String,
    pub received_date: NaiveDate,
    pub storage_notes: Option<String>,
}

/// Input for updating lot metadata (quantities are not editable)
#[derive(Debug, Deserialize)]
pub struct UpdateLotInput {
    pub name: Option<String>,
    /// `Some(None)` clears the supplier reference
    #[serde(default, with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    pub storage_notes: Option<String>,
}

/// Deserializes an absent field to `None` and an explicit `null` to
/// `Some(None)`
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

impl LotService {
    /// Create a new LotService instance
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a received lot; `quantity_available` starts equal to
    /// `quantity_received`
    pub async fn create_lot(&self, input: CreateLotInput) -> AppResult<Lot> {
        if validate_required_text(&input.name).is_err() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Lot name cannot be empty".to_string(),
            });
        }
        if validate_required_text(&input.unit).is_err() {
            return Err(AppError::Validation {
                field: "unit".to_string(),
                message: "Unit cannot be empty".to_string(),
            });
        }
        if validate_positive_quantity(input.quantity_received).is_err() {
            return Err(AppError::Validation {
                field: "quantity_received".to_string(),
                message: "Received quantity must be positive".to_string(),
            });
        }

        if let Some(supplier_id) = input.supplier_id {
            if self.store.get_supplier(supplier_id).await?.is_none() {
                return Err(AppError::NotFound("Supplier".to_string()));
            }
        }

        self.store
            .insert_lot(NewLot {
                kind: input.kind,
                name: input.name,
                supplier_id: input.supplier_id,
                quantity_received: input.quantity_received,
                unit: input.unit,
                received_date: input.received_date,
                storage_notes: input.storage_notes,
            })
            .await
    }

    /// Get a lot by ID
    pub async fn get_lot(&self, id: Uuid) -> AppResult<Lot> {
        self.store
            .get_lot(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))
    }

    /// List lots, optionally filtered by kind
    pub async fn list_lots(&self, kind: Option<LotKind>) -> AppResult<Vec<Lot>> {
        self.store.list_lots(kind).await
    }

    /// Update lot metadata
    pub async fn update_lot(&self, id: Uuid, input: UpdateLotInput) -> AppResult<Lot> {
        if let Some(ref name) = input.name {
            if validate_required_text(name).is_err() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Lot name cannot be empty".to_string(),
                });
            }
        }

        if let Some(Some(supplier_id)) = input.supplier_id {
            if self.store.get_supplier(supplier_id).await?.is_none() {
                return Err(AppError::NotFound("Supplier".to_string()));
            }
        }

        self.store
            .update_lot_metadata(
                id,
                LotMetadataPatch {
                    name: input.name,
                    supplier_id: input.supplier_id,
                    storage_notes: input.storage_notes,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))
    }

    /// Delete a lot. Consumption records keep denormalized copies of the
    /// lot's name and unit, so the audit trail survives the deletion.
    pub async fn delete_lot(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_lot(id).await? {
            return Err(AppError::NotFound("Lot".to_string()));
        }
        Ok(())
    }
}
