//! Supplier registry service

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{NewSupplier, Store, SupplierPatch};
use shared::{validate_required_text, Supplier};

/// Supplier service for managing the supplier registry
#[derive(Clone)]
pub struct SupplierService {
    store: Arc<dyn Store>,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub name: String,
    pub contact: Option<String>,
    pub notes: Option<String>,
}

/// Input for updating a supplier
#[derive(Debug, Deserialize)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub notes: Option<String>,
}

impl SupplierService {
    /// Create a new SupplierService instance
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new supplier
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        if validate_required_text(&input.name).is_err() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Supplier name cannot be empty".to_string(),
            });
        }

        self.store
            .insert_supplier(NewSupplier {
                name: input.name,
                contact: input.contact,
                notes: input.notes,
            })
            .await
    }

    /// Get a supplier by ID
    pub async fn get_supplier(&self, id: Uuid) -> AppResult<Supplier> {
        self.store
            .get_supplier(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// List all suppliers
    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        self.store.list_suppliers().await
    }

    /// Update a supplier
    pub async fn update_supplier(
        &self,
        id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        if let Some(ref name) = input.name {
            if validate_required_text(name).is_err() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Supplier name cannot be empty".to_string(),
                });
            }
        }

        self.store
            .update_supplier(
                id,
                SupplierPatch {
                    name: input.name,
                    contact: input.contact,
                    notes: input.notes,
                },
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))
    }

    /// Delete a supplier; refused while lots still reference it
    pub async fn delete_supplier(&self, id: Uuid) -> AppResult<()> {
        if self.store.supplier_in_use(id).await? {
            return Err(AppError::Conflict(
                "Supplier is still referenced by inventory lots".to_string(),
            ));
        }

        if !self.store.delete_supplier(id).await? {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        Ok(())
    }
}
