//! Finished-goods inventory service
//!
//! Processed goods are only ever created by the approval transition in
//! [`super::BatchService`]; this service is the read side.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::Store;
use shared::ProcessedGood;

/// Processed goods service
#[derive(Clone)]
pub struct ProcessedGoodService {
    store: Arc<dyn Store>,
}

impl ProcessedGoodService {
    /// Create a new ProcessedGoodService instance
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Get a processed good by ID
    pub async fn get_processed_good(&self, id: Uuid) -> AppResult<ProcessedGood> {
        self.store
            .get_processed_good(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Processed good".to_string()))
    }

    /// List all processed goods
    pub async fn list_processed_goods(&self) -> AppResult<Vec<ProcessedGood>> {
        self.store.list_processed_goods().await
    }
}
