//! Finished-goods inventory models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::QaStatus;

/// A finished-goods inventory lot materialized by batch approval
///
/// Exactly one processed good exists per approved batch. QA status is copied
/// from the batch at approval time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedGood {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub product_type: String,
    pub quantity_available: Decimal,
    pub unit: String,
    pub production_date: NaiveDate,
    pub qa_status: QaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
