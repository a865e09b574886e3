//! Production batch and consumption record models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{LotKind, QaStatus};

/// A production run that consumed inventory lots and declared an output
///
/// Once `locked` is true the batch and its consumption records are immutable
/// and the batch cannot be deleted. Locked is only ever reached through the
/// approval transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub id: Uuid,
    /// Unique human-readable reference (e.g. "PB-2026-0001")
    pub batch_ref: String,
    pub batch_date: NaiveDate,
    pub responsible_party: String,
    pub product_type: String,
    pub output_quantity: Decimal,
    pub unit: String,
    pub qa_status: QaStatus,
    pub locked: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Audit-durable line item tying a batch to the lot and quantity it consumed
///
/// Lot name, lot kind and unit are point-in-time copies taken at commit so
/// the audit trail survives later deletion of the source lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub lot_id: Uuid,
    pub lot_kind: LotKind,
    pub lot_name: String,
    pub quantity_consumed: Decimal,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

/// A batch together with its consumption records
#[derive(Debug, Clone, Serialize)]
pub struct BatchWithConsumptions {
    #[serde(flatten)]
    pub batch: ProductionBatch,
    pub consumptions: Vec<ConsumptionRecord>,
}
