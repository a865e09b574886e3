//! Inventory lot models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::LotKind;

/// A quantity-tracked inventory lot (raw material or recurring product)
///
/// `quantity_received` is immutable once set. `quantity_available` starts
/// equal to `quantity_received` and is decremented only by batch commits;
/// `0 <= quantity_available <= quantity_received` holds at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: Uuid,
    pub kind: LotKind,
    pub name: String,
    pub supplier_id: Option<Uuid>,
    pub quantity_received: Decimal,
    pub quantity_available: Decimal,
    pub unit: String,
    pub received_date: NaiveDate,
    pub storage_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
