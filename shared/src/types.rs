//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Kind of quantity-tracked inventory lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotKind {
    RawMaterial,
    RecurringProduct,
}

impl LotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotKind::RawMaterial => "raw_material",
            LotKind::RecurringProduct => "recurring_product",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "raw_material" => Some(LotKind::RawMaterial),
            "recurring_product" => Some(LotKind::RecurringProduct),
            _ => None,
        }
    }
}

impl std::fmt::Display for LotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// QA workflow state of a production batch or processed good
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaStatus {
    Pending,
    Approved,
    Rejected,
    Hold,
}

impl QaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QaStatus::Pending => "pending",
            QaStatus::Approved => "approved",
            QaStatus::Rejected => "rejected",
            QaStatus::Hold => "hold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QaStatus::Pending),
            "approved" => Some(QaStatus::Approved),
            "rejected" => Some(QaStatus::Rejected),
            "hold" => Some(QaStatus::Hold),
            _ => None,
        }
    }
}

impl std::fmt::Display for QaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque access level carried in auth tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Read,
    ReadWrite,
}

impl AccessLevel {
    pub fn can_write(&self) -> bool {
        matches!(self, AccessLevel::ReadWrite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::ReadWrite => "read_write",
        }
    }
}

/// Generate a human-readable batch reference
pub fn format_batch_ref(year: i32, sequence: i64) -> String {
    format!("PB-{}-{:04}", year, sequence)
}
