//! Lot and supplier registry tests
//!
//! Covers lot registration, metadata-only updates, kind filtering, supplier
//! lifecycle, and the conservation invariant between received quantity,
//! availability, and recorded consumption.

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use prodtrack_backend::error::AppError;
use prodtrack_backend::services::lot::{CreateLotInput, LotService, UpdateLotInput};
use prodtrack_backend::services::supplier::{
    CreateSupplierInput, SupplierService, UpdateSupplierInput,
};
use prodtrack_backend::store::{MemoryStore, Store};
use shared::LotKind;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn received_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
}

fn lot_input(kind: LotKind, name: &str, quantity: &str) -> CreateLotInput {
    CreateLotInput {
        kind,
        name: name.to_string(),
        supplier_id: None,
        quantity_received: dec(quantity),
        unit: "kg".to_string(),
        received_date: received_date(),
        storage_notes: None,
    }
}

fn setup() -> (Arc<MemoryStore>, LotService, SupplierService) {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn Store> = store.clone();
    (
        store,
        LotService::new(dyn_store.clone()),
        SupplierService::new(dyn_store),
    )
}

// ============================================================================
// Lot registry
// ============================================================================

#[tokio::test]
async fn new_lot_starts_fully_available() {
    let (_, lots, _) = setup();

    let lot = lots
        .create_lot(lot_input(LotKind::RawMaterial, "Lentils", "250.5"))
        .await
        .unwrap();

    assert_eq!(lot.quantity_received, dec("250.5"));
    assert_eq!(lot.quantity_available, dec("250.5"));
    assert_eq!(lot.unit, "kg");
    assert_eq!(lot.received_date, received_date());
}

#[tokio::test]
async fn lot_creation_validates_quantity_and_name() {
    let (_, lots, _) = setup();

    let err = lots
        .create_lot(lot_input(LotKind::RawMaterial, "Lentils", "0"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { field, .. } if field == "quantity_received"));

    let err = lots
        .create_lot(lot_input(LotKind::RawMaterial, "  ", "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { field, .. } if field == "name"));
}

#[tokio::test]
async fn lot_creation_rejects_unknown_supplier() {
    let (_, lots, _) = setup();

    let mut input = lot_input(LotKind::RawMaterial, "Lentils", "10");
    input.supplier_id = Some(Uuid::new_v4());

    let err = lots.create_lot(input).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn list_lots_filters_by_kind() {
    let (_, lots, _) = setup();

    lots.create_lot(lot_input(LotKind::RawMaterial, "Lentils", "100"))
        .await
        .unwrap();
    lots.create_lot(lot_input(LotKind::RawMaterial, "Chickpeas", "50"))
        .await
        .unwrap();
    lots.create_lot(lot_input(LotKind::RecurringProduct, "Salt", "20"))
        .await
        .unwrap();

    assert_eq!(lots.list_lots(None).await.unwrap().len(), 3);
    assert_eq!(
        lots.list_lots(Some(LotKind::RawMaterial)).await.unwrap().len(),
        2
    );
    assert_eq!(
        lots.list_lots(Some(LotKind::RecurringProduct))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn lot_update_touches_metadata_only() {
    let (_, lots, suppliers) = setup();

    let supplier = suppliers
        .create_supplier(CreateSupplierInput {
            name: "Hillside Farms".to_string(),
            contact: None,
            notes: None,
        })
        .await
        .unwrap();

    let lot = lots
        .create_lot(lot_input(LotKind::RawMaterial, "Lentils", "100"))
        .await
        .unwrap();

    let updated = lots
        .update_lot(
            lot.id,
            UpdateLotInput {
                name: Some("Red lentils".to_string()),
                supplier_id: Some(Some(supplier.id)),
                storage_notes: Some("Bin 4".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Red lentils");
    assert_eq!(updated.supplier_id, Some(supplier.id));
    assert_eq!(updated.storage_notes.as_deref(), Some("Bin 4"));
    // Quantities are not editable through updates
    assert_eq!(updated.quantity_received, dec("100"));
    assert_eq!(updated.quantity_available, dec("100"));

    // Explicit null clears the supplier reference
    let cleared = lots
        .update_lot(
            lot.id,
            UpdateLotInput {
                name: None,
                supplier_id: Some(None),
                storage_notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.supplier_id, None);
}

#[tokio::test]
async fn deleting_a_lot_leaves_consumption_history_intact() {
    use prodtrack_backend::services::batch::{BatchService, CommitBatchInput, ConsumptionLine};

    let (store, lots, _) = setup();
    let batches = BatchService::new(store.clone() as Arc<dyn Store>);

    let lot = lots
        .create_lot(lot_input(LotKind::RawMaterial, "Lentils", "100"))
        .await
        .unwrap();

    let committed = batches
        .commit_batch(CommitBatchInput {
            batch_date: received_date(),
            responsible_party: "A. Ramos".to_string(),
            product_type: "Khar".to_string(),
            output_quantity: dec("35"),
            unit: "kg".to_string(),
            notes: None,
            raw_materials: vec![ConsumptionLine {
                lot_id: lot.id,
                quantity: dec("40"),
            }],
            recurring_products: vec![],
        })
        .await
        .unwrap();

    lots.delete_lot(lot.id).await.unwrap();

    // The denormalized record still names the deleted lot
    let fetched = batches.get_batch(committed.batch.id).await.unwrap();
    assert_eq!(fetched.consumptions.len(), 1);
    assert_eq!(fetched.consumptions[0].lot_name, "Lentils");
    assert_eq!(fetched.consumptions[0].lot_id, lot.id);
}

// ============================================================================
// Supplier registry
// ============================================================================

#[tokio::test]
async fn supplier_crud_round_trip() {
    let (_, _, suppliers) = setup();

    let supplier = suppliers
        .create_supplier(CreateSupplierInput {
            name: "Hillside Farms".to_string(),
            contact: Some("orders@hillside.example".to_string()),
            notes: None,
        })
        .await
        .unwrap();

    let fetched = suppliers.get_supplier(supplier.id).await.unwrap();
    assert_eq!(fetched.name, "Hillside Farms");

    let updated = suppliers
        .update_supplier(
            supplier.id,
            UpdateSupplierInput {
                name: Some("Hillside Farms Co-op".to_string()),
                contact: None,
                notes: Some("Net 30".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Hillside Farms Co-op");
    assert_eq!(updated.notes.as_deref(), Some("Net 30"));

    suppliers.delete_supplier(supplier.id).await.unwrap();
    let err = suppliers.get_supplier(supplier.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn supplier_with_blank_name_is_rejected() {
    let (_, _, suppliers) = setup();

    let err = suppliers
        .create_supplier(CreateSupplierInput {
            name: "".to_string(),
            contact: None,
            notes: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { field, .. } if field == "name"));
}

#[tokio::test]
async fn supplier_referenced_by_a_lot_cannot_be_deleted() {
    let (_, lots, suppliers) = setup();

    let supplier = suppliers
        .create_supplier(CreateSupplierInput {
            name: "Hillside Farms".to_string(),
            contact: None,
            notes: None,
        })
        .await
        .unwrap();

    let mut input = lot_input(LotKind::RawMaterial, "Lentils", "100");
    input.supplier_id = Some(supplier.id);
    let lot = lots.create_lot(input).await.unwrap();

    let err = suppliers.delete_supplier(supplier.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Once the lot is gone the supplier can be removed
    lots.delete_lot(lot.id).await.unwrap();
    suppliers.delete_supplier(supplier.id).await.unwrap();
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    use prodtrack_backend::services::batch::{BatchService, CommitBatchInput, ConsumptionLine};

    /// Strategy for quantities between 0.1 and 1000.0
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Conservation: after any sequence of successful commits against one
        /// lot, available + total consumed = received, and availability never
        /// goes negative
        #[test]
        fn prop_consumption_conserves_received_quantity(
            received in (10000i64..=100000i64).prop_map(|n| Decimal::new(n, 1)),
            draws in prop::collection::vec(quantity_strategy(), 1..8)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            rt.block_on(async {
                let (store, lots, _) = setup();
                let batches = BatchService::new(store as Arc<dyn Store>);

                let lot = lots
                    .create_lot(lot_input(LotKind::RawMaterial, "Lentils", &received.to_string()))
                    .await
                    .unwrap();

                let mut consumed = Decimal::ZERO;
                for draw in &draws {
                    let result = batches
                        .commit_batch(CommitBatchInput {
                            batch_date: received_date(),
                            responsible_party: "A. Ramos".to_string(),
                            product_type: "Khar".to_string(),
                            output_quantity: dec("1"),
                            unit: "kg".to_string(),
                            notes: None,
                            raw_materials: vec![ConsumptionLine {
                                lot_id: lot.id,
                                quantity: *draw,
                            }],
                            recurring_products: vec![],
                        })
                        .await;

                    match result {
                        Ok(_) => consumed += draw,
                        Err(AppError::InsufficientInventory { .. }) => {}
                        Err(other) => panic!("unexpected error: {:?}", other),
                    }

                    let current = lots.get_lot(lot.id).await.unwrap();
                    prop_assert!(current.quantity_available >= Decimal::ZERO);
                    prop_assert_eq!(current.quantity_available, received - consumed);
                }

                let final_lot = lots.get_lot(lot.id).await.unwrap();
                prop_assert_eq!(final_lot.quantity_received, received);
                prop_assert_eq!(final_lot.quantity_available + consumed, received);
                Ok(())
            })?;
        }
    }
}
