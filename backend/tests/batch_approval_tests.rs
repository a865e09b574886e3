//! QA approval transition tests
//!
//! Approval locks the batch and materializes exactly one processed good;
//! every other transition leaves the batch unlocked. Locked batches refuse
//! further transitions and deletion.

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use prodtrack_backend::error::AppError;
use prodtrack_backend::services::batch::{BatchService, CommitBatchInput, ConsumptionLine};
use prodtrack_backend::services::lot::{CreateLotInput, LotService};
use prodtrack_backend::services::processed::ProcessedGoodService;
use prodtrack_backend::store::{MemoryStore, Store};
use shared::{LotKind, ProductionBatch, QaStatus};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Fixture {
    store: Arc<MemoryStore>,
    batches: BatchService,
    goods: ProcessedGoodService,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        Self {
            store,
            batches: BatchService::new(dyn_store.clone()),
            goods: ProcessedGoodService::new(dyn_store),
        }
    }

    /// Seed a lot and commit a pending batch consuming part of it
    async fn committed_batch(&self) -> ProductionBatch {
        let lots = LotService::new(self.store.clone() as Arc<dyn Store>);
        let lot = lots
            .create_lot(CreateLotInput {
                kind: LotKind::RawMaterial,
                name: "Lentils".to_string(),
                supplier_id: None,
                quantity_received: dec("100"),
                unit: "kg".to_string(),
                received_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                storage_notes: None,
            })
            .await
            .unwrap();

        self.batches
            .commit_batch(CommitBatchInput {
                batch_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
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
            .unwrap()
            .batch
    }
}

#[tokio::test]
async fn approve_locks_batch_and_creates_one_processed_good() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    let approved = fx.batches.approve(batch.id).await.unwrap();

    assert_eq!(approved.qa_status, QaStatus::Approved);
    assert!(approved.locked);

    let goods = fx.goods.list_processed_goods().await.unwrap();
    assert_eq!(goods.len(), 1);
    let good = &goods[0];
    assert_eq!(good.batch_id, batch.id);
    assert_eq!(good.product_type, "Khar");
    assert_eq!(good.quantity_available, dec("35"));
    assert_eq!(good.unit, "kg");
    assert_eq!(good.production_date, batch.batch_date);
    assert_eq!(good.qa_status, QaStatus::Approved);
}

#[tokio::test]
async fn approving_a_locked_batch_fails_and_writes_nothing() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    fx.batches.approve(batch.id).await.unwrap();
    let err = fx.batches.approve(batch.id).await.unwrap_err();

    assert!(matches!(err, AppError::AlreadyLocked));
    // Still exactly one processed good
    assert_eq!(fx.goods.list_processed_goods().await.unwrap().len(), 1);
}

#[tokio::test]
async fn approving_an_unknown_batch_is_not_found() {
    let fx = Fixture::new();
    let err = fx.batches.approve(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn reject_and_hold_leave_batch_unlocked() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    let rejected = fx.batches.reject(batch.id).await.unwrap();
    assert_eq!(rejected.qa_status, QaStatus::Rejected);
    assert!(!rejected.locked);

    let held = fx.batches.hold(batch.id).await.unwrap();
    assert_eq!(held.qa_status, QaStatus::Hold);
    assert!(!held.locked);

    // No processed goods from either transition
    assert!(fx.goods.list_processed_goods().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_batch_can_later_be_approved() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    fx.batches.reject(batch.id).await.unwrap();
    let approved = fx.batches.approve(batch.id).await.unwrap();

    assert_eq!(approved.qa_status, QaStatus::Approved);
    assert!(approved.locked);
    assert_eq!(fx.goods.list_processed_goods().await.unwrap().len(), 1);
}

#[tokio::test]
async fn locked_batch_refuses_reject_hold_and_delete() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;
    fx.batches.approve(batch.id).await.unwrap();

    assert!(matches!(
        fx.batches.reject(batch.id).await.unwrap_err(),
        AppError::AlreadyLocked
    ));
    assert!(matches!(
        fx.batches.hold(batch.id).await.unwrap_err(),
        AppError::AlreadyLocked
    ));
    assert!(matches!(
        fx.batches.delete_batch(batch.id).await.unwrap_err(),
        AppError::BatchLocked
    ));
}

#[tokio::test]
async fn deleting_an_unlocked_batch_does_not_restore_inventory() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    fx.batches.delete_batch(batch.id).await.unwrap();

    let err = fx.batches.get_batch(batch.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The commit's consumption stands: availability stays at 60
    let lots = LotService::new(fx.store.clone() as Arc<dyn Store>);
    let all = lots.list_lots(None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].quantity_available, dec("60"));
}

#[tokio::test]
async fn concurrent_approvals_produce_exactly_one_processed_good() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    let first = {
        let batches = fx.batches.clone();
        let id = batch.id;
        tokio::spawn(async move { batches.approve(id).await })
    };
    let second = {
        let batches = fx.batches.clone();
        let id = batch.id;
        tokio::spawn(async move { batches.approve(id).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();

    assert_eq!(successes, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, AppError::AlreadyLocked));
        }
    }
    assert_eq!(fx.goods.list_processed_goods().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_batch_includes_consumption_records() {
    let fx = Fixture::new();
    let batch = fx.committed_batch().await;

    let fetched = fx.batches.get_batch(batch.id).await.unwrap();
    assert_eq!(fetched.batch.id, batch.id);
    assert_eq!(fetched.consumptions.len(), 1);
    assert_eq!(fetched.consumptions[0].quantity_consumed, dec("40"));
}
