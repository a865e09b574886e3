//! Production batch HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::{require_write, CurrentUser};
use crate::services::batch::{BatchService, CommitBatchInput};
use crate::AppState;

/// List all production batches
pub async fn list_batches(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> impl IntoResponse {
    let service = BatchService::new(state.store.clone());

    match service.list_batches().await {
        Ok(batches) => (
            StatusCode::OK,
            Json(serde_json::json!({ "batches": batches })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a batch with its consumption records
pub async fn get_batch(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = BatchService::new(state.store.clone());

    match service.get_batch(batch_id).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Commit a production batch, consuming inventory lots
pub async fn commit_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CommitBatchInput>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = BatchService::new(state.store.clone());

    match service.commit_batch(input).await {
        Ok(batch) => (StatusCode::CREATED, Json(batch)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Approve a batch, locking it and materializing a processed good
pub async fn approve_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = BatchService::new(state.store.clone());

    match service.approve(batch_id).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reject a batch
pub async fn reject_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = BatchService::new(state.store.clone());

    match service.reject(batch_id).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Put a batch on hold
pub async fn hold_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = BatchService::new(state.store.clone());

    match service.hold(batch_id).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete an unlocked batch
pub async fn delete_batch(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = BatchService::new(state.store.clone());

    match service.delete_batch(batch_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
