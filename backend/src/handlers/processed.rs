//! Finished-goods inventory HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::CurrentUser;
use crate::services::processed::ProcessedGoodService;
use crate::AppState;

/// List all processed goods
pub async fn list_processed_goods(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> impl IntoResponse {
    let service = ProcessedGoodService::new(state.store.clone());

    match service.list_processed_goods().await {
        Ok(goods) => (
            StatusCode::OK,
            Json(serde_json::json!({ "processed_goods": goods })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific processed good
pub async fn get_processed_good(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(good_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = ProcessedGoodService::new(state.store.clone());

    match service.get_processed_good(good_id).await {
        Ok(good) => (StatusCode::OK, Json(good)).into_response(),
        Err(e) => e.into_response(),
    }
}
