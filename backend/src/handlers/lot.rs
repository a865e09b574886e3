//! Inventory lot HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{require_write, CurrentUser};
use crate::services::lot::{CreateLotInput, LotService, UpdateLotInput};
use crate::AppState;
use shared::LotKind;

/// Query parameters for listing lots
#[derive(Debug, Deserialize)]
pub struct ListLotsQuery {
    pub kind: Option<LotKind>,
}

/// List lots, optionally filtered by kind
pub async fn list_lots(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListLotsQuery>,
) -> impl IntoResponse {
    let service = LotService::new(state.store.clone());

    match service.list_lots(query.kind).await {
        Ok(lots) => (StatusCode::OK, Json(serde_json::json!({ "lots": lots }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific lot
pub async fn get_lot(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = LotService::new(state.store.clone());

    match service.get_lot(lot_id).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Register a received lot
pub async fn create_lot(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateLotInput>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = LotService::new(state.store.clone());

    match service.create_lot(input).await {
        Ok(lot) => (StatusCode::CREATED, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update lot metadata
pub async fn update_lot(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<UpdateLotInput>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = LotService::new(state.store.clone());

    match service.update_lot(lot_id, input).await {
        Ok(lot) => (StatusCode::OK, Json(lot)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a lot
pub async fn delete_lot(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(lot_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = LotService::new(state.store.clone());

    match service.delete_lot(lot_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
