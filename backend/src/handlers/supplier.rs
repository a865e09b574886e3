//! Supplier registry HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::middleware::{require_write, CurrentUser};
use crate::services::supplier::{CreateSupplierInput, SupplierService, UpdateSupplierInput};
use crate::AppState;

/// List all suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> impl IntoResponse {
    let service = SupplierService::new(state.store.clone());

    match service.list_suppliers().await {
        Ok(suppliers) => (
            StatusCode::OK,
            Json(serde_json::json!({ "suppliers": suppliers })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific supplier
pub async fn get_supplier(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> impl IntoResponse {
    let service = SupplierService::new(state.store.clone());

    match service.get_supplier(supplier_id).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Register a new supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = SupplierService::new(state.store.clone());

    match service.create_supplier(input).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a supplier
pub async fn update_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = SupplierService::new(state.store.clone());

    match service.update_supplier(supplier_id, input).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a supplier
pub async fn delete_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(e) = require_write(&user) {
        return e.into_response();
    }
    let service = SupplierService::new(state.store.clone());

    match service.delete_supplier(supplier_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
