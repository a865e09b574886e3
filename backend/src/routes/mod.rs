//! Route definitions for the Production Operations Tracking Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - supplier registry
        .nest("/suppliers", supplier_routes())
        // Protected routes - inventory lots
        .nest("/lots", lot_routes())
        // Protected routes - production batches
        .nest("/batches", batch_routes())
        // Protected routes - finished goods
        .nest("/processed-goods", processed_good_routes())
}

/// Supplier registry routes (protected)
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::delete_supplier),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory lot routes (protected)
fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lots).post(handlers::create_lot))
        .route(
            "/:lot_id",
            get(handlers::get_lot)
                .put(handlers::update_lot)
                .delete(handlers::delete_lot),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Production batch routes (protected)
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_batches).post(handlers::commit_batch),
        )
        .route(
            "/:batch_id",
            get(handlers::get_batch).delete(handlers::delete_batch),
        )
        .route("/:batch_id/approve", post(handlers::approve_batch))
        .route("/:batch_id/reject", post(handlers::reject_batch))
        .route("/:batch_id/hold", post(handlers::hold_batch))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Finished-goods routes (protected)
fn processed_good_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_processed_goods))
        .route("/:good_id", get(handlers::get_processed_good))
        .route_layer(middleware::from_fn(auth_middleware))
}
