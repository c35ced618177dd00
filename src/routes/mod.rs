//! HTTP routes for the object storage proxy
//!
//! Exposes the proxy endpoint plus operational probes:
//! - GET /objectStorage?container=...&file=... - fetch an object
//! - POST /objectStorage?container=...&file=... - store the request body as an object
//! - DELETE /objectStorage?container=...&file=... - delete an object
//! - GET /healthz - liveness probe
//! - GET /ready - readiness probe

mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::storage::StorageBackend;

/// Query parameters shared by every object storage operation
#[derive(Debug, serde::Deserialize)]
pub struct ObjectStorageQuery {
    pub container: Option<String>,
    pub file: Option<String>,
}

/// Create the proxy router
pub fn create_router(storage: Arc<dyn StorageBackend>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route(
            "/objectStorage",
            get(handlers::retrieve_object)
                .post(handlers::store_object)
                .delete(handlers::delete_object),
        )
        .with_state(storage)
}
