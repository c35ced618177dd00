//! Request handlers for the proxy endpoints

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::{ProxyError, Result};
use crate::routes::ObjectStorageQuery;
use crate::storage::{StorageBackend, StorePayload};

/// Health check endpoint
#[instrument]
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe endpoint
#[instrument]
pub async fn ready() -> impl IntoResponse {
    // TODO: Probe the identity service before reporting ready
    (StatusCode::OK, "Ready")
}

/// Resolve the container and file parameters. Both must be present and
/// non-empty before any backend work starts, including authentication.
fn object_reference(params: &ObjectStorageQuery) -> Result<(&str, &str)> {
    let container = params
        .container
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(ProxyError::MissingParameter("container"))?;
    let file = params
        .file
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or(ProxyError::MissingParameter("file"))?;
    Ok((container, file))
}

/// RetrieveObject - GET /objectStorage
#[instrument(skip(storage))]
pub async fn retrieve_object(
    State(storage): State<Arc<dyn StorageBackend>>,
    Query(params): Query<ObjectStorageQuery>,
) -> Result<Response> {
    let (container, file) = object_reference(&params)?;
    info!(container = %container, file = %file, "RetrieveObject request");

    let session = storage.authenticate().await?;
    let payload = session.get_object(container, file).await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, payload.mime_type);
    if let Some(length) = payload.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }
    if let Some(etag) = payload.etag {
        builder = builder.header(header::ETAG, etag);
    }
    if let Some(last_modified) = payload.last_modified {
        builder = builder.header(header::LAST_MODIFIED, last_modified);
    }

    builder
        .body(Body::from_stream(payload.content))
        .map_err(|e| ProxyError::Internal(format!("failed to build response: {e}")))
}

/// StoreObject - POST /objectStorage
#[instrument(skip(storage, body))]
pub async fn store_object(
    State(storage): State<Arc<dyn StorageBackend>>,
    Query(params): Query<ObjectStorageQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    let (container, file) = object_reference(&params)?;
    info!(container = %container, file = %file, "StoreObject request");

    // Prefer the client's content type and fall back to guessing from the
    // file extension. When neither applies the backend picks one.
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or_else(|| mime_guess::from_path(file).first_raw().map(str::to_owned));

    let content = body.into_data_stream().map_err(Into::into).boxed();

    let session = storage.authenticate().await?;
    session
        .put_object(
            container,
            file,
            StorePayload {
                content_type,
                content,
            },
        )
        .await?;

    Ok(StatusCode::OK.into_response())
}

/// DeleteObject - DELETE /objectStorage
#[instrument(skip(storage))]
pub async fn delete_object(
    State(storage): State<Arc<dyn StorageBackend>>,
    Query(params): Query<ObjectStorageQuery>,
) -> Result<Response> {
    let (container, file) = object_reference(&params)?;
    info!(container = %container, file = %file, "DeleteObject request");

    let session = storage.authenticate().await?;
    session.delete_object(container, file).await?;

    Ok(StatusCode::OK.into_response())
}
