//! Storage backend abstraction layer
//!
//! Defines the seam between the HTTP handlers and the object storage
//! backend: a [`StorageBackend`] authenticates and hands out a short-lived
//! [`StorageSession`] that performs the actual object operations. The
//! concrete implementation talks to OpenStack Swift; tests substitute an
//! in-memory double through the same traits.

mod keystone;
mod swift;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;

pub use swift::SwiftBackend;

/// Boxed error type carried by byte streams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A stream of body chunks, used in both transfer directions.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// A downloaded object: its metadata plus the content stream.
///
/// Dropping the payload releases the underlying connection, so every exit
/// path gives the stream back without explicit close calls.
pub struct ObjectPayload {
    /// MIME type stored with the object.
    pub mime_type: String,
    /// Content length as reported by the backend, when known.
    pub content_length: Option<u64>,
    /// Entity tag reported by the backend.
    pub etag: Option<String>,
    /// Last modification timestamp, as an HTTP date string.
    pub last_modified: Option<String>,
    /// The object bytes.
    pub content: ByteStream,
}

/// Content to upload: an optional MIME type plus the byte stream.
pub struct StorePayload {
    /// MIME type to store with the object; the backend picks one if absent.
    pub content_type: Option<String>,
    /// The object bytes, consumed exactly once by the upload.
    pub content: ByteStream,
}

/// Errors reported by the storage backend client.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The identity service rejected the credentials, or its response was
    /// unusable (missing token, no object-store endpoint in the catalog).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The requested object does not exist.
    #[error("object {container}/{object} not found")]
    NotFound { container: String, object: String },

    /// The backend answered the request with a failure status.
    #[error("backend rejected {operation}: {status}: {reason}")]
    Rejected {
        operation: &'static str,
        status: StatusCode,
        reason: String,
    },

    /// The backend could not be reached, or the transfer broke off.
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Credential holder for the storage backend.
///
/// Authentication runs fresh on every call; sessions are never cached or
/// shared between requests.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Authenticate and return a session for one request's worth of work.
    async fn authenticate(&self) -> Result<Box<dyn StorageSession>, StorageError>;
}

/// An authenticated handle to the backend, valid for a single request.
#[async_trait]
pub trait StorageSession: Send + Sync {
    /// Fetch an object's metadata and content stream.
    async fn get_object(&self, container: &str, object: &str)
        -> Result<ObjectPayload, StorageError>;

    /// Create or overwrite an object from a byte stream.
    async fn put_object(
        &self,
        container: &str,
        object: &str,
        payload: StorePayload,
    ) -> Result<(), StorageError>;

    /// Delete an object.
    async fn delete_object(&self, container: &str, object: &str) -> Result<(), StorageError>;
}

/// Create the storage backend from configuration.
pub fn create_backend(config: &Config) -> Result<Arc<dyn StorageBackend>, StorageError> {
    Ok(Arc::new(SwiftBackend::new(&config.swift)?))
}
