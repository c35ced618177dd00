//! OpenStack Swift backend
//!
//! Authenticates against Keystone with the password method and resolves
//! the object-store endpoint from the service catalog. Object operations
//! then run over Swift's HTTP API with the issued token, streaming content
//! in both directions rather than buffering it.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderName, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use reqwest::{Body, Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::SwiftConfig;

use super::keystone::{AuthRequest, AuthResponse};
use super::{ObjectPayload, StorageBackend, StorageError, StorageSession, StorePayload};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const X_AUTH_TOKEN: &str = "x-auth-token";
const X_SUBJECT_TOKEN: &str = "x-subject-token";

/// Swift credential holder. Holds no token state; every call to
/// [`StorageBackend::authenticate`] performs a fresh token request.
pub struct SwiftBackend {
    http: Client,
    config: SwiftConfig,
}

impl SwiftBackend {
    pub fn new(config: &SwiftConfig) -> Result<Self, StorageError> {
        let http = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/auth/tokens", self.config.auth_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl StorageBackend for SwiftBackend {
    async fn authenticate(&self) -> Result<Box<dyn StorageSession>, StorageError> {
        info!(auth_url = %self.config.auth_url, "authenticating against identity service");

        let response = self
            .http
            .post(self.token_url())
            .json(&AuthRequest::password(&self.config))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(StorageError::Authentication(format!(
                "identity service returned {status}: {reason}"
            )));
        }

        let token = response
            .headers()
            .get(X_SUBJECT_TOKEN)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| {
                StorageError::Authentication(format!(
                    "token response carried no {X_SUBJECT_TOKEN} header"
                ))
            })?;

        let auth: AuthResponse = response.json().await?;

        let endpoint = auth
            .token
            .object_store_endpoint(self.config.region.as_deref())
            .ok_or_else(|| {
                StorageError::Authentication(
                    "service catalog has no matching public object-store endpoint".to_string(),
                )
            })?;

        let storage_url = Url::parse(endpoint).map_err(|e| {
            StorageError::Authentication(format!("catalog endpoint is not a valid URL: {e}"))
        })?;
        if storage_url.cannot_be_a_base() {
            return Err(StorageError::Authentication(format!(
                "catalog endpoint {storage_url} cannot address objects"
            )));
        }

        info!(
            storage_url = %storage_url,
            expires_at = ?auth.token.expires_at,
            "authenticated successfully"
        );

        Ok(Box::new(SwiftSession {
            http: self.http.clone(),
            token,
            storage_url,
        }))
    }
}

/// One authenticated token and the account URL it is valid for.
struct SwiftSession {
    http: Client,
    token: String,
    storage_url: Url,
}

impl SwiftSession {
    /// URL addressing one object, with the container and object names
    /// percent-encoded as path segments.
    fn object_url(&self, container: &str, object: &str) -> Url {
        let mut url = self.storage_url.clone();
        url.path_segments_mut()
            .expect("storage URL validated during authentication")
            .pop_if_empty()
            .push(container)
            .push(object);
        url
    }
}

#[async_trait]
impl StorageSession for SwiftSession {
    async fn get_object(
        &self,
        container: &str,
        object: &str,
    ) -> Result<ObjectPayload, StorageError> {
        let response = self
            .http
            .get(self.object_url(container, object))
            .header(X_AUTH_TOKEN, &self.token)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound {
                container: container.to_string(),
                object: object.to_string(),
            }),
            status if status.is_success() => {
                let mime_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM.as_ref())
                    .to_string();
                let content_length = response.content_length();
                let etag = header_string(&response, ETAG);
                let last_modified = header_string(&response, LAST_MODIFIED);

                debug!(container, object, %mime_type, ?content_length, "streaming object from backend");

                Ok(ObjectPayload {
                    mime_type,
                    content_length,
                    etag,
                    last_modified,
                    content: response.bytes_stream().map_err(Into::into).boxed(),
                })
            }
            _ => Err(rejection("get", response).await),
        }
    }

    async fn put_object(
        &self,
        container: &str,
        object: &str,
        payload: StorePayload,
    ) -> Result<(), StorageError> {
        let mut request = self
            .http
            .put(self.object_url(container, object))
            .header(X_AUTH_TOKEN, &self.token)
            .body(Body::wrap_stream(payload.content));
        if let Some(content_type) = payload.content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(container, object, %status, "stored object");
            Ok(())
        } else {
            Err(rejection("put", response).await)
        }
    }

    async fn delete_object(&self, container: &str, object: &str) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(self.object_url(container, object))
            .header(X_AUTH_TOKEN, &self.token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(container, object, %status, "deleted object");
            Ok(())
        } else {
            Err(rejection("delete", response).await)
        }
    }
}

fn header_string(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Turn a failure response into a [`StorageError::Rejected`], draining the
/// body for whatever reason text the backend included.
async fn rejection(operation: &'static str, response: Response) -> StorageError {
    let status = response.status();
    let reason = response.text().await.unwrap_or_default();
    StorageError::Rejected {
        operation,
        status,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BoxError;
    use bytes::Bytes;
    use futures::stream;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn test_config(auth_url: String) -> SwiftConfig {
        SwiftConfig {
            auth_url,
            username: "svc-object-storage".to_string(),
            password: "hunter2".to_string(),
            domain_name: "Default".to_string(),
            project_id: "a1b2c3d4".to_string(),
            region: None,
            request_timeout_secs: 300,
        }
    }

    async fn mock_token_issue(server: &mut ServerGuard) -> mockito::Mock {
        let catalog = json!({
            "token": {
                "expires_at": "2026-08-22T12:00:00.000000Z",
                "catalog": [
                    {
                        "type": "object-store",
                        "endpoints": [
                            {
                                "interface": "public",
                                "region": "dallas",
                                "url": format!("{}/v1/AUTH_test", server.url())
                            }
                        ]
                    }
                ]
            }
        });
        server
            .mock("POST", "/v3/auth/tokens")
            .match_body(Matcher::PartialJson(json!({
                "auth": {
                    "identity": { "methods": ["password"] },
                    "scope": { "project": { "id": "a1b2c3d4" } }
                }
            })))
            .with_status(201)
            .with_header(X_SUBJECT_TOKEN, "tok-123")
            .with_body(catalog.to_string())
            .create_async()
            .await
    }

    async fn authenticated_session(server: &ServerGuard) -> Box<dyn StorageSession> {
        let backend = SwiftBackend::new(&test_config(format!("{}/v3", server.url()))).unwrap();
        backend.authenticate().await.unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_issues_token_and_resolves_endpoint() {
        let mut server = Server::new_async().await;
        let token_mock = mock_token_issue(&mut server).await;

        let backend = SwiftBackend::new(&test_config(format!("{}/v3", server.url()))).unwrap();
        backend.authenticate().await.unwrap();

        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticate_rejected_credentials() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v3/auth/tokens")
            .with_status(401)
            .with_body("The request you have made requires authentication.")
            .create_async()
            .await;

        let backend = SwiftBackend::new(&test_config(format!("{}/v3", server.url()))).unwrap();
        let err = backend.authenticate().await.err().expect("authentication should fail");

        match err {
            StorageError::Authentication(reason) => assert!(reason.contains("401")),
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_without_subject_token_header() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v3/auth/tokens")
            .with_status(201)
            .with_body(json!({ "token": {} }).to_string())
            .create_async()
            .await;

        let backend = SwiftBackend::new(&test_config(format!("{}/v3", server.url()))).unwrap();
        let err = backend.authenticate().await.err().expect("authentication should fail");

        match err {
            StorageError::Authentication(reason) => assert!(reason.contains(X_SUBJECT_TOKEN)),
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_without_object_store_endpoint() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v3/auth/tokens")
            .with_status(201)
            .with_header(X_SUBJECT_TOKEN, "tok-123")
            .with_body(
                json!({
                    "token": {
                        "catalog": [
                            {
                                "type": "identity",
                                "endpoints": [
                                    { "interface": "public", "url": server.url() }
                                ]
                            }
                        ]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = SwiftBackend::new(&test_config(format!("{}/v3", server.url()))).unwrap();
        let err = backend.authenticate().await.err().expect("authentication should fail");

        match err {
            StorageError::Authentication(reason) => assert!(reason.contains("object-store")),
            other => panic!("expected authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_object_streams_bytes_and_metadata() {
        let mut server = Server::new_async().await;
        mock_token_issue(&mut server).await;
        let get_mock = server
            .mock("GET", "/v1/AUTH_test/photos/cat.jpg")
            .match_header(X_AUTH_TOKEN, "tok-123")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_header("etag", "d41d8cd98f00b204e9800998ecf8427e")
            .with_body(b"jpeg bytes")
            .create_async()
            .await;

        let session = authenticated_session(&server).await;
        let payload = session.get_object("photos", "cat.jpg").await.unwrap();

        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.content_length, Some(10));
        assert_eq!(
            payload.etag.as_deref(),
            Some("d41d8cd98f00b204e9800998ecf8427e")
        );

        let mut content = Vec::new();
        let mut stream = payload.content;
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(content, b"jpeg bytes");

        get_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_object_missing_maps_to_not_found() {
        let mut server = Server::new_async().await;
        mock_token_issue(&mut server).await;
        server
            .mock("GET", "/v1/AUTH_test/photos/missing.jpg")
            .with_status(404)
            .create_async()
            .await;

        let session = authenticated_session(&server).await;
        let err = session
            .get_object("photos", "missing.jpg")
            .await
            .err()
            .expect("retrieval should fail");

        match err {
            StorageError::NotFound { container, object } => {
                assert_eq!(container, "photos");
                assert_eq!(object, "missing.jpg");
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_object_sends_stream_with_content_type() {
        let mut server = Server::new_async().await;
        mock_token_issue(&mut server).await;
        let put_mock = server
            .mock("PUT", "/v1/AUTH_test/notes/hello.txt")
            .match_header(X_AUTH_TOKEN, "tok-123")
            .match_header("content-type", "text/plain")
            .match_body("hello world")
            .with_status(201)
            .create_async()
            .await;

        let content = stream::iter(vec![
            Ok::<_, BoxError>(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ])
        .boxed();

        let session = authenticated_session(&server).await;
        session
            .put_object(
                "notes",
                "hello.txt",
                StorePayload {
                    content_type: Some("text/plain".to_string()),
                    content,
                },
            )
            .await
            .unwrap();

        put_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_object_failure_carries_status() {
        let mut server = Server::new_async().await;
        mock_token_issue(&mut server).await;
        server
            .mock("DELETE", "/v1/AUTH_test/photos/cat.jpg")
            .with_status(409)
            .with_body("conflict")
            .create_async()
            .await;

        let session = authenticated_session(&server).await;
        let err = session.delete_object("photos", "cat.jpg").await.unwrap_err();

        match err {
            StorageError::Rejected {
                operation,
                status,
                reason,
            } => {
                assert_eq!(operation, "delete");
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(reason, "conflict");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_object_url_percent_encodes_segments() {
        let session = SwiftSession {
            http: Client::new(),
            token: "tok-123".to_string(),
            storage_url: Url::parse("https://objects.example.com/v1/AUTH_test").unwrap(),
        };

        assert_eq!(
            session.object_url("summer photos", "cat #1.jpg").as_str(),
            "https://objects.example.com/v1/AUTH_test/summer%20photos/cat%20%231.jpg"
        );
    }

    #[test]
    fn test_object_url_tolerates_trailing_slash() {
        let session = SwiftSession {
            http: Client::new(),
            token: "tok-123".to_string(),
            storage_url: Url::parse("https://objects.example.com/v1/AUTH_test/").unwrap(),
        };

        assert_eq!(
            session.object_url("photos", "cat.jpg").as_str(),
            "https://objects.example.com/v1/AUTH_test/photos/cat.jpg"
        );
    }
}
