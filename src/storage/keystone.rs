//! Keystone v3 wire types
//!
//! Request and response bodies for the identity service's token endpoint,
//! plus the catalog lookup that resolves the object-store URL out of a
//! freshly issued token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SwiftConfig;

const OBJECT_STORE_TYPE: &str = "object-store";
const PUBLIC_INTERFACE: &str = "public";

/// Token request body for password authentication, scoped to a project.
#[derive(Serialize)]
pub struct AuthRequest {
    auth: Auth,
}

#[derive(Serialize)]
struct Auth {
    identity: Identity,
    scope: Scope,
}

#[derive(Serialize)]
struct Identity {
    methods: Vec<&'static str>,
    password: PasswordMethod,
}

#[derive(Serialize)]
struct PasswordMethod {
    user: User,
}

#[derive(Serialize)]
struct User {
    name: String,
    domain: Domain,
    password: String,
}

#[derive(Serialize)]
struct Domain {
    name: String,
}

#[derive(Serialize)]
struct Scope {
    project: Project,
}

#[derive(Serialize)]
struct Project {
    id: String,
}

impl AuthRequest {
    /// Build a password-method request from configuration. The domain is
    /// referenced by name and the project by id, matching how the identity
    /// service hands out object storage credentials.
    pub fn password(config: &SwiftConfig) -> Self {
        Self {
            auth: Auth {
                identity: Identity {
                    methods: vec!["password"],
                    password: PasswordMethod {
                        user: User {
                            name: config.username.clone(),
                            domain: Domain {
                                name: config.domain_name.clone(),
                            },
                            password: config.password.clone(),
                        },
                    },
                },
                scope: Scope {
                    project: Project {
                        id: config.project_id.clone(),
                    },
                },
            },
        }
    }
}

/// Token response body. The token value itself travels in the
/// `X-Subject-Token` response header, not in the body.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: Token,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEndpoint {
    pub interface: String,
    #[serde(default)]
    pub region: Option<String>,
    pub url: String,
}

impl Token {
    /// Resolve the public object-store endpoint from the service catalog,
    /// restricted to `region` when one is configured.
    pub fn object_store_endpoint(&self, region: Option<&str>) -> Option<&str> {
        self.catalog
            .iter()
            .filter(|entry| entry.service_type == OBJECT_STORE_TYPE)
            .flat_map(|entry| entry.endpoints.iter())
            .filter(|endpoint| endpoint.interface == PUBLIC_INTERFACE)
            .find(|endpoint| match region {
                Some(wanted) => endpoint.region.as_deref() == Some(wanted),
                None => true,
            })
            .map(|endpoint| endpoint.url.as_str())
    }
}
