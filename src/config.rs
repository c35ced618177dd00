//! Configuration management for the proxy
//!
//! Supports configuration via:
//! - Environment variables (primary)
//! - Optional TOML config file (secondary)
//!
//! Environment variables take precedence over config file values. The
//! credentials themselves only ever come from configuration; nothing in the
//! proxy hardcodes them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// OpenStack credentials and endpoints
#[derive(Clone, Serialize, Deserialize)]
pub struct SwiftConfig {
    /// Keystone v3 endpoint, e.g. <https://identity.example.com/v3>
    pub auth_url: String,

    /// User name for password authentication
    pub username: String,

    /// Password for the user
    pub password: String,

    /// Domain the user belongs to, referenced by name (default: Default)
    #[serde(default = "default_domain_name")]
    pub domain_name: String,

    /// Project the token is scoped to, referenced by id
    pub project_id: String,

    /// Preferred region for the object-store endpoint (optional)
    #[serde(default)]
    pub region: Option<String>,

    /// Backend request timeout in seconds (default: 300)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_domain_name() -> String {
    "Default".to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

// Keeps the password out of startup logs.
impl fmt::Debug for SwiftConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftConfig")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("domain_name", &self.domain_name)
            .field("project_id", &self.project_id)
            .field("region", &self.region)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Request timeout in seconds (default: 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bind_address() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// OpenStack credentials and endpoints
    pub swift: SwiftConfig,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - SWIFTPROXY_AUTH_URL: Keystone v3 endpoint URL
    /// - SWIFTPROXY_USERNAME: user name for password authentication
    /// - SWIFTPROXY_PASSWORD: password for the user
    /// - SWIFTPROXY_DOMAIN_NAME: user domain name (default: Default)
    /// - SWIFTPROXY_PROJECT_ID: project id the token is scoped to
    /// - SWIFTPROXY_REGION: preferred object-store region (optional)
    /// - SWIFTPROXY_REQUEST_TIMEOUT_SECS: backend request timeout (default: 300)
    /// - SWIFTPROXY_BIND_ADDRESS: server bind address (default: 0.0.0.0:8080)
    /// - SWIFTPROXY_TIMEOUT_SECS: server request timeout (default: 300)
    /// - SWIFTPROXY_LOG_LEVEL: log level (default: info)
    /// - SWIFTPROXY_CONFIG_FILE: optional path to TOML config file
    pub fn from_env() -> anyhow::Result<Self> {
        // Try to load from config file first if specified
        let config_file = std::env::var("SWIFTPROXY_CONFIG_FILE").ok();
        let mut config = if let Some(path) = &config_file {
            Self::from_file(path)?
        } else {
            Self::empty()
        };

        // Override with environment variables
        if let Ok(auth_url) = std::env::var("SWIFTPROXY_AUTH_URL") {
            config.swift.auth_url = auth_url;
        }

        if let Ok(username) = std::env::var("SWIFTPROXY_USERNAME") {
            config.swift.username = username;
        }

        if let Ok(password) = std::env::var("SWIFTPROXY_PASSWORD") {
            config.swift.password = password;
        }

        if let Ok(domain_name) = std::env::var("SWIFTPROXY_DOMAIN_NAME") {
            config.swift.domain_name = domain_name;
        }

        if let Ok(project_id) = std::env::var("SWIFTPROXY_PROJECT_ID") {
            config.swift.project_id = project_id;
        }

        if let Ok(region) = std::env::var("SWIFTPROXY_REGION") {
            config.swift.region = Some(region);
        }

        if let Ok(timeout) = std::env::var("SWIFTPROXY_REQUEST_TIMEOUT_SECS") {
            config.swift.request_timeout_secs = timeout.parse()?;
        }

        if let Ok(addr) = std::env::var("SWIFTPROXY_BIND_ADDRESS") {
            config.server.bind_address = addr.parse()?;
        }

        if let Ok(timeout) = std::env::var("SWIFTPROXY_TIMEOUT_SECS") {
            config.server.timeout_secs = timeout.parse()?;
        }

        if let Ok(level) = std::env::var("SWIFTPROXY_LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check that every field required for authentication is set.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.swift.auth_url.is_empty(), "auth_url is required");
        anyhow::ensure!(!self.swift.username.is_empty(), "username is required");
        anyhow::ensure!(!self.swift.password.is_empty(), "password is required");
        anyhow::ensure!(!self.swift.domain_name.is_empty(), "domain_name is required");
        anyhow::ensure!(!self.swift.project_id.is_empty(), "project_id is required");
        Ok(())
    }

    fn empty() -> Self {
        Self {
            server: ServerConfig::default(),
            swift: SwiftConfig {
                auth_url: String::new(),
                username: String::new(),
                password: String::new(),
                domain_name: default_domain_name(),
                project_id: String::new(),
                region: None,
                request_timeout_secs: default_request_timeout_secs(),
            },
            log_level: default_log_level(),
        }
    }
}
