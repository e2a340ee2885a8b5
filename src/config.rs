//! TOML configuration and startup credentials.
//!
//! Configuration is read once at startup and shared behind an `Arc` for the
//! lifetime of the process. Every section has defaults, so an empty file
//! (or no file at all, see [`load_or_minimal`]) is a valid configuration.
//!
//! ```toml
//! [store]
//! path = "./data/linkedin_posts.json"
//!
//! [api]
//! base_url = "https://linkedin-data-api.p.rapidapi.com"
//! host = "linkedin-data-api.p.rapidapi.com"
//! endpoint = "/get-profile-posts"
//! key_env = "RAPIDAPI_KEY"
//! timeout_secs = 30
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/posts.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("linkedin_posts.json")
}

/// Remote posts API settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as the `x-rapidapi-host` header.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            host: default_host(),
            endpoint: default_endpoint(),
            key_env: default_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://linkedin-data-api.p.rapidapi.com".to_string()
}
fn default_host() -> String {
    "linkedin-data-api.p.rapidapi.com".to_string()
}
fn default_endpoint() -> String {
    "/get-profile-posts".to_string()
}
fn default_key_env() -> String {
    "RAPIDAPI_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists at the default path.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Full URL of the posts endpoint.
    pub fn posts_url(&self) -> String {
        format!(
            "{}{}",
            self.api.base_url.trim_end_matches('/'),
            self.api.endpoint
        )
    }
}

/// Parse and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to [`Config::minimal`] when the
/// file is absent and `explicit` is false.
pub fn load_or_minimal(path: &Path, explicit: bool) -> Result<Config> {
    if !explicit && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::minimal());
    }
    load_config(path)
}

fn validate(config: &Config) -> Result<()> {
    if config.store.path.as_os_str().is_empty() {
        anyhow::bail!("store.path must not be empty");
    }
    if config.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url must not be empty");
    }
    if config.api.host.trim().is_empty() {
        anyhow::bail!("api.host must not be empty");
    }
    if config.api.key_env.trim().is_empty() {
        anyhow::bail!("api.key_env must not be empty");
    }
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }
    Ok(())
}

/// The posts API key, resolved once at startup and read-only afterwards.
///
/// Cloning shares the same key. `Debug` never prints the key itself.
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: Option<Arc<str>>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        let key: String = api_key.into();
        Self {
            api_key: Some(Arc::from(key)),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Load `.env` (if present) and read the key from `key_env`.
    pub fn from_env(config: &Config) -> Self {
        // A missing .env is normal.
        let _ = dotenv::dotenv();
        match std::env::var(&config.api.key_env) {
            Ok(key) if !key.trim().is_empty() => Self::new(key),
            _ => {
                tracing::debug!(var = %config.api.key_env, "API key not set");
                Self::none()
            }
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
