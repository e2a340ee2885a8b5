//! Ingestion: fetch a profile's posts and replace the store with them.
//!
//! One GET against the posts endpoint, no retries. The response is
//! normalized into [`PostRecord`]s and written as the complete new store
//! contents. Any failure before the write (missing key, transport error,
//! non-2xx status, undecodable body) leaves the existing store untouched.

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::{Config, Credentials};
use crate::models::{PostRecord, PostsPayload};
use crate::store::{PostStore, StoreError};

/// Fatal ingestion failures. These abort the call; nothing is written.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("API key not configured (set {0})")]
    MissingApiKey(String),

    #[error("username must not be empty")]
    EmptyUsername,

    #[error("Error fetching posts: {status} - {body}")]
    RemoteApi { status: StatusCode, body: String },

    #[error("request to posts API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("posts API returned an unreadable body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to write store: {0}")]
    Store(#[from] StoreError),
}

/// Thin client for the posts endpoint.
pub struct PostsClient {
    http: reqwest::Client,
    url: String,
    host: String,
    api_key: String,
}

impl PostsClient {
    /// Build a client from config, failing early if no key is available.
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self, IngestError> {
        let api_key = credentials
            .api_key()
            .ok_or_else(|| IngestError::MissingApiKey(config.api.key_env.clone()))?
            .to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.posts_url(),
            host: config.api.host.clone(),
            api_key,
        })
    }

    /// Fetch the raw payload for `username`.
    pub async fn fetch(&self, username: &str) -> Result<PostsPayload, IngestError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("username", username)])
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(IngestError::RemoteApi { status, body });
        }

        serde_json::from_str(&body).map_err(IngestError::Decode)
    }
}

/// Fetch posts for `username`, normalize them, and overwrite the store.
///
/// The handle is sent exactly as given; only a blank one is rejected.
///
/// Returns a confirmation naming the store location.
pub async fn fetch_and_save_posts(
    config: &Config,
    credentials: &Credentials,
    store: &dyn PostStore,
    username: &str,
) -> Result<String, IngestError> {
    if username.trim().is_empty() {
        return Err(IngestError::EmptyUsername);
    }

    let client = PostsClient::new(config, credentials)?;
    let payload = client.fetch(username).await?;
    let records: Vec<PostRecord> = payload.into_records();

    store.save(&records)?;

    tracing::info!(
        username,
        count = records.len(),
        location = %store.location(),
        "posts saved"
    );
    Ok(format!("Data saved in {}", store.location()))
}
