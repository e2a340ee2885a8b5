//! Ingestion against a local mock of the posts API, followed by queries
//! over the resulting store.

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use post_harness::config::{Config, Credentials};
use post_harness::ingest::{fetch_and_save_posts, IngestError};
use post_harness::query;
use post_harness::store::{JsonFileStore, PostStore};
use post_harness::PostRecord;
use serde_json::{json, Value};
use std::collections::HashMap;
use tempfile::TempDir;

const TEST_KEY: &str = "test-key";

fn sample_payload() -> Value {
    json!({
        "success": true,
        "data": [
            {
                "postUrl": "https://example.com/p/1",
                "text": "Shipping Rust to production",
                "likeCount": 40,
                "totalReactionCount": 55,
                "postedDate": "2024-01-15",
                "postedDateTimestamp": 1705312800000u64,
                "shareUrl": "https://example.com/s/1",
                "author": {
                    "firstName": "Grace",
                    "lastName": "Hopper",
                    "url": "https://example.com/in/grace",
                    "headline": "Rear Admiral",
                    "profilePictures": [{ "url": "https://img.example.com/grace.png" }]
                },
                "image": [
                    { "url": "https://img.example.com/a.png" },
                    { "url": "https://img.example.com/b.png" }
                ]
            },
            {
                "postUrl": "https://example.com/p/2",
                "text": "A quiet post",
                "likeCount": 3,
                "postedDate": "2023-12-31"
            },
            {}
        ]
    })
}

/// Serves `/get-profile-posts`. Requests without the expected key get a 403;
/// the username `broken` gets a 500. ` padded ` only matches when the
/// surrounding spaces arrive intact.
async fn posts_handler(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let key = headers
        .get("x-rapidapi-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let host = headers
        .get("x-rapidapi-host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if key != TEST_KEY || host != "linkedin-data-api.p.rapidapi.com" {
        return (StatusCode::FORBIDDEN, "invalid key".to_string()).into_response();
    }

    match params.get("username").map(String::as_str) {
        Some("broken") => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded".to_string())
            .into_response(),
        Some("nobody") => Json(json!({ "success": true, "message": "no posts" })).into_response(),
        Some("garbage") => (StatusCode::OK, "<html>not json</html>".to_string()).into_response(),
        Some(" padded ") => {
            Json(json!({ "data": [{ "text": "exact handle" }] })).into_response()
        }
        Some(_) => Json(sample_payload()).into_response(),
        None => (StatusCode::BAD_REQUEST, "username required".to_string()).into_response(),
    }
}

async fn start_mock_api() -> String {
    let app = Router::new().route("/get-profile-posts", get(posts_handler));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config_for(base_url: &str, tmp: &TempDir) -> Config {
    let mut config = Config::minimal();
    config.api.base_url = base_url.to_string();
    config.api.timeout_secs = 5;
    config.store.path = tmp.path().join("linkedin_posts.json");
    config
}

#[tokio::test]
async fn test_ingest_writes_all_normalized_records() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    let message = fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, "grace")
        .await
        .unwrap();
    assert!(message.starts_with("Data saved in "));
    assert!(message.contains("linkedin_posts.json"));

    let posts = store.load().unwrap();
    assert_eq!(posts.len(), 3);

    let first = &posts[0];
    assert_eq!(first.author_name, "Grace Hopper");
    assert_eq!(first.author_profile_picture, "https://img.example.com/grace.png");
    assert_eq!(first.main_image, "https://img.example.com/a.png");
    assert_eq!(
        first.all_images,
        "https://img.example.com/a.png, https://img.example.com/b.png"
    );
    assert_eq!(first.total_reactions, 55);

    let second = &posts[1];
    assert_eq!(second.like_count, 3);
    assert_eq!(second.total_reactions, 0);
    assert_eq!(second.author_name, " ");

    assert_eq!(posts[2], PostRecord {
        author_name: " ".to_string(),
        ..Default::default()
    });
}

#[tokio::test]
async fn test_ingest_then_paginate_roundtrip() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, "grace")
        .await
        .unwrap();

    let page = query::get_saved_posts(&store, 0, 5).found().unwrap();
    assert_eq!(page.total_posts, 3);
    assert!(!page.has_more);
    assert_eq!(page.posts, store.load().unwrap());
    assert_eq!(page.posts[0].text, "Shipping Rust to production");
}

#[tokio::test]
async fn test_non_success_status_leaves_store_untouched() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    let existing = vec![PostRecord {
        text: "keep me".to_string(),
        ..Default::default()
    }];
    store.save(&existing).unwrap();
    let before = std::fs::read_to_string(&config.store.path).unwrap();

    let err = fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, "broken")
        .await
        .unwrap_err();
    match err {
        IngestError::RemoteApi { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected RemoteApi, got {:?}", other),
    }

    let err = fetch_and_save_posts(&config, &Credentials::new("wrong"), &store, "grace")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"));

    let after = std::fs::read_to_string(&config.store.path).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_missing_data_field_writes_empty_store() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, "nobody")
        .await
        .unwrap();
    assert!(store.load().unwrap().is_empty());

    let page = query::get_saved_posts(&store, 0, 5).found().unwrap();
    assert_eq!(page.total_posts, 0);
}

#[tokio::test]
async fn test_undecodable_body_is_fatal() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    let err = fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, "garbage")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Decode(_)));
    assert!(!config.store.path.exists());
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tmp = TempDir::new().unwrap();
    let config = config_for(&format!("http://{}", addr), &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    let err = fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, "grace")
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Transport(_)));
}

#[tokio::test]
async fn test_reingest_replaces_previous_contents() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());
    let creds = Credentials::new(TEST_KEY);

    fetch_and_save_posts(&config, &creds, &store, "grace").await.unwrap();
    assert_eq!(store.load().unwrap().len(), 3);

    fetch_and_save_posts(&config, &creds, &store, "nobody").await.unwrap();
    assert!(store.load().unwrap().is_empty());
    assert!(query::search_posts(&store, "rust").is_reported());
}

#[tokio::test]
async fn test_username_sent_as_given() {
    let base = start_mock_api().await;
    let tmp = TempDir::new().unwrap();
    let config = config_for(&base, &tmp);
    let store = JsonFileStore::new(config.store.path.clone());

    fetch_and_save_posts(&config, &Credentials::new(TEST_KEY), &store, " padded ")
        .await
        .unwrap();
    let posts = store.load().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "exact handle");
}
