//! Test helper utilities
//!
//! An in-process axum server standing in for both external services:
//! - `GET /search`, `GET /songs/:id`, `GET /pages/:id` (catalog)
//! - `POST /chat/completions` (inference)

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::capture_logs;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lyricmood_common::config::{CatalogSettings, InferenceSettings};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Song served by the mock catalog
#[derive(Debug, Clone)]
pub struct MockSong {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub page_html: String,
}

impl MockSong {
    pub fn new(id: u64, title: &str, artist: &str, page_html: String) -> Self {
        Self {
            id,
            title: title.to_string(),
            artist: artist.to_string(),
            page_html,
        }
    }
}

/// Canned failure: status plus optional Retry-After header
#[derive(Debug, Clone, Copy)]
pub struct Failure {
    pub status: StatusCode,
    pub retry_after: Option<&'static str>,
}

impl Failure {
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after: &'static str) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            retry_after: Some(retry_after),
        }
    }

    fn into_response(self) -> Response {
        match self.retry_after {
            Some(secs) => (self.status, [(header::RETRY_AFTER, secs)], "error").into_response(),
            None => (self.status, "error").into_response(),
        }
    }
}

/// Mock behaviour
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub songs: Vec<MockSong>,
    pub chat_content: String,
    pub search_failure: Option<Failure>,
    pub chat_failure: Option<Failure>,
}

/// Shared server state; counters and captured requests are public for assertions
pub struct MockServer {
    pub base_url: String,
    config: MockConfig,
    pub search_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub search_queries: Mutex<Vec<HashMap<String, String>>>,
    pub chat_requests: Mutex<Vec<Value>>,
    pub authorizations: Mutex<Vec<String>>,
}

impl MockServer {
    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn chats(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_chat_request(&self) -> Value {
        self.chat_requests.lock().unwrap().last().cloned().unwrap()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        self.authorizations.lock().unwrap().push(value);
    }
}

type Shared = Arc<MockServer>;

async fn search(
    State(server): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    server.search_calls.fetch_add(1, Ordering::SeqCst);
    server.record_auth(&headers);
    server.search_queries.lock().unwrap().push(params.clone());

    if let Some(failure) = server.config.search_failure {
        return failure.into_response();
    }

    let per_page: usize = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10);

    let hits: Vec<Value> = server
        .config
        .songs
        .iter()
        .take(per_page)
        .map(|song| {
            json!({
                "type": "song",
                "result": {
                    "id": song.id,
                    "title": song.title,
                    "primary_artist": {"name": song.artist},
                    "url": format!("{}/pages/{}", server.base_url, song.id),
                    "stats": {"pageviews": 1000 + song.id}
                }
            })
        })
        .collect();

    Json(json!({"meta": {"status": 200}, "response": {"hits": hits}})).into_response()
}

async fn song(State(server): State<Shared>, headers: HeaderMap, Path(id): Path<u64>) -> Response {
    server.metadata_calls.fetch_add(1, Ordering::SeqCst);
    server.record_auth(&headers);

    match server.config.songs.iter().find(|s| s.id == id) {
        Some(song) => Json(json!({
            "response": {
                "song": {
                    "id": song.id,
                    "title": song.title,
                    "primary_artist": {"name": song.artist},
                    "album": {"name": format!("{} Album", song.artist)},
                    "release_date_for_display": "January 1, 2000",
                    "url": format!("{}/pages/{}", server.base_url, song.id),
                    "annotation_count": 2,
                    "featured_artists": [],
                    "producer_artists": [{"name": "Producer"}],
                    "writer_artists": null
                }
            }
        }))
        .into_response(),
        None => (StatusCode::NOT_FOUND, "no such song").into_response(),
    }
}

async fn page(State(server): State<Shared>, Path(id): Path<u64>) -> Response {
    server.page_calls.fetch_add(1, Ordering::SeqCst);

    match server.config.songs.iter().find(|s| s.id == id) {
        Some(song) => Html(song.page_html.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, "no such page").into_response(),
    }
}

async fn chat(State(server): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    server.chat_calls.fetch_add(1, Ordering::SeqCst);
    server.record_auth(&headers);
    server.chat_requests.lock().unwrap().push(body);

    if let Some(failure) = server.config.chat_failure {
        return failure.into_response();
    }

    Json(json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": server.config.chat_content},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

/// Start the mock server on an ephemeral port
pub async fn spawn_mock(config: MockConfig) -> Arc<MockServer> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let server = Arc::new(MockServer {
        base_url,
        config,
        search_calls: AtomicUsize::new(0),
        metadata_calls: AtomicUsize::new(0),
        page_calls: AtomicUsize::new(0),
        chat_calls: AtomicUsize::new(0),
        search_queries: Mutex::new(Vec::new()),
        chat_requests: Mutex::new(Vec::new()),
        authorizations: Mutex::new(Vec::new()),
    });

    let router = Router::new()
        .route("/search", get(search))
        .route("/songs/:id", get(song))
        .route("/pages/:id", get(page))
        .route("/chat/completions", post(chat))
        .with_state(server.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    server
}

/// Song page with the lyrics split over two containers plus page chrome
pub fn lyrics_page(lines: &[&str]) -> String {
    let (first, second) = lines.split_at(lines.len() / 2);
    format!(
        r#"<!DOCTYPE html>
<html><head><title>Lyrics</title><script>window.tracking = true;</script></head>
<body>
  <header><div class="Header">Site navigation</div></header>
  <div data-lyrics-container="true">[Verse 1]<br/>{}</div>
  <div class="ad-slot">Sponsored content goes here</div>
  <div data-lyrics-container="true">[Chorus]<br/>{}</div>
  <footer>12 Contributors</footer>
</body></html>"#,
        first.join("<br/>"),
        second.join("<br/>")
    )
}

pub fn catalog_settings(base_url: &str) -> CatalogSettings {
    CatalogSettings {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..CatalogSettings::default()
    }
}

pub fn inference_settings(base_url: &str) -> InferenceSettings {
    InferenceSettings {
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
        timeout_secs: 5,
        ..InferenceSettings::default()
    }
}
