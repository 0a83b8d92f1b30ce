//! Catalog HTTP API client
//!
//! # API Reference
//! - Search: `GET {base}/search?q=...&per_page=...`
//! - Metadata: `GET {base}/songs/{id}`
//! - Lyrics: `GET` of the song's canonical page URL (HTML)
//!
//! Search and metadata requests need a bearer token and pass through the
//! sliding-window rate limiter. Page fetches are plain unauthenticated GETs.

use crate::catalog::CatalogSource;
use crate::error::{ExternalService, PipelineError, PipelineResult};
use crate::extractors::LyricsExtractor;
use crate::models::{SearchCandidate, SongMetadata};
use crate::services::RateLimiter;
use async_trait::async_trait;
use lyricmood_common::config::CatalogSettings;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info};

const SERVICE: ExternalService = ExternalService::Catalog;

/// Largest page size the search endpoint accepts
pub const MAX_PAGE_SIZE: usize = 50;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    result: Option<SongData>,
}

#[derive(Debug, Deserialize)]
struct SongBody {
    song: Option<SongData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SongData {
    id: u64,
    title: String,
    primary_artist: Option<ArtistRef>,
    url: Option<String>,
    song_art_image_thumbnail_url: Option<String>,
    stats: Option<Stats>,
    album: Option<AlbumRef>,
    release_date_for_display: Option<String>,
    annotation_count: Option<u64>,
    featured_artists: Option<Vec<ArtistRef>>,
    producer_artists: Option<Vec<ArtistRef>>,
    writer_artists: Option<Vec<ArtistRef>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlbumRef {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Stats {
    pageviews: Option<u64>,
}

impl SongData {
    fn artist_name(&self) -> String {
        self.primary_artist
            .as_ref()
            .map(|a| a.name.trim().to_string())
            .unwrap_or_default()
    }

    fn page_views(&self) -> Option<u64> {
        self.stats.as_ref().and_then(|s| s.pageviews)
    }

    /// Hits without an id, title or artist are dropped
    fn into_candidate(self) -> Option<SearchCandidate> {
        let artist = self.artist_name();
        let title = self.title.trim().to_string();
        if self.id == 0 || title.is_empty() || artist.is_empty() {
            return None;
        }

        Some(SearchCandidate {
            id: self.id,
            page_views: self.page_views(),
            title,
            artist,
            url: self.url.unwrap_or_default(),
            thumbnail_url: self.song_art_image_thumbnail_url,
        })
    }

    fn into_metadata(self) -> SongMetadata {
        let names = |artists: Option<Vec<ArtistRef>>| -> Vec<String> {
            artists
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.name)
                .collect()
        };

        SongMetadata {
            id: self.id,
            title: self.title.trim().to_string(),
            artist: self.artist_name(),
            page_views: self.page_views(),
            album: self.album.and_then(|a| a.name),
            release_date: self.release_date_for_display,
            url: self.url,
            thumbnail_url: self.song_art_image_thumbnail_url,
            annotation_count: self.annotation_count,
            featured_artists: names(self.featured_artists),
            producers: names(self.producer_artists),
            writers: names(self.writer_artists),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Catalog source backed by the HTTP API
pub struct HttpCatalogSource {
    http_client: Client,
    base_url: String,
    access_token: String,
    rate_limiter: RateLimiter,
    extractor: LyricsExtractor,
}

impl HttpCatalogSource {
    pub fn new(settings: &CatalogSettings, access_token: String) -> PipelineResult<Self> {
        let http_client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()
            .map_err(|e| PipelineError::network(SERVICE, "build_client", e))?;

        info!(
            base_url = %settings.base_url,
            max_requests = settings.rate_limit_requests,
            window_secs = settings.rate_limit_window_secs,
            "Catalog client initialized"
        );

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            access_token,
            rate_limiter: RateLimiter::new(
                SERVICE,
                settings.rate_limit_requests,
                settings.rate_limit_window(),
            ),
            extractor: LyricsExtractor::new(),
        })
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Rate-limited, authenticated GET returning a JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> PipelineResult<T> {
        self.rate_limiter.check(operation)?;

        let started = Instant::now();
        let response = request
            .bearer_auth(&self.access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PipelineError::network(SERVICE, operation, e))?;

        let status = response.status();
        debug!(
            service = %SERVICE,
            operation = operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Catalog API response"
        );

        if !status.is_success() {
            return Err(error_from_response(operation, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::network(SERVICE, operation, e))?;

        serde_json::from_str(&body).map_err(|e| PipelineError::MalformedResponse {
            service: SERVICE,
            operation,
            message: e.to_string(),
        })
    }

    async fn search_page(&self, query: &str, limit: usize) -> PipelineResult<Vec<SearchCandidate>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let per_page = limit.clamp(1, MAX_PAGE_SIZE);
        let request = self
            .http_client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query.to_string()), ("per_page", per_page.to_string())]);

        let envelope: Envelope<SearchBody> = self.get_json("search", request).await?;

        let candidates: Vec<SearchCandidate> = envelope
            .response
            .hits
            .into_iter()
            .filter_map(|hit| hit.result.and_then(SongData::into_candidate))
            .take(limit)
            .collect();

        info!(
            query = %query,
            results = candidates.len(),
            "Catalog search completed"
        );

        Ok(candidates)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn search(&self, query: &str, limit: usize) -> PipelineResult<Vec<SearchCandidate>> {
        self.search_page(query, limit).await
    }

    async fn song_metadata(&self, song_id: u64) -> PipelineResult<SongMetadata> {
        if song_id == 0 {
            return Err(PipelineError::InvalidInput(
                "Song id must be positive".to_string(),
            ));
        }

        let request = self
            .http_client
            .get(format!("{}/songs/{}", self.base_url, song_id));
        let envelope: Envelope<SongBody> = self.get_json("song_metadata", request).await?;

        let song = envelope
            .response
            .song
            .ok_or_else(|| PipelineError::NotFound(format!("No song data for id {}", song_id)))?;

        let metadata = song.into_metadata();
        debug!(
            song_id = song_id,
            title = %metadata.title,
            artist = %metadata.artist,
            "Retrieved song metadata"
        );
        Ok(metadata)
    }

    async fn lyrics(&self, url: &str) -> PipelineResult<String> {
        const OPERATION: &str = "fetch_lyrics_page";

        if url.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "Lyrics page URL is required".to_string(),
            ));
        }

        let started = Instant::now();
        let response = self
            .http_client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| PipelineError::network(SERVICE, OPERATION, e))?;

        if !response.status().is_success() {
            return Err(error_from_response(OPERATION, response).await);
        }

        let html = response
            .text()
            .await
            .map_err(|e| PipelineError::network(SERVICE, OPERATION, e))?;

        let lyrics = self.extractor.extract(&html)?;
        debug!(
            url = %url,
            characters = lyrics.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Lyrics page scraped"
        );
        Ok(lyrics)
    }

    async fn ping(&self) -> PipelineResult<()> {
        self.search_page("test", 1).await?;
        info!("Catalog API connection validated");
        Ok(())
    }
}

async fn error_from_response(operation: &'static str, response: reqwest::Response) -> PipelineError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();

    tracing::warn!(
        service = %SERVICE,
        operation = operation,
        status = status.as_u16(),
        "Catalog request failed"
    );

    PipelineError::from_status(SERVICE, operation, status, retry_after.as_deref(), body)
}
