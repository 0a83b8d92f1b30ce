//! Lyrics catalog access
//!
//! # Architecture
//! - [`CatalogSource`]: raw operations (search, metadata, lyrics) against one
//!   backend. [`HttpCatalogSource`] talks to the HTTP API and owns the rate
//!   limiter and the page extractor.
//! - [`CachedCatalogSource`]: decorator adding one response cache per
//!   operation around any source.
//! - [`CatalogClient`]: resolution logic (candidate ranking, exploratory
//!   search) on top of a source. Independent of caching.

pub mod cached_source;
pub mod client;
pub mod http_source;

pub use cached_source::CachedCatalogSource;
pub use client::{CatalogClient, SearchMode};
pub use http_source::HttpCatalogSource;

use crate::error::PipelineResult;
use crate::models::{SearchCandidate, SongMetadata};
use async_trait::async_trait;

/// Raw catalog operations
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Search hits for a query, at most `limit`
    async fn search(&self, query: &str, limit: usize) -> PipelineResult<Vec<SearchCandidate>>;

    /// Full metadata for a catalog identifier
    async fn song_metadata(&self, song_id: u64) -> PipelineResult<SongMetadata>;

    /// Cleaned lyrics text from a song page URL
    async fn lyrics(&self, url: &str) -> PipelineResult<String>;

    /// Cheap authenticated request that bypasses any cache
    async fn ping(&self) -> PipelineResult<()>;
}
