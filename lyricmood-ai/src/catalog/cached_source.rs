//! Caching decorator for catalog sources
//!
//! Each operation has its own cache and keyspace: search by normalised query
//! and limit, metadata by song id, lyrics by page URL. Only successful
//! responses are stored.

use crate::catalog::CatalogSource;
use crate::error::PipelineResult;
use crate::models::{SearchCandidate, SongMetadata};
use crate::services::ResponseCache;
use async_trait::async_trait;
use std::time::Duration;

/// Catalog source wrapper that caches successful responses
pub struct CachedCatalogSource<S> {
    inner: S,
    search_cache: ResponseCache<(String, usize), Vec<SearchCandidate>>,
    metadata_cache: ResponseCache<u64, SongMetadata>,
    lyrics_cache: ResponseCache<String, String>,
}

impl<S: CatalogSource> CachedCatalogSource<S> {
    pub fn new(inner: S, capacity: usize, ttl: Duration) -> Self {
        Self {
            inner,
            search_cache: ResponseCache::new("catalog_search", capacity, ttl),
            metadata_cache: ResponseCache::new("catalog_metadata", capacity, ttl),
            lyrics_cache: ResponseCache::new("catalog_lyrics", capacity, ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached response
    pub fn clear(&self) {
        self.search_cache.clear();
        self.metadata_cache.clear();
        self.lyrics_cache.clear();
    }

    /// Entry counts for (search, metadata, lyrics)
    pub fn cache_sizes(&self) -> (usize, usize, usize) {
        (
            self.search_cache.len(),
            self.metadata_cache.len(),
            self.lyrics_cache.len(),
        )
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedCatalogSource<S> {
    async fn search(&self, query: &str, limit: usize) -> PipelineResult<Vec<SearchCandidate>> {
        let key = (query.trim().to_lowercase(), limit);
        if let Some(hit) = self.search_cache.get(&key) {
            return Ok(hit);
        }

        let results = self.inner.search(query, limit).await?;
        self.search_cache.put(key, results.clone());
        Ok(results)
    }

    async fn song_metadata(&self, song_id: u64) -> PipelineResult<SongMetadata> {
        if let Some(hit) = self.metadata_cache.get(&song_id) {
            return Ok(hit);
        }

        let metadata = self.inner.song_metadata(song_id).await?;
        self.metadata_cache.put(song_id, metadata.clone());
        Ok(metadata)
    }

    async fn lyrics(&self, url: &str) -> PipelineResult<String> {
        let key = url.to_string();
        if let Some(hit) = self.lyrics_cache.get(&key) {
            return Ok(hit);
        }

        let lyrics = self.inner.lyrics(url).await?;
        self.lyrics_cache.put(key, lyrics.clone());
        Ok(lyrics)
    }

    async fn ping(&self) -> PipelineResult<()> {
        self.inner.ping().await
    }
}
