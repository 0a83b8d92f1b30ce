//! Song resolution on top of a catalog source
//!
//! `resolve` turns a (song, artist) pair into a complete [`SongRecord`]:
//! search, pick the best candidate, fetch metadata, fetch lyrics. The
//! exploratory searches return filtered candidate lists instead.

use crate::catalog::{CachedCatalogSource, CatalogSource, HttpCatalogSource};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{Lyrics, SearchCandidate, SongRecord};
use crate::services::similarity::{similarity, MatchScore, ARTIST_ONLY_THRESHOLD, TITLE_ONLY_THRESHOLD};
use crate::validators::InputValidator;
use lyricmood_common::config::CatalogSettings;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// Candidates requested when resolving a single song
pub const RESOLVE_SEARCH_LIMIT: usize = 10;

/// Default result count for exploratory searches
pub const DEFAULT_EXPLORE_LIMIT: usize = 20;

/// Substrings that make the auto mode treat a query as a song title.
/// Plain substring matching is a known weak heuristic ("ft" matches "often").
const SONG_INDICATORS: [&str; 6] = ["feat", "ft", "featuring", "remix", "version", "cover"];

/// How `smart_search` interprets its query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Auto,
    Artist,
    Song,
    Combined,
}

impl FromStr for SearchMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(SearchMode::Auto),
            "artist" => Ok(SearchMode::Artist),
            "song" => Ok(SearchMode::Song),
            "combined" => Ok(SearchMode::Combined),
            other => Err(PipelineError::InvalidInput(format!(
                "Unknown search mode '{}' (expected auto, artist, song or combined)",
                other
            ))),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Auto => "auto",
            SearchMode::Artist => "artist",
            SearchMode::Song => "song",
            SearchMode::Combined => "combined",
        };
        f.write_str(name)
    }
}

/// Pick the first candidate clearing both similarity thresholds, or the
/// catalog's top-ranked candidate when none does
pub fn select_best_match<'a>(
    candidates: &'a [SearchCandidate],
    song_name: &str,
    artist_name: &str,
) -> Option<&'a SearchCandidate> {
    candidates
        .iter()
        .find(|c| MatchScore::compute(song_name, artist_name, &c.title, &c.artist).is_confident())
        .or_else(|| {
            if !candidates.is_empty() {
                warn!(
                    song = %song_name,
                    artist = %artist_name,
                    "No confident match, using top search result"
                );
            }
            candidates.first()
        })
}

/// Resolves songs against a catalog source
#[derive(Clone)]
pub struct CatalogClient {
    source: Arc<dyn CatalogSource>,
    validator: InputValidator,
}

impl CatalogClient {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            validator: InputValidator::new(),
        }
    }

    /// HTTP source wrapped in the caching decorator
    pub fn from_settings(settings: &CatalogSettings, access_token: String) -> PipelineResult<Self> {
        let http = HttpCatalogSource::new(settings, access_token)?;
        let cached = CachedCatalogSource::new(http, settings.cache_capacity, settings.cache_ttl());
        Ok(Self::new(Arc::new(cached)))
    }

    /// Resolve a song name and artist to a complete record
    pub async fn resolve(&self, song_name: &str, artist_name: &str) -> PipelineResult<SongRecord> {
        let (song_name, artist_name) = self.validator.validate_song_input(song_name, artist_name)?;
        let query = format!("{} {}", song_name, artist_name);

        info!(song = %song_name, artist = %artist_name, "Resolving song");

        let candidates = self.source.search(&query, RESOLVE_SEARCH_LIMIT).await?;
        let best = select_best_match(&candidates, &song_name, &artist_name).ok_or_else(|| {
            PipelineError::NotFound(format!(
                "No search results for '{}' by '{}'",
                song_name, artist_name
            ))
        })?;

        let metadata = self.source.song_metadata(best.id).await?;
        let page_url = metadata
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| best.url.clone());

        let lyrics = match self.source.lyrics(&page_url).await.and_then(|text| Lyrics::new(&text)) {
            Ok(lyrics) => lyrics,
            Err(PipelineError::LyricsNotFound(reason)) => {
                warn!(
                    song = %song_name,
                    artist = %artist_name,
                    reason = %reason,
                    "Could not extract lyrics"
                );
                return Err(PipelineError::NotFound(format!(
                    "No lyrics found for '{}' by '{}'",
                    song_name, artist_name
                )));
            }
            Err(e) => return Err(e),
        };

        let record = SongRecord::new(metadata, lyrics, Some(query));
        info!(
            song_id = record.id(),
            title = %record.full_title(),
            words = record.lyrics.word_count(),
            "Song resolved"
        );
        Ok(record)
    }

    /// Songs whose artist resembles `artist_name`, at most `limit`
    pub async fn resolve_by_artist_only(
        &self,
        artist_name: &str,
        limit: usize,
    ) -> PipelineResult<Vec<SearchCandidate>> {
        let artist_name = self.validator.validate_artist_name(artist_name)?;
        let fetch = (limit * 2).min(crate::catalog::http_source::MAX_PAGE_SIZE);

        let matches: Vec<SearchCandidate> = self
            .source
            .search(&artist_name, fetch)
            .await?
            .into_iter()
            .filter(|c| similarity(&artist_name, &c.artist) > ARTIST_ONLY_THRESHOLD)
            .take(limit)
            .collect();

        info!(artist = %artist_name, results = matches.len(), "Artist search completed");
        Ok(matches)
    }

    /// Songs whose title resembles `song_name`
    pub async fn resolve_by_title_only(
        &self,
        song_name: &str,
        limit: usize,
    ) -> PipelineResult<Vec<SearchCandidate>> {
        let song_name = self.validator.validate_song_name(song_name)?;

        let matches: Vec<SearchCandidate> = self
            .source
            .search(&song_name, limit)
            .await?
            .into_iter()
            .filter(|c| similarity(&song_name, &c.title) > TITLE_ONLY_THRESHOLD)
            .collect();

        info!(song = %song_name, results = matches.len(), "Title search completed");
        Ok(matches)
    }

    /// Exploratory search dispatching on `mode`
    pub async fn smart_search(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> PipelineResult<Vec<SearchCandidate>> {
        match mode {
            SearchMode::Artist => self.resolve_by_artist_only(query, DEFAULT_EXPLORE_LIMIT).await,
            SearchMode::Song => self.resolve_by_title_only(query, DEFAULT_EXPLORE_LIMIT).await,
            SearchMode::Combined => self.source.search(query, RESOLVE_SEARCH_LIMIT).await,
            SearchMode::Auto => {
                if looks_like_song_title(query) {
                    return self.resolve_by_title_only(query, DEFAULT_EXPLORE_LIMIT).await;
                }

                let mut combined = self.resolve_by_artist_only(query, 10).await?;
                combined.extend(self.resolve_by_title_only(query, 10).await?);

                let mut seen = HashSet::new();
                combined.retain(|c| seen.insert(c.id));
                combined.truncate(DEFAULT_EXPLORE_LIMIT);
                Ok(combined)
            }
        }
    }

    /// One-result search that bypasses caches
    pub async fn validate_connection(&self) -> PipelineResult<()> {
        self.source.ping().await
    }
}

fn looks_like_song_title(query: &str) -> bool {
    let lower = query.to_lowercase();
    SONG_INDICATORS.iter().any(|indicator| lower.contains(indicator))
}
