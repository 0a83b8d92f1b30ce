//! Song data: search candidates, catalog metadata and lyrics

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hit returned by catalog search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Catalog identifier (positive)
    pub id: u64,
    pub title: String,
    pub artist: String,
    /// Canonical lyrics page URL
    pub url: String,
    pub thumbnail_url: Option<String>,
    /// Popularity (page views), when the catalog reports it
    pub page_views: Option<u64>,
}

/// Full catalog metadata for one song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongMetadata {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub release_date: Option<String>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub page_views: Option<u64>,
    pub annotation_count: Option<u64>,
    #[serde(default)]
    pub featured_artists: Vec<String>,
    #[serde(default)]
    pub producers: Vec<String>,
    #[serde(default)]
    pub writers: Vec<String>,
}

/// Lyrics text with statistics derived from it
///
/// The text is trimmed and non-empty. Counts are computed once in
/// [`Lyrics::new`] and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lyrics {
    content: String,
    word_count: usize,
    line_count: usize,
    verse_count: usize,
    chorus_count: usize,
    bridge_count: usize,
    character_count: usize,
    retrieved_at: DateTime<Utc>,
}

impl Lyrics {
    pub fn new(text: &str) -> PipelineResult<Self> {
        let content = text.trim();
        if content.is_empty() {
            return Err(PipelineError::LyricsNotFound(
                "lyrics text is empty".to_string(),
            ));
        }

        let lower = content.to_lowercase();
        let section_count =
            |name: &str| lower.matches(&format!("[{}", name)).count() + lower.matches(&format!("{} ", name)).count();

        Ok(Self {
            word_count: content.split_whitespace().count(),
            line_count: content.lines().filter(|l| !l.trim().is_empty()).count(),
            verse_count: section_count("verse"),
            chorus_count: section_count("chorus"),
            bridge_count: section_count("bridge"),
            character_count: content.chars().count(),
            content: content.to_string(),
            retrieved_at: Utc::now(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Non-blank lines
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn verse_count(&self) -> usize {
        self.verse_count
    }

    pub fn chorus_count(&self) -> usize {
        self.chorus_count
    }

    pub fn bridge_count(&self) -> usize {
        self.bridge_count
    }

    pub fn character_count(&self) -> usize {
        self.character_count
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }

    /// Shortened text for display
    ///
    /// Cuts at the last sentence end or line break when that falls past 70%
    /// of `max_len`, otherwise at `max_len` characters. Appends "..." when
    /// anything was cut.
    pub fn preview(&self, max_len: usize) -> String {
        if self.character_count <= max_len {
            return self.content.clone();
        }

        let head: String = self.content.chars().take(max_len).collect();
        let break_point = head
            .char_indices()
            .filter(|(_, c)| *c == '.' || *c == '\n')
            .map(|(i, _)| i)
            .last();

        if let Some(byte_idx) = break_point {
            let char_pos = head[..byte_idx].chars().count();
            if char_pos as f64 > max_len as f64 * 0.7 {
                return format!("{}...", &head[..=byte_idx]);
            }
        }

        format!("{}...", head)
    }
}

/// Fully resolved song: metadata plus lyrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRecord {
    pub metadata: SongMetadata,
    pub lyrics: Lyrics,
    /// Query that led to this record, if it came from a search
    pub search_query: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SongRecord {
    pub fn new(metadata: SongMetadata, lyrics: Lyrics, search_query: Option<String>) -> Self {
        Self {
            metadata,
            lyrics,
            search_query,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.metadata.id
    }

    /// "Title - Artist"
    pub fn full_title(&self) -> String {
        format!("{} - {}", self.metadata.title, self.metadata.artist)
    }

    pub fn lyrics_preview(&self, max_len: usize) -> String {
        self.lyrics.preview(max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lyrics_rejects_blank() {
        assert!(matches!(
            Lyrics::new("  \n\t "),
            Err(PipelineError::LyricsNotFound(_))
        ));
    }

    #[test]
    fn test_lyrics_statistics() {
        let lyrics = Lyrics::new("  Verse one line\n\nchorus here we go\nbridge to nowhere\n").unwrap();
        assert_eq!(lyrics.content(), "Verse one line\n\nchorus here we go\nbridge to nowhere");
        assert_eq!(lyrics.line_count(), 3);
        assert_eq!(lyrics.word_count(), 10);
        assert_eq!(lyrics.verse_count(), 1);
        assert_eq!(lyrics.chorus_count(), 1);
        assert_eq!(lyrics.bridge_count(), 1);
        assert_eq!(lyrics.character_count(), lyrics.content().chars().count());
    }

    #[test]
    fn test_preview_short_text_unchanged() {
        let lyrics = Lyrics::new("short text").unwrap();
        assert_eq!(lyrics.preview(200), "short text");
    }

    #[test]
    fn test_preview_breaks_at_late_line_end() {
        // Line break at char 8 of a 10 char head (> 70%)
        let lyrics = Lyrics::new("abcdefgh\nijklmnop").unwrap();
        assert_eq!(lyrics.preview(10), "abcdefgh\n...");
    }

    #[test]
    fn test_preview_hard_cut_when_break_too_early() {
        let lyrics = Lyrics::new("ab\ncdefghijklmnop").unwrap();
        assert_eq!(lyrics.preview(10), "ab\ncdefghi...");
    }

    #[test]
    fn test_full_title() {
        let metadata = SongMetadata {
            id: 1,
            title: "Yesterday".to_string(),
            artist: "The Beatles".to_string(),
            album: None,
            release_date: None,
            url: None,
            thumbnail_url: None,
            page_views: None,
            annotation_count: None,
            featured_artists: Vec::new(),
            producers: Vec::new(),
            writers: Vec::new(),
        };
        let record = SongRecord::new(metadata, Lyrics::new("Yesterday all my troubles").unwrap(), None);
        assert_eq!(record.full_title(), "Yesterday - The Beatles");
        assert_eq!(record.id(), 1);
    }
}
