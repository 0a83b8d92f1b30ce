//! Extractors for semi-structured catalog content
//!
//! - **lyrics_extractor** - Lyric text from catalog song pages (HTML)

pub mod lyrics_extractor;

pub use lyrics_extractor::{clean_lyrics, LyricsExtractor};
