//! Data models for lyricmood-ai
//!
//! - Song data returned by the catalog
//! - Emotion scores and validated analysis results
//! - Analysis session state machine and history

pub mod analysis_session;
pub mod emotion;
pub mod song;

pub use analysis_session::{AnalysisHistory, AnalysisSession, AnalysisStatus, SessionError};
pub use emotion::{AnalysisQuality, AnalysisResult, EmotionCategory, EmotionScores};
pub use song::{Lyrics, SearchCandidate, SongMetadata, SongRecord};
