//! Analysis session state machine
//!
//! A session progresses PENDING → IN_PROGRESS → one of COMPLETED, FAILED or
//! CACHED. Terminal states are final.

use crate::models::{AnalysisResult, SongRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Analysis session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Created, nothing requested yet
    Pending,
    /// Catalog resolution or inference running
    InProgress,
    /// Fresh analysis result available
    Completed,
    /// Analysis failed, error message available
    Failed,
    /// Result served from the analysis cache
    Cached,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisStatus::Completed | AnalysisStatus::Failed | AnalysisStatus::Cached
        )
    }

    fn can_transition_to(&self, next: AnalysisStatus) -> bool {
        matches!(
            (self, next),
            (AnalysisStatus::Pending, AnalysisStatus::InProgress)
                | (AnalysisStatus::InProgress, AnalysisStatus::Completed)
                | (AnalysisStatus::InProgress, AnalysisStatus::Failed)
                | (AnalysisStatus::InProgress, AnalysisStatus::Cached)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },
}

/// One song analysis, from request to outcome
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSession {
    pub session_id: Uuid,
    pub song_name: String,
    pub artist_name: String,
    status: AnalysisStatus,
    song: Option<SongRecord>,
    result: Option<AnalysisResult>,
    error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl AnalysisSession {
    pub fn new(song_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            song_name: song_name.into(),
            artist_name: artist_name.into(),
            status: AnalysisStatus::Pending,
            song: None,
            result: None,
            error_message: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn song(&self) -> Option<&SongRecord> {
        self.song.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// PENDING → IN_PROGRESS
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.transition_to(AnalysisStatus::InProgress)
    }

    /// Attach the resolved song while in progress
    pub fn attach_song(&mut self, song: SongRecord) -> Result<(), SessionError> {
        if self.status != AnalysisStatus::InProgress {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: AnalysisStatus::InProgress,
            });
        }
        self.song = Some(song);
        Ok(())
    }

    /// IN_PROGRESS → COMPLETED
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), SessionError> {
        self.transition_to(AnalysisStatus::Completed)?;
        self.result = Some(result);
        self.error_message = None;
        Ok(())
    }

    /// IN_PROGRESS → CACHED
    pub fn complete_from_cache(&mut self, result: AnalysisResult) -> Result<(), SessionError> {
        self.transition_to(AnalysisStatus::Cached)?;
        self.result = Some(result);
        self.error_message = None;
        Ok(())
    }

    /// IN_PROGRESS → FAILED
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.transition_to(AnalysisStatus::Failed)?;
        self.error_message = Some(message.into());
        self.result = None;
        Ok(())
    }

    fn transition_to(&mut self, new_status: AnalysisStatus) -> Result<(), SessionError> {
        if !self.status.can_transition_to(new_status) {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: new_status,
            });
        }

        tracing::debug!(
            session_id = %self.session_id,
            from = ?self.status,
            to = ?new_status,
            "Session transition"
        );

        self.status = new_status;
        if new_status.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Time from creation to the terminal state
    pub fn duration(&self) -> Option<Duration> {
        self.finished_at
            .and_then(|end| (end - self.started_at).to_std().ok())
    }

    /// Completed with a result and no error
    pub fn is_successful(&self) -> bool {
        self.status == AnalysisStatus::Completed
            && self.result.is_some()
            && self.error_message.is_none()
    }

    /// Resolved song title, or the requested names before resolution
    pub fn display_title(&self) -> String {
        match &self.song {
            Some(song) => song.full_title(),
            None => format!("{} - {}", self.song_name, self.artist_name),
        }
    }
}

/// Collection of past sessions
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisHistory {
    sessions: Vec<AnalysisSession>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, session: AnalysisSession) {
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[AnalysisSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn successful(&self) -> Vec<&AnalysisSession> {
        self.sessions.iter().filter(|s| s.is_successful()).collect()
    }

    /// Most recently started first
    pub fn recent(&self, count: usize) -> Vec<&AnalysisSession> {
        let mut sessions: Vec<_> = self.sessions.iter().collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(count);
        sessions
    }

    /// Successful sessions divided by all sessions, 0.0 when empty
    pub fn success_rate(&self) -> f64 {
        if self.sessions.is_empty() {
            return 0.0;
        }
        self.successful().len() as f64 / self.sessions.len() as f64
    }

    /// First session whose resolved song matches, case-insensitively
    pub fn find_by_song(&self, title: &str, artist: &str) -> Option<&AnalysisSession> {
        let title = title.to_lowercase();
        let artist = artist.to_lowercase();
        self.sessions.iter().find(|s| {
            s.song.as_ref().is_some_and(|song| {
                song.metadata.title.to_lowercase() == title
                    && song.metadata.artist.to_lowercase() == artist
            })
        })
    }
}
