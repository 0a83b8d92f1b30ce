//! Song analysis pipeline
//!
//! Drives one [`AnalysisSession`] per requested song: resolve through the
//! catalog, then analyse the lyrics. Failures end the session in `Failed`
//! instead of aborting the caller, so a batch always yields one session per
//! request.
//!
//! Batches are processed sequentially with a fixed delay between songs; the
//! external APIs enforce per-minute quotas.

use crate::catalog::CatalogClient;
use crate::error::{PipelineError, PipelineResult};
use crate::inference::{Analysis, InferenceClient};
use crate::models::{AnalysisSession, SessionError};
use std::time::Duration;
use tracing::{error, info, warn};

/// A requested (song, artist) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRequest {
    pub song_name: String,
    pub artist_name: String,
}

impl SongRequest {
    pub fn new(song_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            song_name: song_name.into(),
            artist_name: artist_name.into(),
        }
    }

    /// Parse a `Song - Artist` line
    ///
    /// Splits on the last " - " so song titles may contain the separator.
    pub fn parse_line(line: &str) -> PipelineResult<Self> {
        let (song, artist) = line.trim().rsplit_once(" - ").ok_or_else(|| {
            PipelineError::InvalidInput(format!("Expected 'Song - Artist', got '{}'", line.trim()))
        })?;

        let (song, artist) = (song.trim(), artist.trim());
        if song.is_empty() || artist.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "Song and artist are both required: '{}'",
                line.trim()
            )));
        }
        Ok(Self::new(song, artist))
    }

    /// Parse a batch file body, skipping blank lines and `#` comments
    pub fn parse_batch(body: &str) -> PipelineResult<Vec<Self>> {
        body.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(Self::parse_line)
            .collect()
    }
}

/// Catalog resolution followed by emotion analysis
pub struct LyricMoodPipeline {
    catalog: CatalogClient,
    inference: InferenceClient,
    batch_delay: Duration,
}

impl LyricMoodPipeline {
    pub fn new(catalog: CatalogClient, inference: InferenceClient, batch_delay: Duration) -> Self {
        Self {
            catalog,
            inference,
            batch_delay,
        }
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    pub fn inference(&self) -> &InferenceClient {
        &self.inference
    }

    /// Analyse one song; the returned session is always terminal
    pub async fn run(&self, song_name: &str, artist_name: &str) -> AnalysisSession {
        let mut session = AnalysisSession::new(song_name, artist_name);

        if let Err(e) = self.drive(&mut session).await {
            // Transitions follow a fixed order, so this only fires on a logic error
            error!(session_id = %session.session_id, error = %e, "Session state error");
        }

        session
    }

    async fn drive(&self, session: &mut AnalysisSession) -> Result<(), SessionError> {
        session.start()?;
        info!(
            session_id = %session.session_id,
            song = %session.song_name,
            artist = %session.artist_name,
            "Analysis session started"
        );

        let song = match self
            .catalog
            .resolve(&session.song_name, &session.artist_name)
            .await
        {
            Ok(song) => song,
            Err(e) => {
                warn!(session_id = %session.session_id, error = %e, "Song resolution failed");
                return session.fail(e.to_string());
            }
        };

        let lyrics = song.lyrics.content().to_string();
        session.attach_song(song)?;

        match self.inference.analyze_detailed(&lyrics).await {
            Ok(Analysis {
                result,
                from_cache: true,
            }) => session.complete_from_cache(result)?,
            Ok(Analysis { result, .. }) => session.complete(result)?,
            Err(e) => {
                warn!(session_id = %session.session_id, error = %e, "Emotion analysis failed");
                return session.fail(e.to_string());
            }
        }

        info!(
            session_id = %session.session_id,
            title = %session.display_title(),
            status = ?session.status(),
            "Analysis session finished"
        );
        Ok(())
    }

    /// Analyse several songs one after another, pausing between them
    pub async fn run_batch(&self, requests: &[SongRequest]) -> Vec<AnalysisSession> {
        let mut sessions = Vec::with_capacity(requests.len());
        info!(songs = requests.len(), "Starting batch analysis");

        for (index, request) in requests.iter().enumerate() {
            if index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let session = self.run(&request.song_name, &request.artist_name).await;
            info!(
                progress = %format!("{}/{}", index + 1, requests.len()),
                status = ?session.status(),
                "Batch item finished"
            );
            sessions.push(session);
        }

        let succeeded = sessions.iter().filter(|s| s.result().is_some()).count();
        info!(
            succeeded = succeeded,
            total = sessions.len(),
            "Batch analysis completed"
        );
        sessions
    }
}
