//! Input Validator
//!
//! Trims and length-checks user-supplied names before any request is sent.
//! Lengths are counted in characters.

use crate::error::{PipelineError, PipelineResult};
use tracing::debug;

pub const MIN_SONG_NAME_LENGTH: usize = 1;
pub const MAX_SONG_NAME_LENGTH: usize = 200;
pub const MIN_ARTIST_NAME_LENGTH: usize = 1;
pub const MAX_ARTIST_NAME_LENGTH: usize = 100;

/// Validates song and artist names
#[derive(Debug, Default, Clone, Copy)]
pub struct InputValidator;

impl InputValidator {
    pub fn new() -> Self {
        Self
    }

    /// Trimmed song name, 1 to 200 characters
    pub fn validate_song_name(&self, song_name: &str) -> PipelineResult<String> {
        let cleaned = check_length(
            "Song name",
            song_name,
            MIN_SONG_NAME_LENGTH,
            MAX_SONG_NAME_LENGTH,
        )?;
        debug!(song = %cleaned, "Song name validated");
        Ok(cleaned)
    }

    /// Trimmed artist name, 1 to 100 characters
    pub fn validate_artist_name(&self, artist_name: &str) -> PipelineResult<String> {
        let cleaned = check_length(
            "Artist name",
            artist_name,
            MIN_ARTIST_NAME_LENGTH,
            MAX_ARTIST_NAME_LENGTH,
        )?;
        debug!(artist = %cleaned, "Artist name validated");
        Ok(cleaned)
    }

    /// Validate both names together
    pub fn validate_song_input(
        &self,
        song_name: &str,
        artist_name: &str,
    ) -> PipelineResult<(String, String)> {
        Ok((
            self.validate_song_name(song_name)?,
            self.validate_artist_name(artist_name)?,
        ))
    }
}

fn check_length(label: &str, raw: &str, min: usize, max: usize) -> PipelineResult<String> {
    let cleaned = raw.trim();
    let len = cleaned.chars().count();

    if len < min {
        return Err(PipelineError::InvalidInput(format!(
            "{} must be at least {} characters",
            label, min
        )));
    }

    if len > max {
        return Err(PipelineError::InvalidInput(format!(
            "{} must not exceed {} characters",
            label, max
        )));
    }

    Ok(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_names() {
        let validator = InputValidator::new();
        let (song, artist) = validator
            .validate_song_input("  Hey Jude ", "\tThe Beatles\n")
            .unwrap();
        assert_eq!(song, "Hey Jude");
        assert_eq!(artist, "The Beatles");
    }

    #[test]
    fn test_rejects_blank_and_overlong() {
        let validator = InputValidator::new();
        assert!(matches!(
            validator.validate_song_name("   "),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(validator.validate_song_name(&"a".repeat(200)).is_ok());
        assert!(validator.validate_song_name(&"a".repeat(201)).is_err());
        assert!(validator.validate_artist_name(&"b".repeat(100)).is_ok());
        assert!(validator.validate_artist_name(&"b".repeat(101)).is_err());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let validator = InputValidator::new();
        assert!(validator.validate_artist_name(&"é".repeat(100)).is_ok());
    }
}
