//! Validation Layer
//!
//! 1. **input_validator** - User-supplied song and artist names
//! 2. **result_validator** - Emotion scores and confidence bounds

pub mod input_validator;
pub mod result_validator;

pub use input_validator::InputValidator;
pub use result_validator::{validate_confidence, validate_scores};
