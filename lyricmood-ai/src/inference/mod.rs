//! AI emotion analysis
//!
//! [`InferenceClient`] sends a fixed prompt to the inference API, runs the
//! reply through [`ResponseRepairPipeline`] and validates the outcome into an
//! [`AnalysisResult`](crate::models::AnalysisResult).

pub mod client;
pub mod prompt;
pub mod repair;

pub use client::{Analysis, InferenceClient};
pub use repair::{EmotionPayload, PayloadSource, ResponseRepairPipeline};
