//! lyricmood-ai library interface
//!
//! Lyrics acquisition and emotion analysis:
//! - [`catalog`]: song search, metadata and lyrics scraping
//! - [`inference`]: prompt, response repair and scoring through the AI API
//! - [`workflow`]: per-song analysis sessions and batches

pub mod catalog;
pub mod config;
pub mod error;
pub mod extractors;
pub mod inference;
pub mod models;
pub mod services;
pub mod validators;
pub mod workflow;

pub use crate::error::{ExternalService, PipelineError, PipelineResult};
