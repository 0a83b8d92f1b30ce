//! Per-song analysis workflow
//!
//! Composes the catalog and inference clients into analysis sessions, one
//! song at a time.

pub mod pipeline;

pub use pipeline::{LyricMoodPipeline, SongRequest};
