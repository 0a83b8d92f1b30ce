//! # LyricMood Common Library
//!
//! Shared code for the LyricMood crates:
//! - Error type used by configuration and IO helpers
//! - TOML configuration schema and loading
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
