//! Building blocks shared by the external-service clients
//!
//! - Sliding-window admission control
//! - TTL/capacity bounded response caches
//! - Word-set similarity for candidate ranking

pub mod rate_limiter;
pub mod response_cache;
pub mod similarity;

pub use rate_limiter::RateLimiter;
pub use response_cache::ResponseCache;
pub use similarity::{similarity, MatchScore};
