//! Error types for lyricmood-ai
//!
//! Transport-level kinds (`Unauthorized`, `RateLimited`, `Network`, `Service`,
//! `Request`) carry the external service and operation so callers can decide
//! between retrying and aborting. None of them is retried inside the pipeline.

use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Retry hint used when a 429 response has no usable Retry-After header
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Maximum number of response-body characters kept in a `Request` error
const MAX_ERROR_BODY_CHARS: usize = 500;

/// External HTTP service a request was sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalService {
    /// Lyrics catalog (search, metadata, lyrics pages)
    Catalog,
    /// AI inference API
    Inference,
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalService::Catalog => write!(f, "catalog"),
            ExternalService::Inference => write!(f, "inference"),
        }
    }
}

/// Pipeline error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Credentials missing or rejected (401/403)
    #[error("{service} rejected credentials during {operation}")]
    Unauthorized {
        service: ExternalService,
        operation: &'static str,
    },

    /// Quota exceeded, either locally or reported by the service (429)
    #[error("{service} rate limit exceeded during {operation}, retry after {}s", retry_after.as_secs())]
    RateLimited {
        service: ExternalService,
        operation: &'static str,
        retry_after: Duration,
    },

    /// Timeout, connection failure or other transport error
    #[error("{service} network error during {operation}: {message}")]
    Network {
        service: ExternalService,
        operation: &'static str,
        message: String,
    },

    /// Server-side failure (5xx)
    #[error("{service} service error {status} during {operation}")]
    Service {
        service: ExternalService,
        operation: &'static str,
        status: u16,
    },

    /// Any other rejected request (4xx), with the response body
    #[error("{service} request failed with {status} during {operation}: {body}")]
    Request {
        service: ExternalService,
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Typed API returned a body that does not match its documented shape
    #[error("{service} returned a malformed response during {operation}: {message}")]
    MalformedResponse {
        service: ExternalService,
        operation: &'static str,
        message: String,
    },

    /// No search candidates, or no lyrics could be extracted
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTML page held no usable lyrics
    #[error("Lyrics not found: {0}")]
    LyricsNotFound(String),

    /// Empty input, or no well-formed analysis could be produced
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Scores or confidence outside their allowed ranges
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller input rejected before any request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// lyricmood-common error
    #[error("Common error: {0}")]
    Common(#[from] lyricmood_common::Error),
}

impl PipelineError {
    /// External service involved, if this is a service-level error
    pub fn service(&self) -> Option<ExternalService> {
        match self {
            PipelineError::Unauthorized { service, .. }
            | PipelineError::RateLimited { service, .. }
            | PipelineError::Network { service, .. }
            | PipelineError::Service { service, .. }
            | PipelineError::Request { service, .. }
            | PipelineError::MalformedResponse { service, .. } => Some(*service),
            _ => None,
        }
    }

    /// Suggested wait before retrying, only for `RateLimited`
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PipelineError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// True for errors raised by the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PipelineError::Unauthorized { .. }
                | PipelineError::RateLimited { .. }
                | PipelineError::Network { .. }
                | PipelineError::Service { .. }
                | PipelineError::Request { .. }
        )
    }

    /// Map a reqwest transport failure
    pub fn network(
        service: ExternalService,
        operation: &'static str,
        err: reqwest::Error,
    ) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };

        PipelineError::Network {
            service,
            operation,
            message,
        }
    }

    /// Map a non-success HTTP status
    ///
    /// `retry_after` is the raw Retry-After header value, `body` the response
    /// text (only kept for generic 4xx errors).
    pub fn from_status(
        service: ExternalService,
        operation: &'static str,
        status: StatusCode,
        retry_after: Option<&str>,
        body: String,
    ) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                PipelineError::Unauthorized { service, operation }
            }
            StatusCode::TOO_MANY_REQUESTS => PipelineError::RateLimited {
                service,
                operation,
                retry_after: parse_retry_after(retry_after),
            },
            s if s.is_server_error() => PipelineError::Service {
                service,
                operation,
                status: s.as_u16(),
            },
            s => PipelineError::Request {
                service,
                operation,
                status: s.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            },
        }
    }
}

/// Retry-After in delta-seconds form; anything else falls back to the default
fn parse_retry_after(value: Option<&str>) -> Duration {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
