//! Inference API client
//!
//! # API Reference
//! - Chat completion: `POST {base}/chat/completions` (OpenAI-compatible)
//!
//! Results are cached by the SHA-256 of the exact lyrics text, so two songs
//! with identical lyrics share one analysis.

use crate::error::{ExternalService, PipelineError, PipelineResult};
use crate::inference::prompt::{build_prompt, truncate_lyrics, CONNECTION_TEST_PROMPT};
use crate::inference::repair::{EmotionPayload, PayloadSource, ResponseRepairPipeline};
use crate::models::AnalysisResult;
use crate::services::ResponseCache;
use crate::validators::{validate_confidence, validate_scores};
use lyricmood_common::config::InferenceSettings;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;
use tracing::{debug, info, warn};

const SERVICE: ExternalService = ExternalService::Inference;

/// Token budget of connection checks
const CONNECTION_TEST_MAX_TOKENS: u32 = 10;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Analysis plus whether it was served from the cache
#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub from_cache: bool,
}

// ============================================================================
// Client
// ============================================================================

/// Emotion analysis through the inference API
pub struct InferenceClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    max_lyrics_chars: usize,
    repair: ResponseRepairPipeline,
    cache: ResponseCache<String, AnalysisResult>,
}

impl InferenceClient {
    pub fn new(settings: &InferenceSettings, api_key: String) -> PipelineResult<Self> {
        let http_client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()
            .map_err(|e| PipelineError::network(SERVICE, "build_client", e))?;

        info!(
            base_url = %settings.base_url,
            model = %settings.model,
            "Inference client initialized"
        );

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_lyrics_chars: settings.max_lyrics_chars,
            repair: ResponseRepairPipeline::new(),
            cache: ResponseCache::new("analysis", settings.cache_capacity, settings.cache_ttl()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Analyse lyrics, using the cache when possible
    pub async fn analyze(&self, lyrics: &str) -> PipelineResult<AnalysisResult> {
        Ok(self.analyze_detailed(lyrics).await?.result)
    }

    /// Like [`analyze`](Self::analyze), also reporting cache hits
    pub async fn analyze_detailed(&self, lyrics: &str) -> PipelineResult<Analysis> {
        if lyrics.trim().is_empty() {
            return Err(PipelineError::Analysis("Lyrics cannot be empty".to_string()));
        }

        let key = cache_key(lyrics);
        if let Some(result) = self.cache.get(&key) {
            info!(dominant = %result.dominant(), "Using cached emotion analysis");
            return Ok(Analysis {
                result,
                from_cache: true,
            });
        }

        let started = Instant::now();
        let (text, truncated) = truncate_lyrics(lyrics.trim(), self.max_lyrics_chars);
        if truncated {
            warn!(
                max_chars = self.max_lyrics_chars,
                "Lyrics truncated before analysis"
            );
        }

        debug!(characters = text.chars().count(), "Starting emotion analysis");

        let prompt = build_prompt(&text);
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: Some(self.top_p),
            stream: false,
        };

        let response = self.send_chat("analyze", &request).await?;
        let content = first_content(response)?;

        let payload = self.repair.parse_with_lyrics(&content, &text);
        let result = result_from_payload(&payload)?
            .with_model(self.model.as_str())
            .with_processing_time(started.elapsed());

        info!(
            dominant = %result.dominant(),
            dominant_score = result.dominant_score(),
            confidence = result.confidence(),
            fallback = payload.source() == PayloadSource::Fallback,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Emotion analysis completed"
        );

        self.cache.put(key, result.clone());
        Ok(Analysis {
            result,
            from_cache: false,
        })
    }

    /// Minimal completion request; checks credentials and reachability
    pub async fn validate_connection(&self) -> PipelineResult<()> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: CONNECTION_TEST_PROMPT,
            }],
            max_tokens: CONNECTION_TEST_MAX_TOKENS,
            temperature: 0.0,
            top_p: None,
            stream: false,
        };

        let response = self.send_chat("validate_connection", &request).await?;
        if response.choices.is_empty() {
            return Err(PipelineError::MalformedResponse {
                service: SERVICE,
                operation: "validate_connection",
                message: "response has no choices".to_string(),
            });
        }

        info!("Inference API connection validated");
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Analysis cache cleared");
    }

    /// Number of analyses currently cached
    pub fn cached_analyses(&self) -> usize {
        self.cache.len()
    }

    async fn send_chat(
        &self,
        operation: &'static str,
        request: &ChatRequest<'_>,
    ) -> PipelineResult<ChatResponse> {
        let started = Instant::now();
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PipelineError::network(SERVICE, operation, e))?;

        let status = response.status();
        debug!(
            service = %SERVICE,
            operation = operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Inference API response"
        );

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            warn!(
                service = %SERVICE,
                operation = operation,
                status = status.as_u16(),
                "Inference request failed"
            );
            return Err(PipelineError::from_status(
                SERVICE,
                operation,
                status,
                retry_after.as_deref(),
                body,
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::network(SERVICE, operation, e))?;

        serde_json::from_str(&body).map_err(|e| PipelineError::MalformedResponse {
            service: SERVICE,
            operation,
            message: e.to_string(),
        })
    }
}

/// SHA-256 of the exact lyrics text, hex encoded
pub fn cache_key(lyrics: &str) -> String {
    format!("{:x}", Sha256::digest(lyrics.as_bytes()))
}

fn first_content(response: ChatResponse) -> PipelineResult<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::Analysis("No choices in API response".to_string()))?;

    choice
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PipelineError::Analysis("Empty content in API response".to_string()))
}

/// Validate a repaired payload into a result
fn result_from_payload(payload: &EmotionPayload) -> PipelineResult<AnalysisResult> {
    let scores = validate_scores(payload.fields())?;
    let confidence = payload
        .get("confidence")
        .ok_or_else(|| PipelineError::Analysis("Payload has no confidence".to_string()))
        .and_then(validate_confidence)?;

    AnalysisResult::new(scores, payload.claimed_dominant(), confidence, payload.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmotionCategory;

    #[test]
    fn test_cache_key_is_exact_content_hash() {
        assert_eq!(
            cache_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(cache_key("abc"), cache_key("abc "));
    }

    #[test]
    fn test_first_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "hello"}}]}"#).unwrap();
        assert_eq!(first_content(parsed).unwrap(), "hello");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_content(empty), Err(PipelineError::Analysis(_))));

        let blank: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert!(matches!(first_content(blank), Err(PipelineError::Analysis(_))));
    }

    #[test]
    fn test_result_corrects_claimed_dominant() {
        let payload = ResponseRepairPipeline::new().parse(
            r#"{"happiness": 10, "sadness": 90.456, "anger": 0, "fear": 0, "love": 0,
                "dominant_emotion": "happiness", "confidence": 0.87654}"#,
        );

        let result = result_from_payload(&payload).unwrap();
        assert_eq!(result.dominant(), EmotionCategory::Sadness);
        assert_eq!(result.score(EmotionCategory::Sadness), 90.46);
        assert_eq!(result.confidence(), 0.877);
    }

    #[test]
    fn test_out_of_range_score_is_validation_error() {
        let payload = ResponseRepairPipeline::new().parse(
            r#"{"happiness": 120, "sadness": 0, "anger": 0, "fear": 0, "love": 0, "confidence": 0.9}"#,
        );
        assert!(matches!(
            result_from_payload(&payload),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn test_request_serialisation() {
        let request = ChatRequest {
            model: "m",
            messages: [ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 10,
            temperature: 0.0,
            top_p: None,
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["stream"], false);
        assert!(value.get("top_p").is_none());
    }
}
