//! Result Validator
//!
//! Bounds checks for inference output, applied twice: once to the raw payload
//! before it is trusted, and again by the [`EmotionScores`] and
//! [`AnalysisResult`](crate::models::AnalysisResult) constructors.
//!
//! # Rules
//! - All five categories present, each numeric (JSON number or numeric string)
//! - Scores finite and within [0, 100], rounded to two decimals
//! - Confidence finite and within [0, 1], rounded to three decimals
//! - Unknown keys are ignored with a debug log

use crate::error::{PipelineError, PipelineResult};
use crate::models::{EmotionCategory, EmotionScores};
use serde_json::{Map, Value};
use tracing::debug;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Validate one score and round it to two decimals
pub fn validate_score(category: EmotionCategory, value: f64) -> PipelineResult<f64> {
    if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(PipelineError::Validation(format!(
            "Score for {} must be between 0 and 100, got {}",
            category, value
        )));
    }

    Ok(round_to(value, 2).clamp(MIN_SCORE, MAX_SCORE))
}

/// Validate a confidence value and round it to three decimals
pub fn validate_confidence_value(value: f64) -> PipelineResult<f64> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(PipelineError::Validation(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            value
        )));
    }

    Ok(round_to(value, 3))
}

/// Validate the five category scores of a raw payload
pub fn validate_scores(payload: &Map<String, Value>) -> PipelineResult<EmotionScores> {
    let mut values = [0.0; 5];

    for (slot, category) in values.iter_mut().zip(EmotionCategory::ALL) {
        let raw = payload.get(category.as_str()).ok_or_else(|| {
            PipelineError::Validation(format!("Missing emotion score: {}", category))
        })?;

        let number = numeric(raw).ok_or_else(|| {
            PipelineError::Validation(format!(
                "Invalid score type for {}: must be numeric, got {}",
                category, raw
            ))
        })?;

        *slot = validate_score(category, number)?;
    }

    for key in payload.keys() {
        if !is_payload_field(key) {
            debug!(field = %key, "Ignoring unexpected field in emotion payload");
        }
    }

    EmotionScores::new(values)
}

/// Validate the `confidence` field of a raw payload
pub fn validate_confidence(value: &Value) -> PipelineResult<f64> {
    let number = numeric(value).ok_or_else(|| {
        PipelineError::Validation(format!("Confidence must be numeric, got {}", value))
    })?;
    validate_confidence_value(number)
}

/// JSON number, or a string holding one
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn is_payload_field(key: &str) -> bool {
    EmotionCategory::ALL.iter().any(|c| c.as_str() == key)
        || matches!(key, "dominant_emotion" | "confidence" | "summary")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_scores() {
        let scores = validate_scores(&payload(json!({
            "happiness": 80, "sadness": "10.5", "anger": 5.0, "fear": 5, "love": 0,
            "extra": true
        })))
        .unwrap();
        assert_eq!(scores.get(EmotionCategory::Happiness), 80.0);
        assert_eq!(scores.get(EmotionCategory::Sadness), 10.5);
        assert_eq!(scores.get(EmotionCategory::Love), 0.0);
    }

    #[test]
    fn test_missing_category_fails() {
        let err = validate_scores(&payload(json!({
            "happiness": 80, "sadness": 10, "anger": 5, "fear": 5
        })))
        .unwrap_err();
        assert!(matches!(err, PipelineError::Validation(msg) if msg.contains("love")));
    }

    #[test]
    fn test_non_numeric_and_out_of_range_fail() {
        assert!(validate_scores(&payload(json!({
            "happiness": "lots", "sadness": 0, "anger": 0, "fear": 0, "love": 0
        })))
        .is_err());
        assert!(validate_scores(&payload(json!({
            "happiness": 100.5, "sadness": 0, "anger": 0, "fear": 0, "love": 0
        })))
        .is_err());
        assert!(validate_scores(&payload(json!({
            "happiness": null, "sadness": 0, "anger": 0, "fear": 0, "love": 0
        })))
        .is_err());
    }

    #[test]
    fn test_confidence() {
        assert_eq!(validate_confidence(&json!(0.87654)).unwrap(), 0.877);
        assert_eq!(validate_confidence(&json!("0.5")).unwrap(), 0.5);
        assert_eq!(validate_confidence(&json!(1)).unwrap(), 1.0);
        assert!(validate_confidence(&json!(1.01)).is_err());
        assert!(validate_confidence(&json!("high")).is_err());
        assert!(validate_confidence_value(f64::INFINITY).is_err());
    }
}
