//! Emotion categories, score sets and analysis results
//!
//! Both [`EmotionScores`] and [`AnalysisResult`] validate on construction, so a
//! value that exists is always well-formed: five scores in [0, 100] rounded to
//! two decimals, confidence in [0, 1] rounded to three, dominant category equal
//! to the argmax of the scores.

use crate::error::{PipelineError, PipelineResult};
use crate::validators::result_validator;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Fixed set of emotion categories
///
/// Declaration order is the tie-break order for argmax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionCategory {
    Happiness,
    Sadness,
    Anger,
    Fear,
    Love,
}

impl EmotionCategory {
    pub const ALL: [EmotionCategory; 5] = [
        EmotionCategory::Happiness,
        EmotionCategory::Sadness,
        EmotionCategory::Anger,
        EmotionCategory::Fear,
        EmotionCategory::Love,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionCategory::Happiness => "happiness",
            EmotionCategory::Sadness => "sadness",
            EmotionCategory::Anger => "anger",
            EmotionCategory::Fear => "fear",
            EmotionCategory::Love => "love",
        }
    }

    /// Short description used in prompts
    pub fn description(&self) -> &'static str {
        match self {
            EmotionCategory::Happiness => "Joy, contentment, positive emotions",
            EmotionCategory::Sadness => "Melancholy, grief, sorrow",
            EmotionCategory::Anger => "Rage, frustration, hostility",
            EmotionCategory::Fear => "Anxiety, worry, dread",
            EmotionCategory::Love => "Affection, romance, caring",
        }
    }

    fn index(&self) -> usize {
        match self {
            EmotionCategory::Happiness => 0,
            EmotionCategory::Sadness => 1,
            EmotionCategory::Anger => 2,
            EmotionCategory::Fear => 3,
            EmotionCategory::Love => 4,
        }
    }
}

impl fmt::Display for EmotionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionCategory {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EmotionCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| PipelineError::Validation(format!("Unknown emotion category: {}", s)))
    }
}

/// Exactly one validated score per category
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmotionScores([f64; 5]);

impl EmotionScores {
    /// Build from scores in [`EmotionCategory::ALL`] order
    pub fn new(values: [f64; 5]) -> PipelineResult<Self> {
        let mut scores = [0.0; 5];
        for (category, value) in EmotionCategory::ALL.into_iter().zip(values) {
            scores[category.index()] = result_validator::validate_score(category, value)?;
        }
        Ok(Self(scores))
    }

    pub fn get(&self, category: EmotionCategory) -> f64 {
        self.0[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionCategory, f64)> + '_ {
        EmotionCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Highest-scoring category; ties go to the earlier category
    pub fn dominant(&self) -> EmotionCategory {
        let mut best = EmotionCategory::Happiness;
        for (category, score) in self.iter() {
            if score > self.get(best) {
                best = category;
            }
        }
        best
    }

    /// Categories sorted by descending score (stable for ties)
    pub fn ranked(&self) -> Vec<(EmotionCategory, f64)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl Serialize for EmotionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        for (category, score) in self.iter() {
            map.serialize_entry(category.as_str(), &score)?;
        }
        map.end()
    }
}

/// Qualitative confidence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisQuality {
    High,
    Medium,
    Low,
}

impl fmt::Display for AnalysisQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisQuality::High => write!(f, "High"),
            AnalysisQuality::Medium => write!(f, "Medium"),
            AnalysisQuality::Low => write!(f, "Low"),
        }
    }
}

/// Validated emotion analysis of one lyrics text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    scores: EmotionScores,
    dominant: EmotionCategory,
    confidence: f64,
    summary: Option<String>,
    model: String,
    processing_time_secs: Option<f64>,
    analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Build a result; `claimed_dominant` is ignored in favour of the argmax
    pub fn new(
        scores: EmotionScores,
        claimed_dominant: Option<EmotionCategory>,
        confidence: f64,
        summary: Option<String>,
    ) -> PipelineResult<Self> {
        let confidence = result_validator::validate_confidence_value(confidence)?;
        let dominant = scores.dominant();

        if let Some(claimed) = claimed_dominant {
            if claimed != dominant {
                tracing::debug!(
                    claimed = %claimed,
                    actual = %dominant,
                    "Correcting dominant emotion to highest score"
                );
            }
        }

        Ok(Self {
            scores,
            dominant,
            confidence,
            summary: summary.filter(|s| !s.trim().is_empty()),
            model: String::new(),
            processing_time_secs: None,
            analyzed_at: Utc::now(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_processing_time(mut self, elapsed: Duration) -> Self {
        self.processing_time_secs = Some(elapsed.as_secs_f64());
        self
    }

    pub fn scores(&self) -> &EmotionScores {
        &self.scores
    }

    pub fn score(&self, category: EmotionCategory) -> f64 {
        self.scores.get(category)
    }

    pub fn dominant(&self) -> EmotionCategory {
        self.dominant
    }

    pub fn dominant_score(&self) -> f64 {
        self.scores.get(self.dominant)
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn processing_time(&self) -> Option<Duration> {
        self.processing_time_secs.map(Duration::from_secs_f64)
    }

    pub fn analyzed_at(&self) -> DateTime<Utc> {
        self.analyzed_at
    }

    pub fn top_emotions(&self, count: usize) -> Vec<(EmotionCategory, f64)> {
        let mut ranked = self.scores.ranked();
        ranked.truncate(count);
        ranked
    }

    pub fn is_high_confidence(&self) -> bool {
        self.confidence > 0.7
    }

    pub fn quality(&self) -> AnalysisQuality {
        if self.confidence >= 0.8 {
            AnalysisQuality::High
        } else if self.confidence >= 0.6 {
            AnalysisQuality::Medium
        } else {
            AnalysisQuality::Low
        }
    }

    /// Model summary, or a generated sentence describing the scores
    pub fn summary_text(&self) -> String {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let mut parts = vec![format!(
            "The dominant emotion is {} ({:.1}%)",
            self.dominant,
            self.dominant_score()
        )];

        let top = self.top_emotions(2);
        if let Some((secondary, score)) = top.get(1) {
            if *score > 20.0 {
                parts.push(format!(
                    "with secondary presence of {} ({:.1}%)",
                    secondary, score
                ));
            }
        }

        parts.push(format!(
            "Analysis confidence: {:.1}%",
            self.confidence * 100.0
        ));

        format!("{}.", parts.join(". "))
    }
}
