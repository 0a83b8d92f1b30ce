//! Response repair pipeline
//!
//! Turns loosely structured model output into an emotion payload. This is a
//! bounded sequence of textual transforms, not a JSON repair tool: it handles
//! the handful of defects models commonly produce and otherwise gives up and
//! scores keywords instead. Parsing never fails.
//!
//! # Stages
//! 1. Take the text from the first `{` to the last `}`
//! 2. Strict JSON parse
//! 3. Strip code fences, drop trailing commas, quote bareword keys; parse again
//! 4. Keyword fallback scorer
//! 5. Fill missing fields with defaults and derive `dominant_emotion`

use crate::models::EmotionCategory;
use crate::validators::result_validator::numeric;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Starting score of every category in the fallback scorer
pub const FALLBACK_BASELINE: f64 = 20.0;

/// Added to a category when any of its keywords appears
pub const FALLBACK_KEYWORD_BOOST: f64 = 30.0;

/// Confidence reported by fallback payloads
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

const DEFAULT_SCORE: f64 = 0.0;
const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_SUMMARY: &str = "Analysis completed successfully";

static FENCE_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json\s*").expect("fence regex"));
static FENCE_CLOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").expect("fence regex"));
static TRAILING_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma regex"));
static BAREWORD_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z_]\w*)(\s*):").expect("bareword key regex"));

fn keywords(category: EmotionCategory) -> &'static [&'static str] {
    match category {
        EmotionCategory::Happiness => &["happy", "joy", "good", "positive"],
        EmotionCategory::Sadness => &["sad", "melancholy", "sorrow", "grief"],
        EmotionCategory::Anger => &["anger", "rage", "mad", "fury"],
        EmotionCategory::Fear => &["fear", "scared", "afraid", "anxious"],
        EmotionCategory::Love => &["love", "romance", "affection", "caring"],
    }
}

/// Which stage produced a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// Model output parsed as-is
    Strict,
    /// Parsed after textual repairs
    Repaired,
    /// Synthesised by the keyword scorer
    Fallback,
}

/// Untyped emotion payload with every required field present
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionPayload {
    fields: Map<String, Value>,
    source: PayloadSource,
}

impl EmotionPayload {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn source(&self) -> PayloadSource {
        self.source
    }

    /// Score of one category, if numeric
    pub fn score(&self, category: EmotionCategory) -> Option<f64> {
        self.fields.get(category.as_str()).and_then(numeric)
    }

    /// `dominant_emotion` as reported, when it names a known category
    pub fn claimed_dominant(&self) -> Option<EmotionCategory> {
        self.fields
            .get("dominant_emotion")
            .and_then(Value::as_str)
            .and_then(|name| name.parse().ok())
    }

    pub fn summary(&self) -> Option<String> {
        self.fields
            .get("summary")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Repairs model output into an [`EmotionPayload`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseRepairPipeline;

impl ResponseRepairPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Parse `raw`; the fallback scorer sees only `raw`
    pub fn parse(&self, raw: &str) -> EmotionPayload {
        self.parse_inner(raw, None)
    }

    /// Parse `raw`; the fallback scorer also scans the analysed lyrics
    pub fn parse_with_lyrics(&self, raw: &str, lyrics: &str) -> EmotionPayload {
        self.parse_inner(raw, Some(lyrics))
    }

    fn parse_inner(&self, raw: &str, lyrics: Option<&str>) -> EmotionPayload {
        let raw = raw.trim();

        let parsed = match brace_span(raw) {
            None => {
                warn!("No JSON object in model response, using keyword fallback");
                None
            }
            Some(candidate) => match parse_object(candidate) {
                Some(fields) => Some((fields, PayloadSource::Strict)),
                None => match parse_object(&repair(candidate)) {
                    Some(fields) => {
                        debug!("Model response parsed after repair");
                        Some((fields, PayloadSource::Repaired))
                    }
                    None => {
                        warn!("Model response JSON unparseable after repair, using keyword fallback");
                        None
                    }
                },
            },
        };

        let (mut fields, source) = parsed.unwrap_or_else(|| {
            let scanned = match lyrics {
                Some(lyrics) => format!("{}\n{}", raw, lyrics),
                None => raw.to_string(),
            };
            (fallback_payload(&scanned), PayloadSource::Fallback)
        });

        fill_defaults(&mut fields);
        EmotionPayload { fields, source }
    }
}

/// First `{` through last `}`, greedy like a dot-all `\{.*\}` match
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => Some(fields),
        _ => None,
    }
}

fn repair(text: &str) -> String {
    let text = FENCE_OPEN_RE.replace_all(text, "");
    let text = FENCE_CLOSE_RE.replace(&text, "");
    let text = TRAILING_COMMA_RE.replace_all(&text, "$1");
    let text = BAREWORD_KEY_RE.replace_all(&text, "$1\"$2\"$3:");
    text.trim().to_string()
}

/// Keyword scores over whole lowercase tokens of `text`
fn fallback_payload(text: &str) -> Map<String, Value> {
    let lower = text.to_lowercase();
    let tokens: HashSet<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut scores = [FALLBACK_BASELINE; 5];
    for (slot, category) in scores.iter_mut().zip(EmotionCategory::ALL) {
        if keywords(category).iter().any(|k| tokens.contains(k)) {
            *slot += FALLBACK_KEYWORD_BOOST;
        }
    }

    let dominant = argmax(EmotionCategory::ALL.into_iter().zip(scores));

    let mut fields = Map::new();
    for (category, score) in EmotionCategory::ALL.into_iter().zip(scores) {
        fields.insert(category.as_str().to_string(), Value::from(score));
    }
    fields.insert("dominant_emotion".to_string(), Value::from(dominant.as_str()));
    fields.insert("confidence".to_string(), Value::from(FALLBACK_CONFIDENCE));
    fields.insert(
        "summary".to_string(),
        Value::from(format!(
            "Analysis completed using fallback method. Dominant emotion detected: {}",
            dominant
        )),
    );

    debug!(dominant = %dominant, "Fallback payload synthesised");
    fields
}

fn fill_defaults(fields: &mut Map<String, Value>) {
    for category in EmotionCategory::ALL {
        fields
            .entry(category.as_str())
            .or_insert_with(|| Value::from(DEFAULT_SCORE));
    }
    fields
        .entry("confidence")
        .or_insert_with(|| Value::from(DEFAULT_CONFIDENCE));
    fields
        .entry("summary")
        .or_insert_with(|| Value::from(DEFAULT_SUMMARY));

    if !fields.contains_key("dominant_emotion") {
        let dominant = argmax(EmotionCategory::ALL.into_iter().map(|c| {
            let score = fields.get(c.as_str()).and_then(numeric).unwrap_or(DEFAULT_SCORE);
            (c, score)
        }));
        fields.insert("dominant_emotion".to_string(), Value::from(dominant.as_str()));
    }
}

/// Ties go to the earlier category
fn argmax(scores: impl Iterator<Item = (EmotionCategory, f64)>) -> EmotionCategory {
    let mut best = (EmotionCategory::Happiness, f64::NEG_INFINITY);
    for (category, score) in scores {
        if score > best.1 {
            best = (category, score);
        }
    }
    best.0
}
