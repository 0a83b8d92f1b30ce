//! Lyrics extraction from catalog song pages
//!
//! Page markup is not a typed API, so extraction is an ordered chain of
//! heuristics with a bounded failure mode: either cleaned text of at least
//! [`MIN_CLEANED_LENGTH`] characters, or `LyricsNotFound`.
//!
//! # Strategy
//! 1. Structural selectors, in priority order. The first selector whose
//!    containers yield more than [`MIN_CONTAINER_LENGTH`] characters of
//!    visible text wins; all of its qualifying containers are joined.
//! 2. Fallback: the first `div`/`section`/`article` whose visible text exceeds
//!    [`MIN_FALLBACK_LENGTH`] characters and spans several lines.
//! 3. Cleanup: section markers, boilerplate lines and redundant whitespace
//!    are removed.

use crate::error::{PipelineError, PipelineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Attr, Name, Predicate};
use std::collections::HashSet;
use tracing::debug;

/// Visible text a selector match needs to count as a lyrics container
pub const MIN_CONTAINER_LENGTH: usize = 50;

/// Visible text the block-level fallback needs
pub const MIN_FALLBACK_LENGTH: usize = 200;

/// Shortest acceptable result after cleanup
pub const MIN_CLEANED_LENGTH: usize = 20;

static SECTION_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[.*?\]").expect("section marker regex"));
static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank lines regex"));
static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("space run regex"));
static CONTRIBUTORS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+\s*contributors?\b").expect("contributors regex"));
static EMBED_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+\s*embed$").expect("embed suffix regex"));

/// Element whose `class` attribute contains a substring (CSS `[class*=...]`)
#[derive(Debug, Clone, Copy)]
struct ClassContains(&'static str);

impl Predicate for ClassContains {
    fn matches(&self, node: &Node) -> bool {
        node.attr("class").is_some_and(|class| class.contains(self.0))
    }
}

/// Element that looks like an advertisement slot
#[derive(Debug, Clone, Copy)]
struct AdSlot;

impl Predicate for AdSlot {
    fn matches(&self, node: &Node) -> bool {
        let Some(class) = node.attr("class") else {
            return false;
        };

        class.split_whitespace().any(|token| {
            let token = token.to_lowercase();
            token == "ad"
                || token.starts_with("ad-")
                || token.starts_with("ad_")
                || token.starts_with("ads")
                || token.contains("advert")
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Selector {
    LyricsClass,
    LyricsContainerAttr,
    ContainerClass,
    SongPageGrid,
}

impl Selector {
    const PRIORITY: [Selector; 4] = [
        Selector::LyricsClass,
        Selector::LyricsContainerAttr,
        Selector::ContainerClass,
        Selector::SongPageGrid,
    ];

    fn matches(&self, node: &Node) -> bool {
        let div = Name("div");
        match self {
            Selector::LyricsClass => div.and(ClassContains("lyrics")).matches(node),
            Selector::LyricsContainerAttr => div
                .and(Attr("data-lyrics-container", "true"))
                .matches(node),
            Selector::ContainerClass => div.and(ClassContains("Lyrics__Container")).matches(node),
            Selector::SongPageGrid => div.and(ClassContains("SongPageGrid-sc")).matches(node),
        }
    }
}

/// Pulls lyric text out of an HTML page
#[derive(Debug, Default, Clone, Copy)]
pub struct LyricsExtractor;

impl LyricsExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, html: &str) -> PipelineResult<String> {
        let document = Document::from(html);

        let raw = match self.extract_with_selectors(&document) {
            Some(text) => text,
            None => self.extract_fallback(&document).ok_or_else(|| {
                PipelineError::LyricsNotFound("no lyrics container found in page".to_string())
            })?,
        };

        let cleaned = clean_lyrics(&raw);
        if cleaned.chars().count() < MIN_CLEANED_LENGTH {
            return Err(PipelineError::LyricsNotFound(format!(
                "extracted text too short after cleanup ({} characters)",
                cleaned.chars().count()
            )));
        }

        debug!(characters = cleaned.chars().count(), "Lyrics extracted");
        Ok(cleaned)
    }

    fn extract_with_selectors(&self, document: &Document) -> Option<String> {
        for selector in Selector::PRIORITY {
            let mut accepted: HashSet<usize> = HashSet::new();
            let mut blocks = Vec::new();

            for node in document.find(|n: &Node| selector.matches(n)) {
                if has_ancestor_in(&node, &accepted) {
                    continue;
                }

                let text = visible_text(&node);
                if text.chars().count() > MIN_CONTAINER_LENGTH {
                    accepted.insert(node.index());
                    blocks.push(text);
                }
            }

            if !blocks.is_empty() {
                debug!(
                    selector = ?selector,
                    containers = blocks.len(),
                    "Lyrics containers matched"
                );
                return Some(blocks.join("\n"));
            }
        }

        None
    }

    fn extract_fallback(&self, document: &Document) -> Option<String> {
        let blocks = Name("div").or(Name("section")).or(Name("article"));

        let found = document.find(blocks).find_map(|node| {
            let text = visible_text(&node);
            (text.chars().count() > MIN_FALLBACK_LENGTH && text.contains('\n')).then_some(text)
        });

        if found.is_some() {
            debug!("Lyrics taken from block-level fallback");
        }
        found
    }
}

fn has_ancestor_in(node: &Node, accepted: &HashSet<usize>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if accepted.contains(&parent.index()) {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// Non-empty trimmed text nodes joined with line breaks, skipping scripts,
/// styles and ad slots
fn visible_text(node: &Node) -> String {
    let mut lines = Vec::new();
    collect_text(node, &mut lines);
    lines.join("\n")
}

fn collect_text(node: &Node, lines: &mut Vec<String>) {
    if let Some(text) = node.as_text() {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
        return;
    }

    if matches!(node.name(), Some("script") | Some("style")) || AdSlot.matches(node) {
        return;
    }

    for child in node.children() {
        collect_text(&child, lines);
    }
}

fn is_boilerplate(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    if lower.is_empty() {
        return false;
    }

    CONTRIBUTORS_RE.is_match(&lower)
        || matches!(
            lower.as_str(),
            "embed" | "share" | "translation" | "translations"
        )
        || lower.starts_with("translations")
        || lower.ends_with(" lyrics")
}

/// Strip section markers, boilerplate lines and redundant whitespace
pub fn clean_lyrics(raw: &str) -> String {
    let without_markers = SECTION_MARKER_RE.replace_all(raw, "");
    let collapsed = collapse_whitespace(&without_markers);

    let kept: Vec<String> = collapsed
        .lines()
        .filter(|line| !is_boilerplate(line))
        .map(|line| EMBED_SUFFIX_RE.replace(line.trim(), "").trim_end().to_string())
        .collect();

    collapse_whitespace(&kept.join("\n")).trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    let text = BLANK_LINES_RE.replace_all(text, "\n\n");
    SPACE_RUN_RE.replace_all(&text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verse_lines() -> Vec<String> {
        (1..=10)
            .map(|i| format!("This is verse line number {}", i))
            .collect()
    }

    #[test]
    fn test_data_attribute_container_strips_ads_and_markers() {
        let lines = verse_lines();
        let html = format!(
            r#"<html><body>
            <div data-lyrics-container="true">
                [Verse 1]<br/>
                {}<br/>
                <div class="ad-slot RightRail">Buy now, limited offer</div>
                {}
                <script>var tracking = 1;</script>
            </div>
            </body></html>"#,
            lines[..5].join("<br/>"),
            lines[5..].join("<br/>")
        );

        let text = LyricsExtractor::new().extract(&html).unwrap();

        assert_eq!(text, lines.join("\n"));
        assert!(!text.contains("Buy now"));
        assert!(!text.contains("[Verse 1]"));
        assert!(!text.contains("tracking"));
    }

    #[test]
    fn test_header_class_is_not_treated_as_ad() {
        let lines = verse_lines();
        let html = format!(
            r#"<div data-lyrics-container="true"><div class="Header">{}</div></div>"#,
            lines.join("<br>")
        );

        let text = LyricsExtractor::new().extract(&html).unwrap();
        assert_eq!(text, lines.join("\n"));
    }

    #[test]
    fn test_selector_priority_and_joining() {
        let html = r#"
            <div class="song-lyrics">First block of lyrics that is long enough to count here</div>
            <div class="song-lyrics">Second block of lyrics that is also long enough to count</div>
            <div data-lyrics-container="true">Lower priority container that should be ignored entirely</div>
        "#;

        let text = LyricsExtractor::new().extract(html).unwrap();
        assert_eq!(
            text,
            "First block of lyrics that is long enough to count here\n\
             Second block of lyrics that is also long enough to count"
        );
    }

    #[test]
    fn test_nested_matches_not_duplicated() {
        let html = r#"
            <div class="lyrics-root">
                <div class="lyrics-body">Nested lyrics text that is comfortably longer than fifty characters</div>
            </div>
        "#;

        let text = LyricsExtractor::new().extract(html).unwrap();
        assert_eq!(
            text,
            "Nested lyrics text that is comfortably longer than fifty characters"
        );
    }

    #[test]
    fn test_short_container_falls_through_to_next_selector() {
        let html = r#"
            <div class="lyrics">too short</div>
            <div class="Lyrics__Container-sc-1">The container class selector supplies enough text to pass</div>
        "#;

        let text = LyricsExtractor::new().extract(html).unwrap();
        assert_eq!(
            text,
            "The container class selector supplies enough text to pass"
        );
    }

    #[test]
    fn test_block_fallback() {
        let body: Vec<String> = (1..=12)
            .map(|i| format!("<p>Fallback lyric line {}</p>", i))
            .collect();
        let html = format!("<html><body><article>{}</article></body></html>", body.join(""));

        let text = LyricsExtractor::new().extract(&html).unwrap();
        assert!(text.starts_with("Fallback lyric line 1\nFallback lyric line 2"));
        assert!(text.ends_with("Fallback lyric line 12"));
    }

    #[test]
    fn test_no_lyrics() {
        let err = LyricsExtractor::new()
            .extract("<html><body><p>Nothing here</p></body></html>")
            .unwrap_err();
        assert!(matches!(err, PipelineError::LyricsNotFound(_)));
    }

    #[test]
    fn test_too_short_after_cleanup() {
        let html = r#"<div class="lyrics">[Intro] [Verse 1] [Chorus] [Bridge] [Outro] [Verse 2] ok</div>"#;
        let err = LyricsExtractor::new().extract(html).unwrap_err();
        assert!(matches!(err, PipelineError::LyricsNotFound(_)));
    }

    #[test]
    fn test_clean_lyrics_boilerplate() {
        let raw = "12 Contributors\nTranslations\nHey Jude Lyrics\n[Verse 1]\nHey Jude, don't make it bad\n\n\n\nTake a   sad song\nShare\nand make it better45Embed";
        assert_eq!(
            clean_lyrics(raw),
            "Hey Jude, don't make it bad\n\nTake a sad song\nand make it better"
        );
    }
}
