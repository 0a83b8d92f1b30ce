//! Emotion-analysis prompt

use crate::models::EmotionCategory;
use std::fmt::Write;

/// Prompt sent by connection checks
pub const CONNECTION_TEST_PROMPT: &str = "Test connection. Respond with \"OK\".";

/// Truncate lyrics to `max_chars` characters, appending "..." when cut
///
/// Returns the (possibly shortened) text and whether truncation happened.
pub fn truncate_lyrics(lyrics: &str, max_chars: usize) -> (String, bool) {
    match lyrics.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (format!("{}...", &lyrics[..byte_index]), true),
        None => (lyrics.to_string(), false),
    }
}

/// Build the analysis prompt embedding `lyrics` verbatim
pub fn build_prompt(lyrics: &str) -> String {
    let mut prompt = String::from(
        "Analyze the emotional content of the following song lyrics and provide scores \
         for each emotion category on a scale of 0-100. Be precise and consider the \
         overall emotional tone, specific words, and context.\n\nEmotion Categories:\n",
    );

    for category in EmotionCategory::ALL {
        let name = category.as_str();
        let mut chars = name.chars();
        let capitalised: String = chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect())
            .unwrap_or_default();
        let _ = writeln!(prompt, "- {}: {}", capitalised, category.description());
    }

    let _ = write!(prompt, "\nLyrics:\n{}\n\n", lyrics);

    prompt.push_str("Please respond with only a JSON object in this exact format:\n{\n");
    for category in EmotionCategory::ALL {
        let _ = writeln!(prompt, "    \"{}\": <score>,", category.as_str());
    }
    prompt.push_str(
        "    \"dominant_emotion\": \"<emotion_name>\",\n    \
         \"confidence\": <overall_confidence>,\n    \
         \"summary\": \"<brief_analysis_summary>\"\n}\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_every_category_and_lyrics() {
        let prompt = build_prompt("la la la");

        assert!(prompt.contains("- Happiness: Joy, contentment, positive emotions"));
        assert!(prompt.contains("- Love: Affection, romance, caring"));
        assert!(prompt.contains("Lyrics:\nla la la\n"));
        assert!(prompt.contains("\"fear\": <score>,"));
        assert!(prompt.contains("\"dominant_emotion\""));
        assert!(prompt.trim_end().ends_with('}'));
    }

    #[test]
    fn test_truncate_lyrics() {
        assert_eq!(truncate_lyrics("short", 10), ("short".to_string(), false));
        assert_eq!(truncate_lyrics("exactly10!", 10), ("exactly10!".to_string(), false));
        assert_eq!(truncate_lyrics("abcdefghijkl", 10), ("abcdefghij...".to_string(), true));
        // Multi-byte characters count once
        assert_eq!(truncate_lyrics("ééééé", 3), ("ééé...".to_string(), true));
    }
}
