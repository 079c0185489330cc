//! Text cleanup applied to collected posts before they are stored.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Pictographs plus the joiners, selectors, skin-tone modifiers and regional
/// indicators that glue emoji sequences together.
static PICTOGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[\p{Extended_Pictographic}\u{1F1E6}-\u{1F1FF}\u{1F3FB}-\u{1F3FF}\u{200D}\u{FE0E}\u{FE0F}\u{20E3}]",
    )
    .expect("valid pictograph regex")
});
static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("valid line break regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w&/])#(\w+)").expect("valid hashtag regex"));

/// Remove emoji and other pictographic symbols, leaving everything else as is.
#[must_use]
pub fn strip_pictographs(text: &str) -> String {
    PICTOGRAPH_RE.replace_all(text, "").into_owned()
}

/// Strip pictographs, turn line breaks into spaces, collapse runs of
/// whitespace, and trim.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    let stripped = strip_pictographs(text);
    let single_line = LINE_BREAK_RE.replace_all(&stripped, " ");
    WHITESPACE_RE
        .replace_all(&single_line, " ")
        .trim()
        .to_string()
}

/// Hashtags mentioned in `text`, without the `#`, first occurrence order.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emoji_sequences() {
        assert_eq!(strip_pictographs("to the moon 🚀🚀"), "to the moon ");
        assert_eq!(strip_pictographs("thumbs 👍🏽 up"), "thumbs  up");
        assert_eq!(strip_pictographs("family 👨‍👩‍👧 time"), "family  time");
        assert_eq!(strip_pictographs("flag 🇺🇸!"), "flag !");
        assert_eq!(strip_pictographs("heart ❤️"), "heart ");
    }

    #[test]
    fn keeps_plain_text_and_symbols() {
        assert_eq!(strip_pictographs("$AAPL up 3% -> $190"), "$AAPL up 3% -> $190");
        assert_eq!(strip_pictographs("café über naïve"), "café über naïve");
    }

    #[test]
    fn normalize_collapses_breaks_and_spaces() {
        assert_eq!(
            normalize_text("  $TSLA 🚀\r\n\r\nbreaking   out\n\ttoday  "),
            "$TSLA breaking out today"
        );
    }

    #[test]
    fn normalize_of_only_emoji_is_empty() {
        assert_eq!(normalize_text("🔥🔥 \n 💯"), "");
    }

    #[test]
    fn extracts_hashtags_once_each() {
        assert_eq!(
            extract_hashtags("#stocks are up #AAPL #stocks and #Stocks https://x.com/a#frag"),
            vec!["stocks".to_string(), "AAPL".to_string()]
        );
        assert!(extract_hashtags("no tags, just $AAPL").is_empty());
    }
}
