//! The collected post record and the ticker symbol it is grouped under.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A trending ticker symbol, e.g. `$AAPL`. Identity is the literal symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage-safe stem: `$` trimmed from both ends, `#` removed, spaces to `_`.
    ///
    /// `$AAPL` → `AAPL`, `#BRK B` → `BRK_B`.
    #[must_use]
    pub fn file_stem(&self) -> String {
        self.0
            .trim_matches('$')
            .replace('#', "")
            .replace(' ', "_")
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One collected social-media post.
///
/// Equality is structural over every field, which is what deduplication
/// relies on: two posts with the same `id` but different engagement counts
/// are distinct records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub ticker: Ticker,
    pub username: String,
    pub display_name: String,
    pub content: String,
    pub created_at: String,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub hashtags: Vec<String>,
    pub url: String,
    /// Fields this crate does not model, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected string or number for post id, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn file_stem_strips_cashtag_and_hash() {
        assert_eq!(Ticker::new("$AAPL").file_stem(), "AAPL");
        assert_eq!(Ticker::new("#BRK B").file_stem(), "BRK_B");
        assert_eq!(Ticker::new("TSLA").file_stem(), "TSLA");
    }

    #[test]
    fn deserializes_numeric_id_and_keeps_unknown_fields() {
        let post: Post = serde_json::from_value(json!({
            "id": 1_234_567_890_u64,
            "ticker": "$AAPL",
            "content": "hello",
            "lang": "en"
        }))
        .unwrap();
        assert_eq!(post.id, "1234567890");
        assert_eq!(post.ticker, Ticker::new("$AAPL"));
        assert_eq!(post.extra.get("lang"), Some(&json!("en")));

        let back = serde_json::to_value(&post).unwrap();
        assert_eq!(back["lang"], "en");
    }

    #[test]
    fn structural_equality_covers_engagement_counts() {
        let a = Post {
            id: "1".to_string(),
            likes: 10,
            ..Post::default()
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.likes = 11;
        assert_ne!(a, b);
    }
}
