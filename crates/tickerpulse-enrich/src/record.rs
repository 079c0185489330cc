//! Raw partition records as loaded, untyped.
//!
//! Enrichment only reads the candidate text fields and adds `sentiment` and
//! `sentiment_score`; every other field is written back exactly as loaded.

use serde_json::{Map, Value};

/// Label assigned when classification is skipped or fails.
pub const UNKNOWN_SENTIMENT: &str = "unknown";

/// Fields consulted, in order, for the text to classify.
const TEXT_FIELDS: [&str; 4] = ["content", "text", "rawContent", "full_text"];

/// One post as stored in a raw partition file.
pub type Record = Map<String, Value>;

/// First candidate field holding a string that is non-empty after trimming.
///
/// Missing, `null` and non-string values fall through to the next field.
#[must_use]
pub fn candidate_text(record: &Record) -> Option<&str> {
    TEXT_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
}

pub fn set_sentiment(record: &mut Record, label: impl Into<String>, score: f64) {
    record.insert("sentiment".to_string(), Value::String(label.into()));
    record.insert("sentiment_score".to_string(), Value::from(score));
}

pub fn mark_unknown(record: &mut Record) {
    set_sentiment(record, UNKNOWN_SENTIMENT, 0.0);
}
