//! Per-post sentiment enrichment.

use crate::classifier::{Classification, Classifier};
use crate::record::{candidate_text, mark_unknown, set_sentiment, Record};

/// Counts for one enriched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub classified: usize,
    /// No candidate text; the service was not called.
    pub skipped: usize,
    /// The service answered without a usable label.
    pub unclassified: usize,
    /// The call failed.
    pub failed: usize,
}

pub struct SentimentEnricher<'a> {
    classifier: &'a dyn Classifier,
    max_chars: usize,
}

impl<'a> SentimentEnricher<'a> {
    #[must_use]
    pub fn new(classifier: &'a dyn Classifier, max_chars: usize) -> Self {
        Self {
            classifier,
            max_chars,
        }
    }

    /// Label every record, one classifier call at a time.
    ///
    /// Afterwards every record has `sentiment` and `sentiment_score` set;
    /// records that could not be classified get the `unknown`/`0.0` sentinel.
    /// A failed call never stops the remaining records.
    pub async fn enrich(&self, records: &mut [Record]) -> EnrichStats {
        let mut stats = EnrichStats::default();

        for (index, record) in records.iter_mut().enumerate() {
            let Some(text) = candidate_text(record).map(|t| truncate_chars(t, self.max_chars)) else {
                mark_unknown(record);
                stats.skipped += 1;
                continue;
            };

            match self.classifier.classify(&text).await {
                Ok(Classification::Classified { label, score }) => {
                    set_sentiment(record, label, score);
                    stats.classified += 1;
                }
                Ok(Classification::Unclassified) => {
                    tracing::debug!(post = index + 1, "classifier returned no label");
                    mark_unknown(record);
                    stats.unclassified += 1;
                }
                Err(e) => {
                    tracing::error!(post = index + 1, error = %e, "sentiment inference failed");
                    mark_unknown(record);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// First `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
