//! Enrichment stage: consume storage notifications for newly written raw
//! partitions, label every post with a sentiment from the inference service,
//! write the enriched file, and remove the raw one.

pub mod classifier;
pub mod enricher;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod trigger;

pub use classifier::{pick_best_label, Classification, Classifier, InferenceClient};
pub use enricher::{EnrichStats, SentimentEnricher};
pub use error::EnrichError;
pub use pipeline::{EnrichmentPipeline, EnrichmentReport, FailedFile};
pub use record::{candidate_text, Record, UNKNOWN_SENTIMENT};
pub use trigger::{AcceptedObject, EventRecord, StorageEvent};
