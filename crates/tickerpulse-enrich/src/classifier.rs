//! Sentiment classification boundary and its HTTP inference client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tickerpulse_core::{retry_with_backoff, RetryPolicy};

use crate::error::EnrichError;

/// Result of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Classified { label: String, score: f64 },
    /// The service answered but offered no usable candidate.
    Unclassified,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, EnrichError>;
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Client for a text-classification endpoint that accepts `{"inputs": text}`
/// and answers with `[{label, score}, ...]`, possibly nested one level.
pub struct InferenceClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl InferenceClient {
    /// # Errors
    ///
    /// Returns [`EnrichError::Http`] if the HTTP client cannot be built.
    pub fn new(
        url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
            retry,
        })
    }

    async fn invoke(&self, text: &str) -> Result<Value, EnrichError> {
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&InferenceRequest { inputs: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| EnrichError::Deserialize {
            context: format!("inference response from {}", self.url),
            source,
        })
    }
}

#[async_trait]
impl Classifier for InferenceClient {
    async fn classify(&self, text: &str) -> Result<Classification, EnrichError> {
        let response = retry_with_backoff(self.retry, "sentiment inference", || self.invoke(text)).await?;
        Ok(pick_best_label(&response))
    }
}

/// Select the highest-scoring `{label, score}` candidate.
///
/// Accepts a flat array or an array whose first element is the candidate
/// array. Entries without a string `label` are ignored; a missing `score`
/// counts as `0.0`. Ties go to the earlier candidate.
#[must_use]
pub fn pick_best_label(response: &Value) -> Classification {
    let Some(items) = response.as_array() else {
        return Classification::Unclassified;
    };
    let candidates = match items.first() {
        Some(Value::Array(inner)) => inner,
        Some(_) => items,
        None => return Classification::Unclassified,
    };

    let best = candidates
        .iter()
        .filter_map(|candidate| {
            let object = candidate.as_object()?;
            let label = object.get("label")?.as_str()?;
            let score = object.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            Some((label, score))
        })
        .fold(None, |best: Option<(&str, f64)>, (label, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((label, score)),
        });

    match best {
        Some((label, score)) => Classification::Classified {
            label: label.to_string(),
            score,
        },
        None => Classification::Unclassified,
    }
}
