//! Deduplicating collector: merges one ticker's new search hits into the
//! posts already stored in its partition.

use chrono::{DateTime, Utc};
use tickerpulse_core::{PartitionKey, Post, Ticker};
use tickerpulse_storage::{Fetch, ObjectStore};

use crate::error::HarvestError;
use crate::normalize::{normalize_text, strip_pictographs};
use crate::search::{ResultTier, SearchHit, SearchRequest, SocialSearch};

/// Result of collecting one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectOutcome {
    /// Existing posts followed by every newly added post.
    pub posts: Vec<Post>,
    /// Hits returned by the search.
    pub fetched: usize,
    /// Hits at or above the like floor.
    pub qualified: usize,
    /// Qualified hits not already present in the partition.
    pub added: usize,
}

pub struct Collector<'a> {
    search: &'a dyn SocialSearch,
    store: &'a dyn ObjectStore,
    bucket: &'a str,
    min_likes: u64,
    limit: u32,
}

impl<'a> Collector<'a> {
    #[must_use]
    pub fn new(
        search: &'a dyn SocialSearch,
        store: &'a dyn ObjectStore,
        bucket: &'a str,
        min_likes: u64,
        limit: u32,
    ) -> Self {
        Self {
            search,
            store,
            bucket,
            min_likes,
            limit,
        }
    }

    /// Load the partition's existing posts, search for posts since `since`,
    /// and append every qualifying post that is not already stored.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] if the existing partition cannot be read or
    /// decoded, or if the search fails. Nothing is written either way.
    pub async fn collect(
        &self,
        ticker: &Ticker,
        partition: &PartitionKey,
        since: DateTime<Utc>,
    ) -> Result<CollectOutcome, HarvestError> {
        let mut posts = self.load_existing(partition).await?;

        let request = SearchRequest {
            ticker: ticker.clone(),
            since,
            limit: self.limit,
            tier: ResultTier::Top,
        };
        let hits = self.search.search(&request).await?;
        let fetched = hits.len();

        let mut qualified: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| hit.like_count >= self.min_likes)
            .collect();
        // Stable: equal like counts keep the source's order.
        qualified.sort_by(|a, b| b.like_count.cmp(&a.like_count));
        let qualified_count = qualified.len();

        let fresh = qualified.into_iter().map(|hit| post_from_hit(ticker, hit));
        let added = merge_posts(&mut posts, fresh);

        tracing::debug!(
            ticker = %ticker,
            fetched,
            qualified = qualified_count,
            added,
            total = posts.len(),
            "collected posts"
        );

        Ok(CollectOutcome {
            posts,
            fetched,
            qualified: qualified_count,
            added,
        })
    }

    async fn load_existing(&self, partition: &PartitionKey) -> Result<Vec<Post>, HarvestError> {
        let key = partition.raw_key();
        match self.store.get(self.bucket, &key).await? {
            Fetch::Found(object) => {
                serde_json::from_slice(&object.body).map_err(|source| HarvestError::Deserialize {
                    context: format!("existing partition {}/{key}", self.bucket),
                    source,
                })
            }
            Fetch::NotFound => Ok(Vec::new()),
        }
    }
}

/// Append each post from `incoming` unless a structurally equal post is
/// already in `existing`. Returns how many were appended.
pub fn merge_posts(existing: &mut Vec<Post>, incoming: impl IntoIterator<Item = Post>) -> usize {
    let mut added = 0;
    for post in incoming {
        if !existing.contains(&post) {
            existing.push(post);
            added += 1;
        }
    }
    added
}

fn post_from_hit(ticker: &Ticker, hit: SearchHit) -> Post {
    Post {
        id: hit.id,
        ticker: ticker.clone(),
        username: hit.username,
        display_name: strip_pictographs(&hit.display_name),
        content: normalize_text(&hit.text),
        created_at: hit.created_at,
        likes: hit.like_count,
        retweets: hit.retweet_count,
        replies: hit.reply_count,
        hashtags: hit.hashtags,
        url: hit.url,
        ..Post::default()
    }
}
