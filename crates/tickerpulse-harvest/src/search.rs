//! Social search boundary and its `bird` CLI implementation.
//!
//! [`BirdSearch`] runs `bird search "{query}" --json -n {limit} --auth-token ... --ct0 ...`
//! once per attempt, trying each pooled account in turn until one succeeds.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tickerpulse_core::{retry_with_backoff, RetryPolicy, Ticker};

use crate::accounts::{AccountPool, Credentials};
use crate::error::SearchError;
use crate::normalize::extract_hashtags;

const STDERR_EXCERPT_CHARS: usize = 500;

/// Ranking tier requested from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTier {
    Top,
    Latest,
}

/// One time-windowed search for a ticker.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub ticker: Ticker,
    pub since: DateTime<Utc>,
    pub limit: u32,
    pub tier: ResultTier,
}

impl SearchRequest {
    /// `"{ticker} lang:en since:{YYYY-MM-DD_HH:MM:SS_UTC}"`
    #[must_use]
    pub fn query(&self) -> String {
        format!(
            "{} lang:en since:{}",
            self.ticker,
            self.since.format("%Y-%m-%d_%H:%M:%S_UTC")
        )
    }
}

/// A post as returned by the source, before cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub text: String,
    pub created_at: String,
    pub like_count: u64,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub hashtags: Vec<String>,
    pub url: String,
}

#[async_trait]
pub trait SocialSearch: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BirdTweet {
    id: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    author: BirdAuthor,
}

#[derive(Deserialize)]
struct BirdAuthor {
    username: String,
    #[serde(default)]
    name: String,
}

/// Decode `bird --json` output into hits with canonical status URLs.
///
/// # Errors
///
/// Returns [`SearchError::Decode`] if `stdout` is not a JSON array of tweets.
pub fn decode_bird_output(stdout: &[u8]) -> Result<Vec<SearchHit>, SearchError> {
    let tweets: Vec<BirdTweet> = serde_json::from_slice(stdout)?;
    Ok(tweets
        .into_iter()
        .map(|tweet| SearchHit {
            url: format!(
                "https://x.com/{}/status/{}",
                tweet.author.username, tweet.id
            ),
            hashtags: extract_hashtags(&tweet.text),
            id: tweet.id,
            username: tweet.author.username,
            display_name: tweet.author.name,
            text: tweet.text,
            created_at: tweet.created_at,
            like_count: tweet.like_count,
            retweet_count: tweet.retweet_count,
            reply_count: tweet.reply_count,
        })
        .collect())
}

pub struct BirdSearch {
    bin: String,
    accounts: AccountPool,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl BirdSearch {
    #[must_use]
    pub fn new(bin: &str, accounts: AccountPool, timeout_secs: u64, retry: RetryPolicy) -> Self {
        Self {
            bin: bin.to_string(),
            accounts,
            timeout_secs,
            retry,
        }
    }

    async fn search_with_account(
        &self,
        account: &Credentials,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let query = request.query();
        let limit = request.limit.to_string();
        // bird has no tier switch; `request.tier` is not forwarded.
        let mut command = tokio::process::Command::new(&self.bin);
        command
            .args([
                "search",
                query.as_str(),
                "--json",
                "-n",
                limit.as_str(),
                "--auth-token",
                account.auth_token.as_str(),
                "--ct0",
                account.ct0.as_str(),
            ])
            .kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), command.output())
            .await
            .map_err(|_| SearchError::Timeout {
                secs: self.timeout_secs,
            })?
            .map_err(|source| SearchError::Spawn {
                bin: self.bin.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(STDERR_EXCERPT_CHARS)
                .collect();
            return Err(SearchError::NonZeroExit {
                status: output.status.code(),
                stderr,
            });
        }

        decode_bird_output(&output.stdout)
    }

    async fn search_across_accounts(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if self.accounts.is_empty() {
            return Err(SearchError::NoAccounts);
        }

        let mut last = String::new();
        for account in self.accounts.accounts() {
            match self.search_with_account(account, request).await {
                Ok(hits) => {
                    tracing::debug!(
                        ticker = %request.ticker,
                        account = %account.account,
                        count = hits.len(),
                        "search succeeded"
                    );
                    return Ok(hits);
                }
                // A missing binary fails the same way for every account.
                Err(e @ SearchError::Spawn { .. }) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        ticker = %request.ticker,
                        account = %account.account,
                        error = %e,
                        "search failed with account, trying next"
                    );
                    last = e.to_string();
                }
            }
        }

        Err(SearchError::AllAccountsFailed {
            attempts: self.accounts.len(),
            last,
        })
    }
}

#[async_trait]
impl SocialSearch for BirdSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError> {
        retry_with_backoff(self.retry, "social search", || {
            self.search_across_accounts(request)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn query_embeds_ticker_language_and_window_start() {
        let request = SearchRequest {
            ticker: Ticker::new("$AAPL"),
            since: Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 5).unwrap(),
            limit: 125,
            tier: ResultTier::Top,
        };
        assert_eq!(
            request.query(),
            "$AAPL lang:en since:2024-01-01_12:30:05_UTC"
        );
    }

    #[test]
    fn decodes_bird_tweets_with_engagement() {
        let json = r#"[
            {
                "id": "1234567890",
                "text": "Loading up on $AAPL #earnings",
                "createdAt": "Mon Jan 01 12:00:00 +0000 2024",
                "likeCount": 42,
                "retweetCount": 7,
                "replyCount": 3,
                "author": { "username": "trader", "name": "Day Trader 📈" },
                "authorId": "111"
            },
            {
                "id": "99",
                "text": "no counts here",
                "author": { "username": "quiet" }
            }
        ]"#.as_bytes();
        let hits = decode_bird_output(json).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://x.com/trader/status/1234567890");
        assert_eq!(hits[0].like_count, 42);
        assert_eq!(hits[0].retweet_count, 7);
        assert_eq!(hits[0].reply_count, 3);
        assert_eq!(hits[0].hashtags, vec!["earnings".to_string()]);
        assert_eq!(hits[0].display_name, "Day Trader 📈");
        assert_eq!(hits[1].like_count, 0);
        assert_eq!(hits[1].display_name, "");
    }

    #[test]
    fn rejects_non_array_output() {
        assert!(matches!(
            decode_bird_output(b"{\"error\":\"rate limited\"}"),
            Err(SearchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn empty_pool_fails_without_spawning() {
        let search = BirdSearch::new(
            "definitely-not-a-real-binary",
            AccountPool::default(),
            5,
            RetryPolicy::NONE,
        );
        let request = SearchRequest {
            ticker: Ticker::new("$AAPL"),
            since: Utc::now(),
            limit: 10,
            tier: ResultTier::Top,
        };
        assert!(matches!(
            search.search(&request).await,
            Err(SearchError::NoAccounts)
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let accounts = AccountPool::from_json(br#"{"alice": "auth_token=a; ct0=b"}"#).unwrap();
        let search = BirdSearch::new(
            "definitely-not-a-real-binary",
            accounts,
            5,
            RetryPolicy::NONE,
        );
        let request = SearchRequest {
            ticker: Ticker::new("$AAPL"),
            since: Utc::now(),
            limit: 10,
            tier: ResultTier::Top,
        };
        assert!(matches!(
            search.search(&request).await,
            Err(SearchError::Spawn { .. })
        ));
    }
}
