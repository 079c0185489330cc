//! Authenticated account pool for the social search adapter.
//!
//! The pool is a JSON object stored next to the raw partitions, mapping an
//! account identifier to its session cookie. Cookies may be a header string
//! (`auth_token=...; ct0=...`) or an object with `auth_token` and `ct0`.

use std::collections::BTreeMap;

use serde::Deserialize;
use tickerpulse_storage::{Fetch, ObjectStore};

use crate::error::HarvestError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub account: String,
    pub auth_token: String,
    pub ct0: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("auth_token", &"[redacted]")
            .field("ct0", &"[redacted]")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CookieValue {
    Header(String),
    Fields {
        auth_token: Option<String>,
        ct0: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct AccountPool {
    accounts: Vec<Credentials>,
}

impl AccountPool {
    /// Load the pool from `bucket`/`key`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::AccountsNotFound`] when the object is absent,
    /// [`HarvestError::Deserialize`] when it is not a JSON object, or
    /// [`HarvestError::Storage`] on storage failure.
    pub async fn load(
        store: &dyn ObjectStore,
        bucket: &str,
        key: &str,
    ) -> Result<Self, HarvestError> {
        match store.get(bucket, key).await? {
            Fetch::Found(object) => Self::from_json(&object.body).map_err(|source| {
                HarvestError::Deserialize {
                    context: format!("account pool {bucket}/{key}"),
                    source,
                }
            }),
            Fetch::NotFound => Err(HarvestError::AccountsNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Parse the pool, skipping accounts that lack either credential.
    ///
    /// # Errors
    ///
    /// Returns the decode error when `body` is not an object of cookies.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, CookieValue> = serde_json::from_slice(body)?;
        let mut accounts = Vec::with_capacity(raw.len());

        for (account, cookie) in raw {
            let (auth_token, ct0) = match cookie {
                CookieValue::Header(header) => parse_cookie_header(&header),
                CookieValue::Fields { auth_token, ct0 } => (auth_token, ct0),
            };
            match (auth_token, ct0) {
                (Some(auth_token), Some(ct0)) if !auth_token.is_empty() && !ct0.is_empty() => {
                    accounts.push(Credentials {
                        account,
                        auth_token,
                        ct0,
                    });
                }
                _ => {
                    tracing::warn!(account = %account, "account cookie lacks auth_token or ct0; skipping");
                }
            }
        }

        Ok(Self { accounts })
    }

    #[must_use]
    pub fn accounts(&self) -> &[Credentials] {
        &self.accounts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Extract `auth_token` and `ct0` from a cookie header, or from a cookie
/// string that is itself a JSON object.
fn parse_cookie_header(header: &str) -> (Option<String>, Option<String>) {
    let trimmed = header.trim();
    if trimmed.starts_with('{') {
        if let Ok(map) = serde_json::from_str::<BTreeMap<String, String>>(trimmed) {
            return (map.get("auth_token").cloned(), map.get("ct0").cloned());
        }
    }

    let mut auth_token = None;
    let mut ct0 = None;
    for pair in trimmed.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        match name.trim() {
            "auth_token" => auth_token = Some(value.trim().to_string()),
            "ct0" => ct0 = Some(value.trim().to_string()),
            _ => {}
        }
    }
    (auth_token, ct0)
}
