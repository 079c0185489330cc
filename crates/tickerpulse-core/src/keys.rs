//! Storage key scheme shared by the harvest writer and the enrichment trigger.
//!
//! Raw partitions live at `tweets/{stem}.json/date={YYYY-MM-DD}/data.json`;
//! enriched output is flattened to `{stem}-{date}.json`.

use chrono::NaiveDate;

const RAW_ROOT: &str = "tweets";
const RAW_FILE: &str = "data.json";
const DATE_PREFIX: &str = "date=";

/// Prefix under which every raw partition file is written.
pub const RAW_PREFIX: &str = "tweets/";

/// One ticker's partition for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKey {
    ticker: String,
    date: String,
}

/// Why a storage key was not accepted as a raw partition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    /// The key does not end in `/data.json`.
    NotDataFile,
    /// The key is not `tweets/{ticker}/date={date}/data.json`.
    UnexpectedLayout,
}

impl std::fmt::Display for KeyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyRejection::NotDataFile => write!(f, "key does not end with /{RAW_FILE}"),
            KeyRejection::UnexpectedLayout => write!(f, "path structure is unexpected"),
        }
    }
}

impl PartitionKey {
    /// Partition for `ticker` on `date`; the ticker is reduced to its file stem.
    #[must_use]
    pub fn new(ticker: &crate::Ticker, date: NaiveDate) -> Self {
        Self {
            ticker: ticker.file_stem(),
            date: date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Parse an already URL-decoded raw partition key.
    ///
    /// The ticker is the second segment with its trailing extension removed;
    /// the date is whatever follows `date=` in the third.
    ///
    /// # Errors
    ///
    /// Returns [`KeyRejection`] when the key is not a raw partition file.
    pub fn parse_raw_key(key: &str) -> Result<Self, KeyRejection> {
        if !key.ends_with(&format!("/{RAW_FILE}")) {
            return Err(KeyRejection::NotDataFile);
        }

        let parts: Vec<&str> = key.split('/').collect();
        let [root, ticker_file, partition, _file] = parts.as_slice() else {
            return Err(KeyRejection::UnexpectedLayout);
        };
        if *root != RAW_ROOT {
            return Err(KeyRejection::UnexpectedLayout);
        }

        let ticker = ticker_file
            .rsplit_once('.')
            .map_or(*ticker_file, |(stem, _ext)| stem);
        let date = partition
            .strip_prefix(DATE_PREFIX)
            .ok_or(KeyRejection::UnexpectedLayout)?;

        if ticker.is_empty() || date.is_empty() {
            return Err(KeyRejection::UnexpectedLayout);
        }

        Ok(Self {
            ticker: ticker.to_string(),
            date: date.to_string(),
        })
    }

    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    #[must_use]
    pub fn raw_key(&self) -> String {
        format!(
            "{RAW_ROOT}/{}.json/{DATE_PREFIX}{}/{RAW_FILE}",
            self.ticker, self.date
        )
    }

    #[must_use]
    pub fn enriched_key(&self) -> String {
        format!("{}-{}.json", self.ticker, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ticker;

    #[test]
    fn accepts_well_formed_raw_key() {
        let key = PartitionKey::parse_raw_key("tweets/AAPL.json/date=2024-01-01/data.json").unwrap();
        assert_eq!(key.ticker(), "AAPL");
        assert_eq!(key.date(), "2024-01-01");
        assert_eq!(key.enriched_key(), "AAPL-2024-01-01.json");
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert_eq!(
            PartitionKey::parse_raw_key("other/AAPL.json/data.json"),
            Err(KeyRejection::UnexpectedLayout)
        );
        assert_eq!(
            PartitionKey::parse_raw_key("tweets/x/AAPL.json/date=2024-01-01/data.json"),
            Err(KeyRejection::UnexpectedLayout)
        );
    }

    #[test]
    fn rejects_wrong_suffix() {
        assert_eq!(
            PartitionKey::parse_raw_key("tweets/AAPL.json/date=2024-01-01/notdata.json"),
            Err(KeyRejection::NotDataFile)
        );
    }

    #[test]
    fn rejects_wrong_root_or_partition_segment() {
        assert_eq!(
            PartitionKey::parse_raw_key("posts/AAPL.json/date=2024-01-01/data.json"),
            Err(KeyRejection::UnexpectedLayout)
        );
        assert_eq!(
            PartitionKey::parse_raw_key("tweets/AAPL.json/2024-01-01/data.json"),
            Err(KeyRejection::UnexpectedLayout)
        );
        assert_eq!(
            PartitionKey::parse_raw_key("tweets/AAPL.json/date=/data.json"),
            Err(KeyRejection::UnexpectedLayout)
        );
    }

    #[test]
    fn ticker_without_extension_is_kept_whole() {
        let key = PartitionKey::parse_raw_key("tweets/TSLA/date=2024-02-03/data.json").unwrap();
        assert_eq!(key.ticker(), "TSLA");
    }

    #[test]
    fn only_last_extension_is_stripped() {
        let key =
            PartitionKey::parse_raw_key("tweets/BRK.B.json/date=2024-02-03/data.json").unwrap();
        assert_eq!(key.ticker(), "BRK.B");
        assert_eq!(key.enriched_key(), "BRK.B-2024-02-03.json");
    }

    #[test]
    fn raw_key_round_trips_through_parse() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let key = PartitionKey::new(&Ticker::new("$NVDA"), date);
        assert_eq!(key.raw_key(), "tweets/NVDA.json/date=2024-01-01/data.json");
        assert_eq!(PartitionKey::parse_raw_key(&key.raw_key()).unwrap(), key);
    }
}
