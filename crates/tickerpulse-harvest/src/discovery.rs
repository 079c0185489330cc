//! Trending ticker discovery from a ranked HTML table.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tickerpulse_core::{retry_with_backoff, RetryPolicy, Ticker};

use crate::error::DiscoveryError;

const CODE_CELL_SELECTOR: &str = r#"td[data-th="Code"], td[data-title="Code"]"#;

/// Source of the ordered list of tickers to harvest.
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn trending(&self) -> Result<Vec<Ticker>, DiscoveryError>;
}

/// Scrapes the finder.com "top trending stocks on Twitter" table.
pub struct FinderDiscovery {
    client: Client,
    url: String,
    limit: usize,
    retry: RetryPolicy,
}

impl FinderDiscovery {
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Http`] if the HTTP client cannot be built.
    pub fn new(
        url: &str,
        user_agent: &str,
        timeout_secs: u64,
        limit: usize,
        retry: RetryPolicy,
    ) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            limit,
            retry,
        })
    }

    async fn fetch_page(&self) -> Result<String, DiscoveryError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl TickerSource for FinderDiscovery {
    async fn trending(&self) -> Result<Vec<Ticker>, DiscoveryError> {
        let html = retry_with_backoff(self.retry, "ticker discovery", || self.fetch_page()).await?;
        let tickers = parse_trending_tickers(&html, self.limit);
        if tickers.is_empty() {
            tracing::warn!(url = %self.url, "no ticker cells found on discovery page");
        } else {
            tracing::info!(count = tickers.len(), "discovered trending tickers");
        }
        Ok(tickers)
    }
}

/// Extract up to `limit` cashtags from the page's `Code` column, in page order.
///
/// A cell's `<strong>` text wins over the cell text when present. Every
/// symbol is returned with a `$` prefix; blanks and repeats are dropped.
#[must_use]
pub fn parse_trending_tickers(html: &str, limit: usize) -> Vec<Ticker> {
    let code_cell = Selector::parse(CODE_CELL_SELECTOR).expect("valid code cell selector");
    let strong = Selector::parse("strong").expect("valid strong selector");
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&code_cell)
        .filter_map(|cell| {
            let raw: String = match cell.select(&strong).next() {
                Some(bold) => bold.text().collect(),
                None => cell.text().collect(),
            };
            let symbol = raw.trim();
            if symbol.is_empty() {
                return None;
            }
            let symbol = if symbol.starts_with('$') {
                symbol.to_string()
            } else {
                format!("${symbol}")
            };
            Some(symbol)
        })
        .filter(|symbol| seen.insert(symbol.clone()))
        .take(limit)
        .map(Ticker::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table>
          <tr><th>Rank</th><th>Code</th></tr>
          <tr><td>1</td><td data-th="Code"><strong> AAPL </strong> Apple</td></tr>
          <tr><td>2</td><td data-title="Code">TSLA</td></tr>
          <tr><td>3</td><td data-th="Code"><strong>NVDA</strong></td></tr>
          <tr><td>4</td><td data-th="Name">Not a code</td></tr>
          <tr><td>5</td><td data-th="Code">   </td></tr>
          <tr><td>6</td><td data-th="Code"><strong>AAPL</strong></td></tr>
        </table>"#;

    #[test]
    fn extracts_code_cells_in_order_with_cashtag_prefix() {
        let tickers = parse_trending_tickers(PAGE, 30);
        let symbols: Vec<&str> = tickers.iter().map(Ticker::as_str).collect();
        assert_eq!(symbols, vec!["$AAPL", "$TSLA", "$NVDA"]);
    }

    #[test]
    fn caps_result_count() {
        let tickers = parse_trending_tickers(PAGE, 2);
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[1].as_str(), "$TSLA");
    }

    #[test]
    fn page_without_table_yields_nothing() {
        assert!(parse_trending_tickers("<html><body>maintenance</body></html>", 30).is_empty());
    }
}
