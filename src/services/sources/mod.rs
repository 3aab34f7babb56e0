// src/services/sources/mod.rs
//! Provider adapters. Each one fetches a single symbol from one upstream and
//! normalizes it into a [`LiveQuote`]. Failures never leave an adapter: they
//! are logged and reported as `None` so the fetcher can move on.

use async_trait::async_trait;
use log::warn;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::LiveQuote;

pub mod alpha_vantage;
pub mod screener;
pub mod yahoo_chart;
pub mod yahoo_quote;

pub use alpha_vantage::AlphaVantageSource;
pub use screener::ScreenerSource;
pub use yahoo_chart::YahooChartSource;
pub use yahoo_quote::YahooQuoteSource;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("response is missing {0}")]
    MissingField(&'static str),
    #[error("{field} is not numeric: {raw:?}")]
    NotNumeric { field: &'static str, raw: String },
    #[error("expected element not found: {0}")]
    ElementNotFound(&'static str),
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error(transparent)]
    Regex(#[from] regex::Error),
    #[error("no API key configured")]
    Unavailable,
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sources that need credentials report `false` when none are configured,
    /// and the fetcher skips them.
    fn is_available(&self) -> bool {
        true
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, SourceError>;

    async fn fetch(&self, symbol: &str) -> Option<LiveQuote> {
        match self.fetch_quote(symbol).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                warn!("{} failed for {}: {}", self.name(), symbol, e);
                None
            }
        }
    }
}

/// Shared outbound client. The timeout applies to every adapter.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .timeout(timeout)
        .build()
}

pub(crate) fn ensure_success(response: &reqwest::Response) -> Result<(), SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SourceError::Status(status.as_u16()))
    }
}

pub(crate) fn valid_price(field: &'static str, price: f64) -> Result<f64, SourceError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(SourceError::NotNumeric {
            field,
            raw: price.to_string(),
        })
    }
}

pub(crate) fn percent_change(change: f64, previous_close: f64) -> f64 {
    if previous_close > 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    }
}

/// First signed decimal in `text`, thousands separators dropped.
/// "₹ 3,456.70" -> 3456.7, "-12.5 (0.4%)" -> -12.5
pub(crate) fn parse_number(text: &str) -> Result<Option<f64>, SourceError> {
    let re = Regex::new(r"[-+]?\d[\d,]*(?:\.\d+)?")?;
    Ok(re
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok()))
}

/// Every adapter built from configuration, sharing one client.
pub struct SourceSet {
    pub yahoo_chart: Arc<YahooChartSource>,
    pub alpha_vantage: Arc<AlphaVantageSource>,
    pub yahoo_quote: Arc<YahooQuoteSource>,
    pub screener: Arc<ScreenerSource>,
}

impl SourceSet {
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        SourceSet {
            yahoo_chart: Arc::new(YahooChartSource::new(
                client.clone(),
                &config.yahoo_chart_base_url,
            )),
            alpha_vantage: Arc::new(AlphaVantageSource::new(
                client.clone(),
                &config.alpha_vantage_base_url,
                config.alpha_vantage_api_key.clone(),
            )),
            yahoo_quote: Arc::new(YahooQuoteSource::new(
                client.clone(),
                &config.yahoo_quote_base_url,
            )),
            screener: Arc::new(ScreenerSource::new(client, &config.screener_base_url)),
        }
    }

    /// Chart API, then the alternate vendor, then the scrape.
    pub fn dashboard_chain(&self) -> Vec<Arc<dyn QuoteSource>> {
        vec![
            self.yahoo_chart.clone(),
            self.alpha_vantage.clone(),
            self.screener.clone(),
        ]
    }

    /// Structured APIs only, as served by `/api/yahoo-finance/quote`.
    pub fn structured_chain(&self) -> Vec<Arc<dyn QuoteSource>> {
        vec![
            self.yahoo_chart.clone(),
            self.alpha_vantage.clone(),
            self.yahoo_quote.clone(),
        ]
    }

    pub fn alternate_chain(&self) -> Vec<Arc<dyn QuoteSource>> {
        vec![self.alpha_vantage.clone()]
    }

    pub fn scrape_chain(&self) -> Vec<Arc<dyn QuoteSource>> {
        vec![self.screener.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_handles_currency_and_separators() {
        assert_eq!(parse_number("₹ 3,456.70").unwrap(), Some(3456.7));
        assert_eq!(parse_number("-12.5 (0.4%)").unwrap(), Some(-12.5));
        assert_eq!(parse_number("+8").unwrap(), Some(8.0));
        assert_eq!(parse_number("n/a").unwrap(), None);
    }

    #[test]
    fn percent_change_guards_zero_close() {
        assert_eq!(percent_change(10.0, 200.0), 5.0);
        assert_eq!(percent_change(10.0, 0.0), 0.0);
    }

    #[test]
    fn valid_price_rejects_nonsense() {
        assert!(valid_price("price", 101.5).is_ok());
        assert!(valid_price("price", 0.0).is_err());
        assert!(valid_price("price", f64::NAN).is_err());
    }
}
