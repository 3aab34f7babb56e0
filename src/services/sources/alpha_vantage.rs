// src/services/sources/alpha_vantage.rs
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, valid_price, QuoteSource, SourceError};
use crate::models::LiveQuote;

/// GLOBAL_QUOTE response. Every value is a string; rate-limit and error
/// replies come back as 200 with `Note`/`Information` instead of the quote.
#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "06. volume")]
    volume: Option<String>,
    #[serde(rename = "08. previous close")]
    previous_close: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
    #[serde(rename = "10. change percent")]
    change_percent: Option<String>,
}

fn number(field: &'static str, raw: Option<&str>) -> Result<f64, SourceError> {
    let raw = raw.ok_or(SourceError::MissingField(field))?;
    raw.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| SourceError::NotNumeric {
            field,
            raw: raw.to_string(),
        })
}

/// Alpha Vantage GLOBAL_QUOTE, the alternate vendor. Needs an API key.
pub struct AlphaVantageSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageSource {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        AlphaVantageSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl QuoteSource for AlphaVantageSource {
    fn name(&self) -> &'static str {
        "Alpha Vantage"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, SourceError> {
        let api_key = self.api_key.as_deref().ok_or(SourceError::Unavailable)?;
        debug!("Fetching Alpha Vantage global quote for {}", symbol);

        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", api_key),
            ])
            .send()
            .await?;
        ensure_success(&response)?;
        let body: GlobalQuoteResponse = response.json().await?;

        if let Some(note) = body.note.as_deref().or(body.information.as_deref()) {
            debug!("Alpha Vantage note for {}: {}", symbol, note);
        }
        let quote = body
            .global_quote
            .filter(|q| q.price.is_some())
            .ok_or(SourceError::MissingField("Global Quote.05. price"))?;

        let current_price = valid_price("05. price", number("05. price", quote.price.as_deref())?)?;
        let previous_close = number("08. previous close", quote.previous_close.as_deref())?;
        let change = number("09. change", quote.change.as_deref())?;
        let change_percent = number("10. change percent", quote.change_percent.as_deref())?;
        let volume = number("06. volume", quote.volume.as_deref())?;

        Ok(LiveQuote {
            symbol: symbol.to_string(),
            current_price,
            previous_close,
            change,
            change_percent,
            volume: volume.max(0.0) as u64,
            // not provided by GLOBAL_QUOTE
            market_cap: 0.0,
            pe_ratio: 0.0,
            earnings_per_share: 0.0,
            dividend_yield: 0.0,
            last_updated: Utc::now(),
            source: self.name().to_string(),
        })
    }
}
