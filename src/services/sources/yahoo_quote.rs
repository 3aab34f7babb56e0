// src/services/sources/yahoo_quote.rs
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, percent_change, valid_price, QuoteSource, SourceError};
use crate::models::LiveQuote;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEnvelope {
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    regular_market_price: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    trailing_eps: Option<f64>,
    eps_trailing_twelve_months: Option<f64>,
    dividend_yield: Option<f64>,
}

/// Yahoo Finance v7 quote endpoint.
pub struct YahooQuoteSource {
    client: Client,
    base_url: String,
}

impl YahooQuoteSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        YahooQuoteSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    fn name(&self) -> &'static str {
        "Yahoo Finance Quote"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, SourceError> {
        let response = self
            .client
            .get(format!("{}/v7/finance/quote", self.base_url))
            .query(&[("symbols", symbol)])
            .send()
            .await?;
        ensure_success(&response)?;
        let envelope: QuoteEnvelope = response.json().await?;

        let quote = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or(SourceError::MissingField("quoteResponse.result"))?;

        let current_price = valid_price(
            "regularMarketPrice",
            quote
                .regular_market_price
                .ok_or(SourceError::MissingField("regularMarketPrice"))?,
        )?;
        let previous_close = quote.regular_market_previous_close.unwrap_or(current_price);
        let change = current_price - previous_close;

        Ok(LiveQuote {
            symbol: symbol.to_string(),
            current_price,
            previous_close,
            change,
            change_percent: percent_change(change, previous_close),
            volume: quote.regular_market_volume.unwrap_or(0.0).max(0.0) as u64,
            market_cap: quote.market_cap.unwrap_or(0.0),
            pe_ratio: quote.trailing_pe.unwrap_or(0.0),
            earnings_per_share: quote
                .trailing_eps
                .or(quote.eps_trailing_twelve_months)
                .unwrap_or(0.0),
            dividend_yield: quote.dividend_yield.unwrap_or(0.0),
            last_updated: Utc::now(),
            source: self.name().to_string(),
        })
    }
}
