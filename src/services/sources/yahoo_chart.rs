// src/services/sources/yahoo_chart.rs
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use super::{ensure_success, percent_change, valid_price, QuoteSource, SourceError};
use crate::models::LiveQuote;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    market_cap: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    trailing_eps: Option<f64>,
    dividend_yield: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<IndicatorQuote>,
}

#[derive(Debug, Deserialize)]
struct IndicatorQuote {
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Yahoo Finance v8 chart API, the primary source.
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        YahooChartSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "Yahoo Finance"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, SourceError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Fetching Yahoo chart for {}", symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("interval", "1m"), ("range", "1d")])
            .send()
            .await?;
        ensure_success(&response)?;
        let envelope: ChartEnvelope = response.json().await?;

        let result = envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or(SourceError::MissingField("chart.result"))?;
        let meta = result.meta;

        let current_price = valid_price(
            "regularMarketPrice",
            meta.regular_market_price
                .ok_or(SourceError::MissingField("meta.regularMarketPrice"))?,
        )?;
        let previous_close = meta
            .previous_close
            .or(meta.chart_previous_close)
            .unwrap_or(current_price);
        let change = current_price - previous_close;

        // Last non-null sample of the intraday volume series
        let volume = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .and_then(|q| q.volume.into_iter().rev().flatten().next())
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v as u64)
            .unwrap_or(0);

        Ok(LiveQuote {
            symbol: symbol.to_string(),
            current_price,
            previous_close,
            change,
            change_percent: percent_change(change, previous_close),
            volume,
            market_cap: meta.market_cap.unwrap_or(0.0),
            pe_ratio: meta.trailing_pe.unwrap_or(0.0),
            earnings_per_share: meta.trailing_eps.unwrap_or(0.0),
            dividend_yield: meta.dividend_yield.unwrap_or(0.0),
            last_updated: Utc::now(),
            source: self.name().to_string(),
        })
    }
}
