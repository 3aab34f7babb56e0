// src/services/sources/screener.rs
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use reqwest::Client;
use scraper::{Html, Selector};

use super::{ensure_success, parse_number, percent_change, valid_price, QuoteSource, SourceError};
use crate::models::LiveQuote;

const PRICE_SELECTOR: &str = r#"span[class*="price"]"#;
const CHANGE_SELECTOR: &str = r#"span[class*="change"]"#;

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Selector(format!("{:?}", e)))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

/// Screener company pages carry no exchange suffix.
fn screener_symbol(symbol: &str) -> &str {
    let symbol = symbol.trim();
    symbol
        .strip_suffix(".NS")
        .or_else(|| symbol.strip_suffix(".BO"))
        .unwrap_or(symbol)
}

/// Extracts price and change from a company page. Kept synchronous so the
/// parsed document never lives across an await point.
pub fn parse_company_page(html: &str, symbol: &str) -> Result<LiveQuote, SourceError> {
    let document = Html::parse_document(html);

    let price_text = first_text(&document, &selector(PRICE_SELECTOR)?)
        .ok_or(SourceError::ElementNotFound(PRICE_SELECTOR))?;
    let current_price = parse_number(&price_text)?.ok_or_else(|| SourceError::NotNumeric {
        field: "price",
        raw: price_text.trim().to_string(),
    })?;
    let current_price = valid_price("price", current_price)?;

    // Without a change token there is no sign to trust: report a flat day.
    let change = match first_text(&document, &selector(CHANGE_SELECTOR)?) {
        Some(text) => parse_number(&text)?.unwrap_or(0.0),
        None => 0.0,
    };
    let previous_close = current_price - change;

    Ok(LiveQuote {
        symbol: symbol.to_string(),
        current_price,
        previous_close,
        change,
        change_percent: percent_change(change, previous_close),
        volume: 0,
        market_cap: 0.0,
        pe_ratio: 0.0,
        earnings_per_share: 0.0,
        dividend_yield: 0.0,
        last_updated: Utc::now(),
        source: "Screener.in (Scraped)".to_string(),
    })
}

/// HTML scrape of Screener.in, the last resort.
pub struct ScreenerSource {
    client: Client,
    base_url: String,
}

impl ScreenerSource {
    pub fn new(client: Client, base_url: &str) -> Self {
        ScreenerSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl QuoteSource for ScreenerSource {
    fn name(&self) -> &'static str {
        "Screener.in"
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, SourceError> {
        let url = format!("{}/company/{}/", self.base_url, screener_symbol(symbol));
        debug!("Scraping {}", url);

        let response = self
            .client
            .get(&url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()
            .await?;
        ensure_success(&response)?;
        let html = response.text().await?;

        let quote = parse_company_page(&html, symbol)?;
        info!("Scraped {} from Screener.in: {}", symbol, quote.current_price);
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_price_and_signed_change() {
        let html = r#"
            <div class="company-ratios">
              <span class="number price">₹ 3,890.15</span>
              <span class="change down">-40.15</span>
            </div>"#;
        let quote = parse_company_page(html, "TCS.NS").unwrap();
        assert_eq!(quote.current_price, 3890.15);
        assert_eq!(quote.change, -40.15);
        assert!((quote.previous_close - 3930.30).abs() < 1e-9);
        assert!(quote.change_percent < 0.0);
        assert_eq!(quote.source, "Screener.in (Scraped)");
    }

    #[test]
    fn missing_change_means_flat_day() {
        let html = r#"<span class="current-price">1,200</span>"#;
        let quote = parse_company_page(html, "INFY").unwrap();
        assert_eq!(quote.current_price, 1200.0);
        assert_eq!(quote.change, 0.0);
        assert_eq!(quote.previous_close, 1200.0);
        assert_eq!(quote.change_percent, 0.0);
    }

    #[test]
    fn missing_or_unparseable_price_fails() {
        assert!(matches!(
            parse_company_page("<html><body>redesigned</body></html>", "TCS"),
            Err(SourceError::ElementNotFound(_))
        ));
        assert!(matches!(
            parse_company_page(r#"<span class="price">--</span>"#, "TCS"),
            Err(SourceError::NotNumeric { .. })
        ));
    }

    #[test]
    fn strips_exchange_suffix() {
        assert_eq!(screener_symbol("TCS.NS"), "TCS");
        assert_eq!(screener_symbol("500325.BO"), "500325");
        assert_eq!(screener_symbol("DMART"), "DMART");
    }
}
