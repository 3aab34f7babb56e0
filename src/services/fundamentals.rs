// src/services/fundamentals.rs
use chrono::Utc;
use log::{info, warn};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use super::sources::{ensure_success, parse_number, SourceError};
use crate::models::Fundamentals;

const PE_LABELS: &[&str] = &["p/e ratio", "pe ratio", "pe ratio (ttm)", "p/e (ttm)"];
const EARNINGS_LABELS: &[&str] = &["earnings", "eps", "eps (ttm)", "earnings per share"];
const YAHOO_PE_SELECTOR: &str = r#"[data-test="PE_RATIO-value"], [data-test="PE_RATIO"]"#;
const YAHOO_EPS_SELECTOR: &str = r#"[data-test="EPS_RATIO-value"], [data-test="EPS_RATIO"]"#;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PageFigures {
    pub pe_ratio: f64,
    pub earnings: f64,
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Selector(format!("{:?}", e)))
}

/// Value cell that follows a label cell such as "P/E ratio".
fn labelled_value(document: &Html, labels: &[&str]) -> Result<Option<f64>, SourceError> {
    let cells = selector("div, td, span")?;
    for cell in document.select(&cells) {
        let label = cell.text().collect::<String>().trim().to_lowercase();
        if !labels.contains(&label.as_str()) {
            continue;
        }
        let value = cell
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .map(|el| el.text().collect::<String>());
        if let Some(value) = value {
            if let Some(number) = parse_number(&value)? {
                return Ok(Some(number));
            }
        }
    }
    Ok(None)
}

fn tagged_value(document: &Html, css: &str) -> Result<Option<f64>, SourceError> {
    match document.select(&selector(css)?).next() {
        Some(el) => parse_number(&el.text().collect::<String>()),
        None => Ok(None),
    }
}

pub fn parse_google_page(html: &str) -> Result<PageFigures, SourceError> {
    let document = Html::parse_document(html);
    Ok(PageFigures {
        pe_ratio: labelled_value(&document, PE_LABELS)?.unwrap_or(0.0),
        earnings: labelled_value(&document, EARNINGS_LABELS)?.unwrap_or(0.0),
    })
}

pub fn parse_yahoo_page(html: &str) -> Result<PageFigures, SourceError> {
    let document = Html::parse_document(html);
    let pe_ratio = match labelled_value(&document, PE_LABELS)? {
        Some(pe) => Some(pe),
        None => tagged_value(&document, YAHOO_PE_SELECTOR)?,
    };
    let earnings = match labelled_value(&document, EARNINGS_LABELS)? {
        Some(eps) => Some(eps),
        None => tagged_value(&document, YAHOO_EPS_SELECTOR)?,
    };
    Ok(PageFigures {
        pe_ratio: pe_ratio.unwrap_or(0.0),
        earnings: earnings.unwrap_or(0.0),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// "NSE:BHARTIARTL" -> "BHARTIARTL"
pub fn bare_symbol(symbol: &str) -> &str {
    let symbol = symbol.trim();
    match symbol.split_once(':') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => symbol,
    }
}

/// P/E and earnings scraped from quote pages: Google Finance first, then
/// Yahoo Finance for whatever is still missing.
pub struct FundamentalsScraper {
    client: Client,
    google_base_url: String,
    yahoo_base_url: String,
}

impl FundamentalsScraper {
    pub fn new(client: Client, google_base_url: &str, yahoo_base_url: &str) -> Self {
        FundamentalsScraper {
            client,
            google_base_url: google_base_url.trim_end_matches('/').to_string(),
            yahoo_base_url: yahoo_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn page(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await?;
        ensure_success(&response)?;
        Ok(response.text().await?)
    }

    async fn google(&self, symbol: &str) -> Result<PageFigures, SourceError> {
        let url = format!("{}/finance/quote/{}:NSE", self.google_base_url, symbol);
        parse_google_page(&self.page(&url).await?)
    }

    async fn yahoo(&self, symbol: &str) -> Result<PageFigures, SourceError> {
        let url = format!("{}/quote/{}.NS", self.yahoo_base_url, symbol);
        parse_yahoo_page(&self.page(&url).await?)
    }

    pub async fn fetch(&self, symbol: &str) -> Result<Fundamentals, SourceError> {
        let symbol = bare_symbol(symbol);
        let mut figures = PageFigures::default();
        let mut sources = Vec::new();

        match self.google(symbol).await {
            Ok(google) => {
                if google.pe_ratio != 0.0 || google.earnings != 0.0 {
                    sources.push("Google Finance");
                }
                figures = google;
            }
            Err(e) => warn!("Google Finance failed for {}: {}", symbol, e),
        }

        if figures.pe_ratio == 0.0 || figures.earnings == 0.0 {
            match self.yahoo(symbol).await {
                Ok(yahoo) => {
                    let mut used = false;
                    if figures.pe_ratio == 0.0 && yahoo.pe_ratio != 0.0 {
                        figures.pe_ratio = yahoo.pe_ratio;
                        used = true;
                    }
                    if figures.earnings == 0.0 && yahoo.earnings != 0.0 {
                        figures.earnings = yahoo.earnings;
                        used = true;
                    }
                    if used {
                        sources.push("Yahoo Finance");
                    }
                }
                Err(e) => warn!("Yahoo Finance page failed for {}: {}", symbol, e),
            }
        }

        if figures.pe_ratio == 0.0 && figures.earnings == 0.0 {
            return Err(SourceError::MissingField("P/E ratio and earnings"));
        }

        let source = sources.join(" + ");
        info!("Fundamentals for {} from {}", symbol, source);
        Ok(Fundamentals {
            symbol: symbol.to_string(),
            pe_ratio: round2(figures.pe_ratio),
            earnings: round2(figures.earnings),
            source,
            timestamp: Utc::now(),
        })
    }
}
