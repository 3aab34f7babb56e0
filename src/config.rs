// src/config.rs
use anyhow::{Context, Result};
use log::warn;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_YAHOO_PAGE_URL: &str = "https://finance.yahoo.com";
pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_SCREENER_URL: &str = "https://www.screener.in";
pub const DEFAULT_GOOGLE_FINANCE_URL: &str = "https://www.google.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub portfolio_data_path: PathBuf,
    pub symbol_map_path: Option<PathBuf>,
    pub alpha_vantage_api_key: Option<String>,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub yahoo_chart_base_url: String,
    pub yahoo_quote_base_url: String,
    pub alpha_vantage_base_url: String,
    pub screener_base_url: String,
    pub google_finance_base_url: String,
    pub yahoo_page_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: 3030,
            portfolio_data_path: PathBuf::from("data/portfolio.json"),
            symbol_map_path: None,
            alpha_vantage_api_key: None,
            refresh_interval: Duration::from_secs(15),
            request_timeout: Duration::from_secs(5),
            yahoo_chart_base_url: DEFAULT_YAHOO_API_URL.to_string(),
            yahoo_quote_base_url: DEFAULT_YAHOO_API_URL.to_string(),
            alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_URL.to_string(),
            screener_base_url: DEFAULT_SCREENER_URL.to_string(),
            google_finance_base_url: DEFAULT_GOOGLE_FINANCE_URL.to_string(),
            yahoo_page_base_url: DEFAULT_YAHOO_PAGE_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment. Call `dotenv().ok()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let port = match get("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("PORT must be a number, got {:?}", port))?,
            None => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let refresh_interval = match get("REFRESH_INTERVAL_SECS") {
            Some(secs) => Duration::from_secs(parse_positive_secs("REFRESH_INTERVAL_SECS", &secs)?),
            None => defaults.refresh_interval,
        };

        let request_timeout = match get("QUOTE_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(parse_positive_secs("QUOTE_TIMEOUT_SECS", &secs)?),
            None => defaults.request_timeout,
        };

        Ok(AppConfig {
            port,
            portfolio_data_path: get("PORTFOLIO_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.portfolio_data_path),
            symbol_map_path: get("SYMBOL_MAP_PATH").map(PathBuf::from),
            alpha_vantage_api_key: get("ALPHA_VANTAGE_API_KEY")
                .or_else(|| get("NEXT_PUBLIC_ALPHA_VANTAGE_API_KEY")),
            refresh_interval,
            request_timeout,
            yahoo_chart_base_url: get("YAHOO_CHART_BASE_URL").unwrap_or(defaults.yahoo_chart_base_url),
            yahoo_quote_base_url: get("YAHOO_QUOTE_BASE_URL").unwrap_or(defaults.yahoo_quote_base_url),
            alpha_vantage_base_url: get("ALPHA_VANTAGE_BASE_URL").unwrap_or(defaults.alpha_vantage_base_url),
            screener_base_url: get("SCREENER_BASE_URL").unwrap_or(defaults.screener_base_url),
            google_finance_base_url: get("GOOGLE_FINANCE_BASE_URL")
                .unwrap_or(defaults.google_finance_base_url),
            yahoo_page_base_url: get("YAHOO_PAGE_BASE_URL").unwrap_or(defaults.yahoo_page_base_url),
        })
    }
}

fn parse_positive_secs(key: &str, value: &str) -> Result<u64> {
    let secs = value
        .parse::<u64>()
        .with_context(|| format!("{} must be a whole number of seconds, got {:?}", key, value))?;
    if secs == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(secs)
}
