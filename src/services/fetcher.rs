// src/services/fetcher.rs
use log::{debug, info, warn};
use std::sync::Arc;

use super::sources::QuoteSource;
use crate::models::LiveQuote;

/// Ordered fallback over quote sources: the first quote wins.
pub struct QuoteFetcher {
    sources: Vec<Arc<dyn QuoteSource>>,
}

impl QuoteFetcher {
    pub fn new(sources: Vec<Arc<dyn QuoteSource>>) -> Self {
        QuoteFetcher { sources }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns `None` only when every source failed or was skipped.
    pub async fn resolve_quote(&self, symbol: &str) -> Option<LiveQuote> {
        for source in &self.sources {
            if !source.is_available() {
                debug!("Skipping {} for {}: not configured", source.name(), symbol);
                continue;
            }
            if let Some(quote) = source.fetch(symbol).await {
                info!(
                    "Fetched {} from {}: {}",
                    symbol,
                    source.name(),
                    quote.current_price
                );
                return Some(quote);
            }
        }
        warn!("All quote sources failed for {}", symbol);
        None
    }
}
