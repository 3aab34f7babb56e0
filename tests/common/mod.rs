// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portfolio_dashboard::models::{HoldingRecord, ListingCode, LiveQuote};
use portfolio_dashboard::services::sources::{QuoteSource, SourceError};

pub fn quote(symbol: &str, price: f64, source: &str) -> LiveQuote {
    LiveQuote {
        symbol: symbol.to_string(),
        current_price: price,
        previous_close: price,
        change: 0.0,
        change_percent: 0.0,
        volume: 0,
        market_cap: 0.0,
        pe_ratio: 0.0,
        earnings_per_share: 0.0,
        dividend_yield: 0.0,
        last_updated: Utc::now(),
        source: source.to_string(),
    }
}

pub fn holding(name: &str, code: Option<&str>, purchase: f64, qty: f64, cmp: f64) -> HoldingRecord {
    HoldingRecord {
        row_number: Some(1),
        name: Some(name.to_string()),
        listing_code: code.map(ListingCode::from),
        purchase_price: Some(purchase),
        quantity: Some(qty),
        investment: Some(purchase * qty),
        last_price: Some(cmp),
        ..HoldingRecord::default()
    }
}

/// Quote source with a fixed answer that records how it was used.
pub struct StaticSource {
    name: &'static str,
    price: Option<f64>,
    available: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    symbols: Mutex<Vec<String>>,
}

impl StaticSource {
    fn build(name: &'static str, price: Option<f64>) -> Self {
        StaticSource {
            name,
            price,
            available: true,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            symbols: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(name: &'static str, price: f64) -> Self {
        Self::build(name, Some(price))
    }

    pub fn failing(name: &'static str) -> Self {
        Self::build(name, None)
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.symbols.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteSource for StaticSource {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<LiveQuote, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.symbols.lock().unwrap().push(symbol.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.price {
            Some(price) => Ok(quote(symbol, price, self.name)),
            None => Err(SourceError::Status(503)),
        }
    }
}

/// Source whose fetch panics, standing in for a bug deep in an adapter.
pub struct PanickingSource;

#[async_trait]
impl QuoteSource for PanickingSource {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn fetch_quote(&self, _symbol: &str) -> Result<LiveQuote, SourceError> {
        panic!("adapter bug")
    }
}
