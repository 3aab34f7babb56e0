// src/state.rs
use std::sync::Arc;

use crate::services::dashboard::DashboardState;
use crate::services::fetcher::QuoteFetcher;
use crate::services::fundamentals::FundamentalsScraper;
use crate::services::scheduler::RefreshScheduler;
use crate::services::sources::SourceSet;
use crate::services::symbols::SymbolMapper;

/// Fallback chains behind the quote routes.
pub struct QuoteChains {
    /// Chart API, Alpha Vantage, Screener scrape. Also drives the merge engine.
    pub dashboard: Arc<QuoteFetcher>,
    /// Chart API, Alpha Vantage, v7 quote API.
    pub structured: QuoteFetcher,
    pub alternate: QuoteFetcher,
    pub scrape: QuoteFetcher,
}

impl QuoteChains {
    pub fn from_sources(sources: &SourceSet) -> Self {
        QuoteChains {
            dashboard: Arc::new(QuoteFetcher::new(sources.dashboard_chain())),
            structured: QuoteFetcher::new(sources.structured_chain()),
            alternate: QuoteFetcher::new(sources.alternate_chain()),
            scrape: QuoteFetcher::new(sources.scrape_chain()),
        }
    }
}

/// Everything the handlers need, assembled once in `main`.
pub struct AppState {
    pub symbols: Arc<SymbolMapper>,
    pub chains: QuoteChains,
    pub fundamentals: FundamentalsScraper,
    pub dashboard: Arc<DashboardState>,
    pub scheduler: RefreshScheduler,
}
