// src/services/merge.rs
use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use log::error;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use super::fetcher::QuoteFetcher;
use super::symbols::SymbolMapper;
use crate::models::{CalculatedMetrics, HoldingRecord, HybridView, LiveQuote, PortfolioSummary};

/// Display price: live quote, then a positive static CMP, then purchase price.
pub fn resolve_current_price(holding: &HoldingRecord, live: Option<&LiveQuote>) -> f64 {
    if let Some(quote) = live {
        return quote.current_price;
    }
    match holding.last_price {
        Some(price) if price > 0.0 => price,
        _ => holding.purchase_price.unwrap_or(0.0),
    }
}

pub fn calculate_metrics(holding: &HoldingRecord, current_price: f64) -> CalculatedMetrics {
    let quantity = holding.quantity.unwrap_or(0.0);
    let investment = holding.investment.unwrap_or(0.0);
    let present_value = current_price * quantity;
    let gain_loss = present_value - investment;
    let gain_loss_percent = if investment > 0.0 {
        gain_loss / investment * 100.0
    } else {
        0.0
    };

    CalculatedMetrics {
        current_price,
        present_value,
        gain_loss,
        gain_loss_percent,
        // Stored weight from the snapshot, not recomputed against live values
        portfolio_percentage: holding.portfolio_weight.unwrap_or(0.0),
    }
}

pub fn compose_view(holding: HoldingRecord, live: Option<LiveQuote>) -> HybridView {
    let current_price = resolve_current_price(&holding, live.as_ref());
    let calculated = calculate_metrics(&holding, current_price);
    HybridView {
        base_data: holding,
        live_data: live,
        calculated,
    }
}

pub fn summarize(views: &[HybridView]) -> PortfolioSummary {
    let total_investment: f64 = views
        .iter()
        .map(|v| v.base_data.investment.unwrap_or(0.0))
        .sum();
    let total_present_value: f64 = views.iter().map(|v| v.calculated.present_value).sum();
    let total_gain_loss = total_present_value - total_investment;
    let total_gain_loss_percent = if total_investment > 0.0 {
        total_gain_loss / total_investment * 100.0
    } else {
        0.0
    };

    PortfolioSummary {
        total_stocks: views.len(),
        total_investment,
        total_present_value,
        total_gain_loss,
        total_gain_loss_percent,
        last_updated: Utc::now(),
    }
}

/// Joins static holdings with live quotes.
pub struct HybridMerge {
    symbols: Arc<SymbolMapper>,
    fetcher: Arc<QuoteFetcher>,
}

impl HybridMerge {
    pub fn new(symbols: Arc<SymbolMapper>, fetcher: Arc<QuoteFetcher>) -> Self {
        HybridMerge { symbols, fetcher }
    }

    async fn live_quote(&self, holding: &HoldingRecord) -> Option<LiveQuote> {
        let code = holding.listing_code()?;
        let symbol = self.symbols.map_str(&code);

        match AssertUnwindSafe(self.fetcher.resolve_quote(&symbol))
            .catch_unwind()
            .await
        {
            Ok(quote) => quote,
            Err(_) => {
                error!("Quote lookup for {} panicked, using static price", symbol);
                None
            }
        }
    }

    pub async fn build_view(&self, holding: &HoldingRecord) -> HybridView {
        let live = self.live_quote(holding).await;
        compose_view(holding.clone(), live)
    }

    /// Re-fetches the quote for an existing view. The previous live quote is
    /// not carried over.
    pub async fn refresh_view(&self, view: &HybridView) -> HybridView {
        self.build_view(&view.base_data).await
    }

    pub async fn build_all(&self, holdings: &[HoldingRecord]) -> Vec<HybridView> {
        join_all(holdings.iter().map(|h| self.build_view(h))).await
    }

    /// Refreshes every view on its own task. A task that dies keeps its
    /// previous view.
    pub async fn refresh_all(self: &Arc<Self>, views: &[HybridView]) -> Vec<HybridView> {
        let handles: Vec<_> = views
            .iter()
            .cloned()
            .map(|view| {
                let merge = Arc::clone(self);
                tokio::spawn(async move { merge.refresh_view(&view).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(views)
            .map(|(joined, previous)| match joined {
                Ok(view) => view,
                Err(e) => {
                    error!("Refresh task failed: {}", e);
                    previous.clone()
                }
            })
            .collect()
    }
}
