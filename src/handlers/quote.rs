// src/handlers/quote.rs
use futures::FutureExt;
use log::{error, info};
use serde::Deserialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::fetcher::QuoteFetcher;
use crate::services::fundamentals::bare_symbol;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

impl SymbolQuery {
    fn required(&self) -> Result<String, Rejection> {
        self.symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| warp::reject::custom(ApiError::missing_symbol()))
    }
}

async fn resolve(chain: &QuoteFetcher, symbol: &str) -> Result<Json, Rejection> {
    match AssertUnwindSafe(chain.resolve_quote(symbol)).catch_unwind().await {
        Ok(Some(quote)) => {
            info!("{} = {} from {}", symbol, quote.current_price, quote.source);
            Ok(warp::reply::json(&quote))
        }
        Ok(None) => {
            error!("All sources failed for {}", symbol);
            Err(warp::reject::custom(ApiError::all_sources_failed(symbol)))
        }
        Err(_) => {
            error!("Quote lookup for {} panicked", symbol);
            Err(warp::reject::custom(
                ApiError::internal("Unexpected failure while fetching quote").with_symbol(symbol),
            ))
        }
    }
}

pub async fn get_yahoo_quote(query: SymbolQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let symbol = query.required()?;
    resolve(&state.chains.structured, &symbol).await
}

pub async fn get_alpha_vantage_quote(
    query: SymbolQuery,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    let symbol = query.required()?;
    resolve(&state.chains.alternate, &symbol).await
}

pub async fn get_scraped_quote(query: SymbolQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let symbol = query.required()?;
    resolve(&state.chains.scrape, &symbol).await
}

/// Takes a listing code from the snapshot and runs the dashboard chain.
pub async fn get_quote(query: SymbolQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let code = query.required()?;
    let symbol = state.symbols.map_str(&code);
    resolve(&state.chains.dashboard, &symbol).await
}

pub async fn get_fundamentals(query: SymbolQuery, state: Arc<AppState>) -> Result<Json, Rejection> {
    let symbol = query.required()?;
    let scraped = state.fundamentals.fetch(&symbol).await;
    match scraped {
        Ok(fundamentals) => Ok(warp::reply::json(&fundamentals)),
        Err(e) => {
            error!("Fundamentals unavailable for {}: {}", symbol, e);
            Err(warp::reject::custom(
                ApiError::new(
                    warp::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unable to fetch real-time financial data from any source",
                )
                .with_symbol(bare_symbol(&symbol))
                .with_message(e.to_string()),
            ))
        }
    }
}
