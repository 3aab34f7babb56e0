// src/handlers/portfolio.rs
use log::info;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::filters::SearchFilters;
use crate::services::merge::summarize;
use crate::state::AppState;

pub async fn get_portfolio(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&state.dashboard.views()))
}

pub async fn get_summary(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&summarize(&state.dashboard.views())))
}

pub async fn search_portfolio(
    filters: SearchFilters,
    state: Arc<AppState>,
) -> Result<Json, Rejection> {
    let matches = filters.apply(&state.dashboard.views());
    info!("Search {:?} matched {} holdings", filters, matches.len());
    Ok(warp::reply::json(&matches))
}

pub async fn get_holding(code: String, state: Arc<AppState>) -> Result<Json, Rejection> {
    match state.dashboard.find(&code) {
        Some(view) => Ok(warp::reply::json(&view)),
        None => Err(warp::reject::custom(
            ApiError::not_found(format!("No holding listed as {}", code)).with_symbol(code),
        )),
    }
}

/// Out-of-band refresh. The published collection reaches the dashboard
/// through the bus like any scheduled tick.
pub async fn refresh_portfolio(state: Arc<AppState>) -> Result<Json, Rejection> {
    let current = state.dashboard.views();
    let refreshed = state.scheduler.refresh_now(&current).await;
    Ok(warp::reply::json(&refreshed))
}
