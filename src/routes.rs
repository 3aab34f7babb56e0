// src/routes.rs
use log::info;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::{ApiError, ErrorBody};
use crate::handlers::portfolio::{
    get_holding, get_portfolio, get_summary, refresh_portfolio, search_portfolio,
};
use crate::handlers::quote::{
    get_alpha_vantage_quote, get_fundamentals, get_quote, get_scraped_quote, get_yahoo_quote,
    SymbolQuery,
};
use crate::services::filters::SearchFilters;
use crate::state::AppState;

fn error_json(error: &str, message: Option<&str>) -> serde_json::Value {
    serde_json::json!(ErrorBody {
        error,
        symbol: None,
        message,
    })
}

// Every rejection leaves as `{ error, symbol?, message? }`
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, body) = if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status, serde_json::json!(api_error.body()))
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, error_json("Not Found", None))
    } else if let Some(invalid) = err.find::<warp::reject::InvalidQuery>() {
        let message = invalid.to_string();
        (
            StatusCode::BAD_REQUEST,
            error_json("Invalid query", Some(message.as_str())),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, error_json("Method Not Allowed", None))
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_json("Internal server error", None),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), code))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let yahoo_route = warp::path!("api" / "yahoo-finance" / "quote")
        .and(warp::get())
        .and(warp::query::<SymbolQuery>())
        .and(state_filter.clone())
        .and_then(get_yahoo_quote);

    let alpha_vantage_route = warp::path!("api" / "alpha-vantage" / "quote")
        .and(warp::get())
        .and(warp::query::<SymbolQuery>())
        .and(state_filter.clone())
        .and_then(get_alpha_vantage_quote);

    let scrape_route = warp::path!("api" / "scrape-fallback" / "quote")
        .and(warp::get())
        .and(warp::query::<SymbolQuery>())
        .and(state_filter.clone())
        .and_then(get_scraped_quote);

    let quote_route = warp::path!("api" / "quote")
        .and(warp::get())
        .and(warp::query::<SymbolQuery>())
        .and(state_filter.clone())
        .and_then(get_quote);

    let fundamentals_route = warp::path!("api" / "google-finance" / "fundamentals")
        .and(warp::get())
        .and(warp::query::<SymbolQuery>())
        .and(state_filter.clone())
        .and_then(get_fundamentals);

    let portfolio_route = warp::path!("api" / "portfolio")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_portfolio);

    let summary_route = warp::path!("api" / "portfolio" / "summary")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_summary);

    let search_route = warp::path!("api" / "portfolio" / "search")
        .and(warp::get())
        .and(warp::query::<SearchFilters>())
        .and(state_filter.clone())
        .and_then(search_portfolio);

    let holding_route = warp::path!("api" / "portfolio" / "holdings" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_holding);

    let refresh_route = warp::path!("api" / "portfolio" / "refresh")
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(refresh_portfolio);

    info!("All routes configured successfully.");

    yahoo_route
        .or(alpha_vantage_route)
        .or(scrape_route)
        .or(quote_route)
        .or(fundamentals_route)
        .or(portfolio_route)
        .or(summary_route)
        .or(search_route)
        .or(holding_route)
        .or(refresh_route)
        .recover(handle_rejection)
}
