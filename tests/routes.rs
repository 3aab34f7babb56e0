mod common;

use httpmock::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;

use common::{holding, StaticSource};
use portfolio_dashboard::routes::routes;
use portfolio_dashboard::services::bus::SubscriptionBus;
use portfolio_dashboard::services::dashboard::DashboardState;
use portfolio_dashboard::services::fetcher::QuoteFetcher;
use portfolio_dashboard::services::fundamentals::FundamentalsScraper;
use portfolio_dashboard::services::merge::HybridMerge;
use portfolio_dashboard::services::scheduler::RefreshScheduler;
use portfolio_dashboard::services::sources::{http_client, QuoteSource};
use portfolio_dashboard::services::symbols::SymbolMapper;
use portfolio_dashboard::state::{AppState, QuoteChains};

struct Fixture {
    state: Arc<AppState>,
    dashboard_source: Arc<StaticSource>,
}

fn chain(source: &Arc<StaticSource>) -> QuoteFetcher {
    QuoteFetcher::new(vec![source.clone() as Arc<dyn QuoteSource>])
}

async fn fixture(dashboard_source: Arc<StaticSource>, fundamentals_base: &str) -> Fixture {
    let failing = StaticSource::failing("down").shared();
    let symbols = Arc::new(SymbolMapper::bundled().unwrap());
    let dashboard_chain = Arc::new(chain(&dashboard_source));
    let merge = Arc::new(HybridMerge::new(Arc::clone(&symbols), Arc::clone(&dashboard_chain)));

    let views = merge
        .build_all(&[
            holding("HDFC Bank", Some("HDFCBANK"), 1000.0, 10.0, 0.0),
            holding("SBI Life Insurance", Some("SBLIFE"), 1500.0, 4.0, 0.0),
        ])
        .await;

    let dashboard = Arc::new(DashboardState::new(views));
    let bus = SubscriptionBus::new();
    let subscriber = Arc::clone(&dashboard);
    bus.subscribe(move |refreshed| subscriber.replace(refreshed.to_vec()));

    let state = AppState {
        symbols,
        chains: QuoteChains {
            dashboard: dashboard_chain,
            structured: chain(&failing),
            alternate: chain(&failing),
            scrape: chain(&dashboard_source),
        },
        fundamentals: FundamentalsScraper::new(
            http_client(Duration::from_secs(5)).unwrap(),
            fundamentals_base,
            fundamentals_base,
        ),
        dashboard,
        scheduler: RefreshScheduler::new(merge, bus, Duration::from_secs(15)),
    };

    Fixture {
        state: Arc::new(state),
        dashboard_source,
    }
}

async fn default_fixture() -> Fixture {
    fixture(StaticSource::ok("primary", 1100.0).shared(), "http://127.0.0.1:9").await
}

async fn get(state: &Arc<AppState>, path: &str) -> (StatusCode, Value) {
    let res = warp::test::request()
        .method("GET")
        .path(path)
        .reply(&routes(Arc::clone(state)))
        .await;
    let body = serde_json::from_slice(res.body()).unwrap_or(Value::Null);
    (res.status(), body)
}

#[tokio::test]
async fn missing_or_blank_symbol_is_a_bad_request() {
    let f = default_fixture().await;

    for path in [
        "/api/yahoo-finance/quote",
        "/api/yahoo-finance/quote?symbol=",
        "/api/scrape-fallback/quote?symbol=%20%20",
        "/api/alpha-vantage/quote",
        "/api/quote",
        "/api/google-finance/fundamentals",
    ] {
        let (status, body) = get(&f.state, path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["error"], "Symbol parameter is required");
    }
}

#[tokio::test]
async fn exhausted_chain_is_a_server_error_with_symbol() {
    let f = default_fixture().await;

    let (status, body) = get(&f.state, "/api/yahoo-finance/quote?symbol=TCS.NS").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unable to fetch real-time data from all sources");
    assert_eq!(body["symbol"], "TCS.NS");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn quote_route_maps_listing_codes() {
    let f = default_fixture().await;

    let (status, body) = get(&f.state, "/api/quote?symbol=SBLIFE").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "SBILIFE.NS");
    assert_eq!(body["currentPrice"], 1100.0);
    assert_eq!(body["source"], "primary");
    for field in ["previousClose", "change", "changePercent", "volume", "marketCap", "peRatio", "earningsPerShare", "dividendYield", "lastUpdated"] {
        assert!(!body[field].is_null(), "missing {}", field);
    }
    assert!(f.dashboard_source.symbols().contains(&"SBILIFE.NS".to_string()));
}

#[tokio::test]
async fn scrape_route_passes_symbol_through() {
    let f = default_fixture().await;

    let (status, body) = get(&f.state, "/api/scrape-fallback/quote?symbol=TCS.NS").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "TCS.NS");
}

#[tokio::test]
async fn portfolio_and_summary() {
    let f = default_fixture().await;

    let (status, body) = get(&f.state, "/api/portfolio").await;
    assert_eq!(status, StatusCode::OK);
    let views = body.as_array().unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0]["calculated"]["currentPrice"], 1100.0);
    assert_eq!(views[0]["baseData"]["NSE/BSE"], "HDFCBANK");
    assert_eq!(views[0]["liveData"]["source"], "primary");

    let (status, summary) = get(&f.state, "/api/portfolio/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalStocks"], 2);
    assert_eq!(summary["totalInvestment"], 16000.0);
    assert_eq!(summary["totalPresentValue"], 11000.0 + 4400.0);
}

#[tokio::test]
async fn search_and_holding_lookup() {
    let f = default_fixture().await;

    let (status, body) = get(&f.state, "/api/portfolio/search?query=sbi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (_, gains) = get(&f.state, "/api/portfolio/search?performance=gain").await;
    let names: Vec<_> = gains
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["baseData"]["Particulars"].clone())
        .collect();
    assert_eq!(names, vec![Value::from("HDFC Bank")]);

    let (status, _) = get(&f.state, "/api/portfolio/search?price_range=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&f.state, "/api/portfolio/holdings/hdfcbank").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["baseData"]["Particulars"], "HDFC Bank");

    let (status, body) = get(&f.state, "/api/portfolio/holdings/NOPE").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["symbol"], "NOPE");
}

#[tokio::test]
async fn manual_refresh_publishes_to_dashboard() {
    let f = default_fixture().await;
    let before = f.state.dashboard.updated_at();
    let calls_before = f.dashboard_source.calls();

    let res = warp::test::request()
        .method("POST")
        .path("/api/portfolio/refresh")
        .reply(&routes(Arc::clone(&f.state)))
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(f.dashboard_source.calls(), calls_before + 2);
    assert!(f.state.dashboard.updated_at() >= before);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let f = default_fixture().await;
    let (status, body) = get(&f.state, "/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn fundamentals_route_scrapes_google_page() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/finance/quote/BHARTIARTL:NSE");
            then.status(200).body(
                r#"<div><div>P/E ratio</div><div>74.256</div></div>
                   <div><div>EPS</div><div>21.3</div></div>"#,
            );
        })
        .await;
    let f = fixture(StaticSource::ok("primary", 1.0).shared(), &server.base_url()).await;

    let (status, body) = get(&f.state, "/api/google-finance/fundamentals?symbol=NSE:BHARTIARTL").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "BHARTIARTL");
    assert_eq!(body["peRatio"], 74.26);
    assert_eq!(body["earnings"], 21.3);
    assert_eq!(body["source"], "Google Finance");
}

#[tokio::test]
async fn fundamentals_fill_gaps_from_yahoo() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/finance/quote/ITC:NSE");
            then.status(200).body("<div><div>P/E ratio</div><div>28.1</div></div>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/quote/ITC.NS");
            then.status(200)
                .body(r#"<table><tr><td>EPS (TTM)</td><td>16.42</td></tr></table>"#);
        })
        .await;
    let f = fixture(StaticSource::ok("primary", 1.0).shared(), &server.base_url()).await;

    let (status, body) = get(&f.state, "/api/google-finance/fundamentals?symbol=ITC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["peRatio"], 28.1);
    assert_eq!(body["earnings"], 16.42);
    assert_eq!(body["source"], "Google Finance + Yahoo Finance");
}

#[tokio::test]
async fn fundamentals_credit_google_for_negative_earnings() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/finance/quote/IDEA:NSE");
            then.status(200).body("<div><div>EPS</div><div>-4.50</div></div>");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/quote/IDEA.NS");
            then.status(200).body("<html><body></body></html>");
        })
        .await;
    let f = fixture(StaticSource::ok("primary", 1.0).shared(), &server.base_url()).await;

    let (status, body) = get(&f.state, "/api/google-finance/fundamentals?symbol=NSE:IDEA").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["earnings"], -4.5);
    assert_eq!(body["peRatio"], 0.0);
    assert_eq!(body["source"], "Google Finance");
}

#[tokio::test]
async fn fundamentals_without_figures_is_a_server_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(404);
        })
        .await;
    let f = fixture(StaticSource::ok("primary", 1.0).shared(), &server.base_url()).await;

    let (status, body) = get(&f.state, "/api/google-finance/fundamentals?symbol=NSE:XYZ").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["symbol"], "XYZ");
}
