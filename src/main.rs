use anyhow::{Context, Result};
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use portfolio_dashboard::config::AppConfig;
use portfolio_dashboard::routes;
use portfolio_dashboard::services::bus::SubscriptionBus;
use portfolio_dashboard::services::dashboard::DashboardState;
use portfolio_dashboard::services::fundamentals::FundamentalsScraper;
use portfolio_dashboard::services::merge::HybridMerge;
use portfolio_dashboard::services::portfolio::PortfolioStore;
use portfolio_dashboard::services::scheduler::RefreshScheduler;
use portfolio_dashboard::services::sources::{http_client, SourceSet};
use portfolio_dashboard::services::symbols::SymbolMapper;
use portfolio_dashboard::state::{AppState, QuoteChains};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env()?;
    info!("Using PORT: {}", config.port);

    let store = PortfolioStore::load(&config.portfolio_data_path)?;
    let symbols = Arc::new(SymbolMapper::load(config.symbol_map_path.as_deref())?);

    let client = http_client(config.request_timeout).context("failed to build HTTP client")?;
    let sources = SourceSet::from_config(&config, client.clone());
    let chains = QuoteChains::from_sources(&sources);
    info!("Dashboard quote chain: {:?}", chains.dashboard.source_names());

    let merge = Arc::new(HybridMerge::new(Arc::clone(&symbols), Arc::clone(&chains.dashboard)));
    let holdings = store.individual_holdings();
    info!("Building initial views for {} holdings", holdings.len());
    let views = merge.build_all(&holdings).await;

    let dashboard = Arc::new(DashboardState::new(views.clone()));
    let bus = SubscriptionBus::new();
    let subscriber = Arc::clone(&dashboard);
    bus.subscribe(move |refreshed| subscriber.replace(refreshed.to_vec()));

    let scheduler = RefreshScheduler::new(merge, bus, config.refresh_interval);
    scheduler.start(views);

    let state = Arc::new(AppState {
        symbols,
        chains,
        fundamentals: FundamentalsScraper::new(
            client,
            &config.google_finance_base_url,
            &config.yahoo_page_base_url,
        ),
        dashboard,
        scheduler,
    });

    // Bind to 0.0.0.0 for container hosts
    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(Arc::clone(&state)).with(cors);
    info!("Routes configured successfully with CORS.");

    let (bound, server) = warp::serve(api).bind_with_graceful_shutdown(addr, async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
    });
    info!("Starting server on {}", bound);
    server.await;

    state.scheduler.stop();
    info!("Server stopped");
    Ok(())
}
