use anyhow::{bail, Context};
use dotenv::dotenv;
use log::{error, info};
use std::env;

use portfolio_dashboard::config::AppConfig;
use portfolio_dashboard::services::fetcher::QuoteFetcher;
use portfolio_dashboard::services::sources::{http_client, QuoteSource, SourceSet};
use portfolio_dashboard::services::symbols::SymbolMapper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let code = match env::args().nth(1) {
        Some(code) => code,
        None => bail!("usage: check_quote <NSE/BSE code>"),
    };

    let config = AppConfig::from_env()?;
    let symbols = SymbolMapper::load(config.symbol_map_path.as_deref())?;
    let symbol = symbols.map_str(&code);
    info!("Checking {} (mapped to {})", code, symbol);

    let client = http_client(config.request_timeout).context("failed to build HTTP client")?;
    let sources = SourceSet::from_config(&config, client);
    let adapters: Vec<&dyn QuoteSource> = vec![
        &*sources.yahoo_chart,
        &*sources.alpha_vantage,
        &*sources.yahoo_quote,
        &*sources.screener,
    ];

    for adapter in adapters {
        if !adapter.is_available() {
            info!("SKIPPED: {} is not configured", adapter.name());
            continue;
        }
        match adapter.fetch_quote(&symbol).await {
            Ok(quote) => info!(
                "SUCCESS: {} {} = {} ({:+.2}%)",
                adapter.name(),
                symbol,
                quote.current_price,
                quote.change_percent
            ),
            Err(e) => error!("ERROR: {} failed for {}: {}", adapter.name(), symbol, e),
        }
    }

    let chain = QuoteFetcher::new(sources.dashboard_chain());
    match chain.resolve_quote(&symbol).await {
        Some(quote) => {
            info!("Dashboard chain resolved {} via {}", symbol, quote.source);
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        None => bail!("all quote sources failed for {}", symbol),
    }

    Ok(())
}
