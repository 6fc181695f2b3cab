//! `run` command handler.
//!
//! Wires the Hyperliquid market data client, the chosen execution gateway (live or
//! paper) and the cycle scheduler together, then runs until Ctrl-C.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cli::ArbCliConfig;
use crate::clock::SystemClock;
use crate::exchange::hyperliquid::{Credentials, ExchangeClient, InfoClient};
use crate::exchange::paper::PaperGateway;
use crate::exchange::{ExecutionGateway, QuoteSource};
use crate::strategy::spot_perp::{CycleScheduler, MarketPair};

/// Run the spot/perp arbitrage loop.
///
/// # Errors
/// Returns an error if configuration, credentials or venue metadata are invalid.
/// Per-cycle failures are logged by the scheduler and never returned.
pub async fn run_arbitrage(
    cli_config: ArbCliConfig,
    paper: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let network = cli_config.market.network();
    let config = cli_config.into_config()?;

    info!(
        "--- basis-arb: {} / {} on {}{} ---",
        config.spot_symbol,
        config.perp_symbol,
        network,
        if paper { " (paper)" } else { "" }
    );

    let info_client = Arc::new(InfoClient::connect(network).await?);
    let quotes: Arc<dyn QuoteSource> = info_client.clone();
    let pair = Arc::new(MarketPair::resolve(config, quotes.as_ref()).await?);

    let gateway: Arc<dyn ExecutionGateway> = if paper {
        warn!("Paper mode: orders are simulated against live quotes");
        Arc::new(PaperGateway::new(quotes.clone()))
    } else {
        let credentials = Credentials::from_env()?;
        Arc::new(ExchangeClient::new(
            network,
            info_client,
            &credentials,
            Box::new(SystemClock),
        )?)
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, finishing current cycle"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        let _ = shutdown_tx.send(true);
    });

    let mut scheduler = CycleScheduler::new(quotes, gateway, pair);
    scheduler.run_until(shutdown_rx).await;

    Ok(())
}
