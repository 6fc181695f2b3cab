//! `spread` command handler: one-shot spread check, no trading.

use rust_decimal::Decimal;
use tracing::info;

use crate::cli::MarketArgs;
use crate::exchange::hyperliquid::InfoClient;
use crate::exchange::QuoteSource;
use crate::strategy::spot_perp::{QuoteSnapshot, SpreadReading};

/// Fetch quotes once and print the spread and the direction it would trade.
///
/// # Errors
/// Returns an error if metadata or quotes cannot be fetched.
pub async fn run_spread_check(
    market: MarketArgs,
    threshold_bps: Decimal,
) -> Result<(), Box<dyn std::error::Error>> {
    let info_client = InfoClient::connect(market.network()).await?;

    let (bid, ask) = info_client.best_bid_ask(&market.spot).await?;
    let perp_mid = info_client.mid(&market.perp).await?;
    let quote = QuoteSnapshot::new(bid, ask, perp_mid)?;
    let spread = SpreadReading::from_snapshot(&quote)?;

    info!(
        "{} bid {} ask {} mid {} | {} mid {}",
        market.spot, quote.spot_bid, quote.spot_ask, quote.spot_mid, market.perp, quote.perp_mid
    );

    match spread.classify(threshold_bps) {
        Some(direction) => {
            println!("spread {} -> {} at ±{} bps", spread, direction, threshold_bps)
        }
        None => println!("spread {} -> no trade at ±{} bps", spread, threshold_bps),
    }

    Ok(())
}
