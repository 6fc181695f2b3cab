//! CLI argument parsing using clap.
//!
//! Every strategy parameter can also come from the environment (or a `.env` file),
//! using the variable names shown in `--help`.

mod config;

pub use config::{ArbCliConfig, CliConfigError};

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use crate::exchange::hyperliquid::Network;

/// Spot/perp basis arbitrage on Hyperliquid
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Set the verbosity level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub verbose: String,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the arbitrage loop until Ctrl-C
    Run {
        #[command(flatten)]
        market: MarketArgs,
        #[command(flatten)]
        strategy: StrategyArgs,
        /// Simulate fills against live quotes instead of sending orders
        #[arg(long, default_value_t = false)]
        paper: bool,
    },

    /// Print the current spread once and exit
    Spread {
        #[command(flatten)]
        market: MarketArgs,
        /// Spread threshold in basis points
        #[arg(long, env = "ARB_THRESHOLD_BPS", default_value = "10")]
        threshold_bps: Decimal,
    },
}

/// Which pair to watch and where.
#[derive(Args, Debug, Clone)]
pub struct MarketArgs {
    /// Spot symbol as BASE/QUOTE
    #[arg(long, env = "SPOT_COIN", default_value = "AAVE/USDC")]
    pub spot: String,
    /// Perpetual symbol
    #[arg(long, env = "PERP_COIN", default_value = "AAVE")]
    pub perp: String,
    /// Use the Hyperliquid testnet
    #[arg(long, default_value_t = false)]
    pub testnet: bool,
}

impl MarketArgs {
    pub fn network(&self) -> Network {
        if self.testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }
}

/// Trading parameters for the `run` command.
#[derive(Args, Debug, Clone)]
pub struct StrategyArgs {
    /// Spread threshold in basis points
    #[arg(long, env = "ARB_THRESHOLD_BPS", default_value = "10")]
    pub threshold_bps: Decimal,
    /// Notional per trade in USD
    #[arg(long, env = "ARB_SIZE_USD", default_value = "1000")]
    pub size_usd: Decimal,
    /// Venue minimum order notional in USD
    #[arg(long, env = "ARB_MIN_NOTIONAL", default_value = "10")]
    pub min_notional: Decimal,
    /// Seconds between polls
    #[arg(long, env = "POLL_INTERVAL", default_value_t = 1.0)]
    pub poll_interval: f64,
    /// Limit price slippage as a fraction (0.001 = 0.1%)
    #[arg(long, env = "SLIPPAGE", default_value = "0.001")]
    pub slippage: Decimal,
    /// Seconds to pause after a trade attempt
    #[arg(long, env = "COOLDOWN", default_value_t = 30.0)]
    pub cooldown: f64,
    /// Seconds between info-level spread reports
    #[arg(long, default_value_t = 30.0)]
    pub heartbeat_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_run_command_parses_decimals() {
        let cli = Cli::try_parse_from([
            "basis-arb",
            "run",
            "--spot",
            "PURR/USDC",
            "--perp",
            "PURR",
            "--threshold-bps",
            "12.5",
            "--slippage",
            "0.002",
            "--paper",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { market, strategy, paper } => {
                assert_eq!(market.spot, "PURR/USDC");
                assert_eq!(market.network(), Network::Mainnet);
                assert_eq!(strategy.threshold_bps, dec!(12.5));
                assert_eq!(strategy.slippage, dec!(0.002));
                assert!(paper);
            }
            Commands::Spread { .. } => panic!("expected run"),
        }
        assert_eq!(cli.verbose, "info");
    }

    #[test]
    fn test_spread_command_on_testnet() {
        let cli = Cli::try_parse_from(["basis-arb", "spread", "--testnet", "--verbose", "debug"])
            .unwrap();
        match cli.command {
            Commands::Spread { market, .. } => assert_eq!(market.network(), Network::Testnet),
            Commands::Run { .. } => panic!("expected spread"),
        }
        assert_eq!(cli.verbose, "debug");
    }
}
