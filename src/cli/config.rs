//! Bridges parsed CLI arguments to the validated strategy configuration.

use std::time::Duration;
use thiserror::Error;

use super::{MarketArgs, StrategyArgs};
use crate::strategy::spot_perp::{ArbConfig, ArbConfigBuilder, ArbError};

#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("Invalid {name}: {value} is not a usable number of seconds")]
    InvalidSeconds { name: &'static str, value: f64 },

    #[error(transparent)]
    Strategy(#[from] ArbError),
}

/// Arguments of the `run` command, before validation.
#[derive(Debug, Clone)]
pub struct ArbCliConfig {
    pub market: MarketArgs,
    pub strategy: StrategyArgs,
}

impl ArbCliConfig {
    pub fn new(market: MarketArgs, strategy: StrategyArgs) -> Self {
        Self { market, strategy }
    }

    /// Converts to an [`ArbConfig`], validating every field.
    ///
    /// # Errors
    /// Returns `CliConfigError` for negative or non-finite durations and for anything
    /// [`ArbConfigBuilder::build`] rejects.
    pub fn into_config(self) -> Result<ArbConfig, CliConfigError> {
        let args = self.strategy;
        let config = ArbConfigBuilder::new()
            .spot_symbol(self.market.spot)
            .perp_symbol(self.market.perp)
            .threshold_bps(args.threshold_bps)
            .target_notional(args.size_usd)
            .min_notional(args.min_notional)
            .slippage(args.slippage)
            .poll_interval(seconds("poll interval", args.poll_interval)?)
            .cooldown(seconds("cooldown", args.cooldown)?)
            .heartbeat_interval(seconds("heartbeat interval", args.heartbeat_secs)?)
            .build()?;
        Ok(config)
    }
}

fn seconds(name: &'static str, value: f64) -> Result<Duration, CliConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| CliConfigError::InvalidSeconds { name, value })
}
