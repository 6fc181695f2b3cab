//! Spot/Perp Basis Arbitrage
//!
//! Watches the gap between a spot market and the perpetual on the same underlying and,
//! when it exceeds a threshold, buys the cheap leg and sells the rich one.
//!
//! ## Architecture
//!
//! ```text
//! CycleScheduler ──► QuoteSource ──► SpreadReading ──► SizeCalculator ──► ExecutionEngine
//!       ▲                                                                     │
//!       └──────────────────── cooldown / poll sleep ◄─────────────────────────┘
//! ```
//!
//! - [`spread`]: signed basis-point spread and threshold classification.
//! - [`sizing`]: notional to base quantity under precision and minimum-notional limits,
//!   plus venue price rounding.
//! - [`execution`]: spot leg first, perp hedge sized to the actual spot fill.
//! - [`scheduler`]: the polling loop with cooldown and per-iteration error isolation.
//!
//! All prices and sizes are [`Decimal`]. The only shared state is the read-only
//! [`MarketPair`].

pub mod execution;
pub mod scheduler;
pub mod sizing;
pub mod spread;

pub use execution::{ExecutionEngine, ExecutionOutcome, ExecutionReport, ExecutionState};
pub use scheduler::CycleScheduler;
pub use sizing::{round_price, shared_precision, trade_size, SizeCalculator};
pub use spread::SpreadReading;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::exchange::{ExchangeError, LegResult, OrderSide, QuoteSource};

/// Minimum order notional accepted by the venue, in quote currency.
pub const DEFAULT_MIN_NOTIONAL: Decimal = dec!(10);

#[derive(Error, Debug)]
pub enum ArbError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Sizing failed: {0}")]
    Sizing(String),
    #[error("Malformed quote: {0}")]
    MalformedQuote(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// User-supplied strategy parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbConfig {
    pub spot_symbol: String,
    pub perp_symbol: String,
    /// Spread threshold in basis points, compared against the absolute reading.
    pub threshold_bps: Decimal,
    /// Notional per trade in quote currency.
    pub target_notional: Decimal,
    pub min_notional: Decimal,
    /// Fraction added to (buys) or taken off (sells) the reference price for IOC limits.
    pub slippage: Decimal,
    pub poll_interval: Duration,
    /// Extra pause after any cycle that triggered a trade attempt.
    pub cooldown: Duration,
    /// Minimum spacing of info-level spread heartbeats.
    pub heartbeat_interval: Duration,
}

/// Builder for [`ArbConfig`] with defaults and validation.
#[derive(Debug, Clone)]
pub struct ArbConfigBuilder {
    spot_symbol: Option<String>,
    perp_symbol: Option<String>,
    threshold_bps: Decimal,
    target_notional: Decimal,
    min_notional: Decimal,
    slippage: Decimal,
    poll_interval: Duration,
    cooldown: Duration,
    heartbeat_interval: Duration,
}

impl Default for ArbConfigBuilder {
    fn default() -> Self {
        Self {
            spot_symbol: None,
            perp_symbol: None,
            threshold_bps: dec!(10),
            target_notional: dec!(1000),
            min_notional: DEFAULT_MIN_NOTIONAL,
            slippage: dec!(0.001),
            poll_interval: Duration::from_secs(1),
            cooldown: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl ArbConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spot symbol (required), e.g. `AAVE/USDC`
    pub fn spot_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.spot_symbol = Some(symbol.into());
        self
    }

    /// Set the perp symbol (required), e.g. `AAVE`
    pub fn perp_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.perp_symbol = Some(symbol.into());
        self
    }

    pub fn threshold_bps(mut self, bps: Decimal) -> Self {
        self.threshold_bps = bps;
        self
    }

    pub fn target_notional(mut self, notional: Decimal) -> Self {
        self.target_notional = notional;
        self
    }

    pub fn min_notional(mut self, notional: Decimal) -> Self {
        self.min_notional = notional;
        self
    }

    pub fn slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ArbConfig, ArbError> {
        let spot_symbol = self
            .spot_symbol
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ArbError::Config("spot_symbol is required".to_string()))?;
        let perp_symbol = self
            .perp_symbol
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ArbError::Config("perp_symbol is required".to_string()))?;

        if spot_symbol == perp_symbol {
            return Err(ArbError::Config(format!(
                "spot_symbol and perp_symbol cannot be the same: {}",
                spot_symbol
            )));
        }
        if self.threshold_bps < Decimal::ZERO {
            return Err(ArbError::Config(format!(
                "threshold_bps must not be negative, got: {}",
                self.threshold_bps
            )));
        }
        if self.target_notional <= Decimal::ZERO {
            return Err(ArbError::Config(format!(
                "target_notional must be positive, got: {}",
                self.target_notional
            )));
        }
        if self.min_notional < Decimal::ZERO {
            return Err(ArbError::Config(format!(
                "min_notional must not be negative, got: {}",
                self.min_notional
            )));
        }
        if self.slippage < Decimal::ZERO || self.slippage >= Decimal::ONE {
            return Err(ArbError::Config(format!(
                "slippage must be in [0, 1), got: {}",
                self.slippage
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ArbError::Config("poll_interval must be positive".to_string()));
        }

        Ok(ArbConfig {
            spot_symbol,
            perp_symbol,
            threshold_bps: self.threshold_bps,
            target_notional: self.target_notional,
            min_notional: self.min_notional,
            slippage: self.slippage,
            poll_interval: self.poll_interval,
            cooldown: self.cooldown,
            heartbeat_interval: self.heartbeat_interval,
        })
    }
}

/// Venue precision for one leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegSpec {
    pub symbol: String,
    /// Decimal places allowed for order sizes.
    pub size_decimals: u32,
    /// Maximum decimal places allowed for limit prices.
    pub price_decimals: u32,
}

/// Immutable description of the traded pair. Created once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketPair {
    pub config: ArbConfig,
    pub spot: LegSpec,
    pub perp: LegSpec,
}

impl MarketPair {
    pub fn new(config: ArbConfig, spot: LegSpec, perp: LegSpec) -> Self {
        Self { config, spot, perp }
    }

    /// Resolves both legs' precision from venue metadata.
    ///
    /// # Errors
    /// Fails if either symbol is unknown to the venue.
    pub async fn resolve(config: ArbConfig, quotes: &dyn QuoteSource) -> Result<Self, ArbError> {
        let spot = LegSpec {
            symbol: config.spot_symbol.clone(),
            size_decimals: quotes.size_precision(&config.spot_symbol).await?,
            price_decimals: quotes.price_decimals(&config.spot_symbol).await?,
        };
        let perp = LegSpec {
            symbol: config.perp_symbol.clone(),
            size_decimals: quotes.size_precision(&config.perp_symbol).await?,
            price_decimals: quotes.price_decimals(&config.perp_symbol).await?,
        };

        info!(
            "Resolved pair: spot {} (sz {} dp, px {} dp), perp {} (sz {} dp, px {} dp)",
            spot.symbol,
            spot.size_decimals,
            spot.price_decimals,
            perp.symbol,
            perp.size_decimals,
            perp.price_decimals
        );

        Ok(Self::new(config, spot, perp))
    }

    /// Size precision both legs can represent.
    pub fn shared_precision(&self) -> u32 {
        shared_precision(self.spot.size_decimals, self.perp.size_decimals)
    }
}

/// Prices observed at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteSnapshot {
    pub spot_bid: Decimal,
    pub spot_ask: Decimal,
    pub spot_mid: Decimal,
    pub perp_mid: Decimal,
}

impl QuoteSnapshot {
    /// Validates raw prices and derives the spot mid.
    ///
    /// # Errors
    /// [`ArbError::MalformedQuote`] for non-positive prices, a crossed spot book, or a
    /// spot mid that does not fit in a [`Decimal`].
    pub fn new(spot_bid: Decimal, spot_ask: Decimal, perp_mid: Decimal) -> Result<Self, ArbError> {
        if spot_bid <= Decimal::ZERO || spot_ask <= Decimal::ZERO || perp_mid <= Decimal::ZERO {
            return Err(ArbError::MalformedQuote(format!(
                "non-positive price (bid {}, ask {}, perp mid {})",
                spot_bid, spot_ask, perp_mid
            )));
        }
        if spot_bid > spot_ask {
            return Err(ArbError::MalformedQuote(format!(
                "crossed spot book: bid {} > ask {}",
                spot_bid, spot_ask
            )));
        }

        let spot_mid = spot_bid
            .checked_add(spot_ask)
            .and_then(|sum| sum.checked_div(dec!(2)))
            .ok_or_else(|| {
                ArbError::MalformedQuote(format!(
                    "spot mid of {} and {} overflows",
                    spot_bid, spot_ask
                ))
            })?;

        Ok(Self {
            spot_bid,
            spot_ask,
            spot_mid,
            perp_mid,
        })
    }

    /// Fetches a fresh snapshot for the pair.
    pub async fn fetch(quotes: &dyn QuoteSource, pair: &MarketPair) -> Result<Self, ArbError> {
        let (bid, ask) = quotes.best_bid_ask(&pair.spot.symbol).await?;
        let perp_mid = quotes.mid(&pair.perp.symbol).await?;
        Self::new(bid, ask, perp_mid)
    }
}

/// Which way to put the trade on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbDirection {
    /// Perp rich: buy spot, sell perp.
    CashCarry,
    /// Perp cheap: sell spot, buy perp.
    Reverse,
}

impl ArbDirection {
    pub fn spot_side(self) -> OrderSide {
        match self {
            ArbDirection::CashCarry => OrderSide::Buy,
            ArbDirection::Reverse => OrderSide::Sell,
        }
    }

    pub fn perp_side(self) -> OrderSide {
        self.spot_side().opposite()
    }
}

impl std::fmt::Display for ArbDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArbDirection::CashCarry => write!(f, "CashCarry (buy spot / sell perp)"),
            ArbDirection::Reverse => write!(f, "Reverse (sell spot / buy perp)"),
        }
    }
}

/// A fully priced trade decision.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    pub direction: ArbDirection,
    pub size: Decimal,
    pub spot_limit_price: Decimal,
    pub perp_limit_price: Decimal,
}

/// Everything one scheduler iteration observed and did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub quote: QuoteSnapshot,
    pub spread: SpreadReading,
    /// Direction when the spread crossed the threshold.
    pub direction: Option<ArbDirection>,
    /// Present whenever a trade was attempted.
    pub execution: Option<ExecutionReport>,
}

impl CycleOutcome {
    pub fn triggered(&self) -> bool {
        self.direction.is_some()
    }

    pub fn intent(&self) -> Option<&TradeIntent> {
        self.execution.as_ref().map(|r| &r.intent)
    }

    pub fn spot_leg(&self) -> Option<&LegResult> {
        self.execution.as_ref().map(|r| &r.spot)
    }

    pub fn perp_leg(&self) -> Option<&LegResult> {
        self.execution.as_ref().and_then(|r| r.hedge.as_ref())
    }
}

/// Per-iteration result consumed by the scheduler.
pub type CycleResult = Result<CycleOutcome, ArbError>;
