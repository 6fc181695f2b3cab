//! Exchange Abstraction Layer
//!
//! The arbitrage engine only talks to the venue through two traits:
//! - [`QuoteSource`]: top-of-book, mid prices and venue precision metadata.
//! - [`ExecutionGateway`]: submission of immediate-or-cancel limit orders.
//!
//! Concrete implementations live in submodules: [`hyperliquid`] for the live venue and
//! [`paper`] for simulated execution against live quotes.

pub mod hyperliquid;
pub mod paper;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

pub use crate::types::{FillStatus, LegResult, OrderRequest, OrderSide, TimeInForce};

/// Errors raised by exchange collaborators.
#[derive(Error, Debug, Clone)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Unexpected response shape for {context}: {reason}")]
    Decode { context: String, reason: String },
    #[error("Request rejected by venue: {0}")]
    Rejected(String),
    #[error("Unknown symbol '{0}' in venue metadata")]
    UnknownSymbol(String),
    #[error("Invalid credentials: {0}")]
    Credentials(String),
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Empty order book for {0}")]
    EmptyBook(String),
}

impl ExchangeError {
    pub fn decode(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        ExchangeError::Decode {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ExchangeError::Http {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => ExchangeError::Network(e.to_string()),
        }
    }
}

/// Market data and metadata consumed by the arbitrage loop.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Best bid and best ask for a symbol, in that order.
    async fn best_bid_ask(&self, symbol: &str) -> Result<(Decimal, Decimal), ExchangeError>;

    /// Mid price for a symbol.
    async fn mid(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    /// Number of decimal places allowed for order quantities on `symbol`.
    async fn size_precision(&self, symbol: &str) -> Result<u32, ExchangeError>;

    /// Maximum number of decimal places allowed for limit prices on `symbol`.
    async fn price_decimals(&self, symbol: &str) -> Result<u32, ExchangeError>;
}

/// Order submission.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Submits one order and returns the venue's fill report.
    ///
    /// An order that does not fill is a normal `Ok` result with
    /// [`FillStatus::Unfilled`]; `Err` is reserved for transport or protocol failures.
    async fn submit_order(&self, order: &OrderRequest) -> Result<LegResult, ExchangeError>;
}
