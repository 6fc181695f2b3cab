//! Hyperliquid venue adapter.
//!
//! - [`InfoClient`]: public market data and metadata (`POST /info`), implements
//!   [`QuoteSource`](crate::exchange::QuoteSource).
//! - [`ExchangeClient`]: signed order submission (`POST /exchange`), implements
//!   [`ExecutionGateway`](crate::exchange::ExecutionGateway).

pub mod exchange_client;
pub mod info;
pub mod signing;
pub mod types;

pub use exchange_client::{Credentials, ExchangeClient};
pub use info::{AssetMeta, InfoClient, MarketKind};

use std::time::Duration;

pub const MAINNET_API_URL: &str = "https://api.hyperliquid.xyz";
pub const TESTNET_API_URL: &str = "https://api.hyperliquid-testnet.xyz";

/// Request timeout applied to every REST call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which Hyperliquid deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn api_url(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_API_URL,
            Network::Testnet => TESTNET_API_URL,
        }
    }

    /// Source tag embedded in signed L1 actions.
    pub fn signing_source(self) -> &'static str {
        match self {
            Network::Mainnet => "a",
            Network::Testnet => "b",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}
