//! Hyperliquid market data client.
//!
//! Venue metadata (perp universe and spot pairs) is fetched once in [`InfoClient::connect`]
//! and kept read-only for the lifetime of the process. Prices are fetched fresh on
//! every call.

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::InMemoryState, Quota, RateLimiter};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::types::{AllMids, InfoRequest, L2Book, PerpMeta, SpotMeta};
use super::{Network, REQUEST_TIMEOUT};
use crate::exchange::{ExchangeError, QuoteSource};

/// Offset added to a spot pair index to form its order asset id.
const SPOT_ASSET_OFFSET: u32 = 10_000;
/// Maximum price decimals before subtracting the asset's size decimals.
const PERP_MAX_PRICE_DECIMALS: u32 = 6;
const SPOT_MAX_PRICE_DECIMALS: u32 = 8;

const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => panic!("rate limit must be non-zero"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    Spot,
    Perp,
}

/// Resolved venue metadata for one tradable symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMeta {
    /// Coin name used in `/info` requests (`AAVE`, `PURR/USDC`, `@107`).
    pub coin: String,
    /// Asset id used in order wires.
    pub asset: u32,
    pub sz_decimals: u32,
    pub kind: MarketKind,
}

impl AssetMeta {
    pub fn max_price_decimals(&self) -> u32 {
        let max = match self.kind {
            MarketKind::Perp => PERP_MAX_PRICE_DECIMALS,
            MarketKind::Spot => SPOT_MAX_PRICE_DECIMALS,
        };
        max.saturating_sub(self.sz_decimals)
    }
}

/// Builds the symbol → metadata index from the two metadata payloads.
///
/// Perps are keyed by coin name. Spot pairs are keyed both by `BASE/QUOTE` and by the
/// venue's own pair name, so `AAVE/USDC` and `@107` resolve to the same entry.
pub fn build_asset_index(perp: &PerpMeta, spot: &SpotMeta) -> HashMap<String, AssetMeta> {
    let mut index = HashMap::new();

    for (i, asset) in perp.universe.iter().enumerate() {
        index.insert(
            asset.name.clone(),
            AssetMeta {
                coin: asset.name.clone(),
                asset: i as u32,
                sz_decimals: asset.sz_decimals,
                kind: MarketKind::Perp,
            },
        );
    }

    let tokens: HashMap<u32, _> = spot.tokens.iter().map(|t| (t.index, t)).collect();
    for pair in &spot.universe {
        let (Some(base), Some(quote)) = (tokens.get(&pair.tokens[0]), tokens.get(&pair.tokens[1]))
        else {
            debug!("Skipping spot pair {} with unknown tokens {:?}", pair.name, pair.tokens);
            continue;
        };
        let meta = AssetMeta {
            coin: pair.name.clone(),
            asset: SPOT_ASSET_OFFSET + pair.index,
            sz_decimals: base.sz_decimals,
            kind: MarketKind::Spot,
        };
        index.insert(format!("{}/{}", base.name, quote.name), meta.clone());
        index.entry(pair.name.clone()).or_insert(meta);
    }

    index
}

/// REST client for Hyperliquid's public `/info` endpoint.
pub struct InfoClient {
    http: reqwest::Client,
    base_url: String,
    assets: HashMap<String, AssetMeta>,
    rate_limiter: Arc<RateLimiter<governor::state::direct::NotKeyed, InMemoryState, DefaultClock>>,
}

impl InfoClient {
    /// Connects to the given network and loads venue metadata.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or metadata cannot be fetched.
    pub async fn connect(network: Network) -> Result<Self, ExchangeError> {
        Self::connect_to(network.api_url()).await
    }

    pub async fn connect_to(base_url: &str) -> Result<Self, ExchangeError> {
        let mut client = Self::with_assets(base_url, HashMap::new())?;
        let perp: PerpMeta = client.post_info(&InfoRequest::Meta).await?;
        let spot: SpotMeta = client.post_info(&InfoRequest::SpotMeta).await?;
        client.assets = build_asset_index(&perp, &spot);
        info!(
            "Loaded Hyperliquid metadata from {}: {} perps, {} spot pairs",
            base_url,
            perp.universe.len(),
            spot.universe.len()
        );
        Ok(client)
    }

    /// Creates a client over an already-built asset index without touching the network.
    pub fn with_assets(
        base_url: &str,
        assets: HashMap<String, AssetMeta>,
    ) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            assets,
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND))),
        })
    }

    /// Looks up metadata for a user-facing symbol.
    pub fn asset(&self, symbol: &str) -> Result<&AssetMeta, ExchangeError> {
        self.assets
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownSymbol(symbol.to_string()))
    }

    pub async fn l2_book(&self, symbol: &str) -> Result<L2Book, ExchangeError> {
        let coin = self.asset(symbol)?.coin.clone();
        self.post_info(&InfoRequest::L2Book { coin }).await
    }

    pub async fn all_mids(&self) -> Result<AllMids, ExchangeError> {
        self.post_info(&InfoRequest::AllMids).await
    }

    async fn post_info<T: DeserializeOwned>(
        &self,
        request: &InfoRequest,
    ) -> Result<T, ExchangeError> {
        self.rate_limiter.until_ready().await;

        let response = self
            .http
            .post(format!("{}/info", self.base_url))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ExchangeError::decode(request_name(request), e))
    }
}

fn request_name(request: &InfoRequest) -> String {
    match request {
        InfoRequest::Meta => "meta".to_string(),
        InfoRequest::SpotMeta => "spotMeta".to_string(),
        InfoRequest::AllMids => "allMids".to_string(),
        InfoRequest::L2Book { coin } => format!("l2Book({})", coin),
    }
}

#[async_trait]
impl QuoteSource for InfoClient {
    #[instrument(skip(self))]
    async fn best_bid_ask(&self, symbol: &str) -> Result<(Decimal, Decimal), ExchangeError> {
        let book = self.l2_book(symbol).await?;
        match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) => Ok((bid, ask)),
            _ => Err(ExchangeError::EmptyBook(symbol.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn mid(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let coin = &self.asset(symbol)?.coin;
        let mids = self.all_mids().await?;
        mids.get(coin)
            .copied()
            .ok_or_else(|| ExchangeError::decode("allMids", format!("no mid for coin {}", coin)))
    }

    async fn size_precision(&self, symbol: &str) -> Result<u32, ExchangeError> {
        Ok(self.asset(symbol)?.sz_decimals)
    }

    async fn price_decimals(&self, symbol: &str) -> Result<u32, ExchangeError> {
        Ok(self.asset(symbol)?.max_price_decimals())
    }
}
