//! Signed order submission against Hyperliquid's `/exchange` endpoint.

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::info::InfoClient;
use super::signing::sign_l1_action;
use super::types::{
    decimal_to_wire, Action, BulkOrder, ExchangePayload, ExchangeResponseStatus, LimitWire,
    OrderStatusWire, OrderTypeWire, OrderWire,
};
use super::{Network, REQUEST_TIMEOUT};
use crate::clock::Clock;
use crate::exchange::{ExchangeError, ExecutionGateway, LegResult, OrderRequest, TimeInForce};

/// Environment variable holding the signing key.
pub const SECRET_KEY_ENV: &str = "HL_SECRET_KEY";

/// Opaque credential material for the live gateway.
#[derive(Clone)]
pub struct Credentials {
    secret_key: String,
}

impl Credentials {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
        }
    }

    /// Reads credentials from the environment.
    ///
    /// # Errors
    /// Returns [`ExchangeError::Credentials`] if the key variable is unset or empty.
    pub fn from_env() -> Result<Self, ExchangeError> {
        match std::env::var(SECRET_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(ExchangeError::Credentials(format!(
                "{} must be set in .env file or environment",
                SECRET_KEY_ENV
            ))),
        }
    }

    /// Parses the key into a signing wallet.
    pub fn wallet(&self) -> Result<LocalWallet, ExchangeError> {
        self.secret_key
            .parse::<LocalWallet>()
            .map_err(|e| {
                ExchangeError::Credentials(format!(
                    "{} is not a valid private key: {}",
                    SECRET_KEY_ENV, e
                ))
            })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("secret_key", &"<redacted>").finish()
    }
}

/// Live execution gateway.
pub struct ExchangeClient {
    http: reqwest::Client,
    network: Network,
    info: Arc<InfoClient>,
    wallet: LocalWallet,
    clock: Box<dyn Clock>,
}

impl ExchangeClient {
    /// Creates the gateway, validating the credentials up front.
    ///
    /// # Errors
    /// Returns an error if the key cannot be parsed or the HTTP client cannot be built.
    pub fn new(
        network: Network,
        info: Arc<InfoClient>,
        credentials: &Credentials,
        clock: Box<dyn Clock>,
    ) -> Result<Self, ExchangeError> {
        let wallet = credentials.wallet()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        info!("Live gateway on {} signing as {:?}", network, wallet.address());

        Ok(Self {
            http,
            network,
            info,
            wallet,
            clock,
        })
    }

    fn order_action(&self, order: &OrderRequest) -> Result<Action, ExchangeError> {
        let asset = self.info.asset(&order.symbol)?.asset;
        let tif = match order.time_in_force {
            TimeInForce::ImmediateOrCancel => "Ioc",
        };

        Ok(Action::Order(BulkOrder {
            orders: vec![OrderWire {
                asset,
                is_buy: order.side.is_buy(),
                limit_px: decimal_to_wire(order.limit_price),
                sz: decimal_to_wire(order.size),
                reduce_only: false,
                order_type: OrderTypeWire::Limit(LimitWire { tif: tif.to_string() }),
            }],
            grouping: "na".to_string(),
        }))
    }

    async fn post_action(&self, action: Action) -> Result<ExchangeResponseStatus, ExchangeError> {
        let nonce = self.clock.now_ts_millis() as u64;
        let signature =
            sign_l1_action(&self.wallet, &action, nonce, self.network.signing_source())?;
        let payload = ExchangePayload {
            action,
            nonce,
            signature: signature.into(),
            vault_address: None,
        };

        let response = self
            .http
            .post(format!("{}/exchange", self.network.api_url()))
            .json(&payload)
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

        serde_json::from_str(&body).map_err(|e| ExchangeError::decode("exchange order", e))
    }
}

/// Converts the venue's order response into a [`LegResult`].
pub fn leg_result_from_response(
    requested_size: rust_decimal::Decimal,
    response: ExchangeResponseStatus,
) -> Result<LegResult, ExchangeError> {
    let response = match response {
        ExchangeResponseStatus::Ok(r) => r,
        ExchangeResponseStatus::Err(msg) => return Err(ExchangeError::Rejected(msg)),
    };

    let status = response
        .data
        .and_then(|d| d.statuses.into_iter().next())
        .ok_or_else(|| {
            ExchangeError::decode("exchange order", "response carries no order status")
        })?;

    Ok(match status {
        OrderStatusWire::Filled(fill) => {
            LegResult::filled(requested_size, fill.total_sz, fill.avg_px, Some(fill.oid))
        }
        OrderStatusWire::Error(msg) => LegResult::unfilled(requested_size, msg),
        OrderStatusWire::Resting(resting) => {
            warn!("IOC order {} reported as resting", resting.oid);
            let mut result = LegResult::unfilled(requested_size, "order resting on book");
            result.order_id = Some(resting.oid);
            result
        }
        other => {
            LegResult::unfilled(requested_size, format!("unexpected order status: {:?}", other))
        }
    })
}

#[async_trait]
impl ExecutionGateway for ExchangeClient {
    #[instrument(skip(self), fields(symbol = %order.symbol, side = %order.side))]
    async fn submit_order(&self, order: &OrderRequest) -> Result<LegResult, ExchangeError> {
        let action = self.order_action(order)?;
        let response = self.post_action(action).await?;
        leg_result_from_response(order.size, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::FillStatus;
    use rust_decimal_macros::dec;

    const TEST_KEY: &str = "0x0123456789012345678901234567890123456789012345678901234567890123";

    #[test]
    fn test_credentials_are_redacted_and_validated() {
        let creds = Credentials::new("not-a-key");
        assert!(!format!("{:?}", creds).contains("not-a-key"));
        assert!(matches!(creds.wallet(), Err(ExchangeError::Credentials(_))));

        let creds = Credentials::new(TEST_KEY);
        assert!(creds.wallet().is_ok());
    }

    #[test]
    fn test_order_action_uses_asset_index_and_wire_strings() {
        use crate::clock::FixedClock;
        use crate::exchange::hyperliquid::{AssetMeta, MarketKind, MAINNET_API_URL};
        use crate::exchange::OrderSide;
        use chrono::TimeZone;
        use std::collections::HashMap;

        let mut assets = HashMap::new();
        assets.insert(
            "AAVE/USDC".to_string(),
            AssetMeta {
                coin: "@107".into(),
                asset: 10_107,
                sz_decimals: 3,
                kind: MarketKind::Spot,
            },
        );
        let info = Arc::new(InfoClient::with_assets(MAINNET_API_URL, assets).unwrap());
        let clock = FixedClock(chrono::Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
        let client = ExchangeClient::new(
            Network::Mainnet,
            info,
            &Credentials::new(TEST_KEY),
            Box::new(clock),
        )
        .unwrap();

        let order = OrderRequest::ioc("AAVE/USDC", OrderSide::Buy, dec!(9.990), dec!(100.150));
        let action = serde_json::to_value(client.order_action(&order).unwrap()).unwrap();
        assert_eq!(
            action,
            serde_json::json!({
                "type": "order",
                "orders": [{
                    "a": 10107,
                    "b": true,
                    "p": "100.15",
                    "s": "9.99",
                    "r": false,
                    "t": {"limit": {"tif": "Ioc"}}
                }],
                "grouping": "na"
            })
        );

        let unknown = OrderRequest::ioc("DOGE", OrderSide::Sell, dec!(1), dec!(1));
        assert!(matches!(client.order_action(&unknown), Err(ExchangeError::UnknownSymbol(_))));
    }

    #[test]
    fn test_partial_fill_response() {
        let raw = r#"{"status":"ok","response":{"type":"order","data":{"statuses":[
            {"filled":{"totalSz":"5","avgPx":"100.1","oid":42}}]}}}"#;
        let parsed: ExchangeResponseStatus = serde_json::from_str(raw).unwrap();
        let leg = leg_result_from_response(dec!(10), parsed).unwrap();
        assert_eq!(leg.status, FillStatus::PartiallyFilled);
        assert_eq!(leg.filled_size, dec!(5));
        assert_eq!(leg.avg_fill_price, Some(dec!(100.1)));
        assert_eq!(leg.order_id, Some(42));
    }

    #[test]
    fn test_ioc_no_match_is_unfilled_not_error() {
        let raw = r#"{"status":"ok","response":{"type":"order","data":{"statuses":[
            {"error":"Order could not immediately match against any resting orders."}]}}}"#;
        let parsed: ExchangeResponseStatus = serde_json::from_str(raw).unwrap();
        let leg = leg_result_from_response(dec!(3), parsed).unwrap();
        assert_eq!(leg.status, FillStatus::Unfilled);
        assert!(leg.message.unwrap().contains("could not immediately match"));
    }

    #[test]
    fn test_top_level_error_is_rejected() {
        let parsed: ExchangeResponseStatus =
            serde_json::from_str(r#"{"status":"err","response":"Insufficient margin"}"#).unwrap();
        let err = leg_result_from_response(dec!(1), parsed).unwrap_err();
        assert!(matches!(err, ExchangeError::Rejected(m) if m == "Insufficient margin"));
    }

    #[test]
    fn test_missing_status_is_decode_error() {
        let parsed: ExchangeResponseStatus =
            serde_json::from_str(r#"{"status":"ok","response":{"type":"order"}}"#).unwrap();
        assert!(matches!(
            leg_result_from_response(dec!(1), parsed),
            Err(ExchangeError::Decode { .. })
        ));
    }
}
