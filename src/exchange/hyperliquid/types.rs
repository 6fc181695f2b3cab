//! Typed request and response payloads for the Hyperliquid REST API.
//!
//! Every response the client consumes is decoded into one of these structs so that a
//! change in the venue's payload shape surfaces as a decode error at the boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- /info requests ---

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InfoRequest {
    Meta,
    SpotMeta,
    AllMids,
    L2Book { coin: String },
}

// --- /info responses ---

#[derive(Debug, Clone, Deserialize)]
pub struct PerpMeta {
    pub universe: Vec<PerpAsset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpAsset {
    pub name: String,
    pub sz_decimals: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotMeta {
    pub universe: Vec<SpotPair>,
    pub tokens: Vec<SpotToken>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotPair {
    /// Venue coin name, e.g. `PURR/USDC` or `@107`.
    pub name: String,
    /// Token indices: base first, quote second.
    pub tokens: [u32; 2],
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotToken {
    pub name: String,
    pub sz_decimals: u32,
    pub index: u32,
}

pub type AllMids = HashMap<String, Decimal>;

#[derive(Debug, Clone, Deserialize)]
pub struct L2Book {
    pub coin: String,
    /// `[bids, asks]`, each sorted best first.
    pub levels: [Vec<BookLevel>; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookLevel {
    pub px: Decimal,
    pub sz: Decimal,
    pub n: u32,
}

impl L2Book {
    pub fn best_bid(&self) -> Option<Decimal> {
        self.levels[0].first().map(|l| l.px)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.levels[1].first().map(|l| l.px)
    }
}

// --- /exchange requests ---

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Order(BulkOrder),
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkOrder {
    pub orders: Vec<OrderWire>,
    pub grouping: String,
}

/// Order in the venue's compact wire format. Field order is part of the signed hash.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "p")]
    pub limit_px: String,
    #[serde(rename = "s")]
    pub sz: String,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderTypeWire {
    Limit(LimitWire),
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitWire {
    pub tif: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignatureWire {
    pub r: String,
    pub s: String,
    pub v: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePayload {
    pub action: Action,
    pub nonce: u64,
    pub signature: SignatureWire,
    pub vault_address: Option<String>,
}

// --- /exchange responses ---

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", content = "response", rename_all = "lowercase")]
pub enum ExchangeResponseStatus {
    Ok(ExchangeResponse),
    Err(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<StatusData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub statuses: Vec<OrderStatusWire>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatusWire {
    Filled(FilledWire),
    Resting(RestingWire),
    Error(String),
    Success,
    WaitingForFill,
    WaitingForTrigger,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledWire {
    pub total_sz: Decimal,
    pub avg_px: Decimal,
    pub oid: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestingWire {
    pub oid: u64,
}

/// Formats a decimal the way the venue expects in order wires: no trailing zeros,
/// no trailing decimal point.
pub fn decimal_to_wire(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.is_zero() {
        "0".to_string()
    } else {
        normalized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_info_request_serialization() {
        let body = serde_json::to_value(InfoRequest::L2Book { coin: "@107".into() }).unwrap();
        assert_eq!(body, serde_json::json!({"type": "l2Book", "coin": "@107"}));
        let body = serde_json::to_value(InfoRequest::SpotMeta).unwrap();
        assert_eq!(body, serde_json::json!({"type": "spotMeta"}));
    }

    #[test]
    fn test_l2_book_decoding() {
        let raw = r#"{"coin":"AAVE","time":1700000000000,"levels":[
            [{"px":"100.00","sz":"3.5","n":2},{"px":"99.9","sz":"1","n":1}],
            [{"px":"100.05","sz":"2","n":1}]
        ]}"#;
        let book: L2Book = serde_json::from_str(raw).unwrap();
        assert_eq!(book.best_bid(), Some(dec!(100.00)));
        assert_eq!(book.best_ask(), Some(dec!(100.05)));
    }

    #[test]
    fn test_order_action_serialization() {
        let action = Action::Order(BulkOrder {
            orders: vec![OrderWire {
                asset: 10107,
                is_buy: true,
                limit_px: "100.15".into(),
                sz: "9.99".into(),
                reduce_only: false,
                order_type: OrderTypeWire::Limit(LimitWire { tif: "Ioc".into() }),
            }],
            grouping: "na".into(),
        });
        let body = serde_json::to_value(&action).unwrap();
        assert_eq!(
            body,
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
    }

    #[test]
    fn test_order_status_decoding() {
        let raw = r#"{"status":"ok","response":{"type":"order","data":{"statuses":[
            {"filled":{"totalSz":"0.02","avgPx":"1891.4","oid":77738308}},
            {"error":"Order could not immediately match against any resting orders."}
        ]}}}"#;
        let parsed: ExchangeResponseStatus = serde_json::from_str(raw).unwrap();
        let ExchangeResponseStatus::Ok(resp) = parsed else { panic!("expected ok") };
        let statuses = resp.data.unwrap().statuses;
        match &statuses[0] {
            OrderStatusWire::Filled(f) => {
                assert_eq!(f.total_sz, dec!(0.02));
                assert_eq!(f.oid, 77738308);
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert!(matches!(statuses[1], OrderStatusWire::Error(_)));

        let raw = r#"{"status":"err","response":"User or API Wallet does not exist."}"#;
        let err: ExchangeResponseStatus = serde_json::from_str(raw).unwrap();
        assert!(matches!(err, ExchangeResponseStatus::Err(_)));
    }

    #[test]
    fn test_decimal_to_wire() {
        assert_eq!(decimal_to_wire(dec!(100.150)), "100.15");
        assert_eq!(decimal_to_wire(dec!(100.000)), "100");
        assert_eq!(decimal_to_wire(dec!(0.00)), "0");
        assert_eq!(decimal_to_wire(dec!(0.0012)), "0.0012");
    }
}
