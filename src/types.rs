//! Common Types Module
//!
//! Shared order and fill types used by both the exchange layer and the strategy,
//! kept here to avoid circular dependencies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side that offsets this one.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn is_buy(self) -> bool {
        self == OrderSide::Buy
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// Time in force for submitted orders. Only immediate-or-cancel is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    ImmediateOrCancel,
}

/// A single limit order handed to an execution gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub size: Decimal,
    pub limit_price: Decimal,
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    pub fn ioc(
        symbol: impl Into<String>,
        side: OrderSide,
        size: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size,
            limit_price,
            time_in_force: TimeInForce::ImmediateOrCancel,
        }
    }
}

/// How much of a submitted order was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillStatus {
    Unfilled,
    PartiallyFilled,
    Filled,
}

impl FillStatus {
    /// Classifies a fill against the size that was requested.
    pub fn classify(requested: Decimal, filled: Decimal) -> Self {
        if filled <= Decimal::ZERO {
            FillStatus::Unfilled
        } else if filled < requested {
            FillStatus::PartiallyFilled
        } else {
            FillStatus::Filled
        }
    }
}

impl std::fmt::Display for FillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillStatus::Unfilled => write!(f, "Unfilled"),
            FillStatus::PartiallyFilled => write!(f, "PartiallyFilled"),
            FillStatus::Filled => write!(f, "Filled"),
        }
    }
}

/// Result of one submitted order as reported by the venue. Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct LegResult {
    /// Size sent with the order.
    pub requested_size: Decimal,
    /// Size actually executed.
    pub filled_size: Decimal,
    pub status: FillStatus,
    /// Volume-weighted fill price, absent when nothing filled.
    pub avg_fill_price: Option<Decimal>,
    /// Venue order id, when the venue assigned one.
    pub order_id: Option<u64>,
    /// Venue message explaining why the order did not (fully) fill.
    pub message: Option<String>,
}

impl LegResult {
    pub fn filled(
        requested_size: Decimal,
        filled_size: Decimal,
        avg_fill_price: Decimal,
        order_id: Option<u64>,
    ) -> Self {
        let status = FillStatus::classify(requested_size, filled_size);
        Self {
            requested_size,
            filled_size,
            status,
            avg_fill_price: (status != FillStatus::Unfilled).then_some(avg_fill_price),
            order_id,
            message: None,
        }
    }

    pub fn unfilled(requested_size: Decimal, message: impl Into<String>) -> Self {
        Self {
            requested_size,
            filled_size: Decimal::ZERO,
            status: FillStatus::Unfilled,
            avg_fill_price: None,
            order_id: None,
            message: Some(message.into()),
        }
    }

    pub fn has_fill(&self) -> bool {
        self.filled_size > Decimal::ZERO
    }

    /// Requested size that was not executed.
    pub fn remaining(&self) -> Decimal {
        (self.requested_size - self.filled_size).max(Decimal::ZERO)
    }
}
