//! Paper trading gateway.
//!
//! Simulates immediate-or-cancel fills against live top-of-book quotes. An order whose
//! limit crosses the touch fills in full at the touch price; anything else comes back
//! unfilled, which is exactly what an IOC order would do on the venue.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use super::{ExchangeError, ExecutionGateway, LegResult, OrderRequest, OrderSide, QuoteSource};

pub struct PaperGateway {
    quotes: Arc<dyn QuoteSource>,
    next_order_id: AtomicU64,
}

impl PaperGateway {
    pub fn new(quotes: Arc<dyn QuoteSource>) -> Self {
        Self {
            quotes,
            next_order_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl ExecutionGateway for PaperGateway {
    async fn submit_order(&self, order: &OrderRequest) -> Result<LegResult, ExchangeError> {
        let (bid, ask) = self.quotes.best_bid_ask(&order.symbol).await?;

        let touch = match order.side {
            OrderSide::Buy => ask,
            OrderSide::Sell => bid,
        };
        let crosses = match order.side {
            OrderSide::Buy => order.limit_price >= touch,
            OrderSide::Sell => order.limit_price <= touch,
        };

        if !crosses {
            info!(
                "[PAPER] {} {} {} @ {} did not cross touch {}",
                order.side, order.size, order.symbol, order.limit_price, touch
            );
            return Ok(LegResult::unfilled(
                order.size,
                "Order could not immediately match against any resting orders.",
            ));
        }

        let oid = self.next_order_id.fetch_add(1, Ordering::Relaxed);
        info!(
            "[PAPER] Filled {} {} {} @ {} (oid {})",
            order.side, order.size, order.symbol, touch, oid
        );
        Ok(LegResult::filled(order.size, order.size, touch, Some(oid)))
    }
}
