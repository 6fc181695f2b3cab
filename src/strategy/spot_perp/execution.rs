//! Two-leg execution engine.
//!
//! The spot leg always goes first. The perp hedge is only sent once the spot fill is
//! known, and is sized to exactly what filled, never to what was requested.
//!
//! ```text
//! Idle → SpotSubmitted ─┬─► SpotUnfilled → Aborted ────────────────────────► Completed
//!                       └─► SpotFilled → HedgeSubmitted → HedgeSettled ───► Completed
//! ```
//!
//! Neither leg is retried. A hedge that does not fully fill leaves residual exposure
//! which is reported in [`ExecutionOutcome`], not raised as an error.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::sizing::round_price;
use super::{ArbDirection, ArbError, MarketPair, QuoteSnapshot, TradeIntent};
use crate::exchange::{ExecutionGateway, LegResult, OrderRequest, OrderSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    SpotSubmitted,
    SpotFilled,
    SpotUnfilled,
    Aborted,
    HedgeSubmitted,
    HedgeSettled,
    Completed,
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// How well the spot fill ended up hedged.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Spot did not fill; nothing was hedged because nothing needed hedging.
    Aborted,
    Hedged,
    PartiallyHedged { unhedged: Decimal },
    /// Hedge did not fill at all, or could not be submitted.
    Unhedged { unhedged: Decimal, reason: String },
}

impl ExecutionOutcome {
    /// Base quantity left without an offsetting perp position.
    pub fn unhedged_size(&self) -> Decimal {
        match self {
            ExecutionOutcome::Aborted | ExecutionOutcome::Hedged => Decimal::ZERO,
            ExecutionOutcome::PartiallyHedged { unhedged }
            | ExecutionOutcome::Unhedged { unhedged, .. } => *unhedged,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub intent: TradeIntent,
    pub spot: LegResult,
    pub hedge: Option<LegResult>,
    /// Every state visited, in order.
    pub states: Vec<ExecutionState>,
    pub outcome: ExecutionOutcome,
}

pub struct ExecutionEngine {
    gateway: Arc<dyn ExecutionGateway>,
    pair: Arc<MarketPair>,
}

impl ExecutionEngine {
    pub fn new(gateway: Arc<dyn ExecutionGateway>, pair: Arc<MarketPair>) -> Self {
        Self { gateway, pair }
    }

    /// Prices both legs from the snapshot.
    ///
    /// Buys are limited at `reference * (1 + slippage)`, sells at
    /// `reference * (1 - slippage)`, where the reference is the spot touch for the spot
    /// leg and the perp mid for the hedge. Prices are rounded to the venue's tick rules.
    ///
    /// # Errors
    /// [`ArbError::Sizing`] if a limit price overflows [`Decimal`].
    pub fn plan(
        &self,
        direction: ArbDirection,
        size: Decimal,
        quote: &QuoteSnapshot,
    ) -> Result<TradeIntent, ArbError> {
        let slippage = self.pair.config.slippage;
        let spot_reference = match direction.spot_side() {
            OrderSide::Buy => quote.spot_ask,
            OrderSide::Sell => quote.spot_bid,
        };

        let spot_limit_price = limit_price(direction.spot_side(), spot_reference, slippage)?;
        let perp_limit_price = limit_price(direction.perp_side(), quote.perp_mid, slippage)?;

        Ok(TradeIntent {
            direction,
            size,
            spot_limit_price: round_price(spot_limit_price, self.pair.spot.price_decimals),
            perp_limit_price: round_price(perp_limit_price, self.pair.perp.price_decimals),
        })
    }

    /// Runs the spot-then-hedge sequence for one intent.
    ///
    /// # Errors
    /// Only a gateway failure on the spot leg is an error. Once spot has filled, any
    /// hedge failure is reported through [`ExecutionOutcome::Unhedged`].
    #[instrument(skip(self, intent), fields(direction = ?intent.direction, size = %intent.size))]
    pub async fn execute(&self, intent: &TradeIntent) -> Result<ExecutionReport, ArbError> {
        let mut states = vec![ExecutionState::Idle];

        let spot_order = OrderRequest::ioc(
            &self.pair.spot.symbol,
            intent.direction.spot_side(),
            intent.size,
            intent.spot_limit_price,
        );
        transition(&mut states, ExecutionState::SpotSubmitted);
        info!(
            "Spot leg: {} {} {} @ {} IOC",
            spot_order.side, spot_order.size, spot_order.symbol, spot_order.limit_price
        );
        let spot = self.gateway.submit_order(&spot_order).await?;

        if !spot.has_fill() {
            transition(&mut states, ExecutionState::SpotUnfilled);
            transition(&mut states, ExecutionState::Aborted);
            transition(&mut states, ExecutionState::Completed);
            info!(
                "Spot leg did not fill ({}), skipping hedge",
                spot.message.as_deref().unwrap_or("no reason given")
            );
            return Ok(ExecutionReport {
                intent: intent.clone(),
                spot,
                hedge: None,
                states,
                outcome: ExecutionOutcome::Aborted,
            });
        }

        transition(&mut states, ExecutionState::SpotFilled);
        let filled = spot.filled_size;
        info!(
            "Spot leg filled {}/{} @ {}",
            filled,
            spot.requested_size,
            spot.avg_fill_price.unwrap_or_default()
        );

        let hedge_order = OrderRequest::ioc(
            &self.pair.perp.symbol,
            intent.direction.perp_side(),
            filled,
            intent.perp_limit_price,
        );
        transition(&mut states, ExecutionState::HedgeSubmitted);
        info!(
            "Hedge leg: {} {} {} @ {} IOC",
            hedge_order.side, hedge_order.size, hedge_order.symbol, hedge_order.limit_price
        );

        let (hedge, outcome) = match self.gateway.submit_order(&hedge_order).await {
            Ok(hedge) => {
                transition(&mut states, ExecutionState::HedgeSettled);
                let outcome = classify_hedge(filled, &hedge);
                (Some(hedge), outcome)
            }
            Err(e) => (
                None,
                ExecutionOutcome::Unhedged {
                    unhedged: filled,
                    reason: e.to_string(),
                },
            ),
        };
        transition(&mut states, ExecutionState::Completed);

        match &outcome {
            ExecutionOutcome::Hedged => info!("Hedged {} {}", filled, self.pair.spot.symbol),
            ExecutionOutcome::PartiallyHedged { unhedged } => warn!(
                "Hedge partially filled: {} {} left unhedged",
                unhedged, self.pair.spot.symbol
            ),
            ExecutionOutcome::Unhedged { unhedged, reason } => warn!(
                "Hedge failed ({}): {} {} left unhedged",
                reason, unhedged, self.pair.spot.symbol
            ),
            ExecutionOutcome::Aborted => {}
        }

        Ok(ExecutionReport {
            intent: intent.clone(),
            spot,
            hedge,
            states,
            outcome,
        })
    }
}

fn limit_price(
    side: OrderSide,
    reference: Decimal,
    slippage: Decimal,
) -> Result<Decimal, ArbError> {
    let factor = match side {
        OrderSide::Buy => Decimal::ONE + slippage,
        OrderSide::Sell => Decimal::ONE - slippage,
    };
    reference
        .checked_mul(factor)
        .ok_or_else(|| ArbError::Sizing(format!("{} limit from {} overflows", side, reference)))
}

fn transition(states: &mut Vec<ExecutionState>, next: ExecutionState) {
    if let Some(prev) = states.last() {
        debug!("Execution state {} -> {}", prev, next);
    }
    states.push(next);
}

fn classify_hedge(spot_filled: Decimal, hedge: &LegResult) -> ExecutionOutcome {
    if !hedge.has_fill() {
        return ExecutionOutcome::Unhedged {
            unhedged: spot_filled,
            reason: hedge
                .message
                .clone()
                .unwrap_or_else(|| "hedge did not fill".to_string()),
        };
    }
    let unhedged = spot_filled - hedge.filled_size;
    if unhedged > Decimal::ZERO {
        ExecutionOutcome::PartiallyHedged { unhedged }
    } else {
        ExecutionOutcome::Hedged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{ExchangeError, FillStatus};
    use crate::strategy::spot_perp::{ArbConfigBuilder, LegSpec};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records every order it receives.
    #[derive(Default)]
    struct ScriptedGateway {
        responses: Mutex<VecDeque<Result<LegResult, ExchangeError>>>,
        orders: Mutex<Vec<OrderRequest>>,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<LegResult, ExchangeError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                orders: Mutex::new(Vec::new()),
            })
        }

        fn orders(&self) -> Vec<OrderRequest> {
            self.orders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExecutionGateway for ScriptedGateway {
        async fn submit_order(&self, order: &OrderRequest) -> Result<LegResult, ExchangeError> {
            self.orders.lock().unwrap().push(order.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ExchangeError::Network("no scripted response".into())))
        }
    }

    fn pair() -> Arc<MarketPair> {
        let config = ArbConfigBuilder::new()
            .spot_symbol("AAVE/USDC")
            .perp_symbol("AAVE")
            .build()
            .unwrap();
        Arc::new(MarketPair::new(
            config,
            LegSpec { symbol: "AAVE/USDC".into(), size_decimals: 3, price_decimals: 5 },
            LegSpec { symbol: "AAVE".into(), size_decimals: 2, price_decimals: 4 },
        ))
    }

    fn intent(direction: ArbDirection, size: Decimal) -> TradeIntent {
        TradeIntent {
            direction,
            size,
            spot_limit_price: dec!(100.15),
            perp_limit_price: dec!(100.1),
        }
    }

    #[test]
    fn test_plan_cash_carry_prices() {
        let engine = ExecutionEngine::new(ScriptedGateway::new(vec![]), pair());
        let quote = QuoteSnapshot::new(dec!(100.00), dec!(100.05), dec!(100.20)).unwrap();
        let intent = engine.plan(ArbDirection::CashCarry, dec!(9.99), &quote).unwrap();
        assert_eq!(intent.spot_limit_price, dec!(100.15));
        // 100.20 * 0.999 = 100.0998
        assert_eq!(intent.perp_limit_price, dec!(100.1));
        assert_eq!(intent.size, dec!(9.99));
    }

    #[test]
    fn test_plan_reverse_prices() {
        let engine = ExecutionEngine::new(ScriptedGateway::new(vec![]), pair());
        let quote = QuoteSnapshot::new(dec!(100.00), dec!(100.05), dec!(99.80)).unwrap();
        let intent = engine.plan(ArbDirection::Reverse, dec!(1), &quote).unwrap();
        // 100.00 * 0.999, 99.80 * 1.001 = 99.8998
        assert_eq!(intent.spot_limit_price, dec!(99.9));
        assert_eq!(intent.perp_limit_price, dec!(99.9));
    }

    #[test]
    fn test_plan_rejects_overflowing_limit() {
        let engine = ExecutionEngine::new(ScriptedGateway::new(vec![]), pair());
        let quote = QuoteSnapshot::new(dec!(1), Decimal::MAX - dec!(1000), dec!(100)).unwrap();
        assert!(matches!(
            engine.plan(ArbDirection::CashCarry, dec!(1), &quote),
            Err(ArbError::Sizing(_))
        ));
        // a sell limit only shrinks the reference
        assert!(engine.plan(ArbDirection::Reverse, dec!(1), &quote).is_ok());
    }

    #[tokio::test]
    async fn test_partial_spot_fill_hedges_filled_size() {
        let gateway = ScriptedGateway::new(vec![
            Ok(LegResult::filled(dec!(10), dec!(5), dec!(100.05), Some(1))),
            Ok(LegResult::filled(dec!(5), dec!(5), dec!(100.12), Some(2))),
        ]);
        let engine = ExecutionEngine::new(gateway.clone(), pair());

        let report = engine.execute(&intent(ArbDirection::CashCarry, dec!(10))).await.unwrap();

        let orders = gateway.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].symbol, "AAVE/USDC");
        assert_eq!(orders[0].side, OrderSide::Buy);
        assert_eq!(orders[0].size, dec!(10));
        assert_eq!(orders[1].symbol, "AAVE");
        assert_eq!(orders[1].side, OrderSide::Sell);
        assert_eq!(orders[1].size, dec!(5));
        assert_eq!(orders[1].limit_price, dec!(100.1));

        assert_eq!(report.spot.status, FillStatus::PartiallyFilled);
        assert_eq!(report.outcome, ExecutionOutcome::Hedged);
        assert_eq!(
            report.states,
            vec![
                ExecutionState::Idle,
                ExecutionState::SpotSubmitted,
                ExecutionState::SpotFilled,
                ExecutionState::HedgeSubmitted,
                ExecutionState::HedgeSettled,
                ExecutionState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_unfilled_spot_aborts_without_hedge() {
        let gateway = ScriptedGateway::new(vec![Ok(LegResult::unfilled(dec!(10), "no match"))]);
        let engine = ExecutionEngine::new(gateway.clone(), pair());

        let report = engine.execute(&intent(ArbDirection::Reverse, dec!(10))).await.unwrap();

        assert_eq!(gateway.orders().len(), 1);
        assert_eq!(gateway.orders()[0].side, OrderSide::Sell);
        assert_eq!(report.outcome, ExecutionOutcome::Aborted);
        assert!(report.hedge.is_none());
        assert_eq!(
            report.states,
            vec![
                ExecutionState::Idle,
                ExecutionState::SpotSubmitted,
                ExecutionState::SpotUnfilled,
                ExecutionState::Aborted,
                ExecutionState::Completed,
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_hedge_reports_residual() {
        let gateway = ScriptedGateway::new(vec![
            Ok(LegResult::filled(dec!(10), dec!(10), dec!(100.05), Some(1))),
            Ok(LegResult::filled(dec!(10), dec!(7.5), dec!(100.12), Some(2))),
        ]);
        let engine = ExecutionEngine::new(gateway, pair());

        let report = engine.execute(&intent(ArbDirection::CashCarry, dec!(10))).await.unwrap();
        assert_eq!(report.outcome, ExecutionOutcome::PartiallyHedged { unhedged: dec!(2.5) });
        assert_eq!(report.outcome.unhedged_size(), dec!(2.5));
    }

    #[tokio::test]
    async fn test_unfilled_hedge_is_unhedged() {
        let gateway = ScriptedGateway::new(vec![
            Ok(LegResult::filled(dec!(10), dec!(4), dec!(100.05), Some(1))),
            Ok(LegResult::unfilled(dec!(4), "no match")),
        ]);
        let engine = ExecutionEngine::new(gateway, pair());

        let report = engine.execute(&intent(ArbDirection::CashCarry, dec!(10))).await.unwrap();
        assert_eq!(
            report.outcome,
            ExecutionOutcome::Unhedged { unhedged: dec!(4), reason: "no match".into() }
        );
    }

    #[tokio::test]
    async fn test_hedge_gateway_error_is_reported_not_raised() {
        let gateway = ScriptedGateway::new(vec![
            Ok(LegResult::filled(dec!(10), dec!(10), dec!(100.05), Some(1))),
            Err(ExchangeError::Network("timeout".into())),
        ]);
        let engine = ExecutionEngine::new(gateway, pair());

        let report = engine.execute(&intent(ArbDirection::CashCarry, dec!(10))).await.unwrap();
        assert!(report.hedge.is_none());
        assert!(matches!(
            report.outcome,
            ExecutionOutcome::Unhedged { unhedged, ref reason }
                if unhedged == dec!(10) && reason.contains("timeout")
        ));
        assert_eq!(report.states.last(), Some(&ExecutionState::Completed));
        assert!(!report.states.contains(&ExecutionState::HedgeSettled));
    }

    #[tokio::test]
    async fn test_spot_gateway_error_propagates() {
        let gateway =
            ScriptedGateway::new(vec![Err(ExchangeError::Rejected("Insufficient balance".into()))]);
        let engine = ExecutionEngine::new(gateway.clone(), pair());

        let err = engine.execute(&intent(ArbDirection::CashCarry, dec!(10))).await.unwrap_err();
        assert!(matches!(err, ArbError::Exchange(ExchangeError::Rejected(_))));
        assert_eq!(gateway.orders().len(), 1);
    }
}
