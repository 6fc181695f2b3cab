//! Cycle scheduler: the long-running control loop.
//!
//! One cycle runs at a time. Each cycle fetches quotes, reads the spread and, when it
//! crosses the threshold, sizes and executes a trade. Afterwards the loop sleeps the
//! poll interval, plus the cooldown if the cycle triggered (even when the spot leg
//! did not fill). A failing cycle is logged and the loop carries on after the poll
//! interval; nothing short of shutdown stops it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use super::{
    ArbDirection, CycleOutcome, CycleResult, ExecutionEngine, MarketPair, QuoteSnapshot,
    SizeCalculator, SpreadReading,
};
use crate::exchange::{ExecutionGateway, QuoteSource};
use crate::logging::throttle::LogThrottle;

pub struct CycleScheduler {
    quotes: Arc<dyn QuoteSource>,
    engine: ExecutionEngine,
    pair: Arc<MarketPair>,
    sizer: SizeCalculator,
    cycle: u64,
    heartbeat: LogThrottle,
}

impl CycleScheduler {
    pub fn new(
        quotes: Arc<dyn QuoteSource>,
        gateway: Arc<dyn ExecutionGateway>,
        pair: Arc<MarketPair>,
    ) -> Self {
        Self {
            quotes,
            engine: ExecutionEngine::new(gateway, pair.clone()),
            sizer: SizeCalculator::for_pair(&pair),
            heartbeat: LogThrottle::new(pair.config.heartbeat_interval),
            pair,
            cycle: 0,
        }
    }

    /// Number of cycles run so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Runs one cycle without sleeping.
    pub async fn run_cycle(&self) -> CycleResult {
        let quote = QuoteSnapshot::fetch(self.quotes.as_ref(), &self.pair).await?;
        let spread = SpreadReading::from_snapshot(&quote)?;

        let Some(direction) = spread.classify(self.pair.config.threshold_bps) else {
            return Ok(CycleOutcome {
                quote,
                spread,
                direction: None,
                execution: None,
            });
        };

        info!(
            "Spread {} beyond ±{} bps threshold, going {}",
            spread, self.pair.config.threshold_bps, direction
        );

        let size = self.sizer.size(quote.spot_mid)?;
        let intent = self.engine.plan(direction, size, &quote)?;
        let report = self.engine.execute(&intent).await?;

        Ok(CycleOutcome {
            quote,
            spread,
            direction: Some(direction),
            execution: Some(report),
        })
    }

    /// Time to wait after a cycle before starting the next one.
    pub fn delay_after(&self, result: &CycleResult) -> Duration {
        let poll = self.pair.config.poll_interval;
        match result {
            Ok(outcome) if outcome.triggered() => self.pair.config.cooldown.saturating_add(poll),
            _ => poll,
        }
    }

    /// Runs one cycle, logs it and sleeps the appropriate delay.
    pub async fn step(&mut self) -> CycleResult {
        let result = self.run_logged_cycle().await;
        tokio::time::sleep(self.delay_after(&result)).await;
        result
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Shutdown is observed between cycles and interrupts the sleep, never a cycle in
    /// progress.
    pub async fn run_until(&mut self, mut shutdown: watch::Receiver<bool>) {
        self.log_start();
        loop {
            if *shutdown.borrow() {
                break;
            }

            let result = self.run_logged_cycle().await;
            let delay = self.delay_after(&result);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown handle dropped, stopping");
                        break;
                    }
                }
            }
        }
        info!("Scheduler stopped after {} cycles", self.cycle);
    }

    #[instrument(skip(self), fields(cycle = self.cycle + 1))]
    async fn run_logged_cycle(&mut self) -> CycleResult {
        self.cycle += 1;
        let result = self.run_cycle().await;
        self.report(&result);
        result
    }

    fn report(&mut self, result: &CycleResult) {
        match result {
            Ok(outcome) => {
                debug!(
                    "spot mid {} perp mid {} spread {}",
                    outcome.quote.spot_mid, outcome.quote.perp_mid, outcome.spread
                );
                if let Some(report) = &outcome.execution {
                    info!(
                        "Cycle {} {} finished: {:?}",
                        self.cycle,
                        outcome.direction.map(direction_label).unwrap_or("-"),
                        report.outcome
                    );
                    info!("Cooling down for {:?}", self.pair.config.cooldown);
                } else if self.heartbeat.should_log() {
                    let suppressed = self.heartbeat.get_and_reset_suppressed_count();
                    info!(
                        "Spread {} (spot mid {}, perp mid {}), {} quiet cycles since last report",
                        outcome.spread, outcome.quote.spot_mid, outcome.quote.perp_mid, suppressed
                    );
                }
            }
            Err(e) => error!(
                "Cycle {} failed for {}/{}: {}",
                self.cycle, self.pair.spot.symbol, self.pair.perp.symbol, e
            ),
        }
    }

    fn log_start(&self) {
        let config = &self.pair.config;
        info!(
            "Starting basis arb: spot {} / perp {}, threshold {} bps, size ${}, slippage {}, \
             poll {:?}, cooldown {:?}",
            self.pair.spot.symbol,
            self.pair.perp.symbol,
            config.threshold_bps,
            config.target_notional,
            config.slippage,
            config.poll_interval,
            config.cooldown
        );
    }
}

fn direction_label(direction: ArbDirection) -> &'static str {
    match direction {
        ArbDirection::CashCarry => "cash-carry",
        ArbDirection::Reverse => "reverse",
    }
}
