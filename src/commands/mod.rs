//! CLI command handlers.

mod run;
mod spread;

pub use run::run_arbitrage;
pub use spread::run_spread_check;
