pub mod cli;
pub mod clock;
pub mod commands;
pub mod exchange;
pub mod logging;
pub mod observability;
pub mod strategy;
pub mod types;
