//! Logging utilities.
//!
//! - [`throttle::LogThrottle`]: rate-limits repetitive log lines (the per-cycle spread
//!   heartbeat) while counting what was suppressed.

pub mod throttle;

pub use throttle::LogThrottle;
