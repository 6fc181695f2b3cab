//! Trading strategies.

pub mod spot_perp;
