//! Spread monitor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{ArbDirection, ArbError, QuoteSnapshot};

const BPS_PER_UNIT: Decimal = dec!(10000);

/// Signed spread of the perp over spot, in basis points of the spot mid.
/// Positive means the perp is rich.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpreadReading {
    pub bps: Decimal,
}

impl SpreadReading {
    /// `(perp_mid - spot_mid) / spot_mid * 10_000`
    ///
    /// # Errors
    /// [`ArbError::InvalidInput`] when `spot_mid` is not positive or the result overflows.
    pub fn compute(spot_mid: Decimal, perp_mid: Decimal) -> Result<Self, ArbError> {
        if spot_mid <= Decimal::ZERO {
            return Err(ArbError::InvalidInput(format!(
                "spot mid must be positive to compute a spread, got {}",
                spot_mid
            )));
        }

        let bps = (perp_mid - spot_mid)
            .checked_div(spot_mid)
            .and_then(|ratio| ratio.checked_mul(BPS_PER_UNIT))
            .ok_or_else(|| {
                ArbError::InvalidInput(format!(
                    "spread overflow for spot {} / perp {}",
                    spot_mid, perp_mid
                ))
            })?;

        Ok(Self { bps })
    }

    pub fn from_snapshot(quote: &QuoteSnapshot) -> Result<Self, ArbError> {
        Self::compute(quote.spot_mid, quote.perp_mid)
    }

    /// Strictly above `+threshold` is cash-and-carry, strictly below `-threshold` is
    /// reverse. A reading exactly on the threshold does not trade.
    pub fn classify(&self, threshold_bps: Decimal) -> Option<ArbDirection> {
        if self.bps > threshold_bps {
            Some(ArbDirection::CashCarry)
        } else if self.bps < -threshold_bps {
            Some(ArbDirection::Reverse)
        } else {
            None
        }
    }
}

impl std::fmt::Display for SpreadReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.bps > Decimal::ZERO { "+" } else { "" };
        write!(f, "{}{} bps", sign, self.bps.round_dp(2).normalize())
    }
}
