//! Trade sizing and venue price rounding.
//!
//! Sizes are rounded to the precision *both* legs accept so the hedge can always be
//! submitted with exactly the spot fill. The minimum-notional floor is applied by
//! rounding up, so the floor never rounds below the venue minimum.

use rust_decimal::{Decimal, RoundingStrategy};

use super::{ArbError, MarketPair};

/// Significant figures the venue accepts in a limit price.
const PRICE_SIG_FIGS: i64 = 5;

/// Largest scale a [`Decimal`] can carry.
const MAX_SCALE: u32 = 28;

/// Size precision representable on both legs.
pub fn shared_precision(spot_decimals: u32, perp_decimals: u32) -> u32 {
    spot_decimals.min(perp_decimals)
}

/// Converts a target notional into a base quantity.
///
/// `max(round_half_even(target / mid, p), ceil(min_notional / mid, p))`
///
/// # Errors
/// [`ArbError::Sizing`] for a non-positive mid, negative notionals, a quotient that
/// overflows [`Decimal`], or a result of zero.
pub fn trade_size(
    target_notional: Decimal,
    spot_mid: Decimal,
    min_notional: Decimal,
    precision: u32,
) -> Result<Decimal, ArbError> {
    if spot_mid <= Decimal::ZERO {
        return Err(ArbError::Sizing(format!("spot mid must be positive, got {}", spot_mid)));
    }
    if target_notional < Decimal::ZERO || min_notional < Decimal::ZERO {
        return Err(ArbError::Sizing(format!(
            "notionals must not be negative (target {}, minimum {})",
            target_notional, min_notional
        )));
    }

    let quantity = |notional: Decimal| {
        notional.checked_div(spot_mid).ok_or_else(|| {
            ArbError::Sizing(format!("{} / {} overflows", notional, spot_mid))
        })
    };
    let min_size = quantity(min_notional)?
        .round_dp_with_strategy(precision, RoundingStrategy::ToPositiveInfinity);
    let desired = quantity(target_notional)?
        .round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven);
    let size = desired.max(min_size);

    if size <= Decimal::ZERO {
        return Err(ArbError::Sizing(format!(
            "target {} at mid {} rounds to zero at {} decimals",
            target_notional, spot_mid, precision
        )));
    }

    Ok(size)
}

/// Sizing parameters bound to one market pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeCalculator {
    pub target_notional: Decimal,
    pub min_notional: Decimal,
    pub precision: u32,
}

impl SizeCalculator {
    pub fn for_pair(pair: &MarketPair) -> Self {
        Self {
            target_notional: pair.config.target_notional,
            min_notional: pair.config.min_notional,
            precision: pair.shared_precision(),
        }
    }

    pub fn size(&self, spot_mid: Decimal) -> Result<Decimal, ArbError> {
        trade_size(self.target_notional, spot_mid, self.min_notional, self.precision)
    }
}

/// Rounds a limit price to at most five significant figures and at most
/// `max_decimals` decimal places. Non-positive prices are returned unchanged.
///
/// A positive price never rounds to zero: anything below one tick at the allowed
/// precision is raised to that tick.
pub fn round_price(price: Decimal, max_decimals: u32) -> Decimal {
    if price <= Decimal::ZERO {
        return price;
    }

    // decimals that keep PRICE_SIG_FIGS significant digits
    let sig_decimals = PRICE_SIG_FIGS - 1 - decimal_exponent(price);

    let rounded = if sig_decimals >= 0 {
        let dp = (sig_decimals as u32).min(max_decimals).min(MAX_SCALE);
        let rounded = price.round_dp(dp);
        if rounded.is_zero() {
            Decimal::new(1, dp)
        } else {
            rounded
        }
    } else {
        // price >= 10^PRICE_SIG_FIGS, so the step is at most 10^24
        let step = Decimal::from(10i128.pow(sig_decimals.unsigned_abs() as u32));
        (price / step).round().checked_mul(step).unwrap_or(price)
    };

    rounded.normalize()
}

/// Base-10 exponent of the leading significant digit (`floor(log10(x))`) for `x > 0`.
fn decimal_exponent(value: Decimal) -> i64 {
    let mut mantissa = value.mantissa().unsigned_abs();
    let mut digits = 0i64;
    while mantissa > 0 {
        mantissa /= 10;
        digits += 1;
    }
    digits - 1 - i64::from(value.scale())
}
