//! Revenue split.
//!
//! Every coin a reader spends on a chapter or a tip is divided three ways:
//!
//! - **Author**: 65%, floored
//! - **Tax**: 5%, floored
//! - **Platform**: the remainder
//!
//! The platform share absorbs the rounding loss of both floors, so the three
//! parts always sum to the gross amount. For `gross = 1` the whole coin goes
//! to the platform. This rounding rule is product policy and is kept as is.

use vstory_types::{RevenueSplit, BPS_DENOMINATOR};

/// Author share in basis points.
pub const AUTHOR_BPS: u64 = 6_500;

/// Tax share in basis points.
pub const TAX_BPS: u64 = 500;

/// Split a gross coin amount.
///
/// Zero, negative, or out-of-range input yields [`RevenueSplit::ZERO`];
/// that is the defined result for invalid input, not an error.
pub fn split<G: TryInto<u64>>(gross: G) -> RevenueSplit {
    let gross = match gross.try_into() {
        Ok(g) if g > 0 => g,
        _ => return RevenueSplit::ZERO,
    };

    let author = apply_bps(gross, AUTHOR_BPS);
    let tax = apply_bps(gross, TAX_BPS);
    // author + tax <= 70% of gross, so this cannot underflow
    let platform = gross - author - tax;

    RevenueSplit {
        gross,
        author,
        platform,
        tax,
    }
}

/// Split an amount that arrived as an untyped number.
///
/// NaN, infinities, non-positive and fractional values all yield
/// [`RevenueSplit::ZERO`].
pub fn split_untrusted(gross: f64) -> RevenueSplit {
    if !gross.is_finite() || gross <= 0.0 || gross.fract() != 0.0 || gross > u64::MAX as f64 {
        tracing::debug!(gross, "rejecting untrusted split input");
        return RevenueSplit::ZERO;
    }
    split(gross as u64)
}

/// `floor(amount * bps / 10_000)` without intermediate overflow.
pub(crate) fn apply_bps(amount: u64, bps: u64) -> u64 {
    let scaled = u128::from(amount) * u128::from(bps) / u128::from(BPS_DENOMINATOR);
    // bps <= 10_000 keeps the result within the input range
    scaled as u64
}
