//! Referral commission arithmetic.
//!
//! A referrer earns a fixed percentage of certain amounts flowing to the
//! account they referred. Only whole coins are paid: a commission that
//! floors to zero is not paid at all.

use vstory_types::earning::ReferralTriggerKind;

use crate::splits::apply_bps;

/// Commission on an approved deposit (2%).
pub const DEPOSIT_RATE_BPS: u64 = 200;

/// Commission on an author's split share (1%).
pub const AUTHOR_EARNING_RATE_BPS: u64 = 100;

/// Rate applied for a given trigger.
pub fn rate_for(trigger: ReferralTriggerKind) -> u64 {
    match trigger {
        ReferralTriggerKind::Deposit => DEPOSIT_RATE_BPS,
        ReferralTriggerKind::AuthorEarning => AUTHOR_EARNING_RATE_BPS,
    }
}

/// `floor(base * rate)`, or `None` when that is less than one coin.
pub fn commission(base: u64, rate_bps: u64) -> Option<u64> {
    match apply_bps(base, rate_bps) {
        0 => None,
        amount => Some(amount),
    }
}
