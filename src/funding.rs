// 7.0: funding and borrowing accrual. each tradable asset carries two
// cumulative indices (long/short) that only ever grow. positions settle
// against the index delta since their entry snapshot, so accrual itself
// moves no value.
//
// borrowing: flat APY charged to both directions.
// funding: skew-proportional APY charged to the heavier direction only.

use crate::types::{Rate, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FundingRates {
    /// skew-driven component, applied to the heavier side
    pub funding_apy: Rate,
    /// longs are the heavier side (pay funding) when true
    pub longs_pay: bool,
    /// flat component, applied to both sides
    pub borrowing_apy: Rate,
}

// 7.1: funding APY from open-interest skew: |skew| / alpha, scaled by beta
// and saturating at beta once the skew reaches the alpha notional.
pub fn funding_rate(skew: Usd, alpha: Usd, beta: Rate, borrowing: Rate) -> FundingRates {
    let funding_apy = if alpha.value() <= Decimal::ZERO {
        Rate::zero()
    } else {
        let ratio = (skew.value().abs() / alpha.value()).min(Decimal::ONE);
        Rate::new(beta.value() * ratio)
    };
    FundingRates {
        funding_apy,
        longs_pay: skew.value() >= Decimal::ZERO,
        borrowing_apy: borrowing,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDeltas {
    pub long: Decimal,
    pub short: Decimal,
}

// 7.2: index growth over an elapsed stretch of time. `years` is the elapsed
// whole-interval time divided by a 365-day year.
pub fn accrue(rates: &FundingRates, years: Decimal) -> IndexDeltas {
    debug_assert!(years >= Decimal::ZERO);
    let borrowing = rates.borrowing_apy.value() * years;
    let funding = rates.funding_apy.value() * years;
    if rates.longs_pay {
        IndexDeltas {
            long: borrowing + funding,
            short: borrowing,
        }
    } else {
        IndexDeltas {
            long: borrowing,
            short: borrowing + funding,
        }
    }
}

// 7.3: elapsed whole intervals between the last accrual epoch and now.
// returns the new epoch and the years to accrue; None when still inside the
// same interval (the update is idempotent there).
pub fn accrual_window(
    last_funding_time: Timestamp,
    now: Timestamp,
    interval: u64,
) -> Option<(Timestamp, Decimal)> {
    if interval == 0 {
        return None;
    }
    let epoch = now.align_to(interval);
    if last_funding_time.as_secs() == 0 {
        // first observation anchors the clock without accruing
        return Some((epoch, Decimal::ZERO));
    }
    if epoch <= last_funding_time {
        return None;
    }
    Some((epoch, epoch.elapsed_years(last_funding_time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SECONDS_PER_YEAR;
    use rust_decimal_macros::dec;

    #[test]
    fn no_skew_no_funding() {
        let rates = funding_rate(
            Usd::zero(),
            Usd::new(dec!(20000)),
            Rate::new(dec!(0.20)),
            Rate::new(dec!(0.01)),
        );
        assert!(rates.funding_apy.is_zero());
        assert_eq!(rates.borrowing_apy.value(), dec!(0.01));
    }

    #[test]
    fn skew_scales_funding() {
        // skew 18000 over alpha 20000 at beta 20% -> 18% apy, longs pay
        let rates = funding_rate(
            Usd::new(dec!(18000)),
            Usd::new(dec!(20000)),
            Rate::new(dec!(0.20)),
            Rate::new(dec!(0.01)),
        );
        assert_eq!(rates.funding_apy.value(), dec!(0.18));
        assert!(rates.longs_pay);
    }

    #[test]
    fn funding_saturates_at_beta() {
        let rates = funding_rate(
            Usd::new(dec!(-100000)),
            Usd::new(dec!(20000)),
            Rate::new(dec!(0.20)),
            Rate::new(dec!(0.01)),
        );
        assert_eq!(rates.funding_apy.value(), dec!(0.20));
        assert!(!rates.longs_pay);
    }

    #[test]
    fn accrue_splits_sides() {
        let rates = FundingRates {
            funding_apy: Rate::new(dec!(0.04)),
            longs_pay: false,
            borrowing_apy: Rate::new(dec!(0.01)),
        };
        let one_year = dec!(1);
        let deltas = accrue(&rates, one_year);
        assert_eq!(deltas.long, dec!(0.01));
        assert_eq!(deltas.short, dec!(0.05));
    }

    #[test]
    fn one_day_of_borrowing() {
        let rates = FundingRates {
            funding_apy: Rate::zero(),
            longs_pay: true,
            borrowing_apy: Rate::new(dec!(0.01)),
        };
        let years = Decimal::from(86400u64) / Decimal::from(SECONDS_PER_YEAR);
        let deltas = accrue(&rates, years);
        assert_eq!(deltas.long, dec!(0.01) / dec!(365));
        assert_eq!(deltas.short, dec!(0.01) / dec!(365));
    }

    #[test]
    fn window_aligns_to_interval() {
        let last = Timestamp::from_secs(3600);
        let now = Timestamp::from_secs(3600 * 3 + 1234);

        let (epoch, years) = accrual_window(last, now, 3600).unwrap();
        assert_eq!(epoch.as_secs(), 3600 * 3);
        assert_eq!(years, Decimal::from(7200u64) / Decimal::from(SECONDS_PER_YEAR));
    }

    #[test]
    fn window_idempotent_within_interval() {
        let last = Timestamp::from_secs(7200);
        assert!(accrual_window(last, Timestamp::from_secs(7200 + 3599), 3600).is_none());
    }

    #[test]
    fn first_observation_anchors_without_accrual() {
        let (epoch, years) = accrual_window(Timestamp::from_secs(0), Timestamp::from_secs(9999), 3600).unwrap();
        assert_eq!(epoch.as_secs(), 7200);
        assert_eq!(years, Decimal::ZERO);
    }

    #[test]
    fn indices_monotone_over_updates() {
        let rates = FundingRates {
            funding_apy: Rate::new(dec!(0.18)),
            longs_pay: true,
            borrowing_apy: Rate::new(dec!(0.01)),
        };
        let mut long = Decimal::ZERO;
        let mut short = Decimal::ZERO;
        for hours in [1u64, 5, 24, 100] {
            let years = Decimal::from(hours * 3600) / Decimal::from(SECONDS_PER_YEAR);
            let deltas = accrue(&rates, years);
            let (prev_long, prev_short) = (long, short);
            long += deltas.long;
            short += deltas.short;
            assert!(long >= prev_long && short >= prev_short);
        }
    }
}
