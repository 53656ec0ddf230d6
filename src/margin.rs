// 8.0: margin sufficiency. IM gates opens and withdrawals, MM gates
// liquidation, and the reserve invariant keeps open notional covered by pool
// spot liquidity. all checks are pure so callers can validate fully before
// mutating anything.

use crate::types::{Price, Rate, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarginStatus {
    /// collateral value + pnl - pending funding
    pub margin: Usd,
    pub initial_requirement: Usd,
    pub maintenance_requirement: Usd,
}

impl MarginStatus {
    pub fn compute(
        collateral_value: Usd,
        pnl: Usd,
        funding_owed: Usd,
        size: Decimal,
        mark: Price,
        im_rate: Rate,
        mm_rate: Rate,
    ) -> Self {
        let notional = size * mark.value();
        Self {
            margin: collateral_value.add(pnl).sub(funding_owed),
            initial_requirement: Usd::new(notional * im_rate.value()),
            maintenance_requirement: Usd::new(notional * mm_rate.value()),
        }
    }

    pub fn is_im_safe(&self) -> bool {
        self.margin >= self.initial_requirement
    }

    pub fn is_mm_safe(&self) -> bool {
        self.margin >= self.maintenance_requirement
    }
}

// 8.1: liquidation fee clamp. the fee never digs below zero and never exceeds
// what is left after losses; callers treat the clamped value as final.
pub fn clamp_liquidation_fee(fee: Usd, margin_after_pnl: Usd) -> Usd {
    fee.min(margin_after_pnl.max_zero()).max_zero()
}

// 8.2: reserve invariant. entry notional of all open interest, scaled by the
// reserve rate, must stay inside the pool's spot liquidity value.
pub fn reserve_satisfied(reserved: Usd, spot_liquidity_value: Usd) -> bool {
    reserved <= spot_liquidity_value
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn status(collateral: Decimal, pnl: Decimal, funding: Decimal, size: Decimal, mark: Decimal) -> MarginStatus {
        MarginStatus::compute(
            Usd::new(collateral),
            Usd::new(pnl),
            Usd::new(funding),
            size,
            Price::new_unchecked(mark),
            Rate::new(dec!(0.10)),
            Rate::new(dec!(0.05)),
        )
    }

    #[test]
    fn fresh_position_is_safe() {
        // 998 collateral, 1 unit at 2000: IM 200, MM 100
        let s = status(dec!(998), dec!(0), dec!(0), dec!(1), dec!(2000));
        assert!(s.is_im_safe());
        assert!(s.is_mm_safe());
        assert_eq!(s.initial_requirement.value(), dec!(200));
        assert_eq!(s.maintenance_requirement.value(), dec!(100));
    }

    #[test]
    fn mm_boundary() {
        // short from 2000 with 9996 collateral, 2 units, mark 6664.8:
        // margin = 9996 - 9329.6 = 666.4, MM = 666.48 -> unsafe
        let s = status(dec!(9996), dec!(-9329.6), dec!(0), dec!(2), dec!(6664.8));
        assert!(!s.is_mm_safe());

        // one tick lower the position is still safe
        let s = status(dec!(9996), dec!(-9329.4), dec!(0), dec!(2), dec!(6664.7));
        assert!(s.is_mm_safe());
    }

    #[test]
    fn funding_erodes_margin() {
        let safe = status(dec!(9996), dec!(0), dec!(9795.8), dec!(2), dec!(2000));
        assert!(safe.is_mm_safe());
        let unsafe_ = status(dec!(9996), dec!(0), dec!(9796.01), dec!(2), dec!(2000));
        assert!(!unsafe_.is_mm_safe());
    }

    #[test]
    fn fee_clamped_to_margin() {
        // fee formula says 27.972 but only 10 is left
        let fee = clamp_liquidation_fee(Usd::new(dec!(27.972)), Usd::new(dec!(10)));
        assert_eq!(fee.value(), dec!(10));
    }

    #[test]
    fn fee_clamped_to_zero_when_underwater() {
        let fee = clamp_liquidation_fee(Usd::new(dec!(28)), Usd::new(dec!(-4)));
        assert_eq!(fee.value(), dec!(0));
    }

    #[test]
    fn reserve_check() {
        assert!(reserve_satisfied(Usd::new(dec!(720000)), Usd::new(dec!(720000))));
        assert!(!reserve_satisfied(Usd::new(dec!(720001)), Usd::new(dec!(720000))));
    }
}
