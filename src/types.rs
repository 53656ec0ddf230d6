// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, prices, USD amounts, rates, timestamps. each is a newtype so the compiler catches unit mixups.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

// Long = profit when price goes up. Short = profit when price goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Long => dec!(1),
            Side::Short => dec!(-1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Side::Long)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

// 1.1: price in USD per unit of an asset. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: a USD amount. pnl, fees and margin thresholds all use this. may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usd(Decimal);

impl Usd {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn add(&self, other: Usd) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Usd) -> Self {
        Self(self.0 - other.0)
    }

    pub fn min(&self, other: Usd) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max_zero(&self) -> Self {
        Self(self.0.max(Decimal::ZERO))
    }

    // USD amount -> token amount at the given token price
    pub fn in_tokens(&self, price: Price) -> Decimal {
        self.0 / price.value()
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Usd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Usd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// 1.3: dimensionless fraction (fee rates, margin rates, APYs). 0.001 = 0.1%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    pub fn new(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const SECONDS_PER_YEAR: u64 = 365 * 86400;

// 1.4: unix timestamp in seconds. the engine never reads a clock on its own;
// callers drive time explicitly so every timeout compares against call-time state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn plus(&self, secs: u64) -> Self {
        Self(self.0 + secs)
    }

    // whole elapsed seconds, saturating at zero when `other` is later
    pub fn elapsed_since(&self, other: Timestamp) -> u64 {
        self.0.saturating_sub(other.0)
    }

    // elapsed time as a fraction of a 365-day year, for APY accrual
    pub fn elapsed_years(&self, other: Timestamp) -> Decimal {
        Decimal::from(self.elapsed_since(other)) / Decimal::from(SECONDS_PER_YEAR)
    }

    // snap down to the start of the current accrual interval
    pub fn align_to(&self, interval: u64) -> Self {
        if interval == 0 {
            *self
        } else {
            Self(self.0 - self.0 % interval)
        }
    }
}

// 1.5: a trader's isolated margin bucket: one (owner, collateral, underlying, direction)
// tuple. derived on demand, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubAccountId {
    pub account: AccountId,
    pub collateral_id: AssetId,
    pub asset_id: AssetId,
    pub is_long: bool,
}

impl SubAccountId {
    pub fn new(account: AccountId, collateral_id: AssetId, asset_id: AssetId, is_long: bool) -> Self {
        Self {
            account,
            collateral_id,
            asset_id,
            is_long,
        }
    }

    pub fn side(&self) -> Side {
        if self.is_long {
            Side::Long
        } else {
            Side::Short
        }
    }
}

impl fmt::Display for SubAccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.account.0,
            self.collateral_id.0,
            self.asset_id.0,
            if self.is_long { "L" } else { "S" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_sign_and_opposite() {
        assert_eq!(Side::Long.sign(), dec!(1));
        assert_eq!(Side::Short.sign(), dec!(-1));
        assert_eq!(Side::Long.opposite(), Side::Short);
    }

    #[test]
    fn price_rejects_non_positive() {
        assert!(Price::new(dec!(0)).is_none());
        assert!(Price::new(dec!(-1)).is_none());
        assert_eq!(Price::new(dec!(2000)).unwrap().value(), dec!(2000));
    }

    #[test]
    fn usd_token_conversion() {
        let amount = Usd::new(dec!(100));
        let price = Price::new_unchecked(dec!(0.99));
        assert_eq!(amount.in_tokens(price), dec!(100) / dec!(0.99));
    }

    #[test]
    fn timestamp_alignment() {
        let t = Timestamp::from_secs(7523);
        assert_eq!(t.align_to(3600).as_secs(), 7200);
        assert_eq!(t.align_to(0).as_secs(), 7523);
    }

    #[test]
    fn elapsed_years_one_day() {
        let t0 = Timestamp::from_secs(0);
        let t1 = Timestamp::from_secs(86400);
        assert_eq!(
            t1.elapsed_years(t0),
            Decimal::from(86400u64) / Decimal::from(SECONDS_PER_YEAR)
        );
    }

    #[test]
    fn subaccount_display() {
        let id = SubAccountId::new(AccountId(7), AssetId(0), AssetId(1), false);
        assert_eq!(id.to_string(), "7:0:1:S");
        assert_eq!(id.side(), Side::Short);
    }
}
