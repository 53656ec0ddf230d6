// 3.0: asset registry. per-asset flags + the running totals the engine owns:
// spot liquidity, open interest per direction with average entry prices, and
// the cumulative funding indices. configuration is externally owned (config.rs);
// only the totals here are ever mutated, and always together with the custody
// movement they represent.

use crate::types::{AssetId, Price, Side, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// flag bits. an asset can be collateral (STABLE + ENABLED), tradable underlying
// (TRADABLE + OPENABLE [+ SHORTABLE]), a pool liquidity asset (LIQUIDITY), or
// several of these at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetFlags(pub u32);

impl AssetFlags {
    pub const STABLE: u32 = 0x01;
    pub const LIQUIDITY: u32 = 0x02;
    pub const TRADABLE: u32 = 0x04;
    pub const OPENABLE: u32 = 0x08;
    pub const SHORTABLE: u32 = 0x10;
    pub const ENABLED: u32 = 0x20;
    pub const STRICT_STABLE: u32 = 0x40;

    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn has(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    pub fn is_stable(&self) -> bool {
        self.has(Self::STABLE)
    }

    pub fn can_hold_liquidity(&self) -> bool {
        self.has(Self::LIQUIDITY)
    }

    pub fn is_tradable(&self) -> bool {
        self.has(Self::TRADABLE)
    }

    pub fn is_openable(&self) -> bool {
        self.has(Self::OPENABLE)
    }

    pub fn is_shortable(&self) -> bool {
        self.has(Self::SHORTABLE)
    }

    pub fn is_enabled(&self) -> bool {
        self.has(Self::ENABLED)
    }

    pub fn is_strict_stable(&self) -> bool {
        self.has(Self::STRICT_STABLE)
    }
}

// 3.1: the running totals. funding indices only ever grow; spot liquidity
// mirrors the pool-owned token balance net of unsettled escrow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetState {
    pub spot_liquidity: Decimal,
    pub total_long_size: Decimal,
    pub average_long_price: Decimal,
    pub total_short_size: Decimal,
    pub average_short_price: Decimal,
    pub long_cumulative_funding: Decimal,
    pub short_cumulative_funding: Decimal,
    pub last_funding_time: Timestamp,
}

impl AssetState {
    pub fn new() -> Self {
        Self {
            last_funding_time: Timestamp::from_secs(0),
            ..Default::default()
        }
    }

    pub fn total_size(&self, side: Side) -> Decimal {
        match side {
            Side::Long => self.total_long_size,
            Side::Short => self.total_short_size,
        }
    }

    pub fn average_price(&self, side: Side) -> Decimal {
        match side {
            Side::Long => self.average_long_price,
            Side::Short => self.average_short_price,
        }
    }

    pub fn cumulative_funding(&self, side: Side) -> Decimal {
        match side {
            Side::Long => self.long_cumulative_funding,
            Side::Short => self.short_cumulative_funding,
        }
    }

    // open-interest value per side, in USD of entry notional
    pub fn entry_notional(&self, side: Side) -> Usd {
        Usd::new(self.total_size(side) * self.average_price(side))
    }

    // long value minus short value; positive = longs are heavier
    pub fn skew(&self) -> Usd {
        Usd::new(
            self.total_long_size * self.average_long_price
                - self.total_short_size * self.average_short_price,
        )
    }

    pub fn increase_interest(&mut self, side: Side, size: Decimal, entry_price: Price) {
        let (total, average) = match side {
            Side::Long => (&mut self.total_long_size, &mut self.average_long_price),
            Side::Short => (&mut self.total_short_size, &mut self.average_short_price),
        };
        let new_total = *total + size;
        // size-weighted average entry across the whole side
        *average = (*total * *average + size * entry_price.value()) / new_total;
        *total = new_total;
    }

    pub fn decrease_interest(&mut self, side: Side, size: Decimal) {
        let (total, average) = match side {
            Side::Long => (&mut self.total_long_size, &mut self.average_long_price),
            Side::Short => (&mut self.total_short_size, &mut self.average_short_price),
        };
        *total -= size;
        if total.is_zero() {
            *average = Decimal::ZERO;
        }
    }
}

// 3.2: registry entry. symbol/decimals are custody metadata; the engine never
// inspects token internals beyond the decimal count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub symbol: String,
    pub decimals: u32,
    pub flags: AssetFlags,
    pub state: AssetState,
}

impl Asset {
    pub fn new(id: AssetId, symbol: &str, decimals: u32, flags: AssetFlags) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            decimals,
            flags,
            state: AssetState::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, asset: Asset) {
        debug_assert!(
            self.get(asset.id).is_none(),
            "asset {} registered twice",
            asset.id.0
        );
        self.assets.push(asset);
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.id == id)
    }

    pub fn set_flags(&mut self, id: AssetId, flags: AssetFlags) {
        if let Some(asset) = self.get_mut(id) {
            asset.flags = flags;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Asset> {
        self.assets.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags(bits: u32) -> AssetFlags {
        AssetFlags::new(bits)
    }

    #[test]
    fn flag_queries() {
        let stable = flags(AssetFlags::STABLE | AssetFlags::ENABLED | AssetFlags::LIQUIDITY);
        assert!(stable.is_stable());
        assert!(stable.can_hold_liquidity());
        assert!(!stable.is_tradable());

        let traded = flags(
            AssetFlags::TRADABLE | AssetFlags::OPENABLE | AssetFlags::SHORTABLE | AssetFlags::ENABLED,
        );
        assert!(traded.is_tradable() && traded.is_openable() && traded.is_shortable());
        assert!(!traded.is_stable());
    }

    #[test]
    fn interest_weighted_average() {
        let mut state = AssetState::new();
        state.increase_interest(Side::Long, dec!(1), Price::new_unchecked(dec!(50000)));
        state.increase_interest(Side::Long, dec!(1), Price::new_unchecked(dec!(52000)));

        assert_eq!(state.total_long_size, dec!(2));
        assert_eq!(state.average_long_price, dec!(51000));
        assert_eq!(state.total_short_size, dec!(0));
    }

    #[test]
    fn interest_decrease_keeps_average_until_flat() {
        let mut state = AssetState::new();
        state.increase_interest(Side::Short, dec!(2), Price::new_unchecked(dec!(2000)));

        state.decrease_interest(Side::Short, dec!(1));
        assert_eq!(state.total_short_size, dec!(1));
        assert_eq!(state.average_short_price, dec!(2000));

        state.decrease_interest(Side::Short, dec!(1));
        assert_eq!(state.total_short_size, dec!(0));
        assert_eq!(state.average_short_price, dec!(0));
    }

    #[test]
    fn skew_signs() {
        let mut state = AssetState::new();
        state.increase_interest(Side::Long, dec!(10), Price::new_unchecked(dec!(2000)));
        state.increase_interest(Side::Short, dec!(1), Price::new_unchecked(dec!(2000)));
        // (10 - 1) * 2000
        assert_eq!(state.skew().value(), dec!(18000));
    }

    #[test]
    fn registry_lookup() {
        let mut registry = AssetRegistry::new();
        registry.add(Asset::new(AssetId(0), "USDC", 6, flags(AssetFlags::STABLE)));
        registry.add(Asset::new(AssetId(1), "XXX", 18, flags(AssetFlags::TRADABLE)));

        assert_eq!(registry.get(AssetId(0)).unwrap().symbol, "USDC");
        assert!(registry.get(AssetId(9)).is_none());

        registry.set_flags(AssetId(1), flags(AssetFlags::TRADABLE | AssetFlags::ENABLED));
        assert!(registry.get(AssetId(1)).unwrap().flags.is_enabled());
    }
}
