// 2.0: configuration store. every tunable is addressed by a fixed-width key
// derived from a one-way hash of its human-readable name. the key set is a
// closed registry: keys are hashed once at compile time, never from runtime
// strings. the engine reads these values and owns none of them.
// 2.1 has the typed read views (PoolParams / AssetParams / OrderBookParams).

use crate::types::{AssetId, Rate, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// FNV-1a 64. stable, dependency-free, collision-checked by the registry test below.
const fn fnv1a(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash: u64 = 0xcbf29ce484222325;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x100000001b3);
        i += 1;
    }
    hash
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigKey(pub u64);

impl ConfigKey {
    pub const fn named(name: &str) -> Self {
        Self(fnv1a(name))
    }
}

// pool scope
pub const FUNDING_INTERVAL: ConfigKey = ConfigKey::named("FUNDING_INTERVAL");
pub const BORROWING_RATE_APY: ConfigKey = ConfigKey::named("BORROWING_RATE_APY");
pub const LIQUIDITY_FEE_RATE: ConfigKey = ConfigKey::named("LIQUIDITY_FEE_RATE");
pub const STRICT_STABLE_DEVIATION: ConfigKey = ConfigKey::named("STRICT_STABLE_DEVIATION");
pub const LIQUIDITY_CAP_USD: ConfigKey = ConfigKey::named("LIQUIDITY_CAP_USD");

// asset scope
pub const LOT_SIZE: ConfigKey = ConfigKey::named("LOT_SIZE");
pub const INITIAL_MARGIN_RATE: ConfigKey = ConfigKey::named("INITIAL_MARGIN_RATE");
pub const MAINTENANCE_MARGIN_RATE: ConfigKey = ConfigKey::named("MAINTENANCE_MARGIN_RATE");
pub const MIN_PROFIT_RATE: ConfigKey = ConfigKey::named("MIN_PROFIT_RATE");
pub const MIN_PROFIT_TIME: ConfigKey = ConfigKey::named("MIN_PROFIT_TIME");
pub const POSITION_FEE_RATE: ConfigKey = ConfigKey::named("POSITION_FEE_RATE");
pub const LIQUIDATION_FEE_RATE: ConfigKey = ConfigKey::named("LIQUIDATION_FEE_RATE");
pub const REFERENCE_DEVIATION: ConfigKey = ConfigKey::named("REFERENCE_DEVIATION");
pub const MAX_LONG_POSITION_SIZE: ConfigKey = ConfigKey::named("MAX_LONG_POSITION_SIZE");
pub const MAX_SHORT_POSITION_SIZE: ConfigKey = ConfigKey::named("MAX_SHORT_POSITION_SIZE");
pub const FUNDING_ALPHA: ConfigKey = ConfigKey::named("FUNDING_ALPHA");
pub const FUNDING_BETA_APY: ConfigKey = ConfigKey::named("FUNDING_BETA_APY");
pub const ADL_RESERVE_RATE: ConfigKey = ConfigKey::named("ADL_RESERVE_RATE");
pub const ADL_MAX_PNL_RATE: ConfigKey = ConfigKey::named("ADL_MAX_PNL_RATE");
pub const ADL_TRIGGER_RATE: ConfigKey = ConfigKey::named("ADL_TRIGGER_RATE");

// order book scope
pub const OB_LIQUIDITY_LOCK_PERIOD: ConfigKey = ConfigKey::named("OB_LIQUIDITY_LOCK_PERIOD");
pub const OB_MARKET_ORDER_TIMEOUT: ConfigKey = ConfigKey::named("OB_MARKET_ORDER_TIMEOUT");
pub const OB_LIMIT_ORDER_TIMEOUT: ConfigKey = ConfigKey::named("OB_LIMIT_ORDER_TIMEOUT");
pub const OB_CANCEL_COOL_DOWN: ConfigKey = ConfigKey::named("OB_CANCEL_COOL_DOWN");

// the closed registry, in declaration order. bump when keys change.
pub const CONFIG_REGISTRY_VERSION: u32 = 1;
pub const ALL_KEYS: [(&str, ConfigKey); 24] = [
    ("FUNDING_INTERVAL", FUNDING_INTERVAL),
    ("BORROWING_RATE_APY", BORROWING_RATE_APY),
    ("LIQUIDITY_FEE_RATE", LIQUIDITY_FEE_RATE),
    ("STRICT_STABLE_DEVIATION", STRICT_STABLE_DEVIATION),
    ("LIQUIDITY_CAP_USD", LIQUIDITY_CAP_USD),
    ("LOT_SIZE", LOT_SIZE),
    ("INITIAL_MARGIN_RATE", INITIAL_MARGIN_RATE),
    ("MAINTENANCE_MARGIN_RATE", MAINTENANCE_MARGIN_RATE),
    ("MIN_PROFIT_RATE", MIN_PROFIT_RATE),
    ("MIN_PROFIT_TIME", MIN_PROFIT_TIME),
    ("POSITION_FEE_RATE", POSITION_FEE_RATE),
    ("LIQUIDATION_FEE_RATE", LIQUIDATION_FEE_RATE),
    ("REFERENCE_DEVIATION", REFERENCE_DEVIATION),
    ("MAX_LONG_POSITION_SIZE", MAX_LONG_POSITION_SIZE),
    ("MAX_SHORT_POSITION_SIZE", MAX_SHORT_POSITION_SIZE),
    ("FUNDING_ALPHA", FUNDING_ALPHA),
    ("FUNDING_BETA_APY", FUNDING_BETA_APY),
    ("ADL_RESERVE_RATE", ADL_RESERVE_RATE),
    ("ADL_MAX_PNL_RATE", ADL_MAX_PNL_RATE),
    ("ADL_TRIGGER_RATE", ADL_TRIGGER_RATE),
    ("OB_LIQUIDITY_LOCK_PERIOD", OB_LIQUIDITY_LOCK_PERIOD),
    ("OB_MARKET_ORDER_TIMEOUT", OB_MARKET_ORDER_TIMEOUT),
    ("OB_LIMIT_ORDER_TIMEOUT", OB_LIMIT_ORDER_TIMEOUT),
    ("OB_CANCEL_COOL_DOWN", OB_CANCEL_COOL_DOWN),
];

/// Key/value parameter store. Pool-wide values live under a bare key,
/// per-asset values under (asset, key). Unset keys read as zero, which
/// disables the corresponding behavior (zero fee, zero cap, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigStore {
    pool: HashMap<ConfigKey, Decimal>,
    asset: HashMap<(AssetId, ConfigKey), Decimal>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: ConfigKey, value: Decimal) {
        self.pool.insert(key, value);
    }

    pub fn set_asset(&mut self, asset: AssetId, key: ConfigKey, value: Decimal) {
        self.asset.insert((asset, key), value);
    }

    pub fn get(&self, key: ConfigKey) -> Decimal {
        self.pool.get(&key).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn get_asset(&self, asset: AssetId, key: ConfigKey) -> Decimal {
        self.asset.get(&(asset, key)).copied().unwrap_or(Decimal::ZERO)
    }

    fn get_secs(&self, key: ConfigKey) -> u64 {
        decimal_to_secs(self.get(key))
    }
}

fn decimal_to_secs(value: Decimal) -> u64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_u64().unwrap_or(0)
}

// 2.1: typed views. resolved per operation so a parameter change between two
// operations is picked up without any engine-side caching.

#[derive(Debug, Clone, Copy)]
pub struct PoolParams {
    pub funding_interval: u64,
    pub borrowing_rate_apy: Rate,
    pub liquidity_fee_rate: Rate,
    pub strict_stable_deviation: Rate,
    pub liquidity_cap: Usd,
}

impl PoolParams {
    pub fn read(store: &ConfigStore) -> Self {
        Self {
            funding_interval: store.get_secs(FUNDING_INTERVAL),
            borrowing_rate_apy: Rate::new(store.get(BORROWING_RATE_APY)),
            liquidity_fee_rate: Rate::new(store.get(LIQUIDITY_FEE_RATE)),
            strict_stable_deviation: Rate::new(store.get(STRICT_STABLE_DEVIATION)),
            liquidity_cap: Usd::new(store.get(LIQUIDITY_CAP_USD)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssetParams {
    pub lot_size: Decimal,
    pub initial_margin_rate: Rate,
    pub maintenance_margin_rate: Rate,
    pub min_profit_rate: Rate,
    pub min_profit_time: u64,
    pub position_fee_rate: Rate,
    pub liquidation_fee_rate: Rate,
    pub reference_deviation: Rate,
    pub max_long_position_size: Decimal,
    pub max_short_position_size: Decimal,
    pub funding_alpha: Usd,
    pub funding_beta_apy: Rate,
    pub adl_reserve_rate: Rate,
    pub adl_max_pnl_rate: Rate,
    pub adl_trigger_rate: Rate,
}

impl AssetParams {
    pub fn read(store: &ConfigStore, asset: AssetId) -> Self {
        Self {
            lot_size: store.get_asset(asset, LOT_SIZE),
            initial_margin_rate: Rate::new(store.get_asset(asset, INITIAL_MARGIN_RATE)),
            maintenance_margin_rate: Rate::new(store.get_asset(asset, MAINTENANCE_MARGIN_RATE)),
            min_profit_rate: Rate::new(store.get_asset(asset, MIN_PROFIT_RATE)),
            min_profit_time: decimal_to_secs(store.get_asset(asset, MIN_PROFIT_TIME)),
            position_fee_rate: Rate::new(store.get_asset(asset, POSITION_FEE_RATE)),
            liquidation_fee_rate: Rate::new(store.get_asset(asset, LIQUIDATION_FEE_RATE)),
            reference_deviation: Rate::new(store.get_asset(asset, REFERENCE_DEVIATION)),
            max_long_position_size: store.get_asset(asset, MAX_LONG_POSITION_SIZE),
            max_short_position_size: store.get_asset(asset, MAX_SHORT_POSITION_SIZE),
            funding_alpha: Usd::new(store.get_asset(asset, FUNDING_ALPHA)),
            funding_beta_apy: Rate::new(store.get_asset(asset, FUNDING_BETA_APY)),
            adl_reserve_rate: Rate::new(store.get_asset(asset, ADL_RESERVE_RATE)),
            adl_max_pnl_rate: Rate::new(store.get_asset(asset, ADL_MAX_PNL_RATE)),
            adl_trigger_rate: Rate::new(store.get_asset(asset, ADL_TRIGGER_RATE)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrderBookParams {
    pub liquidity_lock_period: u64,
    pub market_order_timeout: u64,
    pub limit_order_timeout: u64,
    pub cancel_cool_down: u64,
}

impl OrderBookParams {
    pub fn read(store: &ConfigStore) -> Self {
        Self {
            liquidity_lock_period: store.get_secs(OB_LIQUIDITY_LOCK_PERIOD),
            market_order_timeout: store.get_secs(OB_MARKET_ORDER_TIMEOUT),
            limit_order_timeout: store.get_secs(OB_LIMIT_ORDER_TIMEOUT),
            cancel_cool_down: store.get_secs(OB_CANCEL_COOL_DOWN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn keys_are_stable_and_distinct() {
        // hash is part of the stored format; a collision or drift would corrupt lookups
        let mut seen = std::collections::HashSet::new();
        for (name, key) in ALL_KEYS {
            assert_eq!(ConfigKey::named(name), key, "registry drifted for {name}");
            assert!(seen.insert(key), "key collision on {name}");
        }
    }

    #[test]
    fn unset_keys_read_zero() {
        let store = ConfigStore::new();
        assert_eq!(store.get(LIQUIDITY_FEE_RATE), Decimal::ZERO);
        assert_eq!(store.get_asset(AssetId(1), LOT_SIZE), Decimal::ZERO);
    }

    #[test]
    fn pool_and_asset_scopes_are_separate() {
        let mut store = ConfigStore::new();
        store.set(FUNDING_INTERVAL, dec!(3600));
        store.set_asset(AssetId(1), POSITION_FEE_RATE, dec!(0.001));

        let pool = PoolParams::read(&store);
        assert_eq!(pool.funding_interval, 3600);

        let asset = AssetParams::read(&store, AssetId(1));
        assert_eq!(asset.position_fee_rate.value(), dec!(0.001));
        // another asset sees its own (zero) value
        assert_eq!(AssetParams::read(&store, AssetId(2)).position_fee_rate.value(), Decimal::ZERO);
    }

    #[test]
    fn typed_view_reads_all_fields() {
        let mut store = ConfigStore::new();
        let id = AssetId(1);
        store.set_asset(id, LOT_SIZE, dec!(0.1));
        store.set_asset(id, INITIAL_MARGIN_RATE, dec!(0.10));
        store.set_asset(id, MAINTENANCE_MARGIN_RATE, dec!(0.05));
        store.set_asset(id, MIN_PROFIT_TIME, dec!(10));
        store.set_asset(id, FUNDING_ALPHA, dec!(20000));
        store.set_asset(id, FUNDING_BETA_APY, dec!(0.20));

        let params = AssetParams::read(&store, id);
        assert_eq!(params.lot_size, dec!(0.1));
        assert_eq!(params.initial_margin_rate.value(), dec!(0.10));
        assert_eq!(params.maintenance_margin_rate.value(), dec!(0.05));
        assert_eq!(params.min_profit_time, 10);
        assert_eq!(params.funding_alpha.value(), dec!(20000));
        assert_eq!(params.funding_beta_apy.value(), dec!(0.20));
    }
}
