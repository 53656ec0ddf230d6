// 10.0: fee distribution. every fill fee is split between the pool, the
// protocol-owned-liquidity vault and the long-term reward pool; referred
// traders first carve a discount for themselves and a rebate for their
// referrer. splits must reconstruct the input fee exactly, with rounding
// remainder always in favor of the pool.

use crate::types::{AccountId, AssetId, Rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Referral standing of a payer. Owned by an external referral service; the
/// engine only consumes the lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralTier {
    pub discount_rate: Rate,
    pub rebate_rate: Rate,
    pub referrer: AccountId,
}

pub trait ReferralLookup {
    fn tier_of(&self, payer: AccountId) -> Option<ReferralTier>;
}

/// Table-backed lookup for tests and the simulator.
#[derive(Debug, Clone, Default)]
pub struct StaticReferralTable {
    tiers: HashMap<AccountId, ReferralTier>,
}

impl StaticReferralTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, payer: AccountId, tier: ReferralTier) {
        self.tiers.insert(payer, tier);
    }
}

impl ReferralLookup for StaticReferralTable {
    fn tier_of(&self, payer: AccountId) -> Option<ReferralTier> {
        self.tiers.get(&payer).copied()
    }
}

// 10.1: three-way share of the post-discount remainder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeShares {
    pub pool: Rate,
    pub pol: Rate,
    pub reward: Rate,
}

impl Default for FeeShares {
    fn default() -> Self {
        Self {
            pool: Rate::new(dec!(0.70)),
            pol: Rate::new(dec!(0.15)),
            reward: Rate::new(dec!(0.15)),
        }
    }
}

/// Where a fee went, in token units of the fee asset. Always sums to the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub to_pool: Decimal,
    pub to_pol: Decimal,
    pub to_reward: Decimal,
    pub to_payer: Decimal,
    pub to_referrer: Decimal,
}

impl FeeSplit {
    pub fn total(&self) -> Decimal {
        self.to_pool + self.to_pol + self.to_reward + self.to_payer + self.to_referrer
    }
}

// 10.2: the split. pol and reward are computed from the remainder, the pool
// takes whatever is left so the parts always reassemble the fee exactly.
pub fn split_fee(fee: Decimal, tier: Option<ReferralTier>, shares: FeeShares) -> FeeSplit {
    debug_assert!(fee >= Decimal::ZERO);
    let (to_payer, to_referrer) = match tier {
        Some(t) => (fee * t.discount_rate.value(), fee * t.rebate_rate.value()),
        None => (Decimal::ZERO, Decimal::ZERO),
    };
    let remainder = fee - to_payer - to_referrer;
    let to_pol = remainder * shares.pol.value();
    let to_reward = remainder * shares.reward.value();
    let to_pool = remainder - to_pol - to_reward;
    FeeSplit {
        to_pool,
        to_pol,
        to_reward,
        to_payer,
        to_referrer,
    }
}

// 10.3: the long-term reward share is not paid out on the spot; it accrues per
// asset until the reward program claims it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardAccrual {
    claimable: HashMap<AssetId, Decimal>,
}

impl RewardAccrual {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accrue(&mut self, asset: AssetId, amount: Decimal) {
        debug_assert!(amount >= Decimal::ZERO);
        *self.claimable.entry(asset).or_insert(Decimal::ZERO) += amount;
    }

    pub fn claimable(&self, asset: AssetId) -> Decimal {
        self.claimable.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn claim(&mut self, asset: AssetId) -> Decimal {
        self.claimable.remove(&asset).unwrap_or(Decimal::ZERO)
    }
}
