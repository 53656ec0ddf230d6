// 12.2 engine/core.rs: the venue. one state holder shared by every
// capability: order queue, position ledger, pool accounting, custody, fees.
// execution is strictly serialized by the caller; each operation validates
// fully before mutating, so a failed call leaves the venue byte-identical.

use super::results::VenueError;
use crate::asset::{Asset, AssetFlags, AssetRegistry};
use crate::config::{AssetParams, ConfigStore, OrderBookParams, PoolParams};
use crate::custody::{Custody, Holder, TokenId};
use crate::events::{EventLog, EventPayload, FeeDistributedEvent};
use crate::fees::{split_fee, FeeShares, FeeSplit, ReferralLookup, RewardAccrual};
use crate::oracle::{dampened_price, PriceVector, ReferenceOracle};
use crate::order::{Order, OrderList};
use crate::position::{pnl, SubAccount};
use crate::types::{AccountId, AssetId, OrderId, Price, Side, SubAccountId, Timestamp, Usd};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// No referral program: every payer is untiered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferrals;

impl ReferralLookup for NoReferrals {
    fn tier_of(&self, _payer: AccountId) -> Option<crate::fees::ReferralTier> {
        None
    }
}

pub struct Venue {
    pub(super) config: ConfigStore,
    pub(super) registry: AssetRegistry,
    pub(super) reference_oracles: HashMap<AssetId, ReferenceOracle>,
    pub(super) orders: OrderList,
    pub(super) ledger: HashMap<SubAccountId, SubAccount>,
    pub(super) custody: Custody,
    pub(super) fee_shares: FeeShares,
    pub(super) referrals: Box<dyn ReferralLookup + Send + Sync>,
    pub(super) rewards: RewardAccrual,
    pub(super) fillers: HashSet<AccountId>,
    pub(super) events: EventLog,
    pub(super) current_time: Timestamp,
}

impl std::fmt::Debug for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Venue")
            .field("orders", &self.orders.active_count())
            .field("subaccounts", &self.ledger.len())
            .field("time", &self.current_time)
            .finish()
    }
}

impl Venue {
    pub fn new(config: ConfigStore) -> Self {
        Self {
            config,
            registry: AssetRegistry::new(),
            reference_oracles: HashMap::new(),
            orders: OrderList::new(),
            ledger: HashMap::new(),
            custody: Custody::new(),
            fee_shares: FeeShares::default(),
            referrals: Box::new(NoReferrals),
            rewards: RewardAccrual::new(),
            fillers: HashSet::new(),
            events: EventLog::new(4096),
            current_time: Timestamp::from_secs(0),
        }
    }

    // --- setup -----------------------------------------------------------

    pub fn add_asset(&mut self, id: AssetId, symbol: &str, decimals: u32, flags: AssetFlags) {
        self.registry.add(Asset::new(id, symbol, decimals, flags));
    }

    pub fn set_asset_flags(&mut self, id: AssetId, flags: AssetFlags) {
        self.registry.set_flags(id, flags);
    }

    pub fn set_reference_price(&mut self, id: AssetId, price: Price) {
        self.reference_oracles.insert(id, ReferenceOracle { price });
    }

    pub fn clear_reference_price(&mut self, id: AssetId) {
        self.reference_oracles.remove(&id);
    }

    pub fn grant_filler(&mut self, account: AccountId) {
        self.fillers.insert(account);
    }

    pub fn revoke_filler(&mut self, account: AccountId) {
        self.fillers.remove(&account);
    }

    pub fn set_fee_shares(&mut self, shares: FeeShares) {
        self.fee_shares = shares;
    }

    pub fn set_referral_lookup(&mut self, lookup: Box<dyn ReferralLookup + Send + Sync>) {
        self.referrals = lookup;
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    /// External deposit: tokens arriving from outside the venue.
    pub fn fund_account(&mut self, account: AccountId, asset: AssetId, amount: Decimal) {
        self.custody.credit(Holder::User(account), TokenId::Asset(asset), amount);
    }

    // --- time ------------------------------------------------------------

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.plus(secs);
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    // --- read surface ----------------------------------------------------

    pub fn get_order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    pub fn list_orders(&self, offset: usize, count: usize) -> Vec<&Order> {
        self.orders.list(offset, count)
    }

    pub fn list_orders_of(&self, owner: AccountId, offset: usize, count: usize) -> Vec<&Order> {
        self.orders.list_of(owner, offset, count)
    }

    pub fn active_order_count(&self) -> usize {
        self.orders.active_count()
    }

    pub fn sub_account(&self, id: SubAccountId) -> SubAccount {
        self.ledger.get(&id).cloned().unwrap_or_default()
    }

    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.registry.get(id)
    }

    pub fn balance_of(&self, account: AccountId, asset: AssetId) -> Decimal {
        self.custody.balance(Holder::User(account), TokenId::Asset(asset))
    }

    pub fn share_balance_of(&self, account: AccountId) -> Decimal {
        self.custody.balance(Holder::User(account), TokenId::PoolShares)
    }

    pub fn pool_balance(&self, asset: AssetId) -> Decimal {
        self.custody.balance(Holder::Pool, TokenId::Asset(asset))
    }

    pub fn pol_balance(&self, asset: AssetId) -> Decimal {
        self.custody.balance(Holder::PolVault, TokenId::Asset(asset))
    }

    pub fn share_supply(&self) -> Decimal {
        self.custody.share_supply()
    }

    pub fn claimable_reward(&self, asset: AssetId) -> Decimal {
        self.rewards.claimable(asset)
    }

    /// Pay out the accrued long-term reward share for one asset. Filler-only;
    /// the tokens have been sitting in pool custody since distribution.
    pub fn claim_reward(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        recipient: AccountId,
    ) -> Result<Decimal, VenueError> {
        if !self.is_filler(caller) {
            return Err(VenueError::Unauthorized);
        }
        let amount = self.rewards.claimable(asset);
        self.custody
            .transfer(Holder::Pool, Holder::User(recipient), TokenId::Asset(asset), amount)?;
        self.rewards.claim(asset);
        Ok(amount)
    }

    pub fn events(&self) -> &[crate::events::Event] {
        self.events.all()
    }

    pub fn recent_events(&self, count: usize) -> &[crate::events::Event] {
        self.events.recent(count)
    }

    // --- shared internals -------------------------------------------------

    pub(super) fn is_filler(&self, account: AccountId) -> bool {
        self.fillers.contains(&account)
    }

    pub(super) fn pool_params(&self) -> PoolParams {
        PoolParams::read(&self.config)
    }

    pub(super) fn asset_params(&self, id: AssetId) -> AssetParams {
        AssetParams::read(&self.config, id)
    }

    pub(super) fn ob_params(&self) -> OrderBookParams {
        OrderBookParams::read(&self.config)
    }

    pub(super) fn asset_or_err(&self, id: AssetId) -> Result<&Asset, VenueError> {
        self.registry.get(id).ok_or(VenueError::AssetNotFound(id))
    }

    /// Reported price after the strict-stable dampener and, for other assets
    /// with a reference oracle, clamping into the configured deviation band.
    pub(super) fn effective_price(&self, id: AssetId, vector: &PriceVector) -> Result<Price, VenueError> {
        let asset = self.asset_or_err(id)?;
        let reported = vector.get(id)?;
        let reference = self.reference_oracles.get(&id);

        if asset.flags.is_strict_stable() {
            let band = self.pool_params().strict_stable_deviation;
            return Ok(dampened_price(asset, reference, reported, band));
        }
        if let Some(oracle) = reference {
            let deviation = self.asset_params(id).reference_deviation.value();
            if deviation > Decimal::ZERO {
                let lo = oracle.price.value() * (Decimal::ONE - deviation);
                let hi = oracle.price.value() * (Decimal::ONE + deviation);
                let clamped = reported.value().max(lo).min(hi);
                return Price::new(clamped).ok_or(VenueError::InvalidPrice);
            }
        }
        Ok(reported)
    }

    /// Entry notional of all open interest scaled by each asset's reserve rate.
    pub(super) fn total_reserved(&self) -> Usd {
        let mut reserved = Decimal::ZERO;
        for asset in self.registry.iter() {
            if !asset.flags.is_tradable() {
                continue;
            }
            let rate = self.asset_params(asset.id).adl_reserve_rate.value();
            let notional = asset.state.entry_notional(Side::Long).value()
                + asset.state.entry_notional(Side::Short).value();
            reserved += notional * rate;
        }
        Usd::new(reserved)
    }

    /// USD value of all pool-held spot liquidity at reported prices.
    pub(super) fn total_spot_value(&self, vector: &PriceVector) -> Result<Usd, VenueError> {
        let mut total = Decimal::ZERO;
        for asset in self.registry.iter() {
            if !asset.flags.can_hold_liquidity() || asset.state.spot_liquidity.is_zero() {
                continue;
            }
            let price = self.effective_price(asset.id, vector)?;
            total += asset.state.spot_liquidity * price.value();
        }
        Ok(Usd::new(total))
    }

    /// Net asset value backing pool shares: spot liquidity minus the pool's
    /// aggregate liability to traders, with per-side profit capped the same
    /// way realized profit is capped on close.
    pub(super) fn pool_nav(&self, vector: &PriceVector) -> Result<Usd, VenueError> {
        let mut nav = self.total_spot_value(vector)?.value();
        for asset in self.registry.iter() {
            if !asset.flags.is_tradable() {
                continue;
            }
            let max_pnl_rate = self.asset_params(asset.id).adl_max_pnl_rate;
            let price = self.effective_price(asset.id, vector)?;
            for side in [Side::Long, Side::Short] {
                let size = asset.state.total_size(side);
                if size.is_zero() {
                    continue;
                }
                let average = Price::new(asset.state.average_price(side)).ok_or(VenueError::InvalidPrice)?;
                let mut side_pnl = pnl(side, average, price, size).value();
                if side_pnl > Decimal::ZERO {
                    let cap = average.value() * size * max_pnl_rate.value();
                    side_pnl = side_pnl.min(cap);
                }
                nav -= side_pnl;
            }
        }
        Ok(Usd::new(nav))
    }

    /// NAV per pool share. 1.0 before the first deposit.
    pub(super) fn share_price(&self, vector: &PriceVector) -> Result<Decimal, VenueError> {
        let supply = self.custody.share_supply();
        if supply.is_zero() {
            return Ok(Decimal::ONE);
        }
        let nav = self.pool_nav(vector)?.value();
        if nav <= Decimal::ZERO {
            return Err(VenueError::InvalidPrice);
        }
        Ok(nav / supply)
    }

    /// Split a fee sitting in pool custody. Pool share folds into spot
    /// liquidity, POL share moves to the vault, reward share accrues per
    /// asset, discount/rebate pay out immediately.
    pub(super) fn distribute_fee(
        &mut self,
        payer: AccountId,
        asset: AssetId,
        fee_tokens: Decimal,
    ) -> Result<FeeSplit, VenueError> {
        let tier = self.referrals.tier_of(payer);
        let split = split_fee(fee_tokens, tier, self.fee_shares);
        let token = TokenId::Asset(asset);

        self.custody.transfer(Holder::Pool, Holder::User(payer), token, split.to_payer)?;
        if let Some(t) = tier {
            self.custody
                .transfer(Holder::Pool, Holder::User(t.referrer), token, split.to_referrer)?;
        }
        self.custody.transfer(Holder::Pool, Holder::PolVault, token, split.to_pol)?;
        self.rewards.accrue(asset, split.to_reward);
        if let Some(entry) = self.registry.get_mut(asset) {
            entry.state.spot_liquidity += split.to_pool;
        }

        let timestamp = self.current_time;
        self.events.emit(
            timestamp,
            EventPayload::FeeDistributed(FeeDistributedEvent {
                payer,
                asset,
                to_pool: split.to_pool,
                to_pol: split.to_pol,
                to_reward: split.to_reward,
                to_payer: split.to_payer,
                to_referrer: split.to_referrer,
            }),
        );
        Ok(split)
    }

    pub(super) fn emit(&mut self, payload: EventPayload) {
        let timestamp = self.current_time;
        self.events.emit(timestamp, payload);
    }
}
