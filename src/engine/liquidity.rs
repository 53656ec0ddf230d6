// 12.8 engine/liquidity.rs: pool deposits and withdrawals. shares are priced
// at NAV (spot liquidity minus capped trader pnl), entry and exit both pay
// the liquidity fee, and removals re-check the reserve invariant so open
// positions always stay covered.

use super::core::Venue;
use super::results::{LiquidityOutcome, VenueError};
use crate::custody::{Holder, TokenId};
use crate::events::{EventPayload, LiquidityEvent};
use crate::margin::reserve_satisfied;
use crate::oracle::PriceVector;
use crate::types::{AccountId, AssetId, Usd};
use rust_decimal::Decimal;

impl Venue {
    pub(super) fn add_liquidity(
        &mut self,
        owner: AccountId,
        asset_id: AssetId,
        amount: Decimal,
        vector: &PriceVector,
    ) -> Result<LiquidityOutcome, VenueError> {
        let params = self.pool_params();
        let price = self.effective_price(asset_id, vector)?;
        let share_price = self.share_price(vector)?;

        let fee_tokens = amount * params.liquidity_fee_rate.value();
        let net = amount - fee_tokens;

        if params.liquidity_cap.value() > Decimal::ZERO {
            let nav_after = self.pool_nav(vector)?.add(Usd::new(net * price.value()));
            if nav_after > params.liquidity_cap {
                return Err(VenueError::LiquidityCapExceeded);
            }
        }
        let shares = net * price.value() / share_price;

        // commit: escrow into the pool, fee through the distributor, mint
        self.custody
            .transfer(Holder::OrderBook, Holder::Pool, TokenId::Asset(asset_id), amount)?;
        if let Some(asset) = self.registry.get_mut(asset_id) {
            asset.state.spot_liquidity += net;
        }
        if fee_tokens > Decimal::ZERO {
            self.distribute_fee(owner, asset_id, fee_tokens)?;
        }
        self.custody.mint_shares(Holder::User(owner), shares);

        self.emit(EventPayload::LiquidityAdded(LiquidityEvent {
            account: owner,
            asset: asset_id,
            token_amount: amount,
            share_amount: shares,
            share_price,
            fee_tokens,
        }));

        Ok(LiquidityOutcome {
            asset: asset_id,
            token_amount: amount,
            share_amount: shares,
            share_price,
            fee_tokens,
        })
    }

    pub(super) fn remove_liquidity(
        &mut self,
        owner: AccountId,
        asset_id: AssetId,
        shares: Decimal,
        vector: &PriceVector,
    ) -> Result<LiquidityOutcome, VenueError> {
        let params = self.pool_params();
        let price = self.effective_price(asset_id, vector)?;
        let share_price = self.share_price(vector)?;

        let tokens_out = shares * share_price / price.value();
        let spot = self.asset_or_err(asset_id)?.state.spot_liquidity;
        if tokens_out > spot {
            return Err(VenueError::InsufficientLiquidity {
                requested: tokens_out,
                available: spot,
            });
        }

        // withdrawing must not leave open interest uncovered
        let spot_value_after = self
            .total_spot_value(vector)?
            .sub(Usd::new(tokens_out * price.value()));
        if !reserve_satisfied(self.total_reserved(), spot_value_after) {
            return Err(VenueError::InsufficientReserve);
        }

        let fee_tokens = tokens_out * params.liquidity_fee_rate.value();
        let payout = tokens_out - fee_tokens;

        // commit: burn the escrowed shares, pay out net of the exit fee
        self.custody.burn_shares(Holder::OrderBook, shares)?;
        if let Some(asset) = self.registry.get_mut(asset_id) {
            asset.state.spot_liquidity -= tokens_out;
        }
        self.custody
            .transfer(Holder::Pool, Holder::User(owner), TokenId::Asset(asset_id), payout)?;
        if fee_tokens > Decimal::ZERO {
            self.distribute_fee(owner, asset_id, fee_tokens)?;
        }

        self.emit(EventPayload::LiquidityRemoved(LiquidityEvent {
            account: owner,
            asset: asset_id,
            token_amount: tokens_out,
            share_amount: shares,
            share_price,
            fee_tokens,
        }));

        Ok(LiquidityOutcome {
            asset: asset_id,
            token_amount: tokens_out,
            share_amount: shares,
            share_price,
            fee_tokens,
        })
    }
}
