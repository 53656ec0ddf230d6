// 12.4 engine/positions.rs: the position ledger. open/increase and
// close/decrease settlement, plus the collateral withdrawal path. every
// operation computes its entire outcome first and only then commits, so an
// economic rejection leaves ledger, custody and totals untouched.
//
// conventions: position collateral is collateral-token units; pnl, fees and
// margin thresholds are USD, converted at the reported (dampened) prices.
// funding settles on the full position size at entry price on every touch.

use super::core::Venue;
use super::results::{CloseOutcome, OpenOutcome, VenueError};
use crate::custody::{Holder, TokenId};
use crate::events::{CollateralEvent, EventPayload, PositionClosedEvent, PositionOpenedEvent};
use crate::margin::{reserve_satisfied, MarginStatus};
use crate::oracle::PriceVector;
use crate::position::{
    averaged_entry, capped_pnl, funding_fee, pnl, position_fee, profit_rate, OpenPosition,
};
use crate::types::{AssetId, Price, SubAccountId, Usd};
use rust_decimal::Decimal;

impl Venue {
    /// Open or grow a position. Fails whole if the resulting position would
    /// be under-margined or the pool under-reserved; the queued order is then
    /// left untouched by the caller.
    pub(super) fn open_or_increase(
        &mut self,
        sub: SubAccountId,
        amount: Decimal,
        collateral_delta: Decimal,
        trading_price: Price,
        vector: &PriceVector,
    ) -> Result<OpenOutcome, VenueError> {
        let side = sub.side();
        let params = self.asset_params(sub.asset_id);
        let collateral_price = self.effective_price(sub.collateral_id, vector)?;
        let asset_price = self.effective_price(sub.asset_id, vector)?;

        let account = self.sub_account(sub);
        let state = &self.asset_or_err(sub.asset_id)?.state;
        let funding_index = state.cumulative_funding(side);

        // settle funding owed so far, then the open fee; both leave via the distributor
        let funding_owed = match &account.position {
            Some(p) => funding_fee(p, funding_index),
            None => Usd::zero(),
        };
        let open_fee = position_fee(trading_price, amount, params.position_fee_rate);
        let fee_tokens = funding_owed.add(open_fee).in_tokens(collateral_price);

        let new_collateral = account.collateral + collateral_delta - fee_tokens;
        if new_collateral < Decimal::ZERO {
            return Err(VenueError::InsufficientMargin);
        }

        let (old_size, old_entry) = match &account.position {
            Some(p) => (p.size, p.entry_price.value()),
            None => (Decimal::ZERO, Decimal::ZERO),
        };
        let new_size = old_size + amount;
        let new_entry = averaged_entry(old_size, old_entry, amount, trading_price);

        // aggregate size limit for this direction
        let side_total = state.total_size(side) + amount;
        let side_max = if side.is_long() {
            params.max_long_position_size
        } else {
            params.max_short_position_size
        };
        if side_max > Decimal::ZERO && side_total > side_max {
            return Err(VenueError::MaxPositionExceeded);
        }

        // margin after the fill, marked at the reported asset price
        let status = MarginStatus::compute(
            Usd::new(new_collateral * collateral_price.value()),
            pnl(side, new_entry, asset_price, new_size),
            Usd::zero(),
            new_size,
            asset_price,
            params.initial_margin_rate,
            params.maintenance_margin_rate,
        );
        if !status.is_im_safe() {
            return Err(VenueError::InsufficientMargin);
        }

        // reserve invariant with the new open interest included
        let reserved_after = self
            .total_reserved()
            .add(Usd::new(amount * trading_price.value() * params.adl_reserve_rate.value()));
        if !reserve_satisfied(reserved_after, self.total_spot_value(vector)?) {
            return Err(VenueError::InsufficientReserve);
        }

        // commit: escrow into the pool, fees out, then the ledger and totals
        let collateral_token = TokenId::Asset(sub.collateral_id);
        if collateral_delta > Decimal::ZERO {
            self.custody
                .transfer(Holder::OrderBook, Holder::Pool, collateral_token, collateral_delta)?;
        }
        if fee_tokens > Decimal::ZERO {
            self.distribute_fee(sub.account, sub.collateral_id, fee_tokens)?;
        }

        let now = self.current_time;
        let entry = self.ledger.entry(sub).or_default();
        entry.collateral = new_collateral;
        entry.position = Some(OpenPosition {
            size: new_size,
            entry_price: new_entry,
            entry_funding: funding_index,
            last_increased_at: now,
        });
        if let Some(asset) = self.registry.get_mut(sub.asset_id) {
            asset.state.increase_interest(side, amount, trading_price);
        }

        self.emit(EventPayload::PositionOpened(PositionOpenedEvent {
            sub_account: sub,
            size: amount,
            trading_price: trading_price.value(),
            entry_price: new_entry.value(),
            fee: funding_owed.add(open_fee),
            remaining_collateral: new_collateral,
        }));

        Ok(OpenOutcome {
            sub_account: sub,
            entry_price: new_entry.value(),
            fee: funding_owed.add(open_fee),
            remaining_collateral: new_collateral,
        })
    }

    /// Close or shrink a position. Profit is capped per closed entry
    /// notional and paid by the pool in the profit asset; losses and any fee
    /// shortfall come out of collateral, clamped so collateral never goes
    /// negative.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn close_or_decrease(
        &mut self,
        sub: SubAccountId,
        amount: Decimal,
        trading_price: Price,
        vector: &PriceVector,
        profit_asset: AssetId,
        withdraw_all_if_empty: bool,
        min_profit_gate: bool,
        withdraw_collateral: Decimal,
    ) -> Result<CloseOutcome, VenueError> {
        let side = sub.side();
        let params = self.asset_params(sub.asset_id);
        let collateral_price = self.effective_price(sub.collateral_id, vector)?;
        let profit_price = self.effective_price(profit_asset, vector)?;

        let account = self.sub_account(sub);
        let position = account.position.clone().ok_or(VenueError::PositionNotOpen)?;
        let amount = amount.min(position.size);

        let state = &self.asset_or_err(sub.asset_id)?.state;
        let funding_index = state.cumulative_funding(side);
        let funding_owed = funding_fee(&position, funding_index);

        let realized = capped_pnl(
            side,
            position.entry_price,
            trading_price,
            amount,
            params.adl_max_pnl_rate,
        );

        if min_profit_gate && realized.is_positive() {
            let elapsed = self.current_time.elapsed_since(position.last_increased_at);
            let rate = profit_rate(position.entry_price, amount, realized);
            if elapsed < params.min_profit_time && rate < params.min_profit_rate.value() {
                return Err(VenueError::ProfitConditionNotMet);
            }
        }

        let close_fee = position_fee(trading_price, amount, params.position_fee_rate);
        let fee_total = close_fee.add(funding_owed);

        // settlement plan, all in token units
        let mut new_collateral = account.collateral;
        let mut payout_profit_tokens = Decimal::ZERO; // pool -> trader, profit asset
        let mut fee_profit_tokens = Decimal::ZERO; // pool -> distributor, profit asset
        let mut fee_collateral_tokens = Decimal::ZERO; // pool -> distributor, collateral asset
        let mut spot_profit_delta = Decimal::ZERO;
        let mut spot_collateral_delta = Decimal::ZERO;

        if realized.is_positive() {
            // pool pays the gross profit; the fee is carved out of it first
            let gross_tokens = realized.in_tokens(profit_price);
            let profit_state = &self.asset_or_err(profit_asset)?.state;
            if profit_state.spot_liquidity < gross_tokens {
                return Err(VenueError::InsufficientLiquidity {
                    requested: gross_tokens,
                    available: profit_state.spot_liquidity,
                });
            }
            let fee_from_profit = fee_total.min(realized);
            let shortfall = fee_total.sub(fee_from_profit);

            payout_profit_tokens = realized.sub(fee_from_profit).in_tokens(profit_price);
            fee_profit_tokens = fee_from_profit.in_tokens(profit_price);
            spot_profit_delta = -gross_tokens;

            let shortfall_tokens = shortfall.in_tokens(collateral_price).min(new_collateral);
            fee_collateral_tokens = shortfall_tokens;
            new_collateral -= shortfall_tokens;
        } else {
            // losses flow into the pool; fee comes from whatever collateral remains
            let loss_tokens = Usd::zero()
                .sub(realized)
                .in_tokens(collateral_price)
                .min(new_collateral);
            new_collateral -= loss_tokens;
            spot_collateral_delta = loss_tokens;

            let fee_tokens = fee_total.in_tokens(collateral_price).min(new_collateral);
            fee_collateral_tokens = fee_tokens;
            new_collateral -= fee_tokens;
        }

        let remaining_size = position.size - amount;
        let withdraw_now = withdraw_collateral.min(new_collateral);
        let withdraw_rest = if remaining_size.is_zero() && withdraw_all_if_empty {
            new_collateral - withdraw_now
        } else {
            Decimal::ZERO
        };

        // commit
        let collateral_token = TokenId::Asset(sub.collateral_id);
        let profit_token = TokenId::Asset(profit_asset);
        let owner = Holder::User(sub.account);

        self.custody.transfer(Holder::Pool, owner, profit_token, payout_profit_tokens)?;
        if fee_profit_tokens > Decimal::ZERO {
            self.distribute_fee(sub.account, profit_asset, fee_profit_tokens)?;
        }
        if fee_collateral_tokens > Decimal::ZERO {
            self.distribute_fee(sub.account, sub.collateral_id, fee_collateral_tokens)?;
        }
        let paid_out = withdraw_now + withdraw_rest;
        self.custody.transfer(Holder::Pool, owner, collateral_token, paid_out)?;

        if let Some(asset) = self.registry.get_mut(profit_asset) {
            asset.state.spot_liquidity += spot_profit_delta;
        }
        if let Some(asset) = self.registry.get_mut(sub.collateral_id) {
            asset.state.spot_liquidity += spot_collateral_delta;
        }

        let final_collateral = new_collateral - paid_out;
        let entry = self.ledger.entry(sub).or_default();
        entry.collateral = final_collateral;
        entry.position = if remaining_size.is_zero() {
            None
        } else {
            Some(OpenPosition {
                size: remaining_size,
                entry_price: position.entry_price,
                entry_funding: funding_index,
                last_increased_at: position.last_increased_at,
            })
        };
        if entry.is_empty() {
            self.ledger.remove(&sub);
        }
        if let Some(asset) = self.registry.get_mut(sub.asset_id) {
            asset.state.decrease_interest(side, amount);
        }

        self.emit(EventPayload::PositionClosed(PositionClosedEvent {
            sub_account: sub,
            size: amount,
            trading_price: trading_price.value(),
            fee: fee_total,
            pnl: realized,
            remaining_size,
            remaining_collateral: final_collateral,
        }));

        Ok(CloseOutcome {
            sub_account: sub,
            realized_pnl: realized,
            fee: fee_total,
            remaining_size,
            remaining_collateral: final_collateral,
            paid_out: payout_profit_tokens + paid_out,
        })
    }

    /// Withdraw collateral from a subaccount, settling funding first. The
    /// position must stay IM-safe afterwards.
    pub(super) fn withdraw_collateral(
        &mut self,
        sub: SubAccountId,
        amount: Decimal,
        profit_asset: AssetId,
        is_profit: bool,
        vector: &PriceVector,
    ) -> Result<(), VenueError> {
        let side = sub.side();
        let params = self.asset_params(sub.asset_id);
        let collateral_price = self.effective_price(sub.collateral_id, vector)?;

        let account = self.sub_account(sub);
        if account.is_empty() {
            return Err(VenueError::PositionNotOpen);
        }

        let state = &self.asset_or_err(sub.asset_id)?.state;
        let funding_index = state.cumulative_funding(side);
        let funding_owed = match &account.position {
            Some(p) => funding_fee(p, funding_index),
            None => Usd::zero(),
        };
        let funding_tokens = funding_owed.in_tokens(collateral_price);

        let after_funding = account.collateral - funding_tokens;
        if after_funding < Decimal::ZERO {
            return Err(VenueError::InsufficientMargin);
        }

        // principal leaves as collateral tokens; profit leaves as profit-asset
        // tokens paid by the pool against an equivalent slice of collateral
        let (collateral_cost, profit_tokens_out) = if is_profit {
            let profit_price = self.effective_price(profit_asset, vector)?;
            let cost = Usd::new(amount * profit_price.value()).in_tokens(collateral_price);
            (cost, amount)
        } else {
            (amount, Decimal::ZERO)
        };
        if collateral_cost > after_funding {
            return Err(VenueError::InsufficientCollateral(collateral_cost));
        }
        let new_collateral = after_funding - collateral_cost;

        if is_profit {
            let profit_state = &self.asset_or_err(profit_asset)?.state;
            if profit_state.spot_liquidity < profit_tokens_out {
                return Err(VenueError::InsufficientLiquidity {
                    requested: profit_tokens_out,
                    available: profit_state.spot_liquidity,
                });
            }
        }

        // the remaining position must stay IM-safe at reported prices
        if let Some(position) = &account.position {
            let asset_price = self.effective_price(sub.asset_id, vector)?;
            let status = MarginStatus::compute(
                Usd::new(new_collateral * collateral_price.value()),
                pnl(side, position.entry_price, asset_price, position.size),
                Usd::zero(),
                position.size,
                asset_price,
                params.initial_margin_rate,
                params.maintenance_margin_rate,
            );
            if !status.is_im_safe() {
                return Err(VenueError::InsufficientMargin);
            }
        }

        // commit
        let owner = Holder::User(sub.account);
        if is_profit {
            self.custody
                .transfer(Holder::Pool, owner, TokenId::Asset(profit_asset), profit_tokens_out)?;
            if let Some(asset) = self.registry.get_mut(profit_asset) {
                asset.state.spot_liquidity -= profit_tokens_out;
            }
            if let Some(asset) = self.registry.get_mut(sub.collateral_id) {
                asset.state.spot_liquidity += collateral_cost;
            }
        } else {
            self.custody
                .transfer(Holder::Pool, owner, TokenId::Asset(sub.collateral_id), amount)?;
        }
        if funding_tokens > Decimal::ZERO {
            self.distribute_fee(sub.account, sub.collateral_id, funding_tokens)?;
        }

        let entry = self.ledger.entry(sub).or_default();
        entry.collateral = new_collateral;
        if let Some(position) = entry.position.as_mut() {
            position.entry_funding = funding_index;
        }
        if entry.is_empty() {
            self.ledger.remove(&sub);
        }

        self.emit(EventPayload::CollateralWithdrawn(CollateralEvent {
            sub_account: sub,
            amount,
        }));
        Ok(())
    }
}
