// 12.6 engine/liquidations.rs: forced closes. liquidation fires only once a
// position has fallen below maintenance margin at the reported asset price;
// ADL fires only while the pool-wide trigger condition holds. both settle at
// the filler's trading price and can never leave a negative balance behind.

use super::core::Venue;
use super::results::{CloseOutcome, LiquidationOutcome, VenueError};
use crate::custody::{Holder, TokenId};
use crate::events::{AdlExecutedEvent, EventPayload, LiquidatedEvent};
use crate::margin::{clamp_liquidation_fee, MarginStatus};
use crate::oracle::PriceVector;
use crate::position::{capped_pnl, funding_fee, pnl, position_fee};
use crate::types::{AccountId, AssetId, Price, SubAccountId, Usd};
use rust_decimal::Decimal;

impl Venue {
    /// Liquidate an under-margined position. Filler-only.
    pub fn liquidate(
        &mut self,
        filler: AccountId,
        sub: SubAccountId,
        _profit_asset: AssetId,
        fill_price: Decimal,
        vector: &PriceVector,
    ) -> Result<LiquidationOutcome, VenueError> {
        if !self.is_filler(filler) {
            return Err(VenueError::Unauthorized);
        }
        let side = sub.side();
        let params = self.asset_params(sub.asset_id);
        let collateral_price = self.effective_price(sub.collateral_id, vector)?;
        let asset_price = self.effective_price(sub.asset_id, vector)?;
        let trading_price = Price::new(fill_price).ok_or(VenueError::InvalidPrice)?;

        let account = self.sub_account(sub);
        let position = account.position.clone().ok_or(VenueError::PositionNotOpen)?;

        let state = &self.asset_or_err(sub.asset_id)?.state;
        let funding_index = state.cumulative_funding(side);
        let funding_owed = funding_fee(&position, funding_index);

        // the gate prices the position at the reported asset price
        let status = MarginStatus::compute(
            account.collateral_value(collateral_price),
            pnl(side, position.entry_price, asset_price, position.size),
            funding_owed,
            position.size,
            asset_price,
            params.initial_margin_rate,
            params.maintenance_margin_rate,
        );
        if status.is_mm_safe() {
            return Err(VenueError::MarginSafe);
        }

        // settlement prices at the filler's trading price
        let realized = capped_pnl(
            side,
            position.entry_price,
            trading_price,
            position.size,
            params.adl_max_pnl_rate,
        );
        let margin_after_pnl = account.collateral_value(collateral_price).add(realized);
        let fee_formula = position_fee(trading_price, position.size, params.liquidation_fee_rate)
            .add(funding_owed);
        let fee = clamp_liquidation_fee(fee_formula, margin_after_pnl);
        let remain = margin_after_pnl.sub(fee).max_zero();

        let fee_tokens = fee.in_tokens(collateral_price);
        let remain_tokens = remain.in_tokens(collateral_price);

        // commit: pay the trader and the distributor, absorb the rest into spot
        let collateral_token = TokenId::Asset(sub.collateral_id);
        self.custody
            .transfer(Holder::Pool, Holder::User(sub.account), collateral_token, remain_tokens)?;
        if fee_tokens > Decimal::ZERO {
            self.distribute_fee(sub.account, sub.collateral_id, fee_tokens)?;
        }
        if let Some(asset) = self.registry.get_mut(sub.collateral_id) {
            asset.state.spot_liquidity += account.collateral - remain_tokens - fee_tokens;
        }
        if let Some(asset) = self.registry.get_mut(sub.asset_id) {
            asset.state.decrease_interest(side, position.size);
        }
        self.ledger.remove(&sub);

        self.emit(EventPayload::Liquidated(LiquidatedEvent {
            sub_account: sub,
            size: position.size,
            trading_price: trading_price.value(),
            fee,
            pnl: realized,
            returned_collateral: remain_tokens,
        }));

        Ok(LiquidationOutcome {
            sub_account: sub,
            pnl: realized,
            fee,
            returned_collateral: remain_tokens,
        })
    }

    /// Force-close a profitable position to keep the pool's aggregate
    /// liability inside the trigger bound. Bypasses limit-price and
    /// min-profit checks; profit stays capped. Filler-only.
    pub fn fill_adl_order(
        &mut self,
        filler: AccountId,
        sub: SubAccountId,
        amount: Decimal,
        profit_asset: AssetId,
        fill_price: Decimal,
        vector: &PriceVector,
    ) -> Result<CloseOutcome, VenueError> {
        if !self.is_filler(filler) {
            return Err(VenueError::Unauthorized);
        }
        if amount <= Decimal::ZERO {
            return Err(VenueError::ZeroSize);
        }
        let side = sub.side();
        let params = self.asset_params(sub.asset_id);
        let asset_price = self.effective_price(sub.asset_id, vector)?;
        let trading_price = Price::new(fill_price).ok_or(VenueError::InvalidPrice)?;

        let account = self.sub_account(sub);
        let position = account.position.clone().ok_or(VenueError::PositionNotOpen)?;

        // trigger: rate of return at the reported asset price must have
        // reached the configured bound
        let entry_notional = position.entry_price.value() * position.size;
        let unrealized = pnl(side, position.entry_price, asset_price, position.size);
        let trigger = Usd::new(entry_notional * params.adl_trigger_rate.value());
        if params.adl_trigger_rate.is_zero() || unrealized < trigger {
            return Err(VenueError::AdlNotAllowed);
        }

        let outcome = self.close_or_decrease(
            sub,
            amount.min(position.size),
            trading_price,
            vector,
            profit_asset,
            true,
            false,
            Decimal::ZERO,
        )?;

        self.emit(EventPayload::AdlExecuted(AdlExecutedEvent {
            sub_account: sub,
            size: amount.min(position.size),
            trading_price: trading_price.value(),
            pnl: outcome.realized_pnl,
        }));
        Ok(outcome)
    }
}
