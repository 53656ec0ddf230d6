// 12.5 engine/fills.rs: filler-only execution of queued orders. a fill
// validates the order-specific constraints (expiry, limit semantics, fill
// amount), delegates settlement to the ledger or pool, and only then marks
// the order terminal. a failed settlement leaves the order in the queue.

use super::core::Venue;
use super::results::{CloseOutcome, LiquidityOutcome, OpenOutcome, VenueError};
use crate::events::{EventPayload, OrderFilledEvent};
use crate::oracle::PriceVector;
use crate::order::{OrderKind, OrderPayload, PositionOrderPayload};
use crate::types::{AccountId, OrderId, Price};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub enum PositionFillOutcome {
    Opened(OpenOutcome),
    Closed(CloseOutcome),
}

impl Venue {
    /// Execute a queued position order at the filler's reported price.
    pub fn fill_position_order(
        &mut self,
        filler: AccountId,
        id: OrderId,
        amount: Decimal,
        fill_price: Decimal,
        vector: &PriceVector,
    ) -> Result<PositionFillOutcome, VenueError> {
        if !self.is_filler(filler) {
            return Err(VenueError::Unauthorized);
        }
        let order = self.take_active_order(id, OrderKind::Position)?;
        let OrderPayload::Position(payload) = order.payload.clone() else {
            return Err(VenueError::OrderNotFound(id));
        };

        if amount <= Decimal::ZERO || amount > payload.size {
            return Err(VenueError::FillExceedsOrder);
        }
        if let Some(deadline) = self.fill_deadline(&order) {
            if self.current_time > deadline {
                return Err(VenueError::OrderExpired);
            }
        }
        let fill_price = Price::new(fill_price).ok_or(VenueError::InvalidPrice)?;
        check_limit(&payload, fill_price)?;

        let outcome = if payload.flags.is_open() {
            let opened = self.open_or_increase(
                payload.sub_account,
                amount,
                payload.collateral,
                fill_price,
                vector,
            )?;
            // auto-derive the tp/sl close legs inside the same unit of work
            if payload.flags.tp_sl_strategy() {
                self.place_tpsl_children(order.owner, &payload)?;
            }
            PositionFillOutcome::Opened(opened)
        } else {
            let closed = self.close_or_decrease(
                payload.sub_account,
                amount,
                fill_price,
                vector,
                payload.profit_asset,
                payload.flags.withdraw_all_if_empty(),
                payload.flags.should_reach_min_profit(),
                payload.collateral,
            )?;
            PositionFillOutcome::Closed(closed)
        };

        self.orders.deactivate(id);
        self.emit(EventPayload::OrderFilled(OrderFilledEvent {
            order_id: id,
            owner: order.owner,
            fill_price: fill_price.value(),
        }));
        Ok(outcome)
    }

    /// Execute a queued liquidity order once its lock period has elapsed.
    pub fn fill_liquidity_order(
        &mut self,
        filler: AccountId,
        id: OrderId,
        vector: &PriceVector,
    ) -> Result<LiquidityOutcome, VenueError> {
        if !self.is_filler(filler) {
            return Err(VenueError::Unauthorized);
        }
        let order = self.take_active_order(id, OrderKind::Liquidity)?;
        let OrderPayload::Liquidity(payload) = order.payload.clone() else {
            return Err(VenueError::OrderNotFound(id));
        };

        let lock = self.ob_params().liquidity_lock_period;
        if self.current_time < order.placed_at.plus(lock) {
            return Err(VenueError::LiquidityLocked);
        }

        let outcome = if payload.is_adding {
            self.add_liquidity(order.owner, payload.asset, payload.amount, vector)?
        } else {
            self.remove_liquidity(order.owner, payload.asset, payload.amount, vector)?
        };

        self.orders.deactivate(id);
        self.emit(EventPayload::OrderFilled(OrderFilledEvent {
            order_id: id,
            owner: order.owner,
            fill_price: outcome.share_price,
        }));
        Ok(outcome)
    }

    /// Execute a queued collateral withdrawal.
    pub fn fill_withdrawal_order(
        &mut self,
        filler: AccountId,
        id: OrderId,
        vector: &PriceVector,
    ) -> Result<(), VenueError> {
        if !self.is_filler(filler) {
            return Err(VenueError::Unauthorized);
        }
        let order = self.take_active_order(id, OrderKind::Withdrawal)?;
        let OrderPayload::Withdrawal(payload) = order.payload.clone() else {
            return Err(VenueError::OrderNotFound(id));
        };

        if let Some(deadline) = self.fill_deadline(&order) {
            if self.current_time > deadline {
                return Err(VenueError::OrderExpired);
            }
        }

        self.withdraw_collateral(
            payload.sub_account,
            payload.amount,
            payload.profit_asset,
            payload.is_profit,
            vector,
        )?;

        self.orders.deactivate(id);
        self.emit(EventPayload::OrderFilled(OrderFilledEvent {
            order_id: id,
            owner: order.owner,
            fill_price: Decimal::ZERO,
        }));
        Ok(())
    }
}

// limit semantics. buy-side fills (open long, close short) want at-or-below
// the limit, sell-side fills want at-or-above; trigger orders fire through
// the level instead, so the comparison inverts. market orders skip all of it.
fn check_limit(payload: &PositionOrderPayload, fill: Price) -> Result<(), VenueError> {
    if payload.flags.is_market() {
        return Ok(());
    }
    let Some(limit) = payload.limit() else {
        return Ok(());
    };
    let buy_side = payload.flags.is_open() == payload.sub_account.is_long;
    let ok = if payload.flags.is_trigger() {
        // stop orders: a long close triggers at-or-below, a short close at-or-above
        if buy_side {
            fill >= limit
        } else {
            fill <= limit
        }
    } else if buy_side {
        fill <= limit
    } else {
        fill >= limit
    };
    if ok {
        Ok(())
    } else {
        Err(VenueError::PriceNotMet {
            limit: limit.value(),
            fill: fill.value(),
        })
    }
}
