// 12.3 engine/orders.rs: the order queue surface. placement validates the
// payload and escrows what the order will need; cancel refunds the escrow
// verbatim. owner cancels wait out the cancel cool-down, filler cancels wait
// for the order's own deadline. fills live in fills.rs.

use super::core::Venue;
use super::results::VenueError;
use crate::custody::{Holder, TokenId};
use crate::events::{CollateralEvent, EventPayload, OrderCanceledEvent, OrderPlacedEvent};
use crate::order::{
    LiquidityOrderPayload, Order, OrderKind, OrderPayload, PositionOrderFlags, PositionOrderPayload,
    WithdrawalOrderPayload,
};
use crate::types::{AccountId, OrderId, SubAccountId, Timestamp};
use rust_decimal::Decimal;

impl Venue {
    /// Queue a position order. Close orders carrying the tp/sl strategy flag
    /// do not enter the queue themselves: they expand into their take-profit
    /// and stop-loss legs immediately.
    pub fn place_position_order(
        &mut self,
        caller: AccountId,
        payload: PositionOrderPayload,
    ) -> Result<Vec<OrderId>, VenueError> {
        self.validate_position_payload(caller, &payload)?;

        if !payload.flags.is_open() && payload.flags.tp_sl_strategy() {
            // close + strategy: expand in place of a base order
            if payload.collateral != Decimal::ZERO {
                return Err(VenueError::CollateralRequiredZero);
            }
            if payload.tp_price <= Decimal::ZERO && payload.sl_price <= Decimal::ZERO {
                return Err(VenueError::InvalidFlags("tp/sl strategy without tp or sl price"));
            }
            return self.place_tpsl_children(caller, &payload);
        }

        if payload.flags.is_open() && payload.collateral > Decimal::ZERO {
            self.custody.transfer(
                Holder::User(caller),
                Holder::OrderBook,
                TokenId::Asset(payload.sub_account.collateral_id),
                payload.collateral,
            )?;
        }

        let id = self.push_order(caller, OrderPayload::Position(payload));
        Ok(vec![id])
    }

    pub fn place_liquidity_order(
        &mut self,
        caller: AccountId,
        payload: LiquidityOrderPayload,
    ) -> Result<OrderId, VenueError> {
        if payload.amount <= Decimal::ZERO {
            return Err(VenueError::ZeroAmount);
        }
        let asset = self.asset_or_err(payload.asset)?;
        if !asset.flags.can_hold_liquidity() || !asset.flags.is_enabled() {
            return Err(VenueError::UnsupportedAsset(payload.asset));
        }

        let token = if payload.is_adding {
            TokenId::Asset(payload.asset)
        } else {
            TokenId::PoolShares
        };
        self.custody
            .transfer(Holder::User(caller), Holder::OrderBook, token, payload.amount)?;

        Ok(self.push_order(caller, OrderPayload::Liquidity(payload)))
    }

    pub fn place_withdrawal_order(
        &mut self,
        caller: AccountId,
        payload: WithdrawalOrderPayload,
    ) -> Result<OrderId, VenueError> {
        if payload.amount <= Decimal::ZERO {
            return Err(VenueError::ZeroAmount);
        }
        if payload.sub_account.account != caller {
            return Err(VenueError::NotOwner);
        }
        self.asset_or_err(payload.sub_account.collateral_id)?;
        self.asset_or_err(payload.profit_asset)?;

        Ok(self.push_order(caller, OrderPayload::Withdrawal(payload)))
    }

    /// Cancel an active order. Owner cancels are gated by the cool-down so an
    /// order about to be economically filled cannot be sniped away; filler
    /// cancels are only for orders past their own deadline.
    pub fn cancel_order(&mut self, caller: AccountId, id: OrderId) -> Result<(), VenueError> {
        let order = self
            .orders
            .get(id)
            .filter(|o| o.is_active)
            .cloned()
            .ok_or(VenueError::OrderNotFound(id))?;

        let by_filler = if caller == order.owner {
            let cool_down = self.ob_params().cancel_cool_down;
            if self.current_time < order.placed_at.plus(cool_down) {
                return Err(VenueError::TooEarlyToCancel);
            }
            false
        } else if self.is_filler(caller) {
            if self.current_time <= self.cancel_deadline(&order) {
                return Err(VenueError::NotYetExpired);
            }
            true
        } else {
            return Err(VenueError::NotOwner);
        };

        self.refund_escrow(&order)?;
        self.orders.deactivate(id);
        self.emit(EventPayload::OrderCanceled(OrderCanceledEvent {
            order_id: id,
            owner: order.owner,
            by_filler,
        }));
        Ok(())
    }

    /// Immediate path: top up a subaccount's collateral without a queued order.
    pub fn deposit_collateral(
        &mut self,
        caller: AccountId,
        sub_account: SubAccountId,
        amount: Decimal,
    ) -> Result<(), VenueError> {
        if amount <= Decimal::ZERO {
            return Err(VenueError::ZeroAmount);
        }
        if sub_account.account != caller {
            return Err(VenueError::NotOwner);
        }
        let collateral = self.asset_or_err(sub_account.collateral_id)?;
        if !collateral.flags.is_stable() || !collateral.flags.is_enabled() {
            return Err(VenueError::UnsupportedAsset(sub_account.collateral_id));
        }

        self.custody.transfer(
            Holder::User(caller),
            Holder::Pool,
            TokenId::Asset(sub_account.collateral_id),
            amount,
        )?;
        self.ledger.entry(sub_account).or_default().collateral += amount;
        self.emit(EventPayload::CollateralDeposited(CollateralEvent {
            sub_account,
            amount,
        }));
        Ok(())
    }

    /// Immediate path: pull all collateral out of a flat subaccount.
    pub fn withdraw_all_collateral(
        &mut self,
        caller: AccountId,
        sub_account: SubAccountId,
    ) -> Result<Decimal, VenueError> {
        if sub_account.account != caller {
            return Err(VenueError::NotOwner);
        }
        let account = self.ledger.get(&sub_account).cloned().unwrap_or_default();
        if account.position.is_some() {
            return Err(VenueError::PositionNotEmpty);
        }
        let amount = account.collateral;
        self.custody.transfer(
            Holder::Pool,
            Holder::User(caller),
            TokenId::Asset(sub_account.collateral_id),
            amount,
        )?;
        self.ledger.remove(&sub_account);
        self.emit(EventPayload::CollateralWithdrawn(CollateralEvent {
            sub_account,
            amount,
        }));
        Ok(amount)
    }

    // --- internals --------------------------------------------------------

    fn validate_position_payload(
        &self,
        caller: AccountId,
        payload: &PositionOrderPayload,
    ) -> Result<(), VenueError> {
        let sub = payload.sub_account;
        if sub.account != caller {
            return Err(VenueError::NotOwner);
        }
        if payload.size <= Decimal::ZERO {
            return Err(VenueError::ZeroSize);
        }
        if payload.collateral < Decimal::ZERO {
            return Err(VenueError::ZeroAmount);
        }

        let asset = self.asset_or_err(sub.asset_id)?;
        if !asset.flags.is_tradable() || !asset.flags.is_enabled() {
            return Err(VenueError::UnsupportedAsset(sub.asset_id));
        }
        let collateral = self.asset_or_err(sub.collateral_id)?;
        if !collateral.flags.is_stable() || !collateral.flags.is_enabled() {
            return Err(VenueError::UnsupportedAsset(sub.collateral_id));
        }

        let params = self.asset_params(sub.asset_id);
        if params.lot_size > Decimal::ZERO && !(payload.size % params.lot_size).is_zero() {
            return Err(VenueError::LotSize {
                size: payload.size,
                lot_size: params.lot_size,
            });
        }

        let flags = payload.flags;
        if flags.is_auto_deleverage() {
            return Err(VenueError::InvalidFlags("auto-deleverage orders are filler-internal"));
        }
        if flags.is_open() {
            if !asset.flags.is_openable() {
                return Err(VenueError::UnsupportedAsset(sub.asset_id));
            }
            if !sub.is_long && !asset.flags.is_shortable() {
                return Err(VenueError::UnsupportedAsset(sub.asset_id));
            }
            if flags.is_trigger() {
                return Err(VenueError::InvalidFlags("trigger flag on an open order"));
            }
            if flags.should_reach_min_profit() {
                return Err(VenueError::InvalidFlags("min-profit flag on an open order"));
            }
        } else if flags.should_reach_min_profit() && params.min_profit_time == 0 {
            return Err(VenueError::MinProfitNotConfigured);
        }
        Ok(())
    }

    /// Expand a tp/sl strategy into its close-order legs. Shared by
    /// close-order placement and by open-order fills.
    pub(super) fn place_tpsl_children(
        &mut self,
        owner: AccountId,
        base: &PositionOrderPayload,
    ) -> Result<Vec<OrderId>, VenueError> {
        let min_profit_configured = self.asset_params(base.sub_account.asset_id).min_profit_time > 0;
        let mut ids = Vec::new();

        if base.tp_price > Decimal::ZERO {
            let mut flags = PositionOrderFlags::WITHDRAW_ALL_IF_EMPTY;
            if min_profit_configured {
                flags |= PositionOrderFlags::SHOULD_REACH_MIN_PROFIT;
            }
            ids.push(self.push_order(
                owner,
                OrderPayload::Position(PositionOrderPayload {
                    sub_account: base.sub_account,
                    collateral: Decimal::ZERO,
                    size: base.size,
                    limit_price: base.tp_price,
                    tp_price: Decimal::ZERO,
                    sl_price: Decimal::ZERO,
                    expiration: base.tpsl_expiration,
                    tpsl_expiration: Timestamp::from_secs(0),
                    profit_asset: base.tpsl_profit_asset,
                    tpsl_profit_asset: crate::types::AssetId(0),
                    flags: PositionOrderFlags::new(flags),
                }),
            ));
        }
        if base.sl_price > Decimal::ZERO {
            ids.push(self.push_order(
                owner,
                OrderPayload::Position(PositionOrderPayload {
                    sub_account: base.sub_account,
                    collateral: Decimal::ZERO,
                    size: base.size,
                    limit_price: base.sl_price,
                    tp_price: Decimal::ZERO,
                    sl_price: Decimal::ZERO,
                    expiration: base.tpsl_expiration,
                    tpsl_expiration: Timestamp::from_secs(0),
                    profit_asset: base.tpsl_profit_asset,
                    tpsl_profit_asset: crate::types::AssetId(0),
                    flags: PositionOrderFlags::new(
                        PositionOrderFlags::WITHDRAW_ALL_IF_EMPTY | PositionOrderFlags::TRIGGER_ORDER,
                    ),
                }),
            ));
        }
        Ok(ids)
    }

    fn push_order(&mut self, owner: AccountId, payload: OrderPayload) -> OrderId {
        let now = self.current_time;
        let id = self.orders.push(owner, payload.clone(), now);
        self.emit(EventPayload::OrderPlaced(OrderPlacedEvent {
            order_id: id,
            owner,
            payload,
        }));
        id
    }

    /// After this moment the filler may cancel the order.
    pub(super) fn cancel_deadline(&self, order: &Order) -> Timestamp {
        let ob = self.ob_params();
        match &order.payload {
            OrderPayload::Position(p) => {
                let timeout = if p.flags.is_market() {
                    ob.market_order_timeout
                } else {
                    ob.limit_order_timeout
                };
                order.placed_at.plus(timeout)
            }
            OrderPayload::Withdrawal(_) => order.placed_at.plus(ob.market_order_timeout),
            OrderPayload::Liquidity(_) => order.placed_at.plus(ob.liquidity_lock_period),
        }
    }

    /// After this moment the order can no longer fill.
    pub(super) fn fill_deadline(&self, order: &Order) -> Option<Timestamp> {
        match &order.payload {
            OrderPayload::Position(p) => {
                let book = self.cancel_deadline(order);
                if p.expiration.as_secs() > 0 {
                    Some(book.min(p.expiration))
                } else {
                    Some(book)
                }
            }
            OrderPayload::Withdrawal(_) => Some(self.cancel_deadline(order)),
            OrderPayload::Liquidity(_) => None,
        }
    }

    fn refund_escrow(&mut self, order: &Order) -> Result<(), VenueError> {
        let owner = Holder::User(order.owner);
        match &order.payload {
            OrderPayload::Position(p) => {
                if p.flags.is_open() && p.collateral > Decimal::ZERO {
                    self.custody.transfer(
                        Holder::OrderBook,
                        owner,
                        TokenId::Asset(p.sub_account.collateral_id),
                        p.collateral,
                    )?;
                }
            }
            OrderPayload::Liquidity(p) => {
                let token = if p.is_adding {
                    TokenId::Asset(p.asset)
                } else {
                    TokenId::PoolShares
                };
                self.custody.transfer(Holder::OrderBook, owner, token, p.amount)?;
            }
            OrderPayload::Withdrawal(_) => {}
        }
        Ok(())
    }

    pub(super) fn take_active_order(&mut self, id: OrderId, kind: OrderKind) -> Result<Order, VenueError> {
        let order = self
            .orders
            .get(id)
            .filter(|o| o.is_active && o.payload.kind() == kind)
            .cloned()
            .ok_or(VenueError::OrderNotFound(id))?;
        Ok(order)
    }
}
