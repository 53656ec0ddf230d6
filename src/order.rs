// 5.0: order queue data model. orders are append-only by id; cancel and fill
// are the only mutations and both just clear the active flag. two indices are
// kept over the active set (all orders, orders per owner) and must never
// disagree with the flag.

use crate::types::{AccountId, AssetId, OrderId, Price, SubAccountId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// 5.1: flag bits of a position order. fixed combinations only; place() rejects
// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionOrderFlags(pub u8);

impl PositionOrderFlags {
    /// open/increase; without it the order closes/decreases
    pub const OPEN_POSITION: u8 = 0x80;
    /// ignore the limit price, fill at the reported price
    pub const MARKET_ORDER: u8 = 0x40;
    /// transfer all remaining collateral to the owner if the fill flattens the position
    pub const WITHDRAW_ALL_IF_EMPTY: u8 = 0x20;
    /// trigger (stop) semantics: fires through the limit instead of at-or-better
    pub const TRIGGER_ORDER: u8 = 0x10;
    /// on open orders: auto-place tp/sl close orders when this order fills
    pub const TP_SL_STRATEGY: u8 = 0x08;
    /// close must reach min profit rate unless min profit time has elapsed
    pub const SHOULD_REACH_MIN_PROFIT: u8 = 0x04;
    /// marks a forced deleveraging close; never placeable by traders
    pub const AUTO_DELEVERAGE: u8 = 0x02;

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn has(&self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn is_open(&self) -> bool {
        self.has(Self::OPEN_POSITION)
    }

    pub fn is_market(&self) -> bool {
        self.has(Self::MARKET_ORDER)
    }

    pub fn is_trigger(&self) -> bool {
        self.has(Self::TRIGGER_ORDER)
    }

    pub fn withdraw_all_if_empty(&self) -> bool {
        self.has(Self::WITHDRAW_ALL_IF_EMPTY)
    }

    pub fn tp_sl_strategy(&self) -> bool {
        self.has(Self::TP_SL_STRATEGY)
    }

    pub fn should_reach_min_profit(&self) -> bool {
        self.has(Self::SHOULD_REACH_MIN_PROFIT)
    }

    pub fn is_auto_deleverage(&self) -> bool {
        self.has(Self::AUTO_DELEVERAGE)
    }
}

// 5.2: kind-specific payloads. fixed-width on the wire in the original venue;
// typed structs here, serialized with serde when exported.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionOrderPayload {
    pub sub_account: SubAccountId,
    /// open: collateral tokens escrowed into the position on fill.
    /// close: collateral tokens withdrawn from the position after the fill.
    pub collateral: Decimal,
    pub size: Decimal,
    pub limit_price: Decimal,
    pub tp_price: Decimal,
    pub sl_price: Decimal,
    pub expiration: Timestamp,
    pub tpsl_expiration: Timestamp,
    pub profit_asset: AssetId,
    pub tpsl_profit_asset: AssetId,
    pub flags: PositionOrderFlags,
}

impl PositionOrderPayload {
    pub fn limit(&self) -> Option<Price> {
        Price::new(self.limit_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityOrderPayload {
    pub asset: AssetId,
    pub amount: Decimal,
    pub is_adding: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalOrderPayload {
    pub sub_account: SubAccountId,
    pub amount: Decimal,
    pub profit_asset: AssetId,
    pub is_profit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderPayload {
    Position(PositionOrderPayload),
    Liquidity(LiquidityOrderPayload),
    Withdrawal(WithdrawalOrderPayload),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Position,
    Liquidity,
    Withdrawal,
}

impl OrderPayload {
    pub fn kind(&self) -> OrderKind {
        match self {
            OrderPayload::Position(_) => OrderKind::Position,
            OrderPayload::Liquidity(_) => OrderKind::Liquidity,
            OrderPayload::Withdrawal(_) => OrderKind::Withdrawal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: AccountId,
    pub payload: OrderPayload,
    pub placed_at: Timestamp,
    pub is_active: bool,
}

// 5.3: the queue. BTreeMap keeps listings in stable ascending-id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderList {
    orders: BTreeMap<OrderId, Order>,
    next_id: u64,
}

impl OrderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, owner: AccountId, payload: OrderPayload, now: Timestamp) -> OrderId {
        let id = OrderId(self.next_id);
        self.next_id += 1;
        self.orders.insert(
            id,
            Order {
                id,
                owner,
                payload,
                placed_at: now,
                is_active: true,
            },
        );
        id
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Flip an active order to inactive. Returns the order as it was while
    /// active; None if unknown or already terminal.
    pub fn deactivate(&mut self, id: OrderId) -> Option<Order> {
        let order = self.orders.get_mut(&id)?;
        if !order.is_active {
            return None;
        }
        order.is_active = false;
        Some(order.clone())
    }

    pub fn active_count(&self) -> usize {
        self.orders.values().filter(|o| o.is_active).count()
    }

    pub fn list(&self, offset: usize, count: usize) -> Vec<&Order> {
        self.orders
            .values()
            .filter(|o| o.is_active)
            .skip(offset)
            .take(count)
            .collect()
    }

    pub fn list_of(&self, owner: AccountId, offset: usize, count: usize) -> Vec<&Order> {
        self.orders
            .values()
            .filter(|o| o.is_active && o.owner == owner)
            .skip(offset)
            .take(count)
            .collect()
    }
}
