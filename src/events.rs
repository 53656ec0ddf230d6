// 11.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying off-engine observers (the filler watches
// OrderPlaced to know what to execute). the EventPayload enum lists all types.

use crate::order::OrderPayload;
use crate::types::{AccountId, AssetId, OrderId, Rate, SubAccountId, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // order lifecycle
    OrderPlaced(OrderPlacedEvent),
    OrderCanceled(OrderCanceledEvent),
    OrderFilled(OrderFilledEvent),

    // position ledger
    PositionOpened(PositionOpenedEvent),
    PositionClosed(PositionClosedEvent),
    Liquidated(LiquidatedEvent),
    AdlExecuted(AdlExecutedEvent),
    CollateralDeposited(CollateralEvent),
    CollateralWithdrawn(CollateralEvent),

    // pool
    LiquidityAdded(LiquidityEvent),
    LiquidityRemoved(LiquidityEvent),
    FundingUpdated(FundingUpdatedEvent),
    FeeDistributed(FeeDistributedEvent),
}

/// Carries the full payload so off-engine observers can reconstruct the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order_id: OrderId,
    pub owner: AccountId,
    pub payload: OrderPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCanceledEvent {
    pub order_id: OrderId,
    pub owner: AccountId,
    pub by_filler: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFilledEvent {
    pub order_id: OrderId,
    pub owner: AccountId,
    pub fill_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub sub_account: SubAccountId,
    pub size: Decimal,
    pub trading_price: Decimal,
    pub entry_price: Decimal,
    pub fee: Usd,
    pub remaining_collateral: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub sub_account: SubAccountId,
    pub size: Decimal,
    pub trading_price: Decimal,
    pub fee: Usd,
    pub pnl: Usd,
    pub remaining_size: Decimal,
    pub remaining_collateral: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidatedEvent {
    pub sub_account: SubAccountId,
    pub size: Decimal,
    pub trading_price: Decimal,
    pub fee: Usd,
    pub pnl: Usd,
    pub returned_collateral: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdlExecutedEvent {
    pub sub_account: SubAccountId,
    pub size: Decimal,
    pub trading_price: Decimal,
    pub pnl: Usd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralEvent {
    pub sub_account: SubAccountId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityEvent {
    pub account: AccountId,
    pub asset: AssetId,
    pub token_amount: Decimal,
    pub share_amount: Decimal,
    pub share_price: Decimal,
    pub fee_tokens: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingUpdatedEvent {
    pub asset: AssetId,
    pub funding_apy: Rate,
    pub borrowing_apy: Rate,
    pub longs_pay: bool,
    pub long_cumulative_funding: Decimal,
    pub short_cumulative_funding: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeDistributedEvent {
    pub payer: AccountId,
    pub asset: AssetId,
    pub to_pool: Decimal,
    pub to_pol: Decimal,
    pub to_reward: Decimal,
    pub to_payer: Decimal,
    pub to_referrer: Decimal,
}

/// Bounded in-engine event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            max_events,
        }
    }

    pub fn emit(&mut self, timestamp: Timestamp, payload: EventPayload) {
        let event = Event {
            id: EventId(self.next_id),
            timestamp,
            payload,
        };
        self.next_id += 1;
        self.events.push(event);
        if self.events.len() > self.max_events {
            let drain = self.events.len() - self.max_events;
            self.events.drain(0..drain);
        }
    }

    pub fn all(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }
}
