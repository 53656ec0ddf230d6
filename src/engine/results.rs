// 12.1: result payloads and the error taxonomy. validation and authorization
// failures reject before any state change; timing and economic failures are
// expected under normal operation and must leave state untouched; invariant
// breaches are clamped in the math layer instead of surfacing here.

use crate::custody::CustodyError;
use crate::types::{AssetId, OrderId, SubAccountId, Usd};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct OpenOutcome {
    pub sub_account: SubAccountId,
    pub entry_price: Decimal,
    pub fee: Usd,
    pub remaining_collateral: Decimal,
}

#[derive(Debug, Clone)]
pub struct CloseOutcome {
    pub sub_account: SubAccountId,
    pub realized_pnl: Usd,
    pub fee: Usd,
    pub remaining_size: Decimal,
    pub remaining_collateral: Decimal,
    pub paid_out: Decimal,
}

#[derive(Debug, Clone)]
pub struct LiquidationOutcome {
    pub sub_account: SubAccountId,
    pub pnl: Usd,
    pub fee: Usd,
    pub returned_collateral: Decimal,
}

#[derive(Debug, Clone)]
pub struct LiquidityOutcome {
    pub asset: AssetId,
    pub token_amount: Decimal,
    pub share_amount: Decimal,
    pub share_price: Decimal,
    pub fee_tokens: Decimal,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VenueError {
    // validation: malformed request, rejected before any state change
    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("size must be non-zero")]
    ZeroSize,

    #[error("size {size} is not a multiple of lot size {lot_size}")]
    LotSize { size: Decimal, lot_size: Decimal },

    #[error("flag combination not allowed: {0}")]
    InvalidFlags(&'static str),

    #[error("close order with tp/sl strategy must carry zero collateral")]
    CollateralRequiredZero,

    #[error("asset {0:?} not registered")]
    AssetNotFound(AssetId),

    #[error("asset {0:?} not usable in this role")]
    UnsupportedAsset(AssetId),

    #[error("price report out of bounds")]
    InvalidPrice,

    #[error("min-profit flag requires a configured min profit time")]
    MinProfitNotConfigured,

    // authorization
    #[error("caller does not own this order or subaccount")]
    NotOwner,

    #[error("caller lacks the filler role")]
    Unauthorized,

    // timing
    #[error("cancel cool-down has not elapsed")]
    TooEarlyToCancel,

    #[error("order has not expired yet")]
    NotYetExpired,

    #[error("order expired")]
    OrderExpired,

    #[error("liquidity order is still in its lock period")]
    LiquidityLocked,

    // economic: expected, frequent, never corrupting
    #[error("fill price {fill} does not satisfy limit {limit}")]
    PriceNotMet { limit: Decimal, fill: Decimal },

    #[error("fill amount exceeds order size")]
    FillExceedsOrder,

    #[error("margin below initial requirement")]
    InsufficientMargin,

    #[error("position is still maintenance-margin safe")]
    MarginSafe,

    #[error("open interest reserve exceeds spot liquidity")]
    InsufficientReserve,

    #[error("auto-deleverage trigger condition does not hold")]
    AdlNotAllowed,

    #[error("close does not meet the minimum profit condition")]
    ProfitConditionNotMet,

    #[error("liquidity cap exceeded")]
    LiquidityCapExceeded,

    #[error("subaccount still has an open position")]
    PositionNotEmpty,

    #[error("subaccount has no open position")]
    PositionNotOpen,

    #[error("aggregate position size limit exceeded")]
    MaxPositionExceeded,

    #[error("insufficient pool liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Decimal, available: Decimal },

    #[error("insufficient collateral for withdrawal of {0}")]
    InsufficientCollateral(Decimal),

    #[error("order {0:?} not found or no longer active")]
    OrderNotFound(OrderId),

    #[error("custody error: {0}")]
    Custody(#[from] CustodyError),
}
