// 6.0: per-subaccount margin state and the pnl/funding math that prices it.
// collateral is held in collateral-token units; pnl, fees and margin
// thresholds are USD. the entry fields exist only while size > 0, so a flat
// subaccount cannot carry stale entry state by construction.

use crate::types::{Price, Rate, Side, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The open part of a subaccount. Exists only while size > 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub size: Decimal,
    pub entry_price: Price,
    /// cumulative funding index of the asset/direction at the last settlement
    pub entry_funding: Decimal,
    pub last_increased_at: Timestamp,
}

/// A subaccount: free collateral plus an optional open position. Created
/// implicitly on first deposit, removed from the ledger once both are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAccount {
    /// collateral-token units
    pub collateral: Decimal,
    pub position: Option<OpenPosition>,
}

impl SubAccount {
    pub fn size(&self) -> Decimal {
        self.position.as_ref().map(|p| p.size).unwrap_or(Decimal::ZERO)
    }

    pub fn entry_price(&self) -> Decimal {
        self.position
            .as_ref()
            .map(|p| p.entry_price.value())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn entry_funding(&self) -> Decimal {
        self.position.as_ref().map(|p| p.entry_funding).unwrap_or(Decimal::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.collateral.is_zero() && self.position.is_none()
    }

    pub fn collateral_value(&self, collateral_price: Price) -> Usd {
        Usd::new(self.collateral * collateral_price.value())
    }
}

// 6.1: pnl of `size` units between entry and the given price, signed by direction.
pub fn pnl(side: Side, entry_price: Price, price: Price, size: Decimal) -> Usd {
    Usd::new(side.sign() * (price.value() - entry_price.value()) * size)
}

// 6.2: profit cap. realized profit on a close never exceeds a configured
// fraction of the closed portion's entry notional; losses pass through
// untouched. protects the pool from a single outlier price report.
pub fn capped_pnl(
    side: Side,
    entry_price: Price,
    price: Price,
    size: Decimal,
    max_profit_rate: Rate,
) -> Usd {
    let raw = pnl(side, entry_price, price, size);
    if !raw.is_positive() {
        return raw;
    }
    let cap = Usd::new(entry_price.value() * size * max_profit_rate.value());
    raw.min(cap)
}

// 6.3: funding owed since the position's entry-funding snapshot. charged on
// the full position size at entry price, per the venue's funding convention.
pub fn funding_fee(position: &OpenPosition, current_funding: Decimal) -> Usd {
    let delta = current_funding - position.entry_funding;
    Usd::new(position.entry_price.value() * position.size * delta)
}

// 6.4: position fee on a fill.
pub fn position_fee(price: Price, size: Decimal, fee_rate: Rate) -> Usd {
    Usd::new(price.value() * size * fee_rate.value())
}

// 6.5: size-weighted entry price after increasing a position.
pub fn averaged_entry(old_size: Decimal, old_entry: Decimal, add_size: Decimal, fill: Price) -> Price {
    let new_size = old_size + add_size;
    debug_assert!(new_size > Decimal::ZERO);
    Price::new_unchecked((old_size * old_entry + add_size * fill.value()) / new_size)
}

// 6.6: rate of return of a realized pnl against the closed entry notional.
// used by the min-profit gate.
pub fn profit_rate(entry_price: Price, size: Decimal, realized: Usd) -> Decimal {
    let notional = entry_price.value() * size;
    if notional.is_zero() {
        Decimal::ZERO
    } else {
        realized.value() / notional
    }
}
