// 9.0: custody. a narrow deposit/withdraw/transfer/mint/burn ledger over
// fungible balances. the engine moves every escrow, payout and fee through
// here so that token balances and accounting totals change together. token
// metadata is never inspected beyond the registered decimal count.

use crate::types::{AccountId, AssetId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Who holds a balance inside the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holder {
    User(AccountId),
    /// escrow for queued orders
    OrderBook,
    /// the liquidity pool itself (spot liquidity + trader collateral)
    Pool,
    /// protocol-owned-liquidity vault, receives its fee share
    PolVault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenId {
    Asset(AssetId),
    PoolShares,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CustodyError {
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Custody {
    balances: HashMap<(Holder, TokenId), Decimal>,
    share_supply: Decimal,
}

impl Custody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, holder: Holder, token: TokenId) -> Decimal {
        self.balances.get(&(holder, token)).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn share_supply(&self) -> Decimal {
        self.share_supply
    }

    /// External deposit into the venue (tokens arriving from outside).
    pub fn credit(&mut self, holder: Holder, token: TokenId, amount: Decimal) {
        debug_assert!(amount >= Decimal::ZERO);
        *self.balances.entry((holder, token)).or_insert(Decimal::ZERO) += amount;
    }

    pub fn transfer(
        &mut self,
        from: Holder,
        to: Holder,
        token: TokenId,
        amount: Decimal,
    ) -> Result<(), CustodyError> {
        if amount < Decimal::ZERO {
            return Err(CustodyError::NonPositiveAmount(amount));
        }
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance(from, token);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        *self.balances.entry((from, token)).or_insert(Decimal::ZERO) -= amount;
        *self.balances.entry((to, token)).or_insert(Decimal::ZERO) += amount;
        Ok(())
    }

    /// Mint pool shares to a holder, growing supply.
    pub fn mint_shares(&mut self, to: Holder, amount: Decimal) {
        debug_assert!(amount >= Decimal::ZERO);
        self.credit(to, TokenId::PoolShares, amount);
        self.share_supply += amount;
    }

    /// Burn pool shares held by a holder, shrinking supply.
    pub fn burn_shares(&mut self, from: Holder, amount: Decimal) -> Result<(), CustodyError> {
        if amount < Decimal::ZERO {
            return Err(CustodyError::NonPositiveAmount(amount));
        }
        let available = self.balance(from, TokenId::PoolShares);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        *self
            .balances
            .entry((from, TokenId::PoolShares))
            .or_insert(Decimal::ZERO) -= amount;
        self.share_supply -= amount;
        Ok(())
    }
}
