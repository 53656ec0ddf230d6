// 4.0: price inputs. the filler ships a per-asset price vector with every fill,
// liquidation and funding call. the engine never fetches prices itself; it only
// enforces numeric bounds and the strict-stable dampener.

use crate::asset::Asset;
use crate::engine::results::VenueError;
use crate::types::{AssetId, Price, Rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Prices reported by the filler, indexed by asset id. Covers at least the
/// collateral, underlying and profit assets of the operation being filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceVector(Vec<Decimal>);

impl PriceVector {
    pub fn new(prices: Vec<Decimal>) -> Result<Self, VenueError> {
        if prices.iter().any(|p| *p <= Decimal::ZERO) {
            return Err(VenueError::InvalidPrice);
        }
        Ok(Self(prices))
    }

    pub fn get(&self, asset: AssetId) -> Result<Price, VenueError> {
        self.0
            .get(asset.0 as usize)
            .copied()
            .and_then(Price::new)
            .ok_or(VenueError::InvalidPrice)
    }
}

/// Reference price for a stable-pegged asset, fed by an external oracle.
/// Holds the latest observation only; staleness policing is the feeder's job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReferenceOracle {
    pub price: Price,
}

// 4.1: strict-stable dampener. while the reference oracle agrees the peg holds
// (deviation from 1.0 inside the configured band), the asset is worth exactly
// 1.0 no matter what the filler reported. once the reference itself has
// drifted out of the band, the filler price is trusted as-is.
pub fn dampened_price(
    asset: &Asset,
    reference: Option<&ReferenceOracle>,
    reported: Price,
    deviation: Rate,
) -> Price {
    if !asset.flags.is_strict_stable() {
        return reported;
    }
    let Some(oracle) = reference else {
        return reported;
    };
    let drift = (oracle.price.value() - dec!(1)).abs();
    if drift < deviation.value() {
        Price::new_unchecked(dec!(1))
    } else {
        reported
    }
}
