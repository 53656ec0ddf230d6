// 12.7 engine/funding.rs: advances the cumulative funding/borrowing indices
// for every tradable asset. callable by anyone; idempotent within a funding
// interval. moves no value by itself, only the index positions settle against.

use super::core::Venue;
use crate::events::{EventPayload, FundingUpdatedEvent};
use crate::funding::{accrual_window, accrue, funding_rate};
use crate::types::AssetId;

impl Venue {
    /// Accrue funding for all tradable assets up to the venue's current time.
    pub fn update_funding_state(&mut self) {
        let interval = self.pool_params().funding_interval;
        let borrowing = self.pool_params().borrowing_rate_apy;
        let now = self.current_time;

        let ids: Vec<AssetId> = self
            .registry
            .iter()
            .filter(|a| a.flags.is_tradable())
            .map(|a| a.id)
            .collect();

        for id in ids {
            let params = self.asset_params(id);
            let Some(asset) = self.registry.get(id) else { continue };
            let Some((epoch, years)) = accrual_window(asset.state.last_funding_time, now, interval)
            else {
                continue;
            };

            let rates = funding_rate(
                asset.state.skew(),
                params.funding_alpha,
                params.funding_beta_apy,
                borrowing,
            );
            let deltas = accrue(&rates, years);

            let Some(asset) = self.registry.get_mut(id) else { continue };
            asset.state.long_cumulative_funding += deltas.long;
            asset.state.short_cumulative_funding += deltas.short;
            asset.state.last_funding_time = epoch;
            let long_cumulative_funding = asset.state.long_cumulative_funding;
            let short_cumulative_funding = asset.state.short_cumulative_funding;

            self.emit(EventPayload::FundingUpdated(FundingUpdatedEvent {
                asset: id,
                funding_apy: rates.funding_apy,
                borrowing_apy: rates.borrowing_apy,
                longs_pay: rates.longs_pay,
                long_cumulative_funding,
                short_cumulative_funding,
            }));
        }
    }
}
