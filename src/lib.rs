// venue-core: pool-backed leveraged trading venue.
// accounting-first architecture: margin math, funding accrual and
// liquidation safety take priority. all computation is deterministic with
// no external I/O; an outside sequencer feeds one serialized stream of
// instructions and price reports.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, AccountId, Side, Price, Usd, SubAccountId
//   2.x  config.rs: hashed-key parameter store, typed views
//   3.x  asset.rs: asset flags + running totals (spot liquidity, OI, funding)
//   4.x  oracle.rs: price report vector, strict-stable dampener
//   5.x  order.rs: order payloads, flag bitmask, active/per-owner indices
//   6.x  position.rs: subaccount state, capped pnl, funding fee math
//   7.x  funding.rs: borrowing + skew funding accrual
//   8.x  margin.rs: IM/MM checks, reserve invariant, fee clamping
//   9.x  custody.rs: deposit/withdraw/mint/burn balance ledger
//   10.x fees.rs: referral-aware fee splitting, reward accrual
//   11.x events.rs: state transition events for audit
//   12.x engine/: the venue: orders, fills, positions, liquidations, pool

// domain math and data model
pub mod asset;
pub mod config;
pub mod custody;
pub mod fees;
pub mod funding;
pub mod margin;
pub mod oracle;
pub mod order;
pub mod position;
pub mod types;

// integration modules
pub mod events;

// the stateful engine
pub mod engine;

// re exports for convenience
pub use asset::*;
pub use config::{AssetParams, ConfigKey, ConfigStore, OrderBookParams, PoolParams};
pub use custody::{Custody, CustodyError, Holder, TokenId};
pub use engine::fills::PositionFillOutcome;
pub use engine::*;
pub use events::*;
pub use fees::*;
pub use funding::*;
pub use margin::*;
pub use oracle::*;
pub use order::*;
pub use position::*;
pub use types::*;
