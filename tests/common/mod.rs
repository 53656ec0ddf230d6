// shared venue fixture: one strict-stable collateral/liquidity asset (USDC),
// one traded asset (XXX), one spare stable (USDT), a funded LP and trader,
// and a granted filler. parameters mirror the production defaults.

#![allow(dead_code)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use venue_core::*;

pub const USDC: AssetId = AssetId(0);
pub const XXX: AssetId = AssetId(1);
pub const USDT: AssetId = AssetId(2);

pub const LP: AccountId = AccountId(1);
pub const TRADER: AccountId = AccountId(2);
pub const OTHER: AccountId = AccountId(3);
pub const FILLER: AccountId = AccountId(9);

pub const START: u64 = 86400;

pub fn prices(asset_price: Decimal) -> PriceVector {
    PriceVector::new(vec![dec!(1), asset_price, dec!(1)]).unwrap()
}

pub fn prices3(collateral: Decimal, asset: Decimal, profit: Decimal) -> PriceVector {
    PriceVector::new(vec![collateral, asset, profit]).unwrap()
}

pub fn new_venue() -> Venue {
    let mut config = ConfigStore::new();
    config.set(config::FUNDING_INTERVAL, dec!(3600));
    config.set(config::BORROWING_RATE_APY, dec!(0.01));
    config.set(config::LIQUIDITY_FEE_RATE, dec!(0.0001));
    config.set(config::STRICT_STABLE_DEVIATION, dec!(0.005));
    config.set(config::LIQUIDITY_CAP_USD, dec!(1000000));
    config.set(config::OB_LIQUIDITY_LOCK_PERIOD, dec!(300));
    config.set(config::OB_MARKET_ORDER_TIMEOUT, dec!(120));
    config.set(config::OB_LIMIT_ORDER_TIMEOUT, dec!(2592000));
    config.set(config::OB_CANCEL_COOL_DOWN, dec!(5));

    config.set_asset(XXX, config::LOT_SIZE, dec!(0.1));
    config.set_asset(XXX, config::INITIAL_MARGIN_RATE, dec!(0.10));
    config.set_asset(XXX, config::MAINTENANCE_MARGIN_RATE, dec!(0.05));
    config.set_asset(XXX, config::MIN_PROFIT_RATE, dec!(0.01));
    config.set_asset(XXX, config::MIN_PROFIT_TIME, dec!(10));
    config.set_asset(XXX, config::POSITION_FEE_RATE, dec!(0.001));
    config.set_asset(XXX, config::LIQUIDATION_FEE_RATE, dec!(0.002));
    config.set_asset(XXX, config::MAX_LONG_POSITION_SIZE, dec!(10000000));
    config.set_asset(XXX, config::MAX_SHORT_POSITION_SIZE, dec!(10000000));
    config.set_asset(XXX, config::FUNDING_ALPHA, dec!(20000));
    config.set_asset(XXX, config::FUNDING_BETA_APY, dec!(0.20));
    config.set_asset(XXX, config::ADL_RESERVE_RATE, dec!(0.80));
    config.set_asset(XXX, config::ADL_MAX_PNL_RATE, dec!(0.50));
    config.set_asset(XXX, config::ADL_TRIGGER_RATE, dec!(0.90));

    let mut venue = Venue::new(config);
    venue.add_asset(
        USDC,
        "USDC",
        6,
        AssetFlags::new(
            AssetFlags::STABLE
                | AssetFlags::STRICT_STABLE
                | AssetFlags::LIQUIDITY
                | AssetFlags::ENABLED,
        ),
    );
    venue.add_asset(
        XXX,
        "XXX",
        18,
        AssetFlags::new(
            AssetFlags::TRADABLE | AssetFlags::OPENABLE | AssetFlags::SHORTABLE | AssetFlags::ENABLED,
        ),
    );
    venue.add_asset(
        USDT,
        "USDT",
        6,
        AssetFlags::new(
            AssetFlags::STABLE
                | AssetFlags::STRICT_STABLE
                | AssetFlags::LIQUIDITY
                | AssetFlags::ENABLED,
        ),
    );

    venue.grant_filler(FILLER);
    venue.fund_account(LP, USDC, dec!(1000000));
    venue.fund_account(TRADER, USDC, dec!(100000));
    venue.fund_account(OTHER, USDC, dec!(100000));
    venue.set_time(Timestamp::from_secs(START));
    venue
}

/// Queue and fill an add-liquidity order past its lock period.
pub fn add_pool_liquidity(venue: &mut Venue, amount: Decimal) {
    let id = venue
        .place_liquidity_order(
            LP,
            LiquidityOrderPayload {
                asset: USDC,
                amount,
                is_adding: true,
            },
        )
        .unwrap();
    venue.advance_time(301);
    venue.fill_liquidity_order(FILLER, id, &prices(dec!(2000))).unwrap();
}

pub fn position_payload(
    sub: SubAccountId,
    collateral: Decimal,
    size: Decimal,
    limit: Decimal,
    flags: u8,
    expiration: Timestamp,
) -> PositionOrderPayload {
    PositionOrderPayload {
        sub_account: sub,
        collateral,
        size,
        limit_price: limit,
        tp_price: dec!(0),
        sl_price: dec!(0),
        expiration,
        tpsl_expiration: Timestamp::from_secs(0),
        profit_asset: USDC,
        tpsl_profit_asset: USDC,
        flags: PositionOrderFlags::new(flags),
    }
}

/// Place and immediately fill an open order at the given price.
pub fn open_position(
    venue: &mut Venue,
    sub: SubAccountId,
    collateral: Decimal,
    size: Decimal,
    price: Decimal,
) {
    let expiration = venue.time().plus(86400);
    let ids = venue
        .place_position_order(
            sub.account,
            position_payload(sub, collateral, size, price, PositionOrderFlags::OPEN_POSITION, expiration),
        )
        .unwrap();
    venue
        .fill_position_order(FILLER, ids[0], size, price, &prices(price))
        .unwrap();
}

/// Pool/POL/reward split of a fee under the default shares.
pub fn pool_share(fee: Decimal) -> Decimal {
    fee - fee * dec!(0.15) - fee * dec!(0.15)
}
