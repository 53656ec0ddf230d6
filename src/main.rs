//! Leveraged Venue Core Simulation.
//!
//! Demonstrates the full venue lifecycle: liquidity bootstrap, order queue,
//! leveraged fills, funding accrual, profit capping and liquidation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use venue_core::*;

const USDC: AssetId = AssetId(0);
const XXX: AssetId = AssetId(1);

fn main() {
    println!("Leveraged Venue Core Simulation");
    println!("Shared Pool, Queued Orders, Filler Execution\n");

    scenario_1_liquidity_bootstrap();
    scenario_2_open_and_close();
    scenario_3_funding_accrual();
    scenario_4_liquidation();
    scenario_5_tp_sl_strategy();

    println!("\nAll simulations completed successfully.");
}

fn prices(asset_price: Decimal) -> PriceVector {
    PriceVector::new(vec![dec!(1), asset_price, dec!(1)]).unwrap()
}

/// Standard venue: one stable collateral/liquidity asset, one traded asset.
fn setup() -> (Venue, AccountId, AccountId, AccountId) {
    let mut config = ConfigStore::new();
    config.set(config::FUNDING_INTERVAL, dec!(3600));
    config.set(config::BORROWING_RATE_APY, dec!(0.01));
    config.set(config::LIQUIDITY_FEE_RATE, dec!(0.0001));
    config.set(config::STRICT_STABLE_DEVIATION, dec!(0.005));
    config.set(config::LIQUIDITY_CAP_USD, dec!(10000000));
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
            AssetFlags::STABLE | AssetFlags::STRICT_STABLE | AssetFlags::LIQUIDITY | AssetFlags::ENABLED,
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

    let lp = AccountId(1);
    let trader = AccountId(2);
    let filler = AccountId(9);
    venue.grant_filler(filler);
    venue.fund_account(lp, USDC, dec!(1000000));
    venue.fund_account(trader, USDC, dec!(100000));
    venue.set_time(Timestamp::from_secs(3600));

    (venue, lp, trader, filler)
}

fn bootstrap_pool(venue: &mut Venue, lp: AccountId, filler: AccountId, amount: Decimal) {
    let id = venue
        .place_liquidity_order(
            lp,
            LiquidityOrderPayload {
                asset: USDC,
                amount,
                is_adding: true,
            },
        )
        .unwrap();
    venue.advance_time(301);
    venue.fill_liquidity_order(filler, id, &prices(dec!(2000))).unwrap();
}

/// Deposit into the pool, mint shares, pull part of it back out.
fn scenario_1_liquidity_bootstrap() {
    println!("Scenario 1: Liquidity Bootstrap\n");

    let (mut venue, lp, _, filler) = setup();
    bootstrap_pool(&mut venue, lp, filler, dec!(1000000));

    println!("  LP deposits 1,000,000 USDC");
    println!("  Shares minted: {}", venue.share_balance_of(lp));
    println!("  Spot liquidity: {}", venue.asset(USDC).unwrap().state.spot_liquidity);

    let id = venue
        .place_liquidity_order(
            lp,
            LiquidityOrderPayload {
                asset: USDC,
                amount: dec!(1000),
                is_adding: false,
            },
        )
        .unwrap();
    venue.advance_time(301);
    let out = venue.fill_liquidity_order(filler, id, &prices(dec!(2000))).unwrap();

    println!("  Removed {} shares -> {} USDC (fee {})\n", out.share_amount, out.token_amount - out.fee_tokens, out.fee_tokens);
}

/// Open a leveraged long, close half at a profit.
fn scenario_2_open_and_close() {
    println!("Scenario 2: Open and Close\n");

    let (mut venue, lp, trader, filler) = setup();
    bootstrap_pool(&mut venue, lp, filler, dec!(1000000));

    let sub = SubAccountId::new(trader, USDC, XXX, true);
    let ids = venue
        .place_position_order(
            trader,
            PositionOrderPayload {
                sub_account: sub,
                collateral: dec!(10000),
                size: dec!(2),
                limit_price: dec!(2000),
                tp_price: dec!(0),
                sl_price: dec!(0),
                expiration: venue.time().plus(86400),
                tpsl_expiration: Timestamp::from_secs(0),
                profit_asset: USDC,
                tpsl_profit_asset: USDC,
                flags: PositionOrderFlags::new(PositionOrderFlags::OPEN_POSITION),
            },
        )
        .unwrap();
    venue
        .fill_position_order(filler, ids[0], dec!(2), dec!(2000), &prices(dec!(2000)))
        .unwrap();

    let account = venue.sub_account(sub);
    println!("  Opened 2 XXX long @ 2000, collateral {}", account.collateral);

    let ids = venue
        .place_position_order(
            trader,
            PositionOrderPayload {
                sub_account: sub,
                collateral: dec!(0),
                size: dec!(1),
                limit_price: dec!(2100),
                tp_price: dec!(0),
                sl_price: dec!(0),
                expiration: venue.time().plus(86400),
                tpsl_expiration: Timestamp::from_secs(0),
                profit_asset: USDC,
                tpsl_profit_asset: USDC,
                flags: PositionOrderFlags::new(0),
            },
        )
        .unwrap();
    let outcome = venue
        .fill_position_order(filler, ids[0], dec!(1), dec!(2100), &prices(dec!(2110)))
        .unwrap();

    if let PositionFillOutcome::Closed(c) = outcome {
        println!("  Closed 1 XXX @ 2100: pnl {}, fee {}", c.realized_pnl, c.fee);
        println!("  Remaining size {}, collateral {}\n", c.remaining_size, c.remaining_collateral);
    }
}

/// Skewed open interest accrues funding against the heavy side.
fn scenario_3_funding_accrual() {
    println!("Scenario 3: Funding Accrual\n");

    let (mut venue, lp, trader, filler) = setup();
    bootstrap_pool(&mut venue, lp, filler, dec!(1000000));

    let sub = SubAccountId::new(trader, USDC, XXX, true);
    let ids = venue
        .place_position_order(
            trader,
            PositionOrderPayload {
                sub_account: sub,
                collateral: dec!(10000),
                size: dec!(10),
                limit_price: dec!(2000),
                tp_price: dec!(0),
                sl_price: dec!(0),
                expiration: venue.time().plus(86400),
                tpsl_expiration: Timestamp::from_secs(0),
                profit_asset: USDC,
                tpsl_profit_asset: USDC,
                flags: PositionOrderFlags::new(PositionOrderFlags::OPEN_POSITION),
            },
        )
        .unwrap();
    venue
        .fill_position_order(filler, ids[0], dec!(10), dec!(2000), &prices(dec!(2000)))
        .unwrap();
    venue.update_funding_state();

    println!("  10 XXX long open, skew 20,000 USD");
    venue.advance_time(86400);
    venue.update_funding_state();

    let state = &venue.asset(XXX).unwrap().state;
    println!("  After 1 day:");
    println!("    long cumulative funding:  {}", state.long_cumulative_funding);
    println!("    short cumulative funding: {}\n", state.short_cumulative_funding);
}

/// A short blown through its maintenance margin gets liquidated.
fn scenario_4_liquidation() {
    println!("Scenario 4: Liquidation\n");

    let (mut venue, lp, trader, filler) = setup();
    bootstrap_pool(&mut venue, lp, filler, dec!(1000000));

    let sub = SubAccountId::new(trader, USDC, XXX, false);
    let ids = venue
        .place_position_order(
            trader,
            PositionOrderPayload {
                sub_account: sub,
                collateral: dec!(10000),
                size: dec!(2),
                limit_price: dec!(2000),
                tp_price: dec!(0),
                sl_price: dec!(0),
                expiration: venue.time().plus(86400),
                tpsl_expiration: Timestamp::from_secs(0),
                profit_asset: USDC,
                tpsl_profit_asset: USDC,
                flags: PositionOrderFlags::new(PositionOrderFlags::OPEN_POSITION),
            },
        )
        .unwrap();
    venue
        .fill_position_order(filler, ids[0], dec!(2), dec!(2000), &prices(dec!(2000)))
        .unwrap();

    println!("  2 XXX short @ 2000 with 9,996 collateral");
    println!("  Price rips to 6,665...");

    let outcome = venue
        .liquidate(filler, sub, USDC, dec!(6665), &prices(dec!(6664.8)))
        .unwrap();
    println!("  Liquidated: pnl {}, fee {}, returned {}\n", outcome.pnl, outcome.fee, outcome.returned_collateral);
}

/// Open order with the tp/sl strategy flag spawns both close legs on fill.
fn scenario_5_tp_sl_strategy() {
    println!("Scenario 5: TP/SL Strategy\n");

    let (mut venue, lp, trader, filler) = setup();
    bootstrap_pool(&mut venue, lp, filler, dec!(1000000));

    let sub = SubAccountId::new(trader, USDC, XXX, true);
    let ids = venue
        .place_position_order(
            trader,
            PositionOrderPayload {
                sub_account: sub,
                collateral: dec!(10000),
                size: dec!(2),
                limit_price: dec!(2000),
                tp_price: dec!(2200),
                sl_price: dec!(1800),
                expiration: venue.time().plus(86400),
                tpsl_expiration: venue.time().plus(86400 * 2),
                profit_asset: USDC,
                tpsl_profit_asset: USDC,
                flags: PositionOrderFlags::new(
                    PositionOrderFlags::OPEN_POSITION
                        | PositionOrderFlags::MARKET_ORDER
                        | PositionOrderFlags::TP_SL_STRATEGY,
                ),
            },
        )
        .unwrap();
    venue
        .fill_position_order(filler, ids[0], dec!(2), dec!(2000), &prices(dec!(2000)))
        .unwrap();

    println!("  Open filled; auto-derived close orders:");
    for order in venue.list_orders_of(trader, 0, 10) {
        if let OrderPayload::Position(p) = &order.payload {
            let kind = if p.flags.is_trigger() { "stop-loss" } else { "take-profit" };
            println!("    order {}: {} @ {}", order.id.0, kind, p.limit_price);
        }
    }

    for event in venue.recent_events(3) {
        println!("  event {:?}", event.id);
    }
}
