//! End-to-end accounting: liquidity, leveraged fills, funding accrual,
//! capped pnl, ADL and every liquidation branch, with exact balances.

mod common;

use common::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use venue_core::*;

fn short_sub() -> SubAccountId {
    SubAccountId::new(TRADER, USDC, XXX, false)
}

fn long_sub() -> SubAccountId {
    SubAccountId::new(TRADER, USDC, XXX, true)
}

fn years(secs: u64) -> Decimal {
    Decimal::from(secs) / Decimal::from(SECONDS_PER_YEAR)
}

#[test]
fn add_liquidity_mints_shares_at_nav() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));

    // fee 100 split 70/15/15; the pool share folds back into spot liquidity
    let spot = venue.asset(USDC).unwrap().state.spot_liquidity;
    assert_eq!(spot, dec!(999900) + pool_share(dec!(100)));
    assert_eq!(venue.share_balance_of(LP), dec!(999900));
    assert_eq!(venue.share_supply(), dec!(999900));
    assert_eq!(venue.balance_of(LP, USDC), dec!(0));
    assert_eq!(venue.pol_balance(USDC), dec!(100) * dec!(0.15));
    assert_eq!(venue.claimable_reward(USDC), dec!(100) * dec!(0.15));
    // pool custody = deposit minus the POL share that left
    assert_eq!(venue.pool_balance(USDC), dec!(1000000) - dec!(100) * dec!(0.15));
}

#[test]
fn open_short_books_fee_entry_and_aggregates() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    let spot_before = venue.asset(USDC).unwrap().state.spot_liquidity;

    // borrowing accrues one day before the trade
    venue.update_funding_state();
    venue.set_time(Timestamp::from_secs(START * 2));
    venue.update_funding_state();
    let index = dec!(0.01) * years(START);

    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.long_cumulative_funding, index);
    assert_eq!(state.short_cumulative_funding, index);

    open_position(&mut venue, short_sub(), dec!(1000), dec!(1), dec!(2000));

    // fee = 2000 * 1 * 0.1% = 2, paid out of collateral
    let account = venue.sub_account(short_sub());
    assert_eq!(account.collateral, dec!(998));
    assert_eq!(account.size(), dec!(1));
    assert_eq!(account.entry_price(), dec!(2000));
    assert_eq!(account.entry_funding(), index);

    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.total_short_size, dec!(1));
    assert_eq!(state.average_short_price, dec!(2000));
    assert_eq!(state.total_long_size, dec!(0));
    assert_eq!(state.average_long_price, dec!(0));

    // collateral is pool-held but not pool-owned: spot only gains the fee share
    let spot = venue.asset(USDC).unwrap().state.spot_liquidity;
    assert_eq!(spot, spot_before + pool_share(dec!(2)));
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(99000));
}

#[test]
fn close_long_pays_profit_from_spot_and_honors_partial_withdraw() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, long_sub(), dec!(10000), dec!(10), dec!(2000));
    let spot_before = venue.asset(USDC).unwrap().state.spot_liquidity;

    // close 1 of 10 at a 100 USD profit, withdrawing 1 USDC of collateral
    let expiration = venue.time().plus(800);
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(long_sub(), dec!(1), dec!(1), dec!(2000), 0, expiration),
        )
        .unwrap();
    let outcome = venue
        .fill_position_order(FILLER, ids[0], dec!(1), dec!(2100), &prices(dec!(2110)))
        .unwrap();

    let PositionFillOutcome::Closed(closed) = outcome else {
        panic!("expected a close outcome");
    };
    assert_eq!(closed.realized_pnl.value(), dec!(100));
    assert_eq!(closed.fee.value(), dec!(2.1));
    assert_eq!(closed.remaining_size, dec!(9));

    let account = venue.sub_account(long_sub());
    assert_eq!(account.collateral, dec!(9979)); // 9980 - withdrawn 1
    assert_eq!(account.entry_price(), dec!(2000)); // unchanged on decrease

    // trader got net profit plus the withdrawn collateral
    let net_profit = dec!(100) - dec!(2.1);
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000) + net_profit + dec!(1));

    // pool paid the gross profit, got back the pool share of the fee
    let spot = venue.asset(USDC).unwrap().state.spot_liquidity;
    assert_eq!(spot, spot_before - dec!(100) + pool_share(dec!(2.1)));

    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.total_long_size, dec!(9));
    assert_eq!(state.average_long_price, dec!(2000));
}

#[test]
fn realized_profit_is_capped_per_closed_entry_notional() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, long_sub(), dec!(10000), dec!(2), dec!(2000));

    // close 1 @ 3501: raw profit 1501, cap = 50% of 2000 entry notional
    let expiration = venue.time().plus(800);
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(long_sub(), dec!(0), dec!(1), dec!(3501), 0, expiration),
        )
        .unwrap();
    let outcome = venue
        .fill_position_order(FILLER, ids[0], dec!(1), dec!(3501), &prices(dec!(3502)))
        .unwrap();

    let PositionFillOutcome::Closed(closed) = outcome else {
        panic!("expected a close outcome");
    };
    assert_eq!(closed.realized_pnl.value(), dec!(1000));
    assert_eq!(closed.fee.value(), dec!(3.501));
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000) + dec!(1000) - dec!(3.501));

    let account = venue.sub_account(long_sub());
    assert_eq!(account.collateral, dec!(9996)); // untouched: fee came from profit
    assert_eq!(account.size(), dec!(1));
}

#[test]
fn short_profit_capped_symmetrically() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, short_sub(), dec!(10000), dec!(2), dec!(2000));

    let expiration = venue.time().plus(800);
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(short_sub(), dec!(0), dec!(1), dec!(999), 0, expiration),
        )
        .unwrap();
    let outcome = venue
        .fill_position_order(FILLER, ids[0], dec!(1), dec!(999), &prices(dec!(998)))
        .unwrap();

    let PositionFillOutcome::Closed(closed) = outcome else {
        panic!("expected a close outcome");
    };
    // raw profit 1001 capped to 1000
    assert_eq!(closed.realized_pnl.value(), dec!(1000));
    assert_eq!(closed.fee.value(), dec!(0.999));
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000) + dec!(1000) - dec!(0.999));
}

#[test]
fn adl_requires_trigger_and_caps_profit() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, long_sub(), dec!(10000), dec!(2), dec!(2000));

    // roe at 3799 = 89.95% < 90% trigger
    assert!(matches!(
        venue.fill_adl_order(FILLER, long_sub(), dec!(2), USDC, dec!(3501), &prices(dec!(3799))),
        Err(VenueError::AdlNotAllowed)
    ));
    assert!(matches!(
        venue.fill_adl_order(TRADER, long_sub(), dec!(2), USDC, dec!(3501), &prices(dec!(3800))),
        Err(VenueError::Unauthorized)
    ));

    let outcome = venue
        .fill_adl_order(FILLER, long_sub(), dec!(2), USDC, dec!(3501), &prices(dec!(3800)))
        .unwrap();
    // pnl (3501-2000)*2 = 3002, capped at 50% of 4000 entry notional
    assert_eq!(outcome.realized_pnl.value(), dec!(2000));
    assert_eq!(outcome.fee.value(), dec!(7.002));

    // full close returns all collateral alongside the capped net profit
    assert_eq!(
        venue.balance_of(TRADER, USDC),
        dec!(90000) + dec!(9996) + dec!(2000) - dec!(7.002)
    );
    assert!(venue.sub_account(long_sub()).is_empty());
    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.total_long_size, dec!(0));
    assert_eq!(state.average_long_price, dec!(0));
}

#[test]
fn liquidation_when_fee_fits_inside_margin() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, short_sub(), dec!(10000), dec!(2), dec!(2000));
    let spot_before = venue.asset(USDC).unwrap().state.spot_liquidity;

    // at 6664.7 the short is still maintenance-safe
    assert!(matches!(
        venue.liquidate(FILLER, short_sub(), USDC, dec!(6665), &prices(dec!(6664.7))),
        Err(VenueError::MarginSafe)
    ));

    let outcome = venue
        .liquidate(FILLER, short_sub(), USDC, dec!(6665), &prices(dec!(6664.8)))
        .unwrap();
    // pnl (2000-6665)*2 = -9330, fee = 6665*2*0.2% = 26.66
    assert_eq!(outcome.pnl.value(), dec!(-9330));
    assert_eq!(outcome.fee.value(), dec!(26.66));
    assert_eq!(outcome.returned_collateral, dec!(639.34)); // 9996 - 9330 - 26.66

    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000) + dec!(639.34));
    assert!(venue.sub_account(short_sub()).is_empty());

    // the pool absorbs collateral minus what left, plus its share of the fee
    let spot = venue.asset(USDC).unwrap().state.spot_liquidity;
    assert_eq!(
        spot,
        spot_before + dec!(9996) - dec!(639.34) - dec!(26.66) + pool_share(dec!(26.66))
    );
    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.total_short_size, dec!(0));
}

#[test]
fn liquidation_fee_clamped_to_remaining_margin() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, short_sub(), dec!(10000), dec!(2), dec!(2000));

    // margin after pnl = 9996 - 9986 = 10 < fee formula 27.972
    let outcome = venue
        .liquidate(FILLER, short_sub(), USDC, dec!(6993), &prices(dec!(6664.8)))
        .unwrap();
    assert_eq!(outcome.fee.value(), dec!(10));
    assert_eq!(outcome.returned_collateral, dec!(0));
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000));
}

#[test]
fn liquidation_underwater_returns_and_charges_nothing() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, short_sub(), dec!(10000), dec!(2), dec!(2000));

    // collateral + pnl = 9996 - 10000 < 0: no fee, nothing returned, never negative
    let outcome = venue
        .liquidate(FILLER, short_sub(), USDC, dec!(7000), &prices(dec!(6664.8)))
        .unwrap();
    assert_eq!(outcome.fee.value(), dec!(0));
    assert_eq!(outcome.returned_collateral, dec!(0));
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000));
    assert!(venue.sub_account(short_sub()).is_empty());
}

#[test]
fn funding_skew_charges_the_heavy_side() {
    let mut venue = new_venue();
    venue.update_funding_state(); // anchor the clock
    add_pool_liquidity(&mut venue, dec!(1000000));

    venue.set_time(Timestamp::from_secs(START * 2));
    venue.update_funding_state();
    let base = dec!(0.01) * years(START);

    open_position(&mut venue, short_sub(), dec!(1000), dec!(1), dec!(2000));
    open_position(&mut venue, long_sub(), dec!(10000), dec!(10), dec!(2000));
    assert_eq!(venue.sub_account(long_sub()).entry_funding(), base);

    // skew = (10 - 1) * 2000 = 18000 over alpha 20000 at beta 20% -> 18% apy
    venue.set_time(Timestamp::from_secs(START * 3));
    venue.update_funding_state();

    let day = years(START);
    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.long_cumulative_funding, base + dec!(0.01) * day + dec!(0.18) * day);
    assert_eq!(state.short_cumulative_funding, base + dec!(0.01) * day);

    // funding indices never decrease
    venue.set_time(Timestamp::from_secs(START * 4));
    venue.update_funding_state();
    let after = &venue.asset(XXX).unwrap().state;
    assert!(after.long_cumulative_funding > base + dec!(0.19) * day);
    assert!(after.short_cumulative_funding > base + dec!(0.01) * day);
}

#[test]
fn withdrawal_order_settles_funding_then_pays() {
    let mut venue = new_venue();
    venue.update_funding_state();
    add_pool_liquidity(&mut venue, dec!(1000000));

    venue.set_time(Timestamp::from_secs(START * 2));
    venue.update_funding_state();
    let base = dec!(0.01) * years(START);

    open_position(&mut venue, long_sub(), dec!(10000), dec!(2), dec!(2000));

    // one more day: skew 4000/20000 * 20% = 4% apy on longs, 1% borrowing
    venue.set_time(Timestamp::from_secs(START * 3));
    venue.update_funding_state();
    let day = years(START);
    let funding_delta = dec!(0.01) * day + dec!(0.04) * day;

    let id = venue
        .place_withdrawal_order(
            TRADER,
            WithdrawalOrderPayload {
                sub_account: long_sub(),
                amount: dec!(1),
                profit_asset: USDC,
                is_profit: false,
            },
        )
        .unwrap();
    venue
        .fill_withdrawal_order(FILLER, id, &prices(dec!(2100)))
        .unwrap();

    // funding fee = entry notional 4000 * index delta, then 1 USDC paid out
    let funding_fee = dec!(4000) * funding_delta;
    let account = venue.sub_account(long_sub());
    assert_eq!(account.collateral, dec!(9996) - funding_fee - dec!(1));
    assert_eq!(account.entry_funding(), base + funding_delta); // restamped
    assert_eq!(account.size(), dec!(2));
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000) + dec!(1));
}

#[test]
fn strict_stable_dampener_pins_or_trusts() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, short_sub(), dec!(10000), dec!(2), dec!(2000));

    // reference inside the band: collateral price pinned to 1.0, the
    // filler's 0.99 report is ignored
    venue.set_reference_price(USDC, Price::new_unchecked(dec!(0.999)));
    let expiration = venue.time().plus(800);
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(short_sub(), dec!(0), dec!(1), dec!(999), 0, expiration),
        )
        .unwrap();
    venue
        .fill_position_order(FILLER, ids[0], dec!(1), dec!(999), &prices3(dec!(0.99), dec!(998), dec!(0.99)))
        .unwrap();
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000) + dec!(1000) - dec!(0.999));

    // reference itself off-peg: the filler's report is used as-is
    venue.set_reference_price(USDC, Price::new_unchecked(dec!(0.99)));
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(short_sub(), dec!(0), dec!(1), dec!(999), 0, expiration),
        )
        .unwrap();
    venue
        .fill_position_order(FILLER, ids[0], dec!(1), dec!(999), &prices3(dec!(0.999), dec!(998), dec!(0.999)))
        .unwrap();

    let paid = (dec!(1000) - dec!(0.999)) / dec!(0.999);
    assert_eq!(
        venue.balance_of(TRADER, USDC),
        dec!(90000) + dec!(1000) - dec!(0.999) + paid
    );
}

#[test]
fn liquidity_round_trip_costs_exactly_two_fees() {
    let mut venue = new_venue();
    // route fee shares away from the pool so the fee genuinely leaves NAV
    venue.set_fee_shares(FeeShares {
        pool: Rate::new(dec!(0)),
        pol: Rate::new(dec!(0.5)),
        reward: Rate::new(dec!(0.5)),
    });
    add_pool_liquidity(&mut venue, dec!(1000000));
    assert_eq!(venue.share_balance_of(LP), dec!(999900));

    let id = venue
        .place_liquidity_order(
            LP,
            LiquidityOrderPayload {
                asset: USDC,
                amount: dec!(999900),
                is_adding: false,
            },
        )
        .unwrap();
    venue.advance_time(301);
    let outcome = venue.fill_liquidity_order(FILLER, id, &prices(dec!(2000))).unwrap();

    // share price stayed 1.0; exit pays deposit minus entry fee minus exit fee
    assert_eq!(outcome.share_price, dec!(1));
    let entry_fee = dec!(100);
    let exit_fee = dec!(999900) * dec!(0.0001);
    assert_eq!(
        venue.balance_of(LP, USDC),
        dec!(1000000) - entry_fee - exit_fee
    );
    assert_eq!(venue.share_supply(), dec!(0));
    assert_eq!(venue.asset(USDC).unwrap().state.spot_liquidity, dec!(0));
}

#[test]
fn remove_liquidity_respects_the_reserve() {
    let mut venue = new_venue();
    venue.config_mut().set(config::LIQUIDITY_FEE_RATE, dec!(0));
    venue.config_mut().set_asset(XXX, config::POSITION_FEE_RATE, dec!(0));
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, long_sub(), dec!(100000), dec!(900000), dec!(1));

    // reserve = 900,000 * 80% = 720,000; spot 1,000,000 -> 280,000 removable
    let id = venue
        .place_liquidity_order(
            LP,
            LiquidityOrderPayload {
                asset: USDC,
                amount: dec!(280001),
                is_adding: false,
            },
        )
        .unwrap();
    venue.advance_time(301);
    assert!(matches!(
        venue.fill_liquidity_order(FILLER, id, &prices(dec!(1))),
        Err(VenueError::InsufficientReserve)
    ));
    // the rejected order is still active and cancelable
    assert!(venue.get_order(id).unwrap().is_active);
    venue.cancel_order(LP, id).unwrap();

    let id = venue
        .place_liquidity_order(
            LP,
            LiquidityOrderPayload {
                asset: USDC,
                amount: dec!(280000),
                is_adding: false,
            },
        )
        .unwrap();
    venue.advance_time(301);
    venue.fill_liquidity_order(FILLER, id, &prices(dec!(1))).unwrap();
    assert_eq!(venue.asset(USDC).unwrap().state.spot_liquidity, dec!(720000));
}

#[test]
fn open_rejected_when_reserve_uncovered() {
    let mut venue = new_venue();
    // no pool liquidity at all
    let expiration = venue.time().plus(800);
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(long_sub(), dec!(10000), dec!(1), dec!(1), PositionOrderFlags::OPEN_POSITION, expiration),
        )
        .unwrap();
    assert!(matches!(
        venue.fill_position_order(FILLER, ids[0], dec!(1), dec!(1), &prices(dec!(1))),
        Err(VenueError::InsufficientReserve)
    ));

    // nothing changed: order active, escrow still with the order book
    assert!(venue.get_order(ids[0]).unwrap().is_active);
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(90000));
    assert!(venue.sub_account(long_sub()).is_empty());
}

#[test]
fn under_margined_open_is_rejected_whole() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000));
    let expiration = venue.time().plus(800);

    // 100 collateral cannot carry 2 XXX at 2000 under a 10% IM
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(long_sub(), dec!(100), dec!(2), dec!(2000), PositionOrderFlags::OPEN_POSITION, expiration),
        )
        .unwrap();
    assert!(matches!(
        venue.fill_position_order(FILLER, ids[0], dec!(2), dec!(2000), &prices(dec!(2000))),
        Err(VenueError::InsufficientMargin)
    ));
    assert!(venue.get_order(ids[0]).unwrap().is_active);
    assert!(venue.sub_account(long_sub()).is_empty());
    let state = &venue.asset(XXX).unwrap().state;
    assert_eq!(state.total_long_size, dec!(0));
}

#[test]
fn min_profit_gate_blocks_small_early_profit() {
    let mut venue = new_venue();
    venue.config_mut().set_asset(XXX, config::MIN_PROFIT_RATE, dec!(0.10));
    venue.config_mut().set_asset(XXX, config::MIN_PROFIT_TIME, dec!(60));
    add_pool_liquidity(&mut venue, dec!(1000000));
    open_position(&mut venue, long_sub(), dec!(100), dec!(0.1), dec!(1000));

    let expiration = venue.time().plus(86400);
    let ids = venue
        .place_position_order(
            TRADER,
            position_payload(
                long_sub(),
                dec!(0),
                dec!(0.1),
                dec!(1000),
                PositionOrderFlags::WITHDRAW_ALL_IF_EMPTY | PositionOrderFlags::SHOULD_REACH_MIN_PROFIT,
                expiration,
            ),
        )
        .unwrap();

    // profit rate 0.1% < 10% and the position is seconds old
    assert!(matches!(
        venue.fill_position_order(FILLER, ids[0], dec!(0.1), dec!(1001), &prices(dec!(1001))),
        Err(VenueError::ProfitConditionNotMet)
    ));
    assert!(venue.get_order(ids[0]).unwrap().is_active);

    // after the min profit time the same tiny profit is allowed
    venue.advance_time(61);
    venue
        .fill_position_order(FILLER, ids[0], dec!(0.1), dec!(1001), &prices(dec!(1001)))
        .unwrap();
    assert!(venue.sub_account(long_sub()).is_empty());
}

#[test]
fn reward_accrual_is_claimable_by_filler() {
    let mut venue = new_venue();
    add_pool_liquidity(&mut venue, dec!(1000000)); // accrues 15% of the 100 fee

    assert!(matches!(
        venue.claim_reward(TRADER, USDC, OTHER),
        Err(VenueError::Unauthorized)
    ));
    let claimed = venue.claim_reward(FILLER, USDC, OTHER).unwrap();
    assert_eq!(claimed, dec!(15));
    assert_eq!(venue.balance_of(OTHER, USDC), dec!(100015));
    assert_eq!(venue.claimable_reward(USDC), dec!(0));
}

#[test]
fn referral_tier_carves_discount_and_rebate() {
    let mut venue = new_venue();
    let mut table = StaticReferralTable::new();
    table.set(
        TRADER,
        ReferralTier {
            discount_rate: Rate::new(dec!(0.04)),
            rebate_rate: Rate::new(dec!(0.06)),
            referrer: OTHER,
        },
    );
    venue.set_referral_lookup(Box::new(table));
    add_pool_liquidity(&mut venue, dec!(1000000));
    let spot_before = venue.asset(USDC).unwrap().state.spot_liquidity;
    let reward_before = venue.claimable_reward(USDC);
    let pol_before = venue.pol_balance(USDC);

    open_position(&mut venue, short_sub(), dec!(1000), dec!(1), dec!(2000));

    // fee 2: 4% discount back to the trader, 6% rebate to the referrer,
    // remainder 1.8 split 70/15/15
    assert_eq!(venue.balance_of(TRADER, USDC), dec!(99000) + dec!(0.08));
    assert_eq!(venue.balance_of(OTHER, USDC), dec!(100000) + dec!(0.12));
    let spot = venue.asset(USDC).unwrap().state.spot_liquidity;
    assert_eq!(spot, spot_before + dec!(1.8) * dec!(0.70));
    assert_eq!(venue.pol_balance(USDC), pol_before + dec!(1.8) * dec!(0.15));
    assert_eq!(venue.claimable_reward(USDC), reward_before + dec!(1.8) * dec!(0.15));
}
