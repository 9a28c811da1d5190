#![allow(dead_code)]

use chrono::NaiveDate;
use tradelog::domain::trade::{Market, PortfolioSnapshot, Trade};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_trade(ticker: &str, pnl: f64, pnl_percent: f64, exit: NaiveDate, holding: i64) -> Trade {
    Trade {
        ticker: ticker.to_string(),
        market: Market::from_ticker(ticker),
        entry_date: exit - chrono::Duration::days(holding),
        exit_date: exit,
        shares: 4.0,
        entry_price: 95.5,
        exit_price: 95.5 + pnl / 4.0,
        pnl,
        pnl_percent,
        exit_reason: None,
        holding_days: holding,
        tags: vec![],
    }
}

pub fn make_snapshot(day: NaiveDate, total_value: f64) -> PortfolioSnapshot {
    let cash = total_value * 0.2;
    PortfolioSnapshot {
        snapshot_date: day,
        total_value,
        cash_balance: cash,
        positions_value: total_value - cash,
        total_pnl: total_value - 5000.0,
        position_count: 4,
    }
}

/// Five closed trades from the February validation window. Exit order is
/// STX first, then the four 2026-02-13 exits in insertion order.
pub fn scenario_trades() -> Vec<Trade> {
    vec![
        make_trade("STX", 93.68, 24.5, date(2026, 2, 10), 21),
        make_trade("SNDK", 104.98, 18.2, date(2026, 2, 13), 17),
        make_trade("MU", -2.33, -0.6, date(2026, 2, 13), 9),
        make_trade("FRES.L", -182.16, -14.1, date(2026, 2, 13), 25),
        make_trade("WDC", -12.23, -3.2, date(2026, 2, 13), 6),
    ]
}

/// Twelve snapshots spanning 2026-01-31 to 2026-02-13, peaking at 5444.29
/// on 02-03 and bottoming at 5025.22 on 02-10.
pub fn scenario_snapshots() -> Vec<PortfolioSnapshot> {
    let days = [
        (date(2026, 1, 31), 5200.00),
        (date(2026, 2, 1), 5250.00),
        (date(2026, 2, 2), 5300.00),
        (date(2026, 2, 3), 5444.29),
        (date(2026, 2, 4), 5400.00),
        (date(2026, 2, 5), 5350.00),
        (date(2026, 2, 6), 5300.00),
        (date(2026, 2, 9), 5100.00),
        (date(2026, 2, 10), 5025.22),
        (date(2026, 2, 11), 5150.00),
        (date(2026, 2, 12), 5250.00),
        (date(2026, 2, 13), 5352.00),
    ];
    days.iter().map(|&(d, v)| make_snapshot(d, v)).collect()
}
