//! End-to-end analytics over the February validation journal.

mod common;

use approx::assert_abs_diff_eq;
use common::{date, make_trade, scenario_snapshots, scenario_trades};
use tradelog::domain::metrics::compute_report;
use tradelog::domain::period::Period;
use tradelog::domain::report::SharpeMethod;

const TODAY: (i32, u32, u32) = (2026, 8, 25);

fn today() -> chrono::NaiveDate {
    date(TODAY.0, TODAY.1, TODAY.2)
}

#[test]
fn validation_scenario_headline_numbers() {
    let trades = scenario_trades();
    let snapshots = scenario_snapshots();

    let report = compute_report(&trades, &snapshots, Period::AllTime, today(), 5);

    assert!(report.summary.has_enough_data);
    assert_eq!(report.summary.total_trades, 5);
    assert!((report.summary.win_rate - 40.0).abs() < 1e-9);
    assert!((report.summary.total_pnl - 1.94).abs() < 1e-6);

    let exec = &report.executive_metrics;
    assert_abs_diff_eq!(exec.max_drawdown.percent, -7.70, epsilon = 0.1);
    assert_abs_diff_eq!(exec.max_drawdown.amount, 419.07, epsilon = 0.01);
    assert_eq!(exec.max_drawdown.date, Some(date(2026, 2, 10)));
    assert_abs_diff_eq!(exec.recovery_factor, 0.36, epsilon = 0.05);
    assert_abs_diff_eq!(exec.expectancy, 0.39, epsilon = 0.10);
    assert_abs_diff_eq!(exec.profit_factor, 1.01, epsilon = 0.02);
    assert_abs_diff_eq!(exec.risk_reward_ratio, 1.51, epsilon = 0.02);
    // 5 trades and 12 snapshots clear neither Sharpe threshold.
    assert_eq!(exec.sharpe_method, SharpeMethod::InsufficientData);
    assert!((exec.sharpe_ratio - 0.0).abs() < f64::EPSILON);

    let adv = &report.advanced_metrics;
    assert_eq!(adv.win_streak, 2);
    assert_eq!(adv.loss_streak, 3);
    assert_eq!(adv.days_underwater, 0);
    assert!((adv.portfolio_peak_equity - 5444.29).abs() < 1e-9);
    assert!((adv.avg_hold_winners - 19.0).abs() < 1e-9);
    assert!((adv.avg_hold_losers - 40.0 / 3.0).abs() < 1e-9);
}

#[test]
fn validation_scenario_cohorts() {
    let report = compute_report(
        &scenario_trades(),
        &scenario_snapshots(),
        Period::AllTime,
        today(),
        5,
    );

    let us = report.market_comparison.us.as_ref().unwrap();
    let uk = report.market_comparison.uk.as_ref().unwrap();
    assert_eq!(us.trades, 4);
    assert_eq!(uk.trades, 1);
    assert!((us.win_rate - 50.0).abs() < 1e-9);
    assert!((uk.total_pnl - (-182.16)).abs() < 1e-9);
    assert_eq!(us.best_performer.as_ref().unwrap().ticker, "SNDK");
    assert_eq!(us.worst_performer.as_ref().unwrap().ticker, "WDC");

    assert_eq!(report.monthly_data.len(), 1);
    assert_eq!(report.monthly_data[0].month, "2026-02");
    assert_eq!(report.monthly_data[0].trades, 5);
    assert!((report.monthly_data[0].pnl - 1.94).abs() < 1e-6);

    assert_eq!(report.top_performers.winners.len(), 2);
    assert_eq!(report.top_performers.winners[0].ticker, "SNDK");
    assert_eq!(report.top_performers.losers[0].ticker, "FRES.L");

    // Every trade lacked a recorded exit reason.
    assert_eq!(report.exit_reasons.len(), 1);
    assert_eq!(report.exit_reasons[0].reason, "Manual Exit");
    assert!((report.exit_reasons[0].percentage - 100.0).abs() < 1e-9);

    assert_eq!(report.day_of_week.len(), 5);
    assert_eq!(report.holding_periods.len(), 5);
}

#[test]
fn default_gate_degrades_the_scenario() {
    // With the default gate of 10, five trades is not enough.
    let report = compute_report(
        &scenario_trades(),
        &scenario_snapshots(),
        Period::AllTime,
        today(),
        10,
    );
    assert!(!report.summary.has_enough_data);
    assert_eq!(report.summary.total_trades, 5);
    assert_eq!(report.summary.min_required, 10);
    assert!((report.summary.win_rate - 0.0).abs() < f64::EPSILON);
    assert!(report.monthly_data.is_empty());
    assert!(report.market_comparison.us.is_none());
}

#[test]
fn period_filter_excludes_old_trades() {
    let mut trades = scenario_trades();
    trades.push(make_trade("OLD", 500.0, 50.0, date(2024, 3, 1), 10));

    let all_time = compute_report(&trades, &scenario_snapshots(), Period::AllTime, today(), 5);
    assert_eq!(all_time.summary.total_trades, 6);

    let ytd = compute_report(&trades, &scenario_snapshots(), Period::YearToDate, today(), 5);
    assert_eq!(ytd.summary.total_trades, 5);
    assert!((ytd.summary.total_pnl - 1.94).abs() < 1e-6);
}

#[test]
fn report_output_is_byte_identical_across_runs() {
    let trades = scenario_trades();
    let snapshots = scenario_snapshots();
    let a = compute_report(&trades, &snapshots, Period::AllTime, today(), 5);
    let b = compute_report(&trades, &snapshots, Period::AllTime, today(), 5);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn unsorted_input_matches_sorted_input() {
    let trades = scenario_trades();
    let mut snapshots = scenario_snapshots();
    snapshots.reverse();
    snapshots.swap(2, 9);

    let report = compute_report(&trades, &snapshots, Period::AllTime, today(), 5);
    assert!((report.executive_metrics.max_drawdown.percent - (-7.70)).abs() < 0.1);
    assert!((report.advanced_metrics.portfolio_peak_equity - 5444.29).abs() < 1e-9);
}
