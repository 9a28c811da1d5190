//! Performance metrics over the filtered trade and snapshot sets.
//!
//! `compute_report` is a pure function of its inputs: the reference date is
//! a parameter, sorts are stable, and identical inputs serialize to
//! byte-identical reports.

use chrono::NaiveDate;

use super::cohorts;
use super::period::Period;
use super::report::{
    AdvancedMetrics, AnalyticsReport, Drawdown, ExecutiveMetrics, SharpeMethod, Summary,
};
use super::stats::{mean, percent_returns, population_std_dev};
use super::trade::{PortfolioSnapshot, Trade};

pub const DEFAULT_MIN_TRADES: usize = 10;

/// Dual-method Sharpe thresholds. Pinned business policy: the portfolio
/// method needs a month and a half of snapshots, the per-trade fallback a
/// minimum sample of closed trades.
pub const PORTFOLIO_SHARPE_MIN_SNAPSHOTS: usize = 30;
pub const TRADE_SHARPE_MIN_TRADES: usize = 10;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Full analytics report for one period.
pub fn compute_report(
    trades: &[Trade],
    snapshots: &[PortfolioSnapshot],
    period: Period,
    today: NaiveDate,
    min_trades: usize,
) -> AnalyticsReport {
    let filtered = period.filter_trades(trades, today);
    if filtered.len() < min_trades {
        return AnalyticsReport::insufficient(filtered.len(), min_trades);
    }

    let mut snaps = period.filter_snapshots(snapshots, today);
    snaps.sort_by_key(|s| s.snapshot_date);

    let mut by_exit = filtered.clone();
    by_exit.sort_by_key(|t| t.exit_date);

    let total_pnl: f64 = filtered.iter().map(|t| t.pnl).sum();
    let winners = filtered.iter().filter(|t| t.is_winner()).count();
    let win_rate = winners as f64 / filtered.len() as f64 * 100.0;

    AnalyticsReport {
        summary: Summary {
            total_trades: filtered.len(),
            win_rate,
            total_pnl,
            has_enough_data: true,
            min_required: min_trades,
        },
        executive_metrics: executive_metrics(&filtered, &snaps, win_rate),
        advanced_metrics: advanced_metrics(&by_exit, &snaps),
        market_comparison: cohorts::market_comparison(&filtered),
        exit_reasons: cohorts::exit_reasons(&filtered),
        monthly_data: cohorts::monthly_data(&by_exit),
        day_of_week: cohorts::day_of_week(&filtered),
        holding_periods: cohorts::holding_periods(&filtered),
        top_performers: cohorts::top_performers(&filtered),
        consistency_metrics: cohorts::consistency_metrics(&by_exit),
    }
}

fn executive_metrics(
    trades: &[&Trade],
    snapshots: &[&PortfolioSnapshot],
    win_rate: f64,
) -> ExecutiveMetrics {
    let wins: Vec<f64> = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).collect();
    let losses: Vec<f64> = trades.iter().filter(|t| t.pnl < 0.0).map(|t| t.pnl).collect();

    let avg_win = mean(&wins);
    let avg_loss = mean(&losses); // signed, <= 0

    let p_win = win_rate / 100.0;
    let expectancy = p_win * avg_win + (1.0 - p_win) * avg_loss;

    let gross_profit: f64 = wins.iter().sum();
    let gross_loss: f64 = losses.iter().sum::<f64>().abs();
    let profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else {
        0.0
    };

    let risk_reward_ratio = if avg_loss < 0.0 {
        avg_win / avg_loss.abs()
    } else {
        0.0
    };

    let (sharpe_ratio, sharpe_method) = sharpe(trades, snapshots);
    let max_drawdown = max_drawdown(snapshots);
    let recovery_factor = recovery_factor(snapshots, max_drawdown.amount);

    ExecutiveMetrics {
        sharpe_ratio,
        sharpe_method,
        max_drawdown,
        recovery_factor,
        expectancy,
        profit_factor,
        risk_reward_ratio,
    }
}

/// Dual-method Sharpe. Snapshot-based when enough daily valuations exist;
/// per-trade annualized fallback otherwise. Both branches are deliberate
/// policy, including the exact thresholds.
fn sharpe(trades: &[&Trade], snapshots: &[&PortfolioSnapshot]) -> (f64, SharpeMethod) {
    if snapshots.len() >= PORTFOLIO_SHARPE_MIN_SNAPSHOTS {
        let values: Vec<f64> = snapshots.iter().map(|s| s.total_value).collect();
        let returns = percent_returns(&values);
        if returns.len() >= 2 {
            let sd = population_std_dev(&returns);
            let value = if sd > 0.0 {
                mean(&returns) / sd * TRADING_DAYS_PER_YEAR.sqrt()
            } else {
                0.0
            };
            return (value, SharpeMethod::Portfolio);
        }
    }

    if trades.len() >= TRADE_SHARPE_MIN_TRADES {
        // Already annualized per trade, so no sqrt(252) factor here.
        let annualized: Vec<f64> = trades
            .iter()
            .map(|t| t.pnl_percent / t.holding_days.max(1) as f64 * TRADING_DAYS_PER_YEAR)
            .collect();
        if annualized.len() >= 2 {
            let sd = population_std_dev(&annualized);
            let value = if sd > 0.0 { mean(&annualized) / sd } else { 0.0 };
            return (value, SharpeMethod::Trade);
        }
    }

    (0.0, SharpeMethod::InsufficientData)
}

/// Running-peak drawdown over the date-sorted snapshots. Strict `>` keeps
/// the first occurrence on ties; percent is reported negative.
fn max_drawdown(snapshots: &[&PortfolioSnapshot]) -> Drawdown {
    let Some(first) = snapshots.first() else {
        return Drawdown::default();
    };

    let mut peak = first.total_value;
    let mut max_amount = 0.0;
    let mut max_percent = 0.0;
    let mut max_date = None;

    for snap in snapshots {
        if snap.total_value > peak {
            peak = snap.total_value;
        }
        let amount = peak - snap.total_value;
        if amount > max_amount {
            max_amount = amount;
            max_percent = if peak > 0.0 { amount / peak * 100.0 } else { 0.0 };
            max_date = Some(snap.snapshot_date);
        }
    }

    Drawdown {
        percent: -max_percent,
        amount: max_amount,
        date: max_date,
    }
}

/// Period profit divided by the worst drawdown; defined only when both are
/// positive.
fn recovery_factor(snapshots: &[&PortfolioSnapshot], drawdown_amount: f64) -> f64 {
    if snapshots.len() < 2 || drawdown_amount <= 0.0 {
        return 0.0;
    }
    let profit = snapshots[snapshots.len() - 1].total_value - snapshots[0].total_value;
    if profit > 0.0 {
        profit / drawdown_amount
    } else {
        0.0
    }
}

fn advanced_metrics(
    by_exit: &[&Trade],
    snapshots: &[&PortfolioSnapshot],
) -> AdvancedMetrics {
    let (win_streak, loss_streak) = streaks(by_exit);
    let (days_underwater, peak_date) = days_underwater(by_exit);

    let winner_holds: Vec<f64> = by_exit
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.holding_days as f64)
        .collect();
    let loser_holds: Vec<f64> = by_exit
        .iter()
        .filter(|t| !t.is_winner())
        .map(|t| t.holding_days as f64)
        .collect();

    let total_pnl: f64 = by_exit.iter().map(|t| t.pnl).sum();
    let avg_entry_value = mean(&by_exit.iter().map(|t| t.entry_value()).collect::<Vec<_>>());
    let capital_efficiency = if avg_entry_value > 0.0 {
        total_pnl / avg_entry_value * 100.0
    } else {
        0.0
    };

    AdvancedMetrics {
        win_streak,
        loss_streak,
        avg_hold_winners: mean(&winner_holds),
        avg_hold_losers: mean(&loser_holds),
        trade_frequency: trade_frequency(by_exit),
        capital_efficiency,
        days_underwater,
        peak_date,
        portfolio_peak_equity: snapshots
            .iter()
            .map(|s| s.total_value)
            .fold(0.0, f64::max),
    }
}

/// Longest win and loss runs over the exit-date-ordered trades. A signed
/// counter resets to ±1 on a sign flip; breakeven trades count as losses.
fn streaks(by_exit: &[&Trade]) -> (usize, usize) {
    let mut run: i64 = 0;
    let mut max_win: i64 = 0;
    let mut max_loss: i64 = 0;

    for trade in by_exit {
        if trade.is_winner() {
            run = if run > 0 { run + 1 } else { 1 };
            max_win = max_win.max(run);
        } else {
            run = if run < 0 { run - 1 } else { -1 };
            max_loss = max_loss.max(-run);
        }
    }

    (max_win as usize, max_loss as usize)
}

/// Worst observed underwater streak of the running trade pnl, in days.
///
/// Note this is the historical maximum, not the streak as of the latest
/// trade — the literal journal behavior, kept pending product review.
fn days_underwater(by_exit: &[&Trade]) -> (i64, Option<NaiveDate>) {
    let mut running = 0.0;
    let mut peak = 0.0;
    let mut peak_date: Option<NaiveDate> = None;
    let mut max_days: i64 = 0;

    for trade in by_exit {
        running += trade.pnl;
        if running > peak {
            peak = running;
            peak_date = Some(trade.exit_date);
        } else {
            let anchor = *peak_date.get_or_insert(trade.exit_date);
            let days = (trade.exit_date - anchor).num_days();
            max_days = max_days.max(days);
        }
    }

    (max_days, peak_date)
}

/// Trades per week across the span from earliest entry to latest exit.
fn trade_frequency(by_exit: &[&Trade]) -> f64 {
    if by_exit.len() < 2 {
        return 0.0;
    }
    let (Some(earliest_entry), Some(latest_exit)) = (
        by_exit.iter().map(|t| t.entry_date).min(),
        by_exit.iter().map(|t| t.exit_date).max(),
    ) else {
        return 0.0;
    };
    let day_span = (latest_exit - earliest_entry).num_days();
    if day_span <= 0 {
        return 0.0;
    }
    by_exit.len() as f64 / day_span as f64 * 7.0
}
