//! Cohort breakdowns of the filtered trade set.
//!
//! All groupings are order-independent; where an output order matters it is
//! fixed explicitly so the report stays deterministic.

use chrono::{Datelike, Weekday};
use std::collections::BTreeMap;

use super::report::{
    ConsistencyMetrics, DayOfWeekStats, ExitReasonStats, HoldingPeriodStats, MarketComparison,
    MarketStats, MonthlyStats, PerformerRef, TopPerformers, TradeRef,
};
use super::stats::{mean, population_std_dev};
use super::trade::{Market, Trade};

/// Most recent calendar months kept in the monthly breakdown.
const MONTHLY_WINDOW: usize = 12;

const TOP_PERFORMER_COUNT: usize = 5;

pub fn market_comparison(trades: &[&Trade]) -> MarketComparison {
    MarketComparison {
        us: market_stats(trades, Market::Us),
        uk: market_stats(trades, Market::Uk),
    }
}

fn market_stats(trades: &[&Trade], market: Market) -> Option<MarketStats> {
    let cohort: Vec<&&Trade> = trades.iter().filter(|t| t.market == market).collect();
    if cohort.is_empty() {
        return None;
    }

    let winners = cohort.iter().filter(|t| t.is_winner()).count();
    let wins: Vec<f64> = cohort.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).collect();
    let losses: Vec<f64> = cohort.iter().filter(|t| t.pnl < 0.0).map(|t| t.pnl).collect();

    // First occurrence wins ties, so fold with strict comparisons.
    let best = cohort
        .iter()
        .fold(None::<&&&Trade>, |acc, t| match acc {
            Some(b) if b.pnl >= t.pnl => acc,
            _ => Some(t),
        })
        .map(|t| PerformerRef {
            ticker: t.ticker.clone(),
            pnl: t.pnl,
        });
    let worst = cohort
        .iter()
        .fold(None::<&&&Trade>, |acc, t| match acc {
            Some(w) if w.pnl <= t.pnl => acc,
            _ => Some(t),
        })
        .map(|t| PerformerRef {
            ticker: t.ticker.clone(),
            pnl: t.pnl,
        });

    Some(MarketStats {
        trades: cohort.len(),
        win_rate: winners as f64 / cohort.len() as f64 * 100.0,
        total_pnl: cohort.iter().map(|t| t.pnl).sum(),
        avg_win: mean(&wins),
        avg_loss: mean(&losses),
        best_performer: best,
        worst_performer: worst,
    })
}

/// Distribution over exit reasons, count descending, reason ascending on
/// ties. Trades without a recorded reason fall under "Manual Exit".
pub fn exit_reasons(trades: &[&Trade]) -> Vec<ExitReasonStats> {
    let mut groups: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        groups.entry(trade.exit_reason_label()).or_default().push(trade);
    }

    let total = trades.len();
    let mut stats: Vec<ExitReasonStats> = groups
        .into_iter()
        .map(|(reason, cohort)| {
            let winners = cohort.iter().filter(|t| t.is_winner()).count();
            let total_pnl: f64 = cohort.iter().map(|t| t.pnl).sum();
            ExitReasonStats {
                reason: reason.to_string(),
                trades: cohort.len(),
                win_rate: winners as f64 / cohort.len() as f64 * 100.0,
                total_pnl,
                avg_pnl: total_pnl / cohort.len() as f64,
                percentage: cohort.len() as f64 / total as f64 * 100.0,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.trades.cmp(&a.trades).then(a.reason.cmp(&b.reason)));
    stats
}

/// Per-month pnl and win rate keyed `YYYY-MM`, truncated to the most recent
/// twelve months; cumulative pnl accumulates within the reported window.
pub fn monthly_data(by_exit: &[&Trade]) -> Vec<MonthlyStats> {
    let months = month_groups(by_exit);
    let start = months.len().saturating_sub(MONTHLY_WINDOW);

    let mut cumulative = 0.0;
    months[start..]
        .iter()
        .map(|(month, cohort)| {
            let winners = cohort.iter().filter(|t| t.is_winner()).count();
            let pnl: f64 = cohort.iter().map(|t| t.pnl).sum();
            cumulative += pnl;
            MonthlyStats {
                month: month.clone(),
                trades: cohort.len(),
                pnl,
                win_rate: winners as f64 / cohort.len() as f64 * 100.0,
                cumulative_pnl: cumulative,
            }
        })
        .collect()
}

/// Calendar-month groups in chronological order. `YYYY-MM` keys sort
/// lexicographically in date order.
fn month_groups<'a>(by_exit: &[&'a Trade]) -> Vec<(String, Vec<&'a Trade>)> {
    let mut groups: BTreeMap<String, Vec<&Trade>> = BTreeMap::new();
    for trade in by_exit {
        let key = format!("{:04}-{:02}", trade.exit_date.year(), trade.exit_date.month());
        groups.entry(key).or_default().push(trade);
    }
    groups.into_iter().collect()
}

/// Average pnl by weekday of exit, Monday through Friday. All five rows are
/// always present; weekend exits are ignored.
pub fn day_of_week(trades: &[&Trade]) -> Vec<DayOfWeekStats> {
    const WEEKDAYS: [(Weekday, &str); 5] = [
        (Weekday::Mon, "Monday"),
        (Weekday::Tue, "Tuesday"),
        (Weekday::Wed, "Wednesday"),
        (Weekday::Thu, "Thursday"),
        (Weekday::Fri, "Friday"),
    ];

    WEEKDAYS
        .iter()
        .map(|(weekday, label)| {
            let pnls: Vec<f64> = trades
                .iter()
                .filter(|t| t.exit_date.weekday() == *weekday)
                .map(|t| t.pnl)
                .collect();
            DayOfWeekStats {
                day: label.to_string(),
                trades: pnls.len(),
                avg_pnl: mean(&pnls),
            }
        })
        .collect()
}

/// Holding-period buckets in days. A same-day exit (holding_days 0) falls
/// into the first bucket.
pub fn holding_periods(trades: &[&Trade]) -> Vec<HoldingPeriodStats> {
    const BUCKETS: [(&str, i64, i64); 5] = [
        ("1-5", 0, 5),
        ("6-10", 6, 10),
        ("11-20", 11, 20),
        ("21-30", 21, 30),
        ("31+", 31, i64::MAX),
    ];

    BUCKETS
        .iter()
        .map(|(label, lo, hi)| {
            let cohort: Vec<&&Trade> = trades
                .iter()
                .filter(|t| t.holding_days >= *lo && t.holding_days <= *hi)
                .collect();
            let winners = cohort.iter().filter(|t| t.is_winner()).count();
            let pnls: Vec<f64> = cohort.iter().map(|t| t.pnl).collect();
            HoldingPeriodStats {
                period: label.to_string(),
                trades: cohort.len(),
                avg_pnl: mean(&pnls),
                win_rate: if cohort.is_empty() {
                    0.0
                } else {
                    winners as f64 / cohort.len() as f64 * 100.0
                },
            }
        })
        .collect()
}

/// Five largest winners (pnl descending) and five largest losers (pnl
/// ascending).
pub fn top_performers(trades: &[&Trade]) -> TopPerformers {
    let mut winners: Vec<&&Trade> = trades.iter().filter(|t| t.pnl > 0.0).collect();
    winners.sort_by(|a, b| b.pnl.partial_cmp(&a.pnl).unwrap_or(std::cmp::Ordering::Equal));

    let mut losers: Vec<&&Trade> = trades.iter().filter(|t| t.pnl < 0.0).collect();
    losers.sort_by(|a, b| a.pnl.partial_cmp(&b.pnl).unwrap_or(std::cmp::Ordering::Equal));

    let to_ref = |t: &&&Trade| TradeRef {
        ticker: t.ticker.clone(),
        market: t.market,
        pnl: t.pnl,
        pnl_percent: t.pnl_percent,
        exit_date: t.exit_date,
    };

    TopPerformers {
        winners: winners.iter().take(TOP_PERFORMER_COUNT).map(to_ref).collect(),
        losers: losers.iter().take(TOP_PERFORMER_COUNT).map(to_ref).collect(),
    }
}

/// Month-over-month consistency, computed over the full filtered month set
/// (not the truncated monthly view).
pub fn consistency_metrics(by_exit: &[&Trade]) -> ConsistencyMetrics {
    let months = month_groups(by_exit);

    let mut best: usize = 0;
    let mut run: usize = 0;
    let mut win_rates = Vec::with_capacity(months.len());
    let mut pnls = Vec::with_capacity(months.len());

    for (_, cohort) in &months {
        let winners = cohort.iter().filter(|t| t.is_winner()).count();
        let pnl: f64 = cohort.iter().map(|t| t.pnl).sum();
        win_rates.push(winners as f64 / cohort.len() as f64 * 100.0);
        pnls.push(pnl);

        if pnl > 0.0 {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }

    ConsistencyMetrics {
        best_monthly_streak: best,
        current_monthly_streak: run,
        win_rate_stdev: population_std_dev(&win_rates),
        pnl_stdev: population_std_dev(&pnls),
    }
}
