//! Analytics report records.
//!
//! Field names are part of the boundary contract: downstream consumers
//! compare the serialized output numerically, so every struct here derives
//! serde with the exact key names listed in the reporting contract.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade::Market;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub summary: Summary,
    pub executive_metrics: ExecutiveMetrics,
    pub advanced_metrics: AdvancedMetrics,
    pub market_comparison: MarketComparison,
    pub exit_reasons: Vec<ExitReasonStats>,
    pub monthly_data: Vec<MonthlyStats>,
    pub day_of_week: Vec<DayOfWeekStats>,
    pub holding_periods: Vec<HoldingPeriodStats>,
    pub top_performers: TopPerformers,
    pub consistency_metrics: ConsistencyMetrics,
}

impl AnalyticsReport {
    /// Degraded report returned when the trade count does not clear the
    /// minimum gate. A normal outcome, not an error.
    pub fn insufficient(total_trades: usize, min_required: usize) -> Self {
        AnalyticsReport {
            summary: Summary {
                total_trades,
                win_rate: 0.0,
                total_pnl: 0.0,
                has_enough_data: false,
                min_required,
            },
            executive_metrics: ExecutiveMetrics::default(),
            advanced_metrics: AdvancedMetrics::default(),
            market_comparison: MarketComparison::default(),
            exit_reasons: Vec::new(),
            monthly_data: Vec::new(),
            day_of_week: Vec::new(),
            holding_periods: Vec::new(),
            top_performers: TopPerformers::default(),
            consistency_metrics: ConsistencyMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub has_enough_data: bool,
    pub min_required: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpeMethod {
    Portfolio,
    Trade,
    InsufficientData,
}

impl std::fmt::Display for SharpeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SharpeMethod::Portfolio => "portfolio",
            SharpeMethod::Trade => "trade",
            SharpeMethod::InsufficientData => "insufficient_data",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    /// Peak-to-trough decline, reported as a negative percentage.
    pub percent: f64,
    pub amount: f64,
    pub date: Option<NaiveDate>,
}

impl Default for Drawdown {
    fn default() -> Self {
        Drawdown {
            percent: 0.0,
            amount: 0.0,
            date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveMetrics {
    pub sharpe_ratio: f64,
    pub sharpe_method: SharpeMethod,
    pub max_drawdown: Drawdown,
    pub recovery_factor: f64,
    pub expectancy: f64,
    pub profit_factor: f64,
    pub risk_reward_ratio: f64,
}

impl Default for ExecutiveMetrics {
    fn default() -> Self {
        ExecutiveMetrics {
            sharpe_ratio: 0.0,
            sharpe_method: SharpeMethod::InsufficientData,
            max_drawdown: Drawdown::default(),
            recovery_factor: 0.0,
            expectancy: 0.0,
            profit_factor: 0.0,
            risk_reward_ratio: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    pub win_streak: usize,
    pub loss_streak: usize,
    pub avg_hold_winners: f64,
    pub avg_hold_losers: f64,
    pub trade_frequency: f64,
    pub capital_efficiency: f64,
    pub days_underwater: i64,
    pub peak_date: Option<NaiveDate>,
    pub portfolio_peak_equity: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketComparison {
    pub us: Option<MarketStats>,
    pub uk: Option<MarketStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best_performer: Option<PerformerRef>,
    pub worst_performer: Option<PerformerRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerRef {
    pub ticker: String,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitReasonStats {
    pub reason: String,
    pub trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    /// Share of all filtered trades, in percent.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// Calendar month key, `YYYY-MM`.
    pub month: String,
    pub trades: usize,
    pub pnl: f64,
    pub win_rate: f64,
    pub cumulative_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOfWeekStats {
    pub day: String,
    pub trades: usize,
    pub avg_pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPeriodStats {
    pub period: String,
    pub trades: usize,
    pub avg_pnl: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopPerformers {
    pub winners: Vec<TradeRef>,
    pub losers: Vec<TradeRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRef {
    pub ticker: String,
    pub market: Market,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub exit_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsistencyMetrics {
    /// Longest run of consecutive profitable calendar months.
    pub best_monthly_streak: usize,
    /// Profitable-month run ending at the most recent month.
    pub current_monthly_streak: usize,
    pub win_rate_stdev: f64,
    pub pnl_stdev: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_report_is_empty() {
        let report = AnalyticsReport::insufficient(3, 10);
        assert_eq!(report.summary.total_trades, 3);
        assert_eq!(report.summary.min_required, 10);
        assert!(!report.summary.has_enough_data);
        assert!((report.summary.win_rate - 0.0).abs() < f64::EPSILON);
        assert!((report.summary.total_pnl - 0.0).abs() < f64::EPSILON);
        assert!(report.exit_reasons.is_empty());
        assert!(report.monthly_data.is_empty());
        assert!(report.day_of_week.is_empty());
        assert!(report.holding_periods.is_empty());
        assert!(report.top_performers.winners.is_empty());
        assert_eq!(
            report.executive_metrics.sharpe_method,
            SharpeMethod::InsufficientData
        );
    }

    #[test]
    fn sharpe_method_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SharpeMethod::InsufficientData).unwrap(),
            "\"insufficient_data\""
        );
        assert_eq!(
            serde_json::to_string(&SharpeMethod::Portfolio).unwrap(),
            "\"portfolio\""
        );
    }

    #[test]
    fn report_serializes_contract_keys() {
        let report = AnalyticsReport::insufficient(0, 10);
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "summary",
            "executive_metrics",
            "advanced_metrics",
            "market_comparison",
            "exit_reasons",
            "monthly_data",
            "day_of_week",
            "holding_periods",
            "top_performers",
            "consistency_metrics",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        let exec = json.get("executive_metrics").unwrap();
        for key in [
            "sharpe_ratio",
            "sharpe_method",
            "max_drawdown",
            "recovery_factor",
            "expectancy",
            "profit_factor",
            "risk_reward_ratio",
        ] {
            assert!(exec.get(key).is_some(), "missing key {key}");
        }
    }
}
