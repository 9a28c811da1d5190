//! Reporting period filter.
//!
//! The reference date is an explicit parameter so the metrics engine stays a
//! pure function; only the CLI consults the system clock.

use chrono::{Datelike, Duration, NaiveDate};

use super::trade::{PortfolioSnapshot, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    AllTime,
    Last7Days,
    LastMonth,
    LastQuarter,
    LastYear,
    YearToDate,
}

impl Period {
    pub fn parse(s: &str) -> Option<Period> {
        match s.trim().to_lowercase().as_str() {
            "all_time" => Some(Period::AllTime),
            "last_7_days" => Some(Period::Last7Days),
            "last_month" => Some(Period::LastMonth),
            "last_quarter" => Some(Period::LastQuarter),
            "last_year" => Some(Period::LastYear),
            "ytd" => Some(Period::YearToDate),
            _ => None,
        }
    }

    /// Earliest date (inclusive) admitted by this period, or None for
    /// all-time.
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::AllTime => None,
            Period::Last7Days => Some(today - Duration::days(7)),
            Period::LastMonth => Some(today - Duration::days(30)),
            Period::LastQuarter => Some(today - Duration::days(90)),
            Period::LastYear => Some(today - Duration::days(365)),
            Period::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
        }
    }

    /// Trades are filtered on exit date.
    pub fn filter_trades<'a>(&self, trades: &'a [Trade], today: NaiveDate) -> Vec<&'a Trade> {
        match self.cutoff(today) {
            None => trades.iter().collect(),
            Some(cutoff) => trades.iter().filter(|t| t.exit_date >= cutoff).collect(),
        }
    }

    /// Snapshots are filtered on snapshot date.
    pub fn filter_snapshots<'a>(
        &self,
        snapshots: &'a [PortfolioSnapshot],
        today: NaiveDate,
    ) -> Vec<&'a PortfolioSnapshot> {
        match self.cutoff(today) {
            None => snapshots.iter().collect(),
            Some(cutoff) => snapshots
                .iter()
                .filter(|s| s.snapshot_date >= cutoff)
                .collect(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Period::AllTime => "all_time",
            Period::Last7Days => "last_7_days",
            Period::LastMonth => "last_month",
            Period::LastQuarter => "last_quarter",
            Period::LastYear => "last_year",
            Period::YearToDate => "ytd",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::Market;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trade_exiting(exit: NaiveDate) -> Trade {
        Trade {
            ticker: "MU".into(),
            market: Market::Us,
            entry_date: exit - Duration::days(5),
            exit_date: exit,
            shares: 1.0,
            entry_price: 100.0,
            exit_price: 101.0,
            pnl: 1.0,
            pnl_percent: 1.0,
            exit_reason: None,
            holding_days: 5,
            tags: vec![],
        }
    }

    fn snapshot_on(day: NaiveDate) -> PortfolioSnapshot {
        PortfolioSnapshot {
            snapshot_date: day,
            total_value: 5000.0,
            cash_balance: 1000.0,
            positions_value: 4000.0,
            total_pnl: 0.0,
            position_count: 3,
        }
    }

    #[test]
    fn parse_all_labels() {
        assert_eq!(Period::parse("all_time"), Some(Period::AllTime));
        assert_eq!(Period::parse("last_7_days"), Some(Period::Last7Days));
        assert_eq!(Period::parse("last_month"), Some(Period::LastMonth));
        assert_eq!(Period::parse("last_quarter"), Some(Period::LastQuarter));
        assert_eq!(Period::parse("last_year"), Some(Period::LastYear));
        assert_eq!(Period::parse("YTD"), Some(Period::YearToDate));
        assert_eq!(Period::parse("fortnight"), None);
    }

    #[test]
    fn all_time_passes_everything() {
        let trades = vec![trade_exiting(date(1999, 1, 1)), trade_exiting(date(2026, 2, 1))];
        let filtered = Period::AllTime.filter_trades(&trades, date(2026, 8, 25));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn cutoff_day_is_included() {
        let today = date(2026, 8, 25);
        let trades = vec![
            trade_exiting(date(2026, 8, 18)), // exactly 7 days back
            trade_exiting(date(2026, 8, 17)),
        ];
        let filtered = Period::Last7Days.filter_trades(&trades, today);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].exit_date, date(2026, 8, 18));
    }

    #[test]
    fn ytd_cuts_at_january_first() {
        let today = date(2026, 8, 25);
        assert_eq!(Period::YearToDate.cutoff(today), Some(date(2026, 1, 1)));
        let snaps = vec![snapshot_on(date(2025, 12, 31)), snapshot_on(date(2026, 1, 1))];
        let filtered = Period::YearToDate.filter_snapshots(&snaps, today);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].snapshot_date, date(2026, 1, 1));
    }

    #[test]
    fn named_windows() {
        let today = date(2026, 8, 25);
        assert_eq!(Period::LastMonth.cutoff(today), Some(date(2026, 7, 26)));
        assert_eq!(Period::LastQuarter.cutoff(today), Some(date(2026, 5, 27)));
        assert_eq!(Period::LastYear.cutoff(today), Some(date(2025, 8, 25)));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for p in [
            Period::AllTime,
            Period::Last7Days,
            Period::LastMonth,
            Period::LastQuarter,
            Period::LastYear,
            Period::YearToDate,
        ] {
            assert_eq!(Period::parse(&p.to_string()), Some(p));
        }
    }
}
