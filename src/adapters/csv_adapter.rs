//! CSV import adapter.
//!
//! Column order is fixed and documented per reader; a header row is
//! expected and skipped. Every malformed row reports its file and row
//! number so a long import points at the exact line to fix.

use chrono::NaiveDate;
use std::path::Path;

use crate::domain::error::JournalError;
use crate::domain::trade::{Market, PortfolioSnapshot, Trade};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn row_error(path: &Path, row: usize, reason: impl Into<String>) -> JournalError {
    JournalError::ImportRow {
        file: path.display().to_string(),
        row,
        reason: reason.into(),
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    path: &Path,
    row: usize,
) -> Result<&'r str, JournalError> {
    record
        .get(index)
        .ok_or_else(|| row_error(path, row, format!("missing {name} column")))
}

fn parse_date_field(
    value: &str,
    name: &str,
    path: &Path,
    row: usize,
) -> Result<NaiveDate, JournalError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| row_error(path, row, format!("invalid {name}: {e}")))
}

fn parse_f64_field(value: &str, name: &str, path: &Path, row: usize) -> Result<f64, JournalError> {
    value
        .trim()
        .parse()
        .map_err(|e| row_error(path, row, format!("invalid {name}: {e}")))
}

/// Read closed trades from a CSV with columns:
/// ticker, market, entry_date, exit_date, shares, entry_price, exit_price,
/// pnl, pnl_percent, exit_reason, holding_days, tags.
/// An empty market derives from the ticker suffix; tags are
/// semicolon-separated.
pub fn read_trades<P: AsRef<Path>>(path: P) -> Result<Vec<Trade>, JournalError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| JournalError::ImportRow {
        file: path.display().to_string(),
        row: 0,
        reason: e.to_string(),
    })?;

    let mut trades = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 2; // 1-based, after the header
        let record = result.map_err(|e| row_error(path, row, e.to_string()))?;

        let ticker = field(&record, 0, "ticker", path, row)?.trim().to_string();
        if ticker.is_empty() {
            return Err(row_error(path, row, "empty ticker"));
        }

        let market_str = field(&record, 1, "market", path, row)?.trim();
        let market = if market_str.is_empty() {
            Market::from_ticker(&ticker)
        } else {
            Market::parse(market_str)
                .ok_or_else(|| row_error(path, row, format!("unknown market {market_str}")))?
        };

        let entry_date =
            parse_date_field(field(&record, 2, "entry_date", path, row)?, "entry_date", path, row)?;
        let exit_date =
            parse_date_field(field(&record, 3, "exit_date", path, row)?, "exit_date", path, row)?;

        let exit_reason = field(&record, 9, "exit_reason", path, row)?.trim();
        let holding_days: i64 = field(&record, 10, "holding_days", path, row)?
            .trim()
            .parse()
            .map_err(|e| row_error(path, row, format!("invalid holding_days: {e}")))?;
        if holding_days < 0 {
            return Err(row_error(path, row, "negative holding_days"));
        }

        let tags_str = record.get(11).unwrap_or("").trim();

        trades.push(Trade {
            market,
            entry_date,
            exit_date,
            shares: parse_f64_field(field(&record, 4, "shares", path, row)?, "shares", path, row)?,
            entry_price: parse_f64_field(
                field(&record, 5, "entry_price", path, row)?,
                "entry_price",
                path,
                row,
            )?,
            exit_price: parse_f64_field(
                field(&record, 6, "exit_price", path, row)?,
                "exit_price",
                path,
                row,
            )?,
            pnl: parse_f64_field(field(&record, 7, "pnl", path, row)?, "pnl", path, row)?,
            pnl_percent: parse_f64_field(
                field(&record, 8, "pnl_percent", path, row)?,
                "pnl_percent",
                path,
                row,
            )?,
            exit_reason: if exit_reason.is_empty() {
                None
            } else {
                Some(exit_reason.to_string())
            },
            holding_days,
            tags: if tags_str.is_empty() {
                Vec::new()
            } else {
                tags_str.split(';').map(|t| t.trim().to_string()).collect()
            },
            ticker,
        });
    }

    Ok(trades)
}

/// Read portfolio snapshots from a CSV with columns:
/// snapshot_date, total_value, cash_balance, positions_value, total_pnl,
/// position_count.
pub fn read_snapshots<P: AsRef<Path>>(path: P) -> Result<Vec<PortfolioSnapshot>, JournalError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| JournalError::ImportRow {
        file: path.display().to_string(),
        row: 0,
        reason: e.to_string(),
    })?;

    let mut snapshots = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = result.map_err(|e| row_error(path, row, e.to_string()))?;

        let position_count: usize = field(&record, 5, "position_count", path, row)?
            .trim()
            .parse()
            .map_err(|e| row_error(path, row, format!("invalid position_count: {e}")))?;

        snapshots.push(PortfolioSnapshot {
            snapshot_date: parse_date_field(
                field(&record, 0, "snapshot_date", path, row)?,
                "snapshot_date",
                path,
                row,
            )?,
            total_value: parse_f64_field(
                field(&record, 1, "total_value", path, row)?,
                "total_value",
                path,
                row,
            )?,
            cash_balance: parse_f64_field(
                field(&record, 2, "cash_balance", path, row)?,
                "cash_balance",
                path,
                row,
            )?,
            positions_value: parse_f64_field(
                field(&record, 3, "positions_value", path, row)?,
                "positions_value",
                path,
                row,
            )?,
            total_pnl: parse_f64_field(
                field(&record, 4, "total_pnl", path, row)?,
                "total_pnl",
                path,
                row,
            )?,
            position_count,
        });
    }

    Ok(snapshots)
}

/// Read daily closes from a CSV with columns: ticker, date, close. An empty
/// close marks the session as missing.
pub fn read_closes<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<(String, NaiveDate, Option<f64>)>, JournalError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| JournalError::ImportRow {
        file: path.display().to_string(),
        row: 0,
        reason: e.to_string(),
    })?;

    let mut closes = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = result.map_err(|e| row_error(path, row, e.to_string()))?;

        let ticker = field(&record, 0, "ticker", path, row)?.trim().to_string();
        let date = parse_date_field(field(&record, 1, "date", path, row)?, "date", path, row)?;
        let close_str = field(&record, 2, "close", path, row)?.trim();
        let close = if close_str.is_empty() {
            None
        } else {
            Some(parse_f64_field(close_str, "close", path, row)?)
        };

        closes.push((ticker, date, close));
    }

    Ok(closes)
}
