//! Journal records: closed trades and portfolio snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Home market of an instrument. The portfolio base currency is GBP; US
/// holdings are normalized through the live GBP/USD rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "UK")]
    Uk,
}

/// Estimated dealing cost as a fraction of gross cost. The UK rate folds in
/// stamp duty.
pub const UK_FEE_RATE: f64 = 0.005;
pub const US_FEE_RATE: f64 = 0.0015;

impl Market {
    pub fn fee_rate(&self) -> f64 {
        match self {
            Market::Uk => UK_FEE_RATE,
            Market::Us => US_FEE_RATE,
        }
    }

    /// London-listed tickers carry the exchange suffix (e.g. `FRES.L`).
    pub fn from_ticker(ticker: &str) -> Market {
        if ticker.to_uppercase().ends_with(".L") {
            Market::Uk
        } else {
            Market::Us
        }
    }

    pub fn parse(s: &str) -> Option<Market> {
        match s.trim().to_uppercase().as_str() {
            "US" => Some(Market::Us),
            "UK" => Some(Market::Uk),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Us => "US",
            Market::Uk => "UK",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed position. Immutable once recorded; pnl is signed and expressed
/// in the portfolio base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub ticker: String,
    pub market: Market,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub shares: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub exit_reason: Option<String>,
    pub holding_days: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Trade {
    /// Win means strictly positive pnl; a breakeven trade counts as a loss
    /// everywhere the win/loss split appears.
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Capital committed at entry, used for capital efficiency.
    pub fn entry_value(&self) -> f64 {
        self.entry_price * self.shares
    }

    /// Label used by the exit-reason breakdown when none was recorded.
    pub fn exit_reason_label(&self) -> &str {
        self.exit_reason.as_deref().unwrap_or("Manual Exit")
    }
}

/// Daily valuation of the whole portfolio. Input may arrive gappy and out of
/// order; consumers sort by `snapshot_date` before use. The identity
/// total_value = cash_balance + positions_value is assumed, not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub snapshot_date: NaiveDate,
    pub total_value: f64,
    pub cash_balance: f64,
    pub positions_value: f64,
    pub total_pnl: f64,
    pub position_count: usize,
}
