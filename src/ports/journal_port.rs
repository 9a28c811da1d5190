//! Journal storage port trait.

use chrono::NaiveDate;

use crate::domain::error::JournalError;
use crate::domain::signal::Signal;
use crate::domain::trade::{PortfolioSnapshot, Trade};

pub trait JournalPort {
    /// All closed trades, in storage order. Callers sort as needed.
    fn load_trades(&self) -> Result<Vec<Trade>, JournalError>;

    fn load_snapshots(&self) -> Result<Vec<PortfolioSnapshot>, JournalError>;

    /// Most recent snapshot by date, if any exist.
    fn latest_snapshot(&self) -> Result<Option<PortfolioSnapshot>, JournalError>;

    fn save_signals(&self, signals: &[Signal], signal_date: NaiveDate)
        -> Result<(), JournalError>;
}
