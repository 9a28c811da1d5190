//! Market data access port trait.
//!
//! The analytics core consumes already-fetched series; this trait is how
//! the CLI assembles them. Missing sessions come through as `None` so the
//! generator's gap policy stays in the domain.

use chrono::NaiveDate;

use crate::domain::error::JournalError;

pub trait MarketDataPort {
    /// Daily closes for `ticker` between the dates inclusive, one entry per
    /// stored session, `None` where the close is missing.
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Option<f64>>, JournalError>;

    /// Latest GBP/USD rate, if one is stored.
    fn fetch_fx_rate(&self) -> Result<Option<f64>, JournalError>;
}
