//! SQLite journal adapter.
//!
//! Backs both the journal store and the local price cache. One file, five
//! tables; the pool keeps the CLI commands from fighting over a connection.

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::error::JournalError;
use crate::domain::signal::{Signal, SignalStatus};
use crate::domain::trade::{Market, PortfolioSnapshot, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;
use crate::ports::market_data_port::MarketDataPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| JournalError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| JournalError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, JournalError> {
        self.pool.get().map_err(|e: r2d2::Error| JournalError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker TEXT NOT NULL,
                market TEXT NOT NULL,
                entry_date TEXT NOT NULL,
                exit_date TEXT NOT NULL,
                shares REAL NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL NOT NULL,
                pnl REAL NOT NULL,
                pnl_percent REAL NOT NULL,
                exit_reason TEXT,
                holding_days INTEGER NOT NULL,
                tags TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_trades_exit_date ON trades(exit_date);
            CREATE TABLE IF NOT EXISTS snapshots (
                snapshot_date TEXT PRIMARY KEY,
                total_value REAL NOT NULL,
                cash_balance REAL NOT NULL,
                positions_value REAL NOT NULL,
                total_pnl REAL NOT NULL,
                position_count INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS signals (
                ticker TEXT NOT NULL,
                signal_date TEXT NOT NULL,
                market TEXT NOT NULL,
                rank INTEGER NOT NULL,
                momentum_percent REAL NOT NULL,
                price REAL NOT NULL,
                atr REAL NOT NULL,
                volatility REAL NOT NULL,
                status TEXT NOT NULL,
                allocation_amount REAL NOT NULL,
                suggested_shares REAL NOT NULL,
                estimated_total_cost REAL NOT NULL,
                PRIMARY KEY (ticker, signal_date)
            );
            CREATE TABLE IF NOT EXISTS prices (
                ticker TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL,
                PRIMARY KEY (ticker, date)
            );
            CREATE INDEX IF NOT EXISTS idx_prices_ticker ON prices(ticker);
            CREATE TABLE IF NOT EXISTS fx_rates (
                fetched_on TEXT PRIMARY KEY,
                rate REAL NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_trades(&self, trades: &[Trade]) -> Result<(), JournalError> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for trade in trades {
            tx.execute(
                "INSERT INTO trades (ticker, market, entry_date, exit_date, shares,
                     entry_price, exit_price, pnl, pnl_percent, exit_reason,
                     holding_days, tags)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    trade.ticker,
                    trade.market.as_str(),
                    trade.entry_date.format(DATE_FORMAT).to_string(),
                    trade.exit_date.format(DATE_FORMAT).to_string(),
                    trade.shares,
                    trade.entry_price,
                    trade.exit_price,
                    trade.pnl,
                    trade.pnl_percent,
                    trade.exit_reason,
                    trade.holding_days,
                    trade.tags.join(","),
                ],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    pub fn insert_snapshots(&self, snapshots: &[PortfolioSnapshot]) -> Result<(), JournalError> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for snapshot in snapshots {
            tx.execute(
                "INSERT OR REPLACE INTO snapshots (snapshot_date, total_value,
                     cash_balance, positions_value, total_pnl, position_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    snapshot.snapshot_date.format(DATE_FORMAT).to_string(),
                    snapshot.total_value,
                    snapshot.cash_balance,
                    snapshot.positions_value,
                    snapshot.total_pnl,
                    snapshot.position_count as i64,
                ],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    /// Cache daily closes. A `None` close records the session as missing so
    /// the gap policy sees it.
    pub fn insert_closes(
        &self,
        ticker: &str,
        closes: &[(NaiveDate, Option<f64>)],
    ) -> Result<(), JournalError> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for (date, close) in closes {
            tx.execute(
                "INSERT OR REPLACE INTO prices (ticker, date, close) VALUES (?1, ?2, ?3)",
                params![ticker, date.format(DATE_FORMAT).to_string(), close],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })
    }

    pub fn store_fx_rate(&self, fetched_on: NaiveDate, rate: f64) -> Result<(), JournalError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO fx_rates (fetched_on, rate) VALUES (?1, ?2)",
            params![fetched_on.format(DATE_FORMAT).to_string(), rate],
        )
        .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            date_str.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn parse_market(market_str: &str) -> Result<Market, rusqlite::Error> {
    Market::parse(market_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            market_str.len(),
            rusqlite::types::Type::Text,
            format!("unknown market {market_str}").into(),
        )
    })
}

fn snapshot_from_row(row: &rusqlite::Row<'_>) -> Result<PortfolioSnapshot, rusqlite::Error> {
    let date_str: String = row.get(0)?;
    let position_count: i64 = row.get(5)?;
    Ok(PortfolioSnapshot {
        snapshot_date: parse_date(&date_str)?,
        total_value: row.get(1)?,
        cash_balance: row.get(2)?,
        positions_value: row.get(3)?,
        total_pnl: row.get(4)?,
        position_count: position_count as usize,
    })
}

impl JournalPort for SqliteAdapter {
    fn load_trades(&self) -> Result<Vec<Trade>, JournalError> {
        let conn = self.conn()?;

        let query = "SELECT ticker, market, entry_date, exit_date, shares, entry_price,
                            exit_price, pnl, pnl_percent, exit_reason, holding_days, tags
                     FROM trades ORDER BY exit_date ASC, id ASC";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                let market_str: String = row.get(1)?;
                let entry_str: String = row.get(2)?;
                let exit_str: String = row.get(3)?;
                let tags_str: String = row.get(11)?;
                Ok(Trade {
                    ticker: row.get(0)?,
                    market: parse_market(&market_str)?,
                    entry_date: parse_date(&entry_str)?,
                    exit_date: parse_date(&exit_str)?,
                    shares: row.get(4)?,
                    entry_price: row.get(5)?,
                    exit_price: row.get(6)?,
                    pnl: row.get(7)?,
                    pnl_percent: row.get(8)?,
                    exit_reason: row.get(9)?,
                    holding_days: row.get(10)?,
                    tags: if tags_str.is_empty() {
                        Vec::new()
                    } else {
                        tags_str.split(',').map(String::from).collect()
                    },
                })
            })
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(trades)
    }

    fn load_snapshots(&self) -> Result<Vec<PortfolioSnapshot>, JournalError> {
        let conn = self.conn()?;

        let query = "SELECT snapshot_date, total_value, cash_balance, positions_value,
                            total_pnl, position_count
                     FROM snapshots ORDER BY snapshot_date ASC";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], snapshot_from_row)
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(snapshots)
    }

    fn latest_snapshot(&self) -> Result<Option<PortfolioSnapshot>, JournalError> {
        let conn = self.conn()?;

        let query = "SELECT snapshot_date, total_value, cash_balance, positions_value,
                            total_pnl, position_count
                     FROM snapshots ORDER BY snapshot_date DESC LIMIT 1";

        let result = conn.query_row(query, [], snapshot_from_row);
        match result {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(JournalError::DatabaseQuery {
                reason: e.to_string(),
            }),
        }
    }

    fn save_signals(
        &self,
        signals: &[Signal],
        signal_date: NaiveDate,
    ) -> Result<(), JournalError> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for signal in signals {
            tx.execute(
                "INSERT OR REPLACE INTO signals (ticker, signal_date, market, rank,
                     momentum_percent, price, atr, volatility, status,
                     allocation_amount, suggested_shares, estimated_total_cost)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    signal.ticker,
                    signal_date.format(DATE_FORMAT).to_string(),
                    signal.market.as_str(),
                    signal.rank as i64,
                    signal.momentum_percent,
                    signal.price,
                    signal.atr,
                    signal.volatility,
                    signal.status.as_str(),
                    signal.allocation_amount,
                    signal.suggested_shares,
                    signal.estimated_total_cost,
                ],
            )
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}

impl MarketDataPort for SqliteAdapter {
    fn fetch_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Option<f64>>, JournalError> {
        let conn = self.conn()?;

        let start_str = start_date.format(DATE_FORMAT).to_string();
        let end_str = end_date.format(DATE_FORMAT).to_string();

        let query = "SELECT close FROM prices
                     WHERE ticker = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn
            .prepare(query)
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![ticker, start_str, end_str], |row| row.get(0))
            .map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut closes = Vec::new();
        for row in rows {
            closes.push(row.map_err(|e: rusqlite::Error| JournalError::DatabaseQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(closes)
    }

    fn fetch_fx_rate(&self) -> Result<Option<f64>, JournalError> {
        let conn = self.conn()?;

        let query = "SELECT rate FROM fx_rates ORDER BY fetched_on DESC LIMIT 1";

        let result: Result<f64, rusqlite::Error> = conn.query_row(query, [], |row| row.get(0));
        match result {
            Ok(rate) => Ok(Some(rate)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(JournalError::DatabaseQuery {
                reason: e.to_string(),
            }),
        }
    }
}
