//! CLI definition and dispatch.
//!
//! Progress and diagnostics go to stderr; stdout carries only the JSON
//! payload of the command, so output can be piped straight into other
//! tooling.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::JournalError;

/// Fallback GBP/USD rate used when no stored rate is available. Fail-open:
/// a stale-but-plausible rate beats refusing to produce signals.
pub const DEFAULT_GBP_USD: f64 = 1.27;

#[derive(Parser, Debug)]
#[command(name = "tradelog", about = "Trading journal analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Produce the full analytics report as JSON
    Report {
        #[arg(short, long)]
        config: PathBuf,
        /// Reporting period (all_time, last_7_days, last_month, last_quarter, last_year, ytd)
        #[arg(short, long)]
        period: Option<String>,
        #[arg(long)]
        min_trades: Option<usize>,
        /// Reference date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate momentum signals for the configured universe
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        /// Signal date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Override available cash (defaults to the latest snapshot's cash balance)
        #[arg(long)]
        cash: Option<f64>,
        /// Override the GBP/USD rate
        #[arg(long)]
        fx: Option<f64>,
        /// Write the JSON run here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Size a position from entry, stop and risk budget
    Size {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        stop: f64,
        /// Risk budget as a percent of portfolio value
        #[arg(long)]
        risk: f64,
        /// Market of the instrument (US or UK)
        #[arg(long)]
        market: String,
        /// Caller-supplied GBP/USD override for US sizing
        #[arg(long)]
        fx: Option<f64>,
        /// Override available cash
        #[arg(long)]
        cash: Option<f64>,
        /// Write the JSON result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import closed trades from a CSV file
    ImportTrades {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Import portfolio snapshots from a CSV file
    ImportSnapshots {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Import daily closes from a CSV file
    ImportPrices {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        file: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report {
            config,
            period,
            min_trades,
            date,
            output,
        } => run_report(&config, period.as_deref(), min_trades, date, output.as_ref()),
        Command::Signals {
            config,
            date,
            cash,
            fx,
            output,
        } => run_signals(&config, date, cash, fx, output.as_ref()),
        Command::Size {
            config,
            entry,
            stop,
            risk,
            market,
            fx,
            cash,
            output,
        } => run_size(&config, entry, stop, risk, &market, fx, cash, output.as_ref()),
        Command::ImportTrades { config, file } => run_import(&config, &file, Import::Trades),
        Command::ImportSnapshots { config, file } => run_import(&config, &file, Import::Snapshots),
        Command::ImportPrices { config, file } => run_import(&config, &file, Import::Prices),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = JournalError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

enum Import {
    Trades,
    Snapshots,
    Prices,
}

#[cfg(feature = "sqlite")]
mod with_sqlite {
    use super::*;
    use chrono::{Duration, Local};
    use std::collections::{BTreeMap, HashSet};
    use std::path::Path;

    use crate::adapters::csv_adapter;
    use crate::adapters::sqlite_adapter::SqliteAdapter;
    use crate::adapters::stderr_telemetry::StderrTelemetry;
    use crate::domain::metrics::{self, DEFAULT_MIN_TRADES};
    use crate::domain::period::Period;
    use crate::domain::signal::{self, PriceSeries, SignalParams};
    use crate::domain::sizing::{self, SizingRequest};
    use crate::domain::trade::Market;
    use crate::ports::config_port::ConfigPort;
    use crate::ports::journal_port::JournalPort;
    use crate::ports::market_data_port::MarketDataPort;
    use crate::ports::telemetry_port::TelemetryPort;

    fn open_journal(adapter: &FileConfigAdapter) -> Result<SqliteAdapter, ExitCode> {
        let journal = SqliteAdapter::from_config(adapter).map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        })?;
        journal.initialize_schema().map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        })?;
        Ok(journal)
    }

    fn emit_json<T: serde::Serialize>(value: &T, output: Option<&PathBuf>) -> ExitCode {
        let json = match serde_json::to_string_pretty(value) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("error: failed to serialize output: {e}");
                return ExitCode::from(1);
            }
        };
        match output {
            Some(path) => {
                if let Err(e) = std::fs::write(path, &json) {
                    eprintln!("error: failed to write {}: {e}", path.display());
                    return ExitCode::from(1);
                }
                eprintln!("Wrote {}", path.display());
                ExitCode::SUCCESS
            }
            None => {
                println!("{json}");
                ExitCode::SUCCESS
            }
        }
    }

    pub fn run_report(
        config_path: &PathBuf,
        period_arg: Option<&str>,
        min_trades_arg: Option<usize>,
        date_arg: Option<NaiveDate>,
        output: Option<&PathBuf>,
    ) -> ExitCode {
        eprintln!("Loading config from {}", config_path.display());
        let adapter = match load_config(config_path) {
            Ok(a) => a,
            Err(code) => return code,
        };

        let period_str = period_arg
            .map(String::from)
            .or_else(|| adapter.get_string("journal", "period"))
            .unwrap_or_else(|| "all_time".to_string());
        let Some(period) = Period::parse(&period_str) else {
            let err = JournalError::ConfigInvalid {
                section: "journal".into(),
                key: "period".into(),
                reason: format!("unknown period {period_str}"),
            };
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        };

        let min_trades = min_trades_arg
            .unwrap_or_else(|| adapter.get_usize("journal", "min_trades", DEFAULT_MIN_TRADES));
        let today = date_arg.unwrap_or_else(|| Local::now().date_naive());

        let journal = match open_journal(&adapter) {
            Ok(j) => j,
            Err(code) => return code,
        };

        eprintln!("Loading journal...");
        let trades = match journal.load_trades() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };
        let snapshots = match journal.load_snapshots() {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };

        eprintln!(
            "Computing {period} report over {} trades, {} snapshots",
            trades.len(),
            snapshots.len()
        );
        let report = metrics::compute_report(&trades, &snapshots, period, today, min_trades);
        emit_json(&report, output)
    }

    fn signal_params(adapter: &dyn ConfigPort) -> SignalParams {
        let defaults = SignalParams::default();
        SignalParams {
            lookback_days: adapter.get_usize("signals", "lookback_days", defaults.lookback_days),
            top_n: adapter.get_usize("signals", "top_n", defaults.top_n),
            ma_period: adapter.get_usize("signals", "ma_period", defaults.ma_period),
            atr_period: adapter.get_usize("signals", "atr_period", defaults.atr_period),
            volatility_window: adapter.get_usize(
                "signals",
                "volatility_window",
                defaults.volatility_window,
            ),
            min_position_pct: adapter.get_double(
                "signals",
                "min_position_pct",
                defaults.min_position_pct,
            ),
            max_position_pct: adapter.get_double(
                "signals",
                "max_position_pct",
                defaults.max_position_pct,
            ),
        }
    }

    fn comma_list(value: Option<String>) -> Vec<String> {
        value
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn index_closes(
        journal: &SqliteAdapter,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<Vec<f64>> {
        match journal.fetch_closes(ticker, start, end) {
            Ok(raw) => {
                let closes = signal::forward_fill(&raw);
                if closes.is_empty() { None } else { Some(closes) }
            }
            Err(e) => {
                eprintln!("warning: index {ticker} unavailable ({e})");
                None
            }
        }
    }

    pub fn run_signals(
        config_path: &PathBuf,
        date_arg: Option<NaiveDate>,
        cash_arg: Option<f64>,
        fx_arg: Option<f64>,
        output: Option<&PathBuf>,
    ) -> ExitCode {
        eprintln!("Loading config from {}", config_path.display());
        let adapter = match load_config(config_path) {
            Ok(a) => a,
            Err(code) => return code,
        };

        let universe_tickers = comma_list(adapter.get_string("signals", "universe"));
        if universe_tickers.is_empty() {
            let err = JournalError::ConfigMissing {
                section: "signals".into(),
                key: "universe".into(),
            };
            eprintln!("error: {err}");
            return ExitCode::from(&err);
        }
        let held: HashSet<String> = comma_list(adapter.get_string("signals", "held"))
            .into_iter()
            .collect();
        let params = signal_params(&adapter);
        let us_index_ticker = adapter
            .get_string("signals", "us_index")
            .unwrap_or_else(|| "SPY".to_string());
        let uk_index_ticker = adapter
            .get_string("signals", "uk_index")
            .unwrap_or_else(|| "^FTSE".to_string());

        let journal = match open_journal(&adapter) {
            Ok(j) => j,
            Err(code) => return code,
        };

        let signal_date = date_arg.unwrap_or_else(|| Local::now().date_naive());
        // Calendar window with slack over the session counts the filters
        // need; the generator enforces the exact minimums.
        let window_days = params.lookback_days.max(params.ma_period) as i64 * 2;
        let start = signal_date - Duration::days(window_days);

        eprintln!("Loading price history for {} tickers...", universe_tickers.len());
        let mut universe = Vec::with_capacity(universe_tickers.len());
        for ticker in &universe_tickers {
            match journal.fetch_closes(ticker, start, signal_date) {
                Ok(closes) => universe.push(PriceSeries {
                    ticker: ticker.clone(),
                    closes,
                }),
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            }
        }

        let us_index = index_closes(&journal, &us_index_ticker, start, signal_date);
        let uk_index = index_closes(&journal, &uk_index_ticker, start, signal_date);

        let telemetry = StderrTelemetry;
        let fx_rate = match fx_arg {
            Some(rate) => rate,
            None => match journal.fetch_fx_rate() {
                Ok(Some(rate)) => rate,
                Ok(None) => {
                    telemetry.event(
                        "signals",
                        &format!("no stored FX rate, using default {DEFAULT_GBP_USD}"),
                    );
                    DEFAULT_GBP_USD
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            },
        };

        let available_cash = match cash_arg {
            Some(cash) => cash,
            None => match journal.latest_snapshot() {
                Ok(Some(snapshot)) => snapshot.cash_balance,
                Ok(None) => {
                    telemetry.event("signals", "no snapshot on file, assuming zero cash");
                    0.0
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::from(&e);
                }
            },
        };

        eprintln!("Generating signals for {signal_date}...");
        let run = match signal::generate_signals(
            &universe,
            us_index.as_deref(),
            uk_index.as_deref(),
            fx_rate,
            &params,
            &held,
            available_cash,
            signal_date,
            &telemetry,
        ) {
            Ok(run) => run,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };

        if let Err(e) = journal.save_signals(&run.signals, signal_date) {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }

        emit_json(&run, output)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn run_size(
        config_path: &PathBuf,
        entry: f64,
        stop: f64,
        risk: f64,
        market_str: &str,
        fx_arg: Option<f64>,
        cash_arg: Option<f64>,
        output: Option<&PathBuf>,
    ) -> ExitCode {
        let adapter = match load_config(config_path) {
            Ok(a) => a,
            Err(code) => return code,
        };

        let Some(market) = Market::parse(market_str) else {
            eprintln!("error: unknown market {market_str} (expected US or UK)");
            return ExitCode::from(2);
        };

        let journal = match open_journal(&adapter) {
            Ok(j) => j,
            Err(code) => return code,
        };

        let latest = match journal.latest_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };
        let portfolio_value = latest.as_ref().map(|s| s.total_value);
        let available_cash =
            cash_arg.unwrap_or_else(|| latest.as_ref().map(|s| s.cash_balance).unwrap_or(0.0));

        let live_fx = match journal.fetch_fx_rate() {
            Ok(rate) => rate.unwrap_or(DEFAULT_GBP_USD),
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };

        let request = SizingRequest {
            entry_price: entry,
            stop_price: stop,
            risk_percent: risk,
            market,
            fx_rate: fx_arg,
        };
        // Invalid outcomes are data, not failures: still exit 0.
        let result = sizing::size_position(&request, available_cash, portfolio_value, live_fx);
        emit_json(&result, output)
    }

    pub fn run_import(config_path: &PathBuf, file: &Path, kind: Import) -> ExitCode {
        let adapter = match load_config(config_path) {
            Ok(a) => a,
            Err(code) => return code,
        };
        let journal = match open_journal(&adapter) {
            Ok(j) => j,
            Err(code) => return code,
        };

        let outcome = match kind {
            Import::Trades => csv_adapter::read_trades(file).and_then(|trades| {
                journal.insert_trades(&trades)?;
                Ok(format!("Imported {} trades", trades.len()))
            }),
            Import::Snapshots => csv_adapter::read_snapshots(file).and_then(|snapshots| {
                journal.insert_snapshots(&snapshots)?;
                Ok(format!("Imported {} snapshots", snapshots.len()))
            }),
            Import::Prices => csv_adapter::read_closes(file).and_then(|closes| {
                let mut by_ticker: BTreeMap<String, Vec<(NaiveDate, Option<f64>)>> =
                    BTreeMap::new();
                for (ticker, date, close) in closes {
                    by_ticker.entry(ticker).or_default().push((date, close));
                }
                let mut rows = 0;
                for (ticker, series) in &by_ticker {
                    journal.insert_closes(ticker, series)?;
                    rows += series.len();
                }
                Ok(format!("Imported {rows} closes for {} tickers", by_ticker.len()))
            }),
        };

        match outcome {
            Ok(message) => {
                eprintln!("{message}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            }
        }
    }
}

#[cfg(feature = "sqlite")]
use with_sqlite::{run_import, run_report, run_signals, run_size};

#[cfg(not(feature = "sqlite"))]
mod without_sqlite {
    use super::*;
    use std::path::Path;

    fn unavailable(command: &str) -> ExitCode {
        eprintln!("error: sqlite feature is required for {command}");
        ExitCode::from(1)
    }

    pub fn run_report(
        _config: &PathBuf,
        _period: Option<&str>,
        _min_trades: Option<usize>,
        _date: Option<NaiveDate>,
        _output: Option<&PathBuf>,
    ) -> ExitCode {
        unavailable("report")
    }

    pub fn run_signals(
        _config: &PathBuf,
        _date: Option<NaiveDate>,
        _cash: Option<f64>,
        _fx: Option<f64>,
        _output: Option<&PathBuf>,
    ) -> ExitCode {
        unavailable("signals")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn run_size(
        _config: &PathBuf,
        _entry: f64,
        _stop: f64,
        _risk: f64,
        _market: &str,
        _fx: Option<f64>,
        _cash: Option<f64>,
        _output: Option<&PathBuf>,
    ) -> ExitCode {
        unavailable("size")
    }

    pub fn run_import(_config: &PathBuf, _file: &Path, _kind: Import) -> ExitCode {
        unavailable("import")
    }
}

#[cfg(not(feature = "sqlite"))]
use without_sqlite::{run_import, run_report, run_signals, run_size};
