//! Momentum signal generation.
//!
//! The generator is a pure function over pre-fetched price histories: it
//! never touches the network. Candidates are ranked by trailing momentum,
//! filtered by trend and market regime, then sized equal-weight from the
//! available cash.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::JournalError;
use super::stats::{population_std_dev, trailing_sma};
use super::trade::Market;
use crate::ports::TelemetryPort;

/// Longest run of missing sessions that forward-filling will bridge.
/// Longer runs are dropped outright rather than papered over.
pub const MAX_FILL_GAP: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalParams {
    pub lookback_days: usize,
    pub top_n: usize,
    pub ma_period: usize,
    pub atr_period: usize,
    pub volatility_window: usize,
    pub min_position_pct: f64,
    pub max_position_pct: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        SignalParams {
            lookback_days: 90,
            top_n: 5,
            ma_period: 100,
            atr_period: 14,
            volatility_window: 20,
            min_position_pct: 0.05,
            max_position_pct: 0.25,
        }
    }
}

/// Raw close history for one ticker. `None` marks a missing session.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub ticker: String,
    pub closes: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    New,
    AlreadyHeld,
    Entered,
    Dismissed,
    Expired,
}

impl SignalStatus {
    pub fn parse(s: &str) -> Option<SignalStatus> {
        match s {
            "new" => Some(SignalStatus::New),
            "already_held" => Some(SignalStatus::AlreadyHeld),
            "entered" => Some(SignalStatus::Entered),
            "dismissed" => Some(SignalStatus::Dismissed),
            "expired" => Some(SignalStatus::Expired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::New => "new",
            SignalStatus::AlreadyHeld => "already_held",
            SignalStatus::Entered => "entered",
            SignalStatus::Dismissed => "dismissed",
            SignalStatus::Expired => "expired",
        }
    }
}

/// A ranked, sized trade candidate. Prices and ATR are normalized to the
/// portfolio base currency; UK minor units are divided by 100, US prices by
/// the live FX rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub market: Market,
    pub rank: usize,
    pub momentum_percent: f64,
    pub price: f64,
    pub atr: f64,
    pub volatility: f64,
    pub status: SignalStatus,
    pub allocation_amount: f64,
    pub suggested_shares: f64,
    pub estimated_total_cost: f64,
    pub signal_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketRegime {
    pub spy_risk_on: bool,
    pub ftse_risk_on: bool,
}

impl MarketRegime {
    fn allows(&self, market: Market) -> bool {
        match market {
            Market::Us => self.spy_risk_on,
            Market::Uk => self.ftse_risk_on,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRun {
    pub signals: Vec<Signal>,
    pub signals_generated: usize,
    pub new_signals: usize,
    pub already_held: usize,
    pub signal_date: NaiveDate,
    pub fx_rate: f64,
    pub available_cash: f64,
    pub market_regime: MarketRegime,
}

/// Bridge missing sessions with the prior close. Runs longer than
/// [`MAX_FILL_GAP`] are dropped, as are leading gaps with nothing to fill
/// from. Returns the compacted usable series.
pub fn forward_fill(closes: &[Option<f64>]) -> Vec<f64> {
    let mut filled = Vec::with_capacity(closes.len());
    let mut i = 0;
    while i < closes.len() {
        match closes[i] {
            Some(value) => {
                filled.push(value);
                i += 1;
            }
            None => {
                let run_start = i;
                while i < closes.len() && closes[i].is_none() {
                    i += 1;
                }
                let run_len = i - run_start;
                if let Some(&last) = filled.last() {
                    if run_len <= MAX_FILL_GAP {
                        filled.extend(std::iter::repeat(last).take(run_len));
                    }
                }
            }
        }
    }
    filled
}

/// Percent change over the trailing `lookback` observations, taken at the
/// latest close.
fn momentum_percent(closes: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || closes.len() < lookback {
        return None;
    }
    let base = closes[closes.len() - lookback];
    if base <= 0.0 {
        return None;
    }
    let latest = closes[closes.len() - 1];
    Some((latest - base) / base * 100.0)
}

/// Close-to-close ATR approximation: mean absolute step over the trailing
/// `period` steps.
fn close_to_close_atr(closes: &[f64], period: usize) -> f64 {
    let steps: Vec<f64> = closes
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .collect();
    if steps.is_empty() || period == 0 {
        return 0.0;
    }
    let tail = &steps[steps.len().saturating_sub(period)..];
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Population stdev of daily percent returns over the trailing window.
fn trailing_volatility(closes: &[f64], window: usize) -> f64 {
    let start = closes.len().saturating_sub(window + 1);
    let returns: Vec<f64> = closes[start..]
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect();
    population_std_dev(&returns)
}

/// Index is risk-on when its latest price sits above its own trailing MA.
/// Missing or short index data defaults to risk-on; an outage in index data
/// must not block the whole run.
fn regime_for(index: Option<&[f64]>, ma_period: usize) -> bool {
    let Some(closes) = index else {
        return true;
    };
    let Some(&latest) = closes.last() else {
        return true;
    };
    match trailing_sma(closes, ma_period) {
        Some(ma) => latest > ma,
        None => true,
    }
}

struct Candidate {
    ticker: String,
    market: Market,
    momentum: f64,
    rank: usize,
    native_price: f64,
    native_atr: f64,
    volatility: f64,
}

#[allow(clippy::too_many_arguments)]
pub fn generate_signals(
    universe: &[PriceSeries],
    us_index: Option<&[f64]>,
    uk_index: Option<&[f64]>,
    fx_rate: f64,
    params: &SignalParams,
    held: &HashSet<String>,
    available_cash: f64,
    signal_date: NaiveDate,
    telemetry: &dyn TelemetryPort,
) -> Result<SignalRun, JournalError> {
    let regime = MarketRegime {
        spy_risk_on: regime_for(us_index, params.ma_period),
        ftse_risk_on: regime_for(uk_index, params.ma_period),
    };

    // Quality filter: forward-fill, then require a full lookback of usable
    // observations.
    let mut usable: Vec<(String, Market, Vec<f64>)> = Vec::new();
    for series in universe {
        let closes = forward_fill(&series.closes);
        if closes.len() < params.lookback_days {
            telemetry.event(
                "signals",
                &format!(
                    "{}: dropped, {} usable closes of {} required",
                    series.ticker,
                    closes.len(),
                    params.lookback_days
                ),
            );
            continue;
        }
        usable.push((series.ticker.clone(), Market::from_ticker(&series.ticker), closes));
    }
    if usable.is_empty() {
        return Err(JournalError::NoPriceData);
    }

    // Momentum plus trend filter.
    let mut candidates: Vec<Candidate> = Vec::new();
    for (ticker, market, closes) in &usable {
        let Some(momentum) = momentum_percent(closes, params.lookback_days) else {
            continue;
        };
        let latest = closes[closes.len() - 1];
        match trailing_sma(closes, params.ma_period) {
            Some(ma) if latest > ma => {}
            _ => {
                telemetry.event("signals", &format!("{ticker}: below trend MA, dropped"));
                continue;
            }
        }
        candidates.push(Candidate {
            ticker: ticker.clone(),
            market: *market,
            momentum,
            rank: 0,
            native_price: latest,
            native_atr: close_to_close_atr(closes, params.atr_period),
            volatility: trailing_volatility(closes, params.volatility_window),
        });
    }

    // Stable momentum-descending rank; insertion order breaks ties.
    candidates.sort_by(|a, b| {
        b.momentum
            .partial_cmp(&a.momentum)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    candidates.truncate(params.top_n);

    // Regime and volatility filters run after ranking; assigned ranks keep
    // their values so a survivor's rank reflects its momentum standing.
    candidates.retain(|c| {
        if !regime.allows(c.market) {
            telemetry.event(
                "signals",
                &format!("{}: home market risk-off, dropped", c.ticker),
            );
            return false;
        }
        if c.volatility <= 0.0 || c.volatility.is_nan() {
            telemetry.event(
                "signals",
                &format!("{}: volatility undefined, dropped", c.ticker),
            );
            return false;
        }
        true
    });

    let mut signals: Vec<Signal> = candidates
        .into_iter()
        .map(|c| {
            let (price, atr) = match c.market {
                Market::Uk => (c.native_price / 100.0, c.native_atr / 100.0),
                Market::Us => (c.native_price / fx_rate, c.native_atr / fx_rate),
            };
            let status = if held.contains(&c.ticker) {
                SignalStatus::AlreadyHeld
            } else {
                SignalStatus::New
            };
            Signal {
                ticker: c.ticker,
                market: c.market,
                rank: c.rank,
                momentum_percent: c.momentum,
                price,
                atr,
                volatility: c.volatility,
                status,
                allocation_amount: 0.0,
                suggested_shares: 0.0,
                estimated_total_cost: 0.0,
                signal_date,
            }
        })
        .collect();

    // Equal-weight allocation among new signals only, clamped to the
    // per-position band. Held names keep zero allocation.
    let new_count = signals
        .iter()
        .filter(|s| s.status == SignalStatus::New)
        .count();
    if new_count > 0 {
        let raw = available_cash / new_count as f64;
        let allocation = raw
            .max(available_cash * params.min_position_pct)
            .min(available_cash * params.max_position_pct);
        for signal in signals.iter_mut().filter(|s| s.status == SignalStatus::New) {
            if signal.price <= 0.0 {
                continue;
            }
            let shares = (allocation / signal.price).floor();
            let gross = shares * signal.price;
            let fee = gross * signal.market.fee_rate();
            signal.allocation_amount = allocation;
            signal.suggested_shares = shares;
            signal.estimated_total_cost = gross + fee;
        }
    }

    signals.sort_by_key(|s| s.rank);

    let run = SignalRun {
        signals_generated: signals.len(),
        new_signals: new_count,
        already_held: signals.len() - new_count,
        signal_date,
        fx_rate,
        available_cash,
        market_regime: regime,
        signals,
    };
    telemetry.event(
        "signals",
        &format!(
            "run complete: {} signals, {} new, {} held",
            run.signals_generated, run.new_signals, run.already_held
        ),
    );
    Ok(run)
}
