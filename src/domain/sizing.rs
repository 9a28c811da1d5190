//! Risk-based position sizing.
//!
//! Business-rule failures are data, not errors: every gate failure comes
//! back as a tagged [`SizingResult::Invalid`] with a stable reason code so
//! callers can surface it and retry with corrected inputs.

use serde::{Deserialize, Serialize};

use super::stats::floor_4dp;
use super::trade::Market;

/// Haircut applied to available cash when computing the affordable
/// fallback size, covering fees on the reduced order.
pub const FEE_HAIRCUT: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingRequest {
    pub entry_price: f64,
    pub stop_price: f64,
    pub risk_percent: f64,
    pub market: Market,
    /// Caller-supplied FX override; when absent US sizing uses the live
    /// rate passed alongside the request.
    pub fx_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    #[serde(rename = "INVALID_RISK_PERCENT")]
    InvalidRiskPercent,
    #[serde(rename = "INVALID_ENTRY_PRICE")]
    InvalidEntryPrice,
    #[serde(rename = "INVALID_STOP_PRICE")]
    InvalidStopPrice,
    #[serde(rename = "INVALID_STOP_DISTANCE")]
    InvalidStopDistance,
    #[serde(rename = "NO_PORTFOLIO_VALUE_SNAPSHOT")]
    NoPortfolioValueSnapshot,
}

impl ReasonCode {
    pub fn detail(&self) -> &'static str {
        match self {
            ReasonCode::InvalidRiskPercent => "risk percent must be greater than zero",
            ReasonCode::InvalidEntryPrice => "entry price must be greater than zero",
            ReasonCode::InvalidStopPrice => "stop price must be greater than zero",
            ReasonCode::InvalidStopDistance => "stop price must sit below the entry price",
            ReasonCode::NoPortfolioValueSnapshot => {
                "no portfolio valuation snapshot available to size against"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SizingResult {
    Valid {
        suggested_shares: f64,
        risk_amount: f64,
        stop_distance: f64,
        estimated_cost: f64,
        estimated_fees: f64,
        fx_rate_used: f64,
        cash_sufficient: bool,
        available_cash: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_affordable_shares: Option<f64>,
    },
    Invalid {
        reason_code: ReasonCode,
        reason_detail: String,
    },
}

impl SizingResult {
    fn invalid(code: ReasonCode) -> Self {
        SizingResult::Invalid {
            reason_code: code,
            reason_detail: code.detail().to_string(),
        }
    }
}

/// Size a position from entry, stop and risk budget. The portfolio value is
/// the risk basis; available cash is only the feasibility limit.
pub fn size_position(
    request: &SizingRequest,
    available_cash: f64,
    portfolio_value: Option<f64>,
    live_fx: f64,
) -> SizingResult {
    // Ordered gate, first failure wins.
    if request.risk_percent <= 0.0 {
        return SizingResult::invalid(ReasonCode::InvalidRiskPercent);
    }
    if request.entry_price <= 0.0 {
        return SizingResult::invalid(ReasonCode::InvalidEntryPrice);
    }
    if request.stop_price <= 0.0 {
        return SizingResult::invalid(ReasonCode::InvalidStopPrice);
    }
    if request.stop_price >= request.entry_price {
        return SizingResult::invalid(ReasonCode::InvalidStopDistance);
    }
    let Some(portfolio_value) = portfolio_value else {
        return SizingResult::invalid(ReasonCode::NoPortfolioValueSnapshot);
    };

    let fx_rate_used = match request.market {
        Market::Uk => 1.0,
        Market::Us => request.fx_rate.unwrap_or(live_fx),
    };

    let risk_amount = portfolio_value * (request.risk_percent / 100.0);
    let stop_distance = request.entry_price - request.stop_price;
    let suggested_shares = floor_4dp(risk_amount / (stop_distance * fx_rate_used));

    // Cost in base currency follows the signal generator's normalization.
    let unit_cost = match request.market {
        Market::Uk => request.entry_price / 100.0,
        Market::Us => request.entry_price / fx_rate_used,
    };
    let gross = suggested_shares * unit_cost;
    let estimated_fees = gross * request.market.fee_rate();
    let estimated_cost = gross + estimated_fees;
    let cash_sufficient = estimated_cost <= available_cash;

    let max_affordable_shares = if cash_sufficient {
        None
    } else if unit_cost > 0.0 {
        Some(floor_4dp(available_cash * (1.0 - FEE_HAIRCUT) / unit_cost))
    } else {
        None
    };

    SizingResult::Valid {
        suggested_shares,
        risk_amount,
        stop_distance,
        estimated_cost,
        estimated_fees,
        fx_rate_used,
        cash_sufficient,
        available_cash,
        max_affordable_shares,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(entry: f64, stop: f64, risk: f64, market: Market) -> SizingRequest {
        SizingRequest {
            entry_price: entry,
            stop_price: stop,
            risk_percent: risk,
            market,
            fx_rate: None,
        }
    }

    fn reason(result: &SizingResult) -> ReasonCode {
        match result {
            SizingResult::Invalid { reason_code, .. } => *reason_code,
            SizingResult::Valid { .. } => panic!("expected invalid result"),
        }
    }

    #[test]
    fn gate_checks_run_in_order() {
        let r = size_position(&request(100.0, 90.0, 0.0, Market::Uk), 1000.0, Some(10_000.0), 1.27);
        assert_eq!(reason(&r), ReasonCode::InvalidRiskPercent);

        let r = size_position(&request(0.0, 90.0, 1.0, Market::Uk), 1000.0, Some(10_000.0), 1.27);
        assert_eq!(reason(&r), ReasonCode::InvalidEntryPrice);

        let r = size_position(&request(100.0, -1.0, 1.0, Market::Uk), 1000.0, Some(10_000.0), 1.27);
        assert_eq!(reason(&r), ReasonCode::InvalidStopPrice);

        let r = size_position(&request(100.0, 100.0, 1.0, Market::Uk), 1000.0, Some(10_000.0), 1.27);
        assert_eq!(reason(&r), ReasonCode::InvalidStopDistance);

        // Risk check wins even when several inputs are bad.
        let r = size_position(&request(0.0, 0.0, -1.0, Market::Uk), 1000.0, Some(10_000.0), 1.27);
        assert_eq!(reason(&r), ReasonCode::InvalidRiskPercent);
    }

    #[test]
    fn missing_snapshot_is_a_business_outcome() {
        let r = size_position(&request(100.0, 90.0, 1.0, Market::Uk), 1000.0, None, 1.27);
        assert_eq!(reason(&r), ReasonCode::NoPortfolioValueSnapshot);
    }

    #[test]
    fn uk_sizing_reference_case() {
        let r = size_position(&request(100.0, 90.0, 1.0, Market::Uk), 1000.0, Some(10_000.0), 1.27);
        match r {
            SizingResult::Valid {
                suggested_shares,
                risk_amount,
                stop_distance,
                fx_rate_used,
                cash_sufficient,
                ..
            } => {
                assert!((risk_amount - 100.0).abs() < 1e-9);
                assert!((stop_distance - 10.0).abs() < 1e-9);
                assert!((suggested_shares - 10.0).abs() < 1e-9);
                assert!((fx_rate_used - 1.0).abs() < f64::EPSILON);
                // 10 shares at 100p = 10.00 base plus 0.5% fee
                assert!(cash_sufficient);
            }
            SizingResult::Invalid { .. } => panic!("expected valid result"),
        }
    }

    #[test]
    fn us_sizing_uses_fx_override_over_live_rate() {
        let mut req = request(50.0, 45.0, 2.0, Market::Us);
        req.fx_rate = Some(1.30);
        let r = size_position(&req, 100_000.0, Some(10_000.0), 1.27);
        match r {
            SizingResult::Valid {
                suggested_shares,
                fx_rate_used,
                estimated_fees,
                estimated_cost,
                ..
            } => {
                assert!((fx_rate_used - 1.30).abs() < f64::EPSILON);
                // 200 / (5 * 1.30) = 30.7692..., floored to 4dp
                assert!((suggested_shares - 30.7692).abs() < 1e-9);
                let gross = 30.7692 * (50.0 / 1.30);
                assert!((estimated_fees - gross * 0.0015).abs() < 1e-9);
                assert!((estimated_cost - (gross + gross * 0.0015)).abs() < 1e-9);
            }
            SizingResult::Invalid { .. } => panic!("expected valid result"),
        }
    }

    #[test]
    fn insufficient_cash_offers_affordable_fallback() {
        // 100 base-currency risk, stop distance 1: suggests 100 shares at
        // 10.00 each, but only 200 cash is available.
        let r = size_position(
            &request(1000.0, 999.0, 1.0, Market::Uk),
            200.0,
            Some(10_000.0),
            1.27,
        );
        match r {
            SizingResult::Valid {
                suggested_shares,
                cash_sufficient,
                max_affordable_shares,
                ..
            } => {
                assert!((suggested_shares - 100.0).abs() < 1e-9);
                assert!(!cash_sufficient);
                // 200 * 0.995 / 10.00 = 19.9, floored at 4dp
                let affordable = max_affordable_shares.unwrap();
                assert!(affordable <= 19.9 + 1e-9);
                assert!((affordable - 19.9).abs() < 2e-4);
            }
            SizingResult::Invalid { .. } => panic!("expected valid result"),
        }
    }

    #[test]
    fn reason_codes_serialize_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ReasonCode::InvalidStopDistance).unwrap(),
            "\"INVALID_STOP_DISTANCE\""
        );
        assert_eq!(
            serde_json::to_string(&ReasonCode::NoPortfolioValueSnapshot).unwrap(),
            "\"NO_PORTFOLIO_VALUE_SNAPSHOT\""
        );
    }
}
