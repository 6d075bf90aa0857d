use serde::{Deserialize, Serialize};

use crate::numeric::{finite_or_zero, round_dp};
use crate::report::{AccountSnapshot, PositionSnapshot};
use crate::DISPLAY_DP;

/// Exposure and leverage for one account.
///
/// Exposures are unrounded sums; only the leverage ratios are rounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMetrics {
    pub net_exposure: f64,
    pub gross_exposure: f64,
    pub net_leverage: f64,
    pub gross_leverage: f64,
}

/// Equity used as the leverage denominator.
///
/// Zero or negative equity is floored to `1` so the division stays defined.
/// Leverage computed against this floor is a display-safety number, not an
/// economic ratio: it equals the raw exposure.
pub fn effective_equity(equity: f64) -> f64 {
    if equity > 0.0 {
        equity
    } else {
        1.0
    }
}

/// net   = Σ exposure
/// gross = Σ |exposure|
/// net_leverage   = round(|net| / effective_equity, 2)
/// gross_leverage = round(gross / effective_equity, 2)
pub(crate) fn account_metrics(equity: f64, positions: &[PositionSnapshot]) -> AccountMetrics {
    let (net, gross) = positions.iter().fold((0.0_f64, 0.0_f64), |(n, g), p| {
        (n + p.exposure_value, g + p.exposure_value.abs())
    });
    let (net, gross) = (finite_or_zero(net), finite_or_zero(gross));
    let denom = effective_equity(equity);

    AccountMetrics {
        net_exposure: net,
        gross_exposure: gross,
        net_leverage: finite_or_zero(round_dp(net.abs() / denom, DISPLAY_DP)),
        gross_leverage: finite_or_zero(round_dp(gross / denom, DISPLAY_DP)),
    }
}

/// Recompute the metrics of a snapshot from its own fields.
///
/// Always equal to `snapshot.metrics`, which was frozen at construction.
pub fn aggregate_account(snapshot: &AccountSnapshot) -> AccountMetrics {
    account_metrics(snapshot.equity, &snapshot.positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(exposure: f64) -> PositionSnapshot {
        PositionSnapshot {
            instrument: "BTC-PERP".to_string(),
            size: exposure.signum(),
            exposure_value: exposure,
            liquidation_price: 0.0,
        }
    }

    #[test]
    fn long_and_short_net_and_gross() {
        let m = account_metrics(1000.0, &[pos(500.0), pos(-200.0)]);
        assert_eq!(m.net_exposure, 300.0);
        assert_eq!(m.gross_exposure, 700.0);
        assert_eq!(m.net_leverage, 0.3);
        assert_eq!(m.gross_leverage, 0.7);
    }

    #[test]
    fn net_leverage_uses_absolute_net() {
        let m = account_metrics(100.0, &[pos(-250.0)]);
        assert_eq!(m.net_exposure, -250.0);
        assert_eq!(m.net_leverage, 2.5);
    }

    #[test]
    fn exposures_are_not_rounded() {
        let m = account_metrics(3.0, &[pos(0.123_456), pos(0.000_001)]);
        assert!((m.net_exposure - 0.123_457).abs() < 1e-12);
        assert_eq!(m.net_leverage, 0.04);
    }

    #[test]
    fn overflowing_sums_collapse_to_zero() {
        let m = account_metrics(1000.0, &[pos(f64::MAX), pos(f64::MAX)]);
        assert_eq!(m.net_exposure, 0.0);
        assert_eq!(m.gross_exposure, 0.0);
        assert_eq!(m.gross_leverage, 0.0);

        let tiny_equity = account_metrics(1e-320, &[pos(1e10)]);
        assert_eq!(tiny_equity.net_exposure, 1e10);
        assert_eq!(tiny_equity.net_leverage, 0.0);
    }

    #[test]
    fn effective_equity_floor() {
        assert_eq!(effective_equity(250.0), 250.0);
        assert_eq!(effective_equity(0.0), 1.0);
        assert_eq!(effective_equity(-40.0), 1.0);
    }

    #[test]
    fn no_positions_is_all_zero() {
        assert_eq!(account_metrics(500.0, &[]), AccountMetrics::default());
    }
}
