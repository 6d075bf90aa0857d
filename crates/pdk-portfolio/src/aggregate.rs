use chrono_tz::Tz;

use crate::numeric::finite_or_zero;
use crate::report::{AccountSnapshot, PortfolioReport, VenueAggregate, NOT_AVAILABLE};

const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Roll accounts up into one venue. Account order is kept as given.
///
/// Zero accounts is valid and yields all-zero totals.
pub fn aggregate_venue(
    venue_id: impl Into<String>,
    display_name: impl Into<String>,
    accounts: Vec<AccountSnapshot>,
) -> VenueAggregate {
    let (equity_total, net_exposure_total, gross_exposure_total) =
        accounts.iter().fold((0.0, 0.0, 0.0), |(e, n, g), a| {
            (
                e + a.equity,
                n + a.metrics.net_exposure,
                g + a.metrics.gross_exposure,
            )
        });

    VenueAggregate {
        venue_id: venue_id.into(),
        display_name: display_name.into(),
        equity_total: finite_or_zero(equity_total),
        net_exposure_total: finite_or_zero(net_exposure_total),
        gross_exposure_total: finite_or_zero(gross_exposure_total),
        accounts,
    }
}

/// Roll venues up into the report root. Venue order is kept as given.
///
/// `generated_at` is the first source timestamp found scanning venues, then
/// accounts, in order; rendered in `tz`. None anywhere gives `"N/A"`.
pub fn aggregate_portfolio(venues: Vec<VenueAggregate>, tz: Tz) -> PortfolioReport {
    let (total_equity, total_exposure, total_gross_exposure) =
        venues.iter().fold((0.0, 0.0, 0.0), |(e, n, g), v| {
            (
                e + v.equity_total,
                n + v.net_exposure_total,
                g + v.gross_exposure_total,
            )
        });

    let generated_at = venues
        .iter()
        .flat_map(|v| v.accounts.iter())
        .find_map(|a| a.observed_at)
        .map(|ts| ts.with_timezone(&tz).format(GENERATED_AT_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    PortfolioReport {
        generated_at,
        total_equity: finite_or_zero(total_equity),
        total_exposure: finite_or_zero(total_exposure),
        total_gross_exposure: finite_or_zero(total_gross_exposure),
        venues,
    }
}
