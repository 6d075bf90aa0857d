//! Plain-text report rendering.
//!
//! Layout: update time, totals, then three tables (venues, accounts,
//! positions). Dollar amounts are whole dollars with thousands separators;
//! leverage keeps two decimals.

use std::fmt::Write as _;

use pdk_portfolio::{AccountSnapshot, PortfolioReport, VenueAggregate};

/// `$1,234,568`. Rounds half to even (`$2` for 2.5); negative is `$-1,400`.
pub fn format_usd(value: f64) -> String {
    let whole = value.round_ties_even() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("$-{grouped}")
    } else {
        format!("${grouped}")
    }
}

/// `0.30x`
pub fn format_leverage(value: f64) -> String {
    format!("{value:.2}x")
}

fn exposure_with_leverage(exposure: f64, leverage: f64) -> String {
    format!("{} ({})", format_usd(exposure), format_leverage(leverage))
}

// Left-aligned columns, two spaces between them.
struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        Self {
            rows: vec![headers.iter().map(|h| h.to_string()).collect()],
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render_into(&self, out: &mut String) {
        let cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let widths: Vec<usize> = (0..cols)
            .map(|c| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(c))
                    .map(|s| s.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for row in &self.rows {
            let mut line = String::new();
            for (c, cell) in row.iter().enumerate() {
                if c + 1 == row.len() {
                    line.push_str(cell);
                } else {
                    let pad = widths[c] - cell.chars().count() + 2;
                    line.push_str(cell);
                    line.extend(std::iter::repeat(' ').take(pad));
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
}

fn labelled_accounts(venue: &VenueAggregate) -> impl Iterator<Item = (String, &AccountSnapshot)> {
    venue
        .accounts
        .iter()
        .enumerate()
        .map(move |(i, a)| (venue.account_label(i), a))
}

/// Render the whole report as monospaced text.
pub fn render_text(report: &PortfolioReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", report.generated_at);
    out.push('\n');
    let _ = writeln!(out, "Total Equity:   {}", format_usd(report.total_equity));
    let _ = writeln!(out, "Total Exposure: {}", format_usd(report.total_exposure));

    out.push_str("\n*** Summary by Venue ***\n");
    let mut venues = Table::new(&["Venue", "Equity", "Net Exposure", "Gross Exposure"]);
    for v in &report.venues {
        venues.push(vec![
            v.display_name.clone(),
            format_usd(v.equity_total),
            format_usd(v.net_exposure_total),
            format_usd(v.gross_exposure_total),
        ]);
    }
    venues.render_into(&mut out);

    out.push_str("\n*** Summary by Account ***\n");
    let mut accounts = Table::new(&["Account", "Equity", "N_Exposure", "G_Exposure"]);
    for v in &report.venues {
        for (label, a) in labelled_accounts(v) {
            accounts.push(vec![
                label,
                format_usd(a.equity),
                exposure_with_leverage(a.metrics.net_exposure, a.metrics.net_leverage),
                exposure_with_leverage(a.metrics.gross_exposure, a.metrics.gross_leverage),
            ]);
        }
    }
    accounts.render_into(&mut out);

    out.push_str("\n*** Positions ***\n");
    let mut positions = Table::new(&["Account", "Instrument", "Size", "Exposure", "Liq.price"]);
    for v in &report.venues {
        for (label, a) in labelled_accounts(v) {
            for p in &a.positions {
                positions.push(vec![
                    label.clone(),
                    p.instrument.clone(),
                    p.size.to_string(),
                    format_usd(p.exposure_value),
                    format!("{:.2}", p.liquidation_price),
                ]);
            }
        }
    }
    positions.render_into(&mut out);

    out
}
