use serde_json::Value;

use crate::report::NOT_AVAILABLE;

/// Convert a raw JSON field into an `f64`, substituting `default` on anything
/// that is not a usable number.
///
/// Rules:
/// - `None`, `null`, `""` (after trim) and `"N/A"` return `default`.
/// - JSON numbers and numeric strings (whitespace tolerated) are parsed.
/// - Booleans, arrays, objects and unparseable strings return `default`.
/// - Non-finite results (`"NaN"`, `"inf"`, overflow) return `default`, so no
///   NaN or infinity ever reaches a report.
pub fn safe_numeric(raw: Option<&Value>, default: f64) -> f64 {
    match raw {
        Some(Value::Number(n)) => finite_or(n.as_f64(), default),
        Some(Value::String(s)) => safe_numeric_str(s, default),
        _ => default,
    }
}

/// Same rule as [`safe_numeric`] for an already-extracted string.
pub fn safe_numeric_str(raw: &str, default: f64) -> f64 {
    let t = raw.trim();
    if t.is_empty() || t == NOT_AVAILABLE {
        return default;
    }
    finite_or(t.parse::<f64>().ok(), default)
}

fn finite_or(v: Option<f64>, default: f64) -> f64 {
    match v {
        Some(x) if x.is_finite() => x,
        _ => default,
    }
}

/// Replace NaN and infinities produced by arithmetic on finite inputs with `0.0`.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Round half away from zero to `dp` decimal places.
///
/// Values too large to scale are already integral at that precision and come
/// back unchanged.
pub fn round_dp(x: f64, dp: u32) -> f64 {
    let scale = 10f64.powi(dp as i32);
    let scaled = x * scale;
    if !scaled.is_finite() {
        return x;
    }
    let r = scaled.round() / scale;
    // collapse -0.0 so rendered output never shows "-0.00"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
