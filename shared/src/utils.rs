// Formatting and date helpers shared by the engine and the front end.

use chrono::{DateTime, Duration, Utc};

/// Formats a price with two decimals and comma thousands separators,
/// e.g. `1234567.891` -> `"1,234,567.89"`.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Compact volume label: `1.2M`, `350.0K`, `999`.
pub fn format_volume(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// Short session label for chart axes, e.g. `"Mar 05"`.
pub fn format_session_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%b %d").to_string()
}

/// Earliest timestamp still inside a lookback of `days` calendar days ending
/// at `latest`.
pub fn lookback_cutoff(latest: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    latest - Duration::days(i64::from(days))
}
