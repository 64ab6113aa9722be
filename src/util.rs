// Utility helpers for parsing, rounding and display formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;

pub const CURRENCY_PREFIX: &str = "R$";

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in payroll exports.
///
/// - Trims whitespace and an optional `R$` prefix.
/// - Rejects values that contain alphabetic characters (`nan`, `n/d`, ...).
/// - Accepts both `1234.56` and the Brazilian `1.234,56`.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    let s = s.strip_prefix(CURRENCY_PREFIX).unwrap_or(s).trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

pub fn parse_usize_safe(s: Option<&str>) -> Option<usize> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<usize>().ok()
}

/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and ISO timestamps (`YYYY-MM-DD HH:MM:SS`
/// or with a `T`); the time part is dropped.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(d);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub fn round_to(v: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (v * factor).round() / factor
}

/// `part / whole * 100`, or 0 when `whole` is zero so no NaN ever leaks out.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let p = part / whole * 100.0;
    if p.is_finite() {
        p
    } else {
        0.0
    }
}

/// Most frequent value; ties go to the smallest value.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let (mut best, mut best_count) = (v[0], 0usize);
    let mut i = 0;
    while i < v.len() {
        let current = v[i];
        let mut j = i;
        while j < v.len() && v[j] == current {
            j += 1;
        }
        if j - i > best_count {
            best = current;
            best_count = j - i;
        }
        i = j;
    }
    Some(best)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - thousands separators (e.g., `1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    // Values that round to zero never get a minus sign.
    let neg = n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Brazilian money: `12345.6` -> `R$ 12.345,60`; missing -> `-`.
pub fn format_money(x: Option<f64>) -> String {
    let Some(x) = x.filter(|v| v.is_finite()) else {
        return "-".to_string();
    };
    let s: String = format_number(x, 2)
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            other => other,
        })
        .collect();
    format!("{} {}", CURRENCY_PREFIX, s)
}

/// Short magnitude label used on cost charts. Exactly 1,000,000 and above
/// use the millions form.
pub fn format_magnitude(v: f64) -> String {
    if v >= 1_000_000.0 {
        format!("{} {:.1} mi", CURRENCY_PREFIX, v / 1_000_000.0)
    } else {
        format!("{} {:.0} mil", CURRENCY_PREFIX, v / 1_000.0)
    }
}

pub fn format_percent(v: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, v)
}
