//! Unit normalization for the numeric tokens that logs and load-test tools print.
//!
//! Every helper returns `None` for tokens it does not understand; callers treat that
//! the same as a field the tool never reported.

/// Parse a duration token (`635.91us`, `0.89ms`, `1.2s`, `2m`) into milliseconds.
/// A bare number is taken as milliseconds.
pub fn parse_duration_ms(s: &str) -> Option<f64> {
    let (num, unit) = split_number(s)?;
    let factor = match unit.to_lowercase().as_str() {
        "" | "ms" => 1.0,
        "us" | "µs" => 0.001,
        "ns" => 0.000_001,
        "s" | "sec" | "secs" => 1000.0,
        "m" | "min" => 60_000.0,
        "h" => 3_600_000.0,
        _ => return None,
    };
    Some(num * factor)
}

/// Parse a byte-size token (`17.76GB`, `1.2 kB`, `512B`) into bytes, binary multiples.
pub fn parse_bytes(s: &str) -> Option<f64> {
    let (num, unit) = split_number(s)?;
    let factor = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "k" | "kb" | "kib" => 1024.0,
        "m" | "mb" | "mib" => 1024.0 * 1024.0,
        "g" | "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        "t" | "tb" | "tib" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some(num * factor)
}

/// Parse a byte-size token printed with SI units (`1.2 MB`, `41 kB`) into bytes,
/// decimal multiples.
pub fn parse_si_bytes(s: &str) -> Option<f64> {
    let (num, unit) = split_number(s)?;
    let factor = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "kb" => 1e3,
        "mb" => 1e6,
        "gb" => 1e9,
        "tb" => 1e12,
        _ => return None,
    };
    Some(num * factor)
}

/// Parse a count with an optional magnitude suffix (`56.20k`, `1.2m`, `101k`).
pub fn parse_magnitude(s: &str) -> Option<f64> {
    let (num, unit) = split_number(s)?;
    let factor = match unit.to_ascii_lowercase().as_str() {
        "" => 1.0,
        "k" => 1_000.0,
        "m" => 1_000_000.0,
        "g" | "b" => 1_000_000_000.0,
        _ => return None,
    };
    Some(num * factor)
}

/// Split `"12.5 MB"` into `(12.5, "MB")`. The unit part is trimmed.
fn split_number(s: &str) -> Option<(f64, &str)> {
    let s = s.trim();
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == ','))
        .unwrap_or(s.len());
    let (num_part, unit) = s.split_at(end);
    if num_part.is_empty() {
        return None;
    }
    let num: f64 = num_part.replace(',', "").parse().ok()?;
    Some((num, unit.trim()))
}

/// Round to two decimal places, the precision used for every displayed percentage.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
