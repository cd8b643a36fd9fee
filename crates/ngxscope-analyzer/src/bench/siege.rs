use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{capture, capture_f64, capture_u64, BenchmarkMetrics};
use crate::units::parse_duration_ms;
use ngxscope_core::SourceKind;

static RE_TRANSACTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Transactions:\s+([\d,]+) hits").unwrap());
static RE_ELAPSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Elapsed time:\s+([\d.]+) secs").unwrap());
static RE_RESPONSE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Response time:\s+([\d.]+ ?(?:secs|ms))").unwrap());
static RE_RATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Transaction rate:\s+([\d.]+) trans/sec").unwrap());
static RE_THROUGHPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Throughput:\s+([\d.]+) MB/sec").unwrap());
static RE_CONCURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Concurrency:\s+([\d.]+)").unwrap());
static RE_FAILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Failed transactions:\s+([\d,]+)").unwrap());
static RE_LONGEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Longest transaction:\s+([\d.]+)").unwrap());
static RE_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"under siege\.*[ \t]*(https?://\S+)").unwrap());

const MB: f64 = 1024.0 * 1024.0;

/// Parse siege output: the JSON summary printed by siege 4.x when it is one,
/// otherwise the classic `Transactions: ... hits` text block.
pub fn parse(text: &str) -> BenchmarkMetrics {
    parse_json(text).unwrap_or_else(|| parse_text(text))
}

fn parse_json(text: &str) -> Option<BenchmarkMetrics> {
    // siege prints its banner before the JSON object.
    let start = text.find('{')?;
    let root: Value = serde_json::from_str(text[start..].trim()).ok()?;
    let obj = root.as_object()?;
    if !obj.contains_key("transactions") && !obj.contains_key("transaction_rate") {
        return None;
    }
    let num = |key: &str| obj.get(key).and_then(Value::as_f64);

    let mut m = BenchmarkMetrics::empty(SourceKind::Siege);
    let ok = num("transactions").map(|t| t as u64);
    let failed = num("failed_transactions").map(|f| f as u64);
    fill_totals(&mut m, ok, failed);
    m.duration_secs = num("elapsed_time");
    m.latency.avg = num("response_time").map(|s| s * 1000.0);
    m.latency.max = num("longest_transaction").map(|s| s * 1000.0);
    m.throughput.requests_per_sec = num("transaction_rate");
    m.throughput.bytes_per_sec = num("throughput").map(|mb| mb * MB);
    m.concurrency = num("concurrency").map(|c| c.round() as u32);
    Some(m)
}

fn parse_text(text: &str) -> BenchmarkMetrics {
    let mut m = BenchmarkMetrics::empty(SourceKind::Siege);

    m.target = capture(&RE_TARGET, text).map(str::to_string);
    fill_totals(
        &mut m,
        capture_u64(&RE_TRANSACTIONS, text),
        capture_u64(&RE_FAILED, text),
    );
    m.duration_secs = capture_f64(&RE_ELAPSED, text);
    m.latency.avg = capture(&RE_RESPONSE_TIME, text).and_then(parse_duration_ms);
    m.latency.max = capture_f64(&RE_LONGEST, text).map(|s| s * 1000.0);
    m.throughput.requests_per_sec = capture_f64(&RE_RATE, text);
    m.throughput.bytes_per_sec = capture_f64(&RE_THROUGHPUT, text).map(|mb| mb * MB);
    // Concurrency is siege's average of simultaneous connections, a fraction.
    m.concurrency = capture_f64(&RE_CONCURRENCY, text).map(|c| c.round() as u32);

    m
}

/// siege counts successful transactions and failures separately.
fn fill_totals(m: &mut BenchmarkMetrics, ok: Option<u64>, failed: Option<u64>) {
    m.error_count = failed;
    m.total_requests = match (ok, failed) {
        (Some(ok), failed) => Some(ok.saturating_add(failed.unwrap_or(0))),
        (None, _) => None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIEGE_TEXT: &str = "\
** SIEGE 4.0.7
** Preparing 25 concurrent users for battle.
The server is now under siege... http://localhost:8080/
Lifting the server siege...
Transactions:\t\t        4950 hits
Availability:\t\t       99.00 %
Elapsed time:\t\t       29.87 secs
Data transferred:\t        5.12 MB
Response time:\t\t        0.15 secs
Transaction rate:\t      165.72 trans/sec
Throughput:\t\t        0.50 MB/sec
Concurrency:\t\t       24.86
Successful transactions:        4950
Failed transactions:\t          50
Longest transaction:\t        1.25
Shortest transaction:\t        0.01
";

    #[test]
    fn parse_text_summary() {
        let m = parse(SIEGE_TEXT);
        assert_eq!(m.tool, SourceKind::Siege);
        assert_eq!(m.target.as_deref(), Some("http://localhost:8080/"));
        assert_eq!(m.total_requests, Some(5000));
        assert_eq!(m.error_count, Some(50));
        assert_eq!(m.duration_secs, Some(29.87));
        assert!((m.latency.avg.unwrap() - 150.0).abs() < 1e-9);
        assert!((m.latency.max.unwrap() - 1250.0).abs() < 1e-9);
        assert_eq!(m.throughput.requests_per_sec, Some(165.72));
        assert!((m.throughput.bytes_per_sec.unwrap() - 0.5 * MB).abs() < 1e-6);
        assert_eq!(m.concurrency, Some(25));
        assert!((m.error_rate().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parse_json_summary() {
        let text = r#"** SIEGE 4.1.6
** Preparing 10 concurrent users for battle.
{
    "transactions":                 1000,
    "availability":               100.00,
    "elapsed_time":                10.05,
    "data_transferred":             5.12,
    "response_time":                0.05,
    "transaction_rate":            99.50,
    "throughput":                   0.51,
    "concurrency":                  4.98,
    "successful_transactions":      1000,
    "failed_transactions":             0,
    "longest_transaction":          0.25,
    "shortest_transaction":         0.01
}"#;
        let m = parse(text);
        assert_eq!(m.total_requests, Some(1000));
        assert_eq!(m.error_count, Some(0));
        assert_eq!(m.duration_secs, Some(10.05));
        assert!((m.latency.avg.unwrap() - 50.0).abs() < 1e-9);
        assert_eq!(m.throughput.requests_per_sec, Some(99.5));
        assert_eq!(m.concurrency, Some(5));
    }

    #[test]
    fn huge_counts_saturate() {
        let text = "Transactions:\t\t 18446744073709551615 hits\nFailed transactions:\t 1\n";
        let m = parse(text);
        assert_eq!(m.total_requests, Some(u64::MAX));
        assert_eq!(m.error_count, Some(1));
    }

    #[test]
    fn response_time_in_ms() {
        let m = parse("Response time:\t\t       12.00 ms\n");
        assert_eq!(m.latency.avg, Some(12.0));
        assert!(m.total_requests.is_none());
    }
}
