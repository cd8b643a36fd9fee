use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::{capture, capture_u64, sum_present, BenchmarkMetrics, SocketErrors};
use crate::units::{parse_duration_ms, parse_magnitude, parse_si_bytes};
use ngxscope_core::SourceKind;

static RE_RUNNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Running (\S+) test @ (\S+)").unwrap());
static RE_CONNECTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+) connections").unwrap());
static RE_TOTALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d.]+[kmgb]?) requests in ([\d.]+\w*),[ \t]*([\d.]+[ \t]*\w+) read").unwrap()
});
static RE_ERRORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) errors \((\d+) timeouts\)").unwrap());
static RE_NON_2XX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) non 2xx responses").unwrap());

/// One data row of an autocannon stat table, keyed by column header.
type StatRow = HashMap<String, String>;

/// Parse autocannon's default table output.
pub fn parse(text: &str) -> BenchmarkMetrics {
    let mut m = BenchmarkMetrics::empty(SourceKind::Autocannon);

    if let Some(c) = RE_RUNNING.captures(text) {
        m.duration_secs = parse_duration_ms(&c[1]).map(|ms| ms / 1000.0);
        m.target = Some(c[2].to_string());
    }
    m.concurrency = capture(&RE_CONNECTIONS, text).and_then(|v| v.parse().ok());

    let rows = stat_rows(text);
    if let Some(latency) = rows.get("Latency") {
        let ms = |col: &str| latency.get(col).and_then(|v| parse_duration_ms(v));
        m.latency.median = ms("50%");
        m.latency.p90 = ms("90%");
        m.latency.p99 = ms("99%");
        m.latency.avg = ms("Avg");
        m.latency.stdev = ms("Stdev");
        m.latency.max = ms("Max");
    }
    if let Some(reqs) = rows.get("Req/Sec") {
        m.throughput.requests_per_sec = reqs.get("Avg").and_then(|v| parse_magnitude(v));
    }
    if let Some(bytes) = rows.get("Bytes/Sec") {
        m.throughput.bytes_per_sec = bytes.get("Avg").and_then(|v| parse_si_bytes(v));
    }

    if let Some(c) = RE_TOTALS.captures(text) {
        m.total_requests = parse_magnitude(&c[1]).map(|n| n.round() as u64);
        if m.duration_secs.is_none() {
            m.duration_secs = parse_duration_ms(&c[2]).map(|ms| ms / 1000.0);
        }
    }

    let (errors, timeouts) = match RE_ERRORS.captures(text) {
        Some(c) => (c[1].parse::<u64>().ok(), c[2].parse::<u64>().ok()),
        None => (None, None),
    };
    if let Some(timeout) = timeouts {
        m.socket_errors = Some(SocketErrors {
            timeout,
            ..SocketErrors::default()
        });
    }
    m.error_count = sum_present(errors, capture_u64(&RE_NON_2XX, text));

    m
}

/// Collect the data rows of every box-drawn table, keyed by their first cell.
fn stat_rows(text: &str) -> HashMap<String, StatRow> {
    let mut rows = HashMap::new();
    let mut header: Vec<String> = Vec::new();

    for line in text.lines() {
        let cells: Vec<&str> = line
            .split(['│', '|'])
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        let Some((&first, rest)) = cells.split_first() else {
            continue;
        };
        if first == "Stat" {
            header = rest.iter().map(|c| c.to_string()).collect();
            continue;
        }
        if header.is_empty() || rest.len() != header.len() {
            continue;
        }
        let row: StatRow = header
            .iter()
            .cloned()
            .zip(rest.iter().map(|c| c.to_string()))
            .collect();
        rows.insert(first.to_string(), row);
    }
    rows
}
