use std::sync::LazyLock;

use regex::Regex;

use super::{capture, capture_f64, capture_u64, BenchmarkMetrics, SocketErrors};
use crate::units::{parse_bytes, parse_duration_ms, parse_magnitude};
use ngxscope_core::SourceKind;

static RE_RUNNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Running (\S+) test @ (\S+)").unwrap());
static RE_THREADS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) threads and (\d+) connections").unwrap());
static RE_LATENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*Latency[ \t]+(\S+)[ \t]+(\S+)[ \t]+(\S+)").unwrap()
});
static RE_DISTRIBUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+(?:\.\d+)?)%[ \t]+(\S+)[ \t]*$").unwrap());
static RE_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+) requests in ([\d.]+\w+),").unwrap());
static RE_SOCKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Socket errors: connect (\d+), read (\d+), write (\d+), timeout (\d+)").unwrap()
});
static RE_NON_2XX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Non-2xx or 3xx responses:\s*(\d+)").unwrap());
static RE_RPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Requests/sec:\s*([\d.]+)").unwrap());
static RE_TRANSFER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Transfer/sec:\s*(\S+)").unwrap());

/// Parse `wrk` (and `wrk2`) console output.
pub fn parse(text: &str) -> BenchmarkMetrics {
    let mut m = BenchmarkMetrics::empty(SourceKind::Wrk);

    if let Some(c) = RE_RUNNING.captures(text) {
        m.duration_secs = parse_duration_ms(&c[1]).map(|ms| ms / 1000.0);
        m.target = Some(c[2].to_string());
    }
    if let Some(c) = RE_THREADS.captures(text) {
        m.threads = c[1].parse().ok();
        m.concurrency = c[2].parse().ok();
    }
    if let Some(c) = RE_LATENCY.captures(text) {
        m.latency.avg = parse_duration_ms(&c[1]);
        m.latency.stdev = parse_duration_ms(&c[2]);
        m.latency.max = parse_duration_ms(&c[3]);
    }

    // Percentile ladder only exists with --latency.
    if let Some(start) = text.find("Latency Distribution") {
        for c in RE_DISTRIBUTION.captures_iter(&text[start..]) {
            let Some(value) = parse_duration_ms(&c[2]) else {
                continue;
            };
            match c[1].parse::<f64>().ok() {
                Some(p) if p == 50.0 => m.latency.median = Some(value),
                Some(p) if p == 90.0 => m.latency.p90 = Some(value),
                Some(p) if p == 95.0 => m.latency.p95 = Some(value),
                Some(p) if p == 99.0 => m.latency.p99 = Some(value),
                _ => {}
            }
        }
    }

    m.total_requests = capture_u64(&RE_TOTAL, text);
    if m.duration_secs.is_none() {
        m.duration_secs = RE_TOTAL
            .captures(text)
            .and_then(|c| parse_duration_ms(&c[2]))
            .map(|ms| ms / 1000.0);
    }

    if let Some(c) = RE_SOCKET.captures(text) {
        m.socket_errors = Some(SocketErrors {
            connect: c[1].parse().unwrap_or(0),
            read: c[2].parse().unwrap_or(0),
            write: c[3].parse().unwrap_or(0),
            timeout: c[4].parse().unwrap_or(0),
        });
    }
    m.error_count = capture_u64(&RE_NON_2XX, text);
    m.throughput.requests_per_sec = capture_f64(&RE_RPS, text);
    m.throughput.bytes_per_sec = capture(&RE_TRANSFER, text).and_then(parse_bytes);

    // Fall back to the per-thread request rate when the footer is missing.
    if m.throughput.requests_per_sec.is_none() {
        if let (Some(threads), Some(per_thread)) = (m.threads, per_thread_rps(text)) {
            m.throughput.requests_per_sec = Some(per_thread * threads as f64);
        }
    }

    m
}

fn per_thread_rps(text: &str) -> Option<f64> {
    static RE_REQ_SEC: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Req/Sec[ \t]+(\S+)").unwrap());
    capture(&RE_REQ_SEC, text).and_then(parse_magnitude)
}
