use std::sync::LazyLock;

use regex::Regex;

use super::{capture, capture_f64, capture_u64, sum_present, BenchmarkMetrics};
use ngxscope_core::SourceKind;

static RE_HOST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Server Hostname:\s*(\S+)").unwrap());
static RE_PORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Server Port:\s*(\d+)").unwrap());
static RE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Document Path:\s*(\S+)").unwrap());
static RE_CONCURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Concurrency Level:\s*(\d+)").unwrap());
static RE_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Time taken for tests:\s*([\d.]+) seconds").unwrap());
static RE_COMPLETE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Complete requests:\s*(\d+)").unwrap());
static RE_FAILED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Failed requests:\s*(\d+)").unwrap());
static RE_NON_2XX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Non-2xx responses:\s*(\d+)").unwrap());
static RE_RPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Requests per second:\s*([\d.]+)").unwrap());
// The first "Time per request" line is the per-user mean; the second is across all users.
static RE_MEAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Time per request:\s*([\d.]+) \[ms\] \(mean\)").unwrap()
});
static RE_TRANSFER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Transfer rate:\s*([\d.]+) \[Kbytes/sec\]").unwrap());
static RE_TOTAL_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Total:[ \t]+(\d+)[ \t]+(\d+)[ \t]+([\d.]+)[ \t]+(\d+)[ \t]+(\d+)").unwrap()
});
static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+)%[ \t]+(\d+)").unwrap());

/// Parse ApacheBench (`ab`) console output.
pub fn parse(text: &str) -> BenchmarkMetrics {
    let mut m = BenchmarkMetrics::empty(SourceKind::Ab);

    if let Some(host) = capture(&RE_HOST, text) {
        let port = capture(&RE_PORT, text)
            .filter(|p| *p != "80")
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        let path = capture(&RE_PATH, text).unwrap_or("/");
        m.target = Some(format!("{host}{port}{path}"));
    }

    m.concurrency = capture_u64(&RE_CONCURRENCY, text).map(|c| c as u32);
    m.duration_secs = capture_f64(&RE_DURATION, text);
    m.total_requests = capture_u64(&RE_COMPLETE, text);
    m.error_count = sum_present(capture_u64(&RE_FAILED, text), capture_u64(&RE_NON_2XX, text));
    m.throughput.requests_per_sec = capture_f64(&RE_RPS, text);
    m.throughput.bytes_per_sec = capture_f64(&RE_TRANSFER, text).map(|kb| kb * 1024.0);
    m.latency.avg = capture_f64(&RE_MEAN, text);

    if let Some(c) = RE_TOTAL_ROW.captures(text) {
        m.latency.stdev = c[3].parse().ok();
    }

    for c in RE_PERCENT.captures_iter(text) {
        let value: Option<f64> = c[2].parse().ok();
        match &c[1] {
            "50" => m.latency.median = value,
            "90" => m.latency.p90 = value,
            "95" => m.latency.p95 = value,
            "99" => m.latency.p99 = value,
            "100" => m.latency.max = value,
            _ => {}
        }
    }

    m
}
