use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{capture, BenchmarkMetrics};
use crate::units::{parse_duration_ms, parse_si_bytes};
use ngxscope_core::SourceKind;

static RE_DURATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*http_req_duration\.*:[ \t]*(.+)$").unwrap());
static RE_KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(avg|min|med|max|p\(\d+(?:\.\d+)?\))=(\S+)").unwrap()
});
static RE_REQS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*http_reqs\.*:[ \t]*(\d+)[ \t]+([\d.]+)/s").unwrap()
});
static RE_FAILED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*http_req_failed\.*:[ \t]*([\d.]+)%[ \t]+(?:✓[ \t]*(\d+)|(\d+) out of (\d+))",
    )
    .unwrap()
});
static RE_VUS_MAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*vus_max\.*:[ \t]*(\d+)").unwrap());
static RE_DATA_RECEIVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*data_received\.*:[ \t]*[\d.]+[ \t]*\w+[ \t]+([\d.]+[ \t]*\w+)/s")
        .unwrap()
});
static RE_SCENARIO_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*script:[ \t]*(\S+)").unwrap());

/// Parse k6 output: a JSON summary (`--summary-export` or `handleSummary`) when the
/// payload is one, otherwise the end-of-test text summary.
pub fn parse(text: &str) -> BenchmarkMetrics {
    parse_json(text).unwrap_or_else(|| parse_text(text))
}

fn parse_json(text: &str) -> Option<BenchmarkMetrics> {
    let root: Value = serde_json::from_str(text.trim()).ok()?;
    let metrics = root.get("metrics")?.as_object()?;
    let mut m = BenchmarkMetrics::empty(SourceKind::K6);

    let values = |name: &str| metric_values(metrics, name);
    let num = |v: &Value, key: &str| v.get(key).and_then(Value::as_f64);

    if let Some(d) = values("http_req_duration") {
        m.latency.avg = num(d, "avg");
        m.latency.median = num(d, "med");
        m.latency.max = num(d, "max");
        m.latency.p90 = num(d, "p(90)");
        m.latency.p95 = num(d, "p(95)");
        m.latency.p99 = num(d, "p(99)");
    }
    if let Some(r) = values("http_reqs") {
        m.total_requests = num(r, "count").map(|c| c as u64);
        m.throughput.requests_per_sec = num(r, "rate");
    }
    if let Some(f) = values("http_req_failed") {
        // For a rate metric, "passes" counts samples where the condition (failure) was true.
        m.error_count = num(f, "passes").map(|p| p as u64).or_else(|| {
            let rate = num(f, "rate").or_else(|| num(f, "value"))?;
            let total = m.total_requests?;
            Some((rate * total as f64).round() as u64)
        });
    }
    if let Some(v) = values("vus_max") {
        m.concurrency = num(v, "max").or_else(|| num(v, "value")).map(|c| c as u32);
    }
    if let Some(d) = values("data_received") {
        m.throughput.bytes_per_sec = num(d, "rate");
    }
    m.duration_secs = root
        .pointer("/state/testRunDurationMs")
        .and_then(Value::as_f64)
        .map(|ms| ms / 1000.0);

    Some(m)
}

/// handleSummary nests a metric's figures under `values`; `--summary-export` does not.
fn metric_values<'a>(metrics: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let metric = metrics.get(name)?;
    Some(metric.get("values").unwrap_or(metric))
}

fn parse_text(text: &str) -> BenchmarkMetrics {
    let mut m = BenchmarkMetrics::empty(SourceKind::K6);

    m.target = capture(&RE_SCENARIO_URL, text).map(str::to_string);

    if let Some(line) = capture(&RE_DURATION_LINE, text) {
        for c in RE_KEY_VALUE.captures_iter(line) {
            let value = parse_duration_ms(&c[2]);
            match &c[1] {
                "avg" => m.latency.avg = value,
                "med" => m.latency.median = value,
                "max" => m.latency.max = value,
                "p(90)" => m.latency.p90 = value,
                "p(95)" => m.latency.p95 = value,
                "p(99)" => m.latency.p99 = value,
                _ => {}
            }
        }
    }

    if let Some(c) = RE_REQS.captures(text) {
        m.total_requests = c[1].parse().ok();
        m.throughput.requests_per_sec = c[2].parse().ok();
    }

    if let Some(c) = RE_FAILED.captures(text) {
        let explicit = c.get(2).or_else(|| c.get(3)).and_then(|g| g.as_str().parse().ok());
        m.error_count = explicit.or_else(|| {
            let pct: f64 = c[1].parse().ok()?;
            let total = m.total_requests?;
            Some((pct / 100.0 * total as f64).round() as u64)
        });
        if m.total_requests.is_none() {
            m.total_requests = c.get(4).and_then(|g| g.as_str().parse().ok());
        }
    }

    m.concurrency = capture(&RE_VUS_MAX, text).and_then(|v| v.parse().ok());
    m.throughput.bytes_per_sec = capture(&RE_DATA_RECEIVED, text).and_then(parse_si_bytes);

    m
}
