//! Load-test tool output parsers.
//!
//! Each parser scans a whole output blob for the fixed-shape summary lines its tool
//! prints and fills whatever it finds. Fields a tool does not report stay `None`.

pub mod ab;
pub mod autocannon;
pub mod k6;
pub mod siege;
pub mod wrk;

use regex::Regex;
use serde::Serialize;

use ngxscope_core::{ScopeError, SourceKind};

use crate::stats::percentage;

/// Latency figures in milliseconds. Tools disagree on precision, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub avg: Option<f64>,
    pub stdev: Option<f64>,
    pub median: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub p99: Option<f64>,
    pub max: Option<f64>,
}

/// Request and byte rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Throughput {
    pub requests_per_sec: Option<f64>,
    pub bytes_per_sec: Option<f64>,
}

/// Transport-level failures reported by the tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SocketErrors {
    pub connect: u64,
    pub read: u64,
    pub write: u64,
    pub timeout: u64,
}

impl SocketErrors {
    pub fn total(&self) -> u64 {
        self.connect
            .saturating_add(self.read)
            .saturating_add(self.write)
            .saturating_add(self.timeout)
    }
}

/// Summary fields extracted from one load-test run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkMetrics {
    pub tool: SourceKind,
    pub target: Option<String>,
    pub concurrency: Option<u32>,
    pub threads: Option<u32>,
    pub duration_secs: Option<f64>,
    pub total_requests: Option<u64>,
    pub latency: LatencySummary,
    pub throughput: Throughput,
    /// Failed or non-2xx/3xx responses.
    pub error_count: Option<u64>,
    pub socket_errors: Option<SocketErrors>,
}

impl BenchmarkMetrics {
    pub fn empty(tool: SourceKind) -> Self {
        Self {
            tool,
            target: None,
            concurrency: None,
            threads: None,
            duration_secs: None,
            total_requests: None,
            latency: LatencySummary::default(),
            throughput: Throughput::default(),
            error_count: None,
            socket_errors: None,
        }
    }

    /// Error count as a percentage of total requests, when both are known.
    pub fn error_rate(&self) -> Option<f64> {
        match (self.error_count, self.total_requests) {
            (Some(errors), Some(total)) if total > 0 => Some(percentage(errors, total)),
            _ => None,
        }
    }

    pub fn socket_error_total(&self) -> u64 {
        self.socket_errors.map(|s| s.total()).unwrap_or(0)
    }
}

pub type BenchParser = fn(&str) -> BenchmarkMetrics;

/// Tool to parser lookup table.
const PARSERS: [(SourceKind, BenchParser); 5] = [
    (SourceKind::Wrk, wrk::parse),
    (SourceKind::Ab, ab::parse),
    (SourceKind::K6, k6::parse),
    (SourceKind::Autocannon, autocannon::parse),
    (SourceKind::Siege, siege::parse),
];

/// Parser for a tool, or `None` if `tool` is not a load-test tool.
pub fn parser_for(tool: SourceKind) -> Option<BenchParser> {
    PARSERS
        .iter()
        .find(|(kind, _)| *kind == tool)
        .map(|(_, parser)| *parser)
}

/// Parse `text` as the output of `tool`.
pub fn parse(text: &str, tool: SourceKind) -> Result<BenchmarkMetrics, ScopeError> {
    let parser = parser_for(tool).ok_or_else(|| ScopeError::UnknownTool(tool.to_string()))?;
    Ok(parser(text))
}

// --- Capture helpers ---

pub(crate) fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

pub(crate) fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    capture(re, text).and_then(|s| s.replace(',', "").parse().ok())
}

pub(crate) fn capture_u64(re: &Regex, text: &str) -> Option<u64> {
    capture(re, text).and_then(|s| s.replace(',', "").parse().ok())
}

/// Add two optional counts; `None` only when both are absent.
pub(crate) fn sum_present(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_covers_every_tool() {
        for tool in [
            SourceKind::Wrk,
            SourceKind::Ab,
            SourceKind::K6,
            SourceKind::Autocannon,
            SourceKind::Siege,
        ] {
            assert!(parser_for(tool).is_some(), "{tool} has no parser");
        }
        assert!(parser_for(SourceKind::AccessLog).is_none());
    }

    #[test]
    fn log_kind_is_unknown_tool() {
        let err = parse("anything", SourceKind::ErrorLog).unwrap_err();
        assert!(matches!(err, ScopeError::UnknownTool(_)));
    }

    #[test]
    fn error_rate_needs_both_fields() {
        let mut m = BenchmarkMetrics::empty(SourceKind::Wrk);
        assert!(m.error_rate().is_none());
        m.error_count = Some(5);
        assert!(m.error_rate().is_none());
        m.total_requests = Some(200);
        assert!((m.error_rate().unwrap() - 2.5).abs() < 1e-9);
        m.total_requests = Some(0);
        assert!(m.error_rate().is_none());
    }

    #[test]
    fn sum_present_keeps_absence() {
        assert_eq!(sum_present(None, None), None);
        assert_eq!(sum_present(Some(2), None), Some(2));
        assert_eq!(sum_present(Some(2), Some(3)), Some(5));
        assert_eq!(sum_present(Some(u64::MAX), Some(3)), Some(u64::MAX));
    }

    #[test]
    fn socket_error_total_saturates() {
        let errors = SocketErrors {
            connect: u64::MAX,
            read: 1,
            write: 0,
            timeout: 2,
        };
        assert_eq!(errors.total(), u64::MAX);
    }
}
