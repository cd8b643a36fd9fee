//! Telemetry analysis for nginx access/error logs and HTTP load-test output.
//!
//! Every entry point is a pure function over an in-memory text blob: detect the format,
//! parse records, aggregate statistics, scan for anomalies, and derive recommendations
//! (plus a letter grade for benchmarks).

pub mod access;
pub mod analyze;
pub mod bench;
pub mod detect;
pub mod errorlog;
pub mod grade;
pub mod recommend;
pub mod report;
pub mod security;
pub mod stats;
pub mod units;

pub use analyze::{
    analyze, analyze_benchmark, analyze_log, AnalysisResult, Analyzer, BenchmarkAnalysis,
    LogAnalysis, LogMetrics,
};
pub use detect::detect_format;
pub use ngxscope_core::{RequestedKind, ScopeError, SourceKind};
pub use report::format_report;

use serde::Serialize;

/// Severity attached to recommendations and security issues.
/// Variant order is the report order: most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Info => "info",
        }
    }
}

/// Area of the nginx setup a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Reliability,
    Errors,
    Performance,
    Capacity,
    Traffic,
    Configuration,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Reliability => "reliability",
            Self::Errors => "errors",
            Self::Performance => "performance",
            Self::Capacity => "capacity",
            Self::Traffic => "traffic",
            Self::Configuration => "configuration",
        }
    }
}

/// A single piece of advice derived from the aggregated metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Recommendation {
    pub fn new(
        severity: Severity,
        category: Category,
        message: impl Into<String>,
        suggestions: &[&str],
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One row of a top-N list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub value: String,
    pub count: u64,
    /// Share of all parsed records, 0-100.
    #[serde(serialize_with = "stats::serialize_pct")]
    pub percentage: f64,
}

/// Tunables for an [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Length of every ranked list; the security scan only looks at the top paths.
    pub top_n: usize,
    /// Lowercase user-agent substrings counted as automated traffic.
    pub bot_signatures: Vec<String>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            bot_signatures: security::DEFAULT_BOT_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl AnalyzerOptions {
    /// Default options with extra bot signatures appended (lowercased, deduplicated).
    pub fn with_extra_bots<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for sig in extra {
            let sig = sig.as_ref().trim().to_lowercase();
            if !sig.is_empty() && !self.bot_signatures.contains(&sig) {
                self.bot_signatures.push(sig);
            }
        }
        self
    }
}
