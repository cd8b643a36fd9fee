//! Entry points: detect, parse, aggregate, scan and recommend in one call.

use serde::Serialize;
use tracing::debug;

use crate::bench::{self, BenchmarkMetrics};
use crate::detect::resolve;
use crate::grade::{grade, Grade};
use crate::security::{self, SecurityIssue};
use crate::stats::{aggregate_access, aggregate_errors, AccessMetrics, ErrorMetrics};
use crate::{access, errorlog, recommend, AnalyzerOptions, Recommendation};
use ngxscope_core::{RequestedKind, ScopeError, SourceKind};

/// Metrics of a log analysis, tagged with the log kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LogMetrics {
    Access(AccessMetrics),
    Error(ErrorMetrics),
}

impl LogMetrics {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Access(_) => SourceKind::AccessLog,
            Self::Error(_) => SourceKind::ErrorLog,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogAnalysis {
    pub metrics: LogMetrics,
    /// Always empty for error logs.
    pub security_issues: Vec<SecurityIssue>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkAnalysis {
    pub metrics: BenchmarkMetrics,
    pub grade: Grade,
    pub recommendations: Vec<Recommendation>,
}

/// Result of [`Analyzer::analyze`], whichever family the input belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Log(LogAnalysis),
    Benchmark(BenchmarkAnalysis),
}

/// Stateless analysis engine. Holds only its options, so one instance can serve any
/// number of independent calls.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
}

impl Analyzer {
    /// `top_n` is raised to at least 1; an empty top list would hide every
    /// path from the security scan.
    pub fn new(mut options: AnalyzerOptions) -> Self {
        options.top_n = options.top_n.max(1);
        Self { options }
    }

    pub fn options(&self) -> &AnalyzerOptions {
        &self.options
    }

    /// Analyze an access or error log. A benchmark kind is `UnsupportedFormat`.
    pub fn analyze_log(
        &self,
        text: &str,
        requested: RequestedKind,
    ) -> Result<LogAnalysis, ScopeError> {
        match resolve(text, requested)? {
            SourceKind::AccessLog => Ok(self.access_log(text)),
            SourceKind::ErrorLog => Ok(self.error_log(text)),
            other => Err(ScopeError::UnsupportedFormat(format!(
                "{other} is a benchmark tool, not a log format"
            ))),
        }
    }

    /// Analyze load-test tool output. A log kind is `UnknownTool`.
    pub fn analyze_benchmark(
        &self,
        text: &str,
        requested: RequestedKind,
    ) -> Result<BenchmarkAnalysis, ScopeError> {
        let tool = resolve(text, requested)?;
        let metrics = bench::parse(text, tool)?;
        let grade = grade(&metrics);
        let recommendations = recommend::for_benchmark(&metrics);
        debug!(
            tool = %tool,
            total_requests = ?metrics.total_requests,
            grade = %grade,
            recommendations = recommendations.len(),
            "analyzed benchmark output"
        );
        Ok(BenchmarkAnalysis {
            metrics,
            grade,
            recommendations,
        })
    }

    /// Analyze any supported input, dispatching on the resolved kind.
    pub fn analyze(
        &self,
        text: &str,
        requested: RequestedKind,
    ) -> Result<AnalysisResult, ScopeError> {
        let kind = resolve(text, requested)?;
        let explicit = RequestedKind::Explicit(kind);
        if kind.is_log() {
            self.analyze_log(text, explicit).map(AnalysisResult::Log)
        } else {
            self.analyze_benchmark(text, explicit)
                .map(AnalysisResult::Benchmark)
        }
    }

    fn access_log(&self, text: &str) -> LogAnalysis {
        let records = access::parse(text);
        let metrics = aggregate_access(&records, &self.options);
        let security_issues = security::scan_paths(&metrics.top_paths);
        let recommendations = recommend::for_access(&metrics, &security_issues);
        debug!(
            records = records.len(),
            security_issues = security_issues.len(),
            recommendations = recommendations.len(),
            "analyzed access log"
        );
        LogAnalysis {
            metrics: LogMetrics::Access(metrics),
            security_issues,
            recommendations,
        }
    }

    fn error_log(&self, text: &str) -> LogAnalysis {
        let records = errorlog::parse(text);
        let metrics = aggregate_errors(&records, &self.options);
        let recommendations = recommend::for_errors(&metrics);
        debug!(
            records = records.len(),
            critical = metrics.critical_count,
            recommendations = recommendations.len(),
            "analyzed error log"
        );
        LogAnalysis {
            metrics: LogMetrics::Error(metrics),
            security_issues: Vec::new(),
            recommendations,
        }
    }
}

/// [`Analyzer::analyze_log`] with default options.
pub fn analyze_log(text: &str, requested: RequestedKind) -> Result<LogAnalysis, ScopeError> {
    Analyzer::default().analyze_log(text, requested)
}

/// [`Analyzer::analyze_benchmark`] with default options.
pub fn analyze_benchmark(
    text: &str,
    requested: RequestedKind,
) -> Result<BenchmarkAnalysis, ScopeError> {
    Analyzer::default().analyze_benchmark(text, requested)
}

/// [`Analyzer::analyze`] with default options.
pub fn analyze(text: &str, requested: RequestedKind) -> Result<AnalysisResult, ScopeError> {
    Analyzer::default().analyze(text, requested)
}
