//! Pattern-based anomaly detection over aggregated access log data.
//!
//! Injection and traversal checks run over the ranked top-path list only, not the full
//! record set: an attack path outside the top N is not reported.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::stats::{percentage, serialize_pct};
use crate::{RankedEntry, Severity};

/// User-agent substrings (lowercase) that mark crawlers and scripted clients.
pub const DEFAULT_BOT_SIGNATURES: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "slurp",
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "go-http-client",
    "java/",
    "libwww-perl",
    "httpclient",
    "scrapy",
    "headless",
    "phantomjs",
    "nikto",
    "sqlmap",
    "masscan",
    "zgrab",
];

static RE_SQL_INJECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)('|%27|%22|;|%3b|--|/\*|\*/|#|%23|\bunion\b.+\bselect\b|\bselect\b.+\bfrom\b|\b(drop|truncate|alter)\s+table\b|\binsert\s+into\b|\bdelete\s+from\b|\bexec(\s|\()|\bsleep\(|\bbenchmark\()",
    )
    .unwrap()
});
static RE_PATH_TRAVERSAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\.\./|\.\.\\|%2e%2e|\.\.%2f|/etc/(passwd|shadow|hosts)|/proc/self|c:\\windows|/windows/system32|/boot\.ini)",
    )
    .unwrap()
});

/// Kind of suspicious request pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecurityIssueKind {
    SqlInjection,
    PathTraversal,
}

impl SecurityIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlInjection => "sql-injection",
            Self::PathTraversal => "path-traversal",
        }
    }
}

/// A suspicious pattern found among the most requested paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityIssue {
    #[serde(rename = "type")]
    pub kind: SecurityIssueKind,
    pub severity: Severity,
    pub message: String,
    pub paths: Vec<String>,
}

/// Share of traffic attributed to automated clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BotTraffic {
    pub count: u64,
    #[serde(serialize_with = "serialize_pct")]
    pub percentage: f64,
}

/// Scan ranked paths for injection and traversal signatures.
/// Returns at most one issue per kind, listing every offending path in rank order.
pub fn scan_paths(top_paths: &[RankedEntry]) -> Vec<SecurityIssue> {
    let mut issues = Vec::new();

    let injection: Vec<String> = top_paths
        .iter()
        .filter(|e| RE_SQL_INJECTION.is_match(&e.value))
        .map(|e| e.value.clone())
        .collect();
    if !injection.is_empty() {
        issues.push(SecurityIssue {
            kind: SecurityIssueKind::SqlInjection,
            severity: Severity::High,
            message: format!(
                "Possible SQL injection attempts in {} frequently requested path(s)",
                injection.len()
            ),
            paths: injection,
        });
    }

    let traversal: Vec<String> = top_paths
        .iter()
        .filter(|e| RE_PATH_TRAVERSAL.is_match(&e.value))
        .map(|e| e.value.clone())
        .collect();
    if !traversal.is_empty() {
        issues.push(SecurityIssue {
            kind: SecurityIssueKind::PathTraversal,
            severity: Severity::High,
            message: format!(
                "Possible path traversal attempts in {} frequently requested path(s)",
                traversal.len()
            ),
            paths: traversal,
        });
    }

    issues
}

/// Whether a user agent matches any of the (lowercase) signatures.
pub fn is_bot(user_agent: &str, signatures: &[String]) -> bool {
    let ua = user_agent.to_lowercase();
    signatures.iter().any(|sig| ua.contains(sig.as_str()))
}

/// Fraction of `total` requests whose user agent matches a bot signature.
pub fn bot_traffic<'a>(
    user_agents: impl Iterator<Item = (&'a str, u64)>,
    total: u64,
    signatures: &[String],
) -> BotTraffic {
    let count = user_agents
        .filter(|(ua, _)| is_bot(ua, signatures))
        .map(|(_, n)| n)
        .sum();
    BotTraffic {
        count,
        percentage: percentage(count, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AnalyzerOptions;

    fn entry(path: &str, count: u64) -> RankedEntry {
        RankedEntry {
            value: path.to_string(),
            count,
            percentage: 0.0,
        }
    }

    #[test]
    fn detects_sql_injection() {
        let issues = scan_paths(&[entry("/", 10), entry("/admin' OR '1'='1", 3)]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, SecurityIssueKind::SqlInjection);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].paths, vec!["/admin' OR '1'='1".to_string()]);
    }

    #[test]
    fn detects_path_traversal() {
        let issues = scan_paths(&[entry("/../../etc/passwd", 2)]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, SecurityIssueKind::PathTraversal);
        assert_eq!(issues[0].kind.as_str(), "path-traversal");
    }

    #[test]
    fn clean_paths_have_no_issues() {
        let paths = [
            entry("/", 1),
            entry("/api/v1/users", 1),
            entry("/static/app.min.js", 1),
            entry("/blog/select-the-best-option", 1),
        ];
        assert!(scan_paths(&paths).is_empty());
    }

    #[test]
    fn bot_classification_is_case_insensitive() {
        let sigs = AnalyzerOptions::default().bot_signatures;
        assert!(is_bot("Mozilla/5.0 (compatible; Googlebot/2.1)", &sigs));
        assert!(is_bot("CURL/8.1", &sigs));
        assert!(!is_bot("Mozilla/5.0 (Windows NT 10.0; Win64; x64)", &sigs));
    }

    #[test]
    fn bot_share_of_total() {
        let sigs = AnalyzerOptions::default().bot_signatures;
        let agents = vec![("Googlebot/2.1", 3u64), ("Mozilla/5.0", 6), ("curl/8.0", 1)];
        let bots = bot_traffic(agents.into_iter(), 10, &sigs);
        assert_eq!(bots.count, 4);
        assert!((bots.percentage - 40.0).abs() < 1e-9);
    }
}
