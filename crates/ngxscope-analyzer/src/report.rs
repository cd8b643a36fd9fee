//! Plain-text report for terminal display.

use std::collections::BTreeMap;

use crate::analyze::{AnalysisResult, BenchmarkAnalysis, LogAnalysis, LogMetrics};
use crate::bench::BenchmarkMetrics;
use crate::security::SecurityIssue;
use crate::stats::{AccessMetrics, ErrorMetrics, TimeRange};
use crate::{Category, RankedEntry, Recommendation, Severity};

const RULE: &str = "----------------------------------------";

/// Format any analysis result as a sectioned text report.
pub fn format_report(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Log(log) => format_log(log),
        AnalysisResult::Benchmark(bench) => format_benchmark(bench),
    }
}

fn format_log(a: &LogAnalysis) -> String {
    let mut out = String::new();
    match &a.metrics {
        LogMetrics::Access(m) => access_section(&mut out, m),
        LogMetrics::Error(m) => error_section(&mut out, m),
    }
    security_section(&mut out, &a.security_issues);
    recommendation_section(&mut out, &a.recommendations);
    out
}

fn format_benchmark(a: &BenchmarkAnalysis) -> String {
    let mut out = String::new();
    benchmark_section(&mut out, &a.metrics, a.grade.as_str());
    recommendation_section(&mut out, &a.recommendations);
    out
}

fn header(out: &mut String, title: &str) {
    out.push_str(&format!("{title}\n{RULE}\n"));
}

fn access_section(out: &mut String, m: &AccessMetrics) {
    header(out, "Access log analysis");
    out.push_str(&format!(
        "Requests: {} | Unique clients: {} | Bytes: {}\n",
        m.total_requests,
        m.unique_clients,
        human_bytes(m.total_bytes as f64)
    ));
    if let Some(range) = &m.time_range {
        out.push_str(&format!("Period: {}\n", format_range(range)));
    }

    let b = &m.status_breakdown;
    out.push_str(&format!(
        "Status: 2xx {:.2}% | 3xx {:.2}% | 4xx {:.2}% | 5xx {:.2}%\n",
        b.success.percentage,
        b.redirect.percentage,
        b.client_error.percentage,
        b.server_error.percentage
    ));
    if !m.methods.is_empty() {
        let methods: Vec<String> = m.methods.iter().map(|(k, v)| format!("{k} {v}")).collect();
        out.push_str(&format!("Methods: {}\n", methods.join(", ")));
    }

    if let Some(rt) = &m.response_times {
        out.push_str(&format!(
            "Response time: avg {:.2}ms | median {:.2}ms | p95 {:.2}ms | p99 {:.2}ms | max {:.2}ms\n",
            rt.avg, rt.median, rt.p95, rt.p99, rt.max
        ));
    }
    out.push_str(&format!(
        "Bot traffic: {} requests ({:.2}%)\n",
        m.bot_traffic.count, m.bot_traffic.percentage
    ));
    if let Some(hour) = m.peak_hour {
        let count = m.hourly.get(&hour).copied().unwrap_or(0);
        out.push_str(&format!("Peak hour: {hour:02}:00 ({count} requests)\n"));
    }

    ranked(out, "Top paths", &m.top_paths);
    ranked(out, "Top clients", &m.top_clients);
    ranked(out, "Top user agents", &m.top_user_agents);
}

fn error_section(out: &mut String, m: &ErrorMetrics) {
    header(out, "Error log analysis");
    out.push_str(&format!(
        "Entries: {} | Critical: {}\n",
        m.total_errors, m.critical_count
    ));
    if let Some(range) = &m.time_range {
        out.push_str(&format!("Period: {}\n", format_range(range)));
    }
    if !m.levels.is_empty() {
        let levels: Vec<String> = m.levels.iter().map(|(k, v)| format!("{k} {v}")).collect();
        out.push_str(&format!("Levels: {}\n", levels.join(", ")));
    }
    if !m.categories.is_empty() {
        let cats: Vec<String> = m
            .categories
            .iter()
            .map(|(k, v)| format!("{} {v}", k.as_str()))
            .collect();
        out.push_str(&format!("Categories: {}\n", cats.join(", ")));
    }

    ranked(out, "Top messages", &m.top_messages);
    ranked(out, "Top clients", &m.top_clients);
}

fn benchmark_section(out: &mut String, m: &BenchmarkMetrics, grade: &str) {
    header(out, &format!("Benchmark analysis ({})", m.tool));
    out.push_str(&format!("Grade: {grade}\n"));
    if let Some(target) = &m.target {
        out.push_str(&format!("Target: {target}\n"));
    }

    let mut setup = Vec::new();
    if let Some(c) = m.concurrency {
        setup.push(format!("Concurrency: {c}"));
    }
    if let Some(t) = m.threads {
        setup.push(format!("Threads: {t}"));
    }
    if let Some(d) = m.duration_secs {
        setup.push(format!("Duration: {d:.2}s"));
    }
    if let Some(n) = m.total_requests {
        setup.push(format!("Requests: {n}"));
    }
    if !setup.is_empty() {
        out.push_str(&setup.join(" | "));
        out.push('\n');
    }

    let l = &m.latency;
    let latency: Vec<String> = [
        ("avg", l.avg),
        ("stdev", l.stdev),
        ("median", l.median),
        ("p90", l.p90),
        ("p95", l.p95),
        ("p99", l.p99),
        ("max", l.max),
    ]
    .iter()
    .filter_map(|(name, v)| v.map(|v| format!("{name} {v:.2}ms")))
    .collect();
    if !latency.is_empty() {
        out.push_str(&format!("Latency: {}\n", latency.join(" | ")));
    }

    if let Some(rps) = m.throughput.requests_per_sec {
        out.push_str(&format!("Throughput: {rps:.2} req/s"));
        if let Some(bps) = m.throughput.bytes_per_sec {
            out.push_str(&format!(" | {}/s", human_bytes(bps)));
        }
        out.push('\n');
    }

    if let Some(errors) = m.error_count {
        match m.error_rate() {
            Some(rate) => out.push_str(&format!("Errors: {errors} ({rate:.2}%)\n")),
            None => out.push_str(&format!("Errors: {errors}\n")),
        }
    }
    if let Some(s) = &m.socket_errors {
        out.push_str(&format!(
            "Socket errors: connect {} | read {} | write {} | timeout {}\n",
            s.connect, s.read, s.write, s.timeout
        ));
    }
}

fn security_section(out: &mut String, issues: &[SecurityIssue]) {
    if issues.is_empty() {
        return;
    }
    out.push_str("\nSecurity issues:\n");
    for issue in issues {
        out.push_str(&format!(
            "  {} {}: {}\n",
            marker(issue.severity),
            issue.kind.as_str(),
            issue.message
        ));
        for path in &issue.paths {
            out.push_str(&format!("      {}\n", truncate(path, 80)));
        }
    }
}

/// Recommendations grouped by category, most severe first within each group.
fn recommendation_section(out: &mut String, recs: &[Recommendation]) {
    out.push_str("\nRecommendations:\n");
    if recs.is_empty() {
        out.push_str("  No issues found.\n");
        return;
    }

    let mut groups: BTreeMap<Category, Vec<&Recommendation>> = BTreeMap::new();
    for r in recs {
        groups.entry(r.category).or_default().push(r);
    }
    for (category, mut items) in groups {
        items.sort_by_key(|r| r.severity);
        out.push_str(&format!("  [{}]\n", category.as_str()));
        for r in items {
            out.push_str(&format!("    {} {}\n", marker(r.severity), r.message));
            for s in &r.suggestions {
                out.push_str(&format!("        - {s}\n"));
            }
        }
    }
}

fn ranked(out: &mut String, title: &str, entries: &[RankedEntry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("{title}:\n"));
    for (i, e) in entries.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {} (x{}, {:.2}%)\n",
            i + 1,
            truncate(&e.value, 70),
            e.count,
            e.percentage
        ));
    }
}

fn marker(severity: Severity) -> String {
    format!("[{}]", severity.as_str().to_uppercase())
}

fn format_range(range: &TimeRange) -> String {
    format!(
        "{} .. {}",
        range.start.format("%Y-%m-%d %H:%M:%S"),
        range.end.format("%Y-%m-%d %H:%M:%S")
    )
}

fn human_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{value:.0}{}", UNITS[unit])
    } else {
        format!("{value:.2}{}", UNITS[unit])
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{analyze, analyze_benchmark};
    use ngxscope_core::RequestedKind;

    #[test]
    fn access_report_sections() {
        let text = r#"10.0.0.1 - - [15/Jan/2024:10:30:00 +0000] "GET /../../etc/passwd HTTP/1.1" 400 0 "-" "curl/8.0" rt=2.5"#;
        let report = format_report(&analyze(text, RequestedKind::Auto).unwrap());
        assert!(report.starts_with("Access log analysis"));
        assert!(report.contains("Top paths:"));
        assert!(report.contains("Security issues:"));
        assert!(report.contains("[HIGH] path-traversal"));
        assert!(report.contains("[security]"));
        assert!(report.contains("Peak hour: 10:00"));
    }

    #[test]
    fn recommendations_grouped_by_category_then_severity() {
        let recs = vec![
            Recommendation::new(Severity::Low, Category::Performance, "slow-ish", &[]),
            Recommendation::new(Severity::High, Category::Reliability, "sockets", &[]),
            Recommendation::new(Severity::High, Category::Performance, "very slow", &[]),
        ];
        let mut out = String::new();
        recommendation_section(&mut out, &recs);
        let reliability = out.find("[reliability]").unwrap();
        let performance = out.find("[performance]").unwrap();
        let very_slow = out.find("very slow").unwrap();
        let slow_ish = out.find("slow-ish").unwrap();
        assert!(reliability < performance);
        assert!(performance < very_slow && very_slow < slow_ish);
    }

    #[test]
    fn benchmark_report_omits_unknown_fields() {
        let text = "This is ApacheBench, Version 2.3\nRequests per second:    1500.50 [#/sec] (mean)\n";
        let report = format_report(&AnalysisResult::Benchmark(
            analyze_benchmark(text, RequestedKind::Auto).unwrap(),
        ));
        assert!(report.contains("Benchmark analysis (ab)"));
        assert!(report.contains("Grade: A"));
        assert!(report.contains("Throughput: 1500.50 req/s"));
        assert!(!report.contains("Latency:"));
        assert!(!report.contains("Errors:"));
        assert!(report.contains("No issues found."));
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(human_bytes(512.0), "512B");
        assert_eq!(human_bytes(1536.0), "1.50KB");
        assert_eq!(human_bytes(3.0 * 1024.0 * 1024.0), "3.00MB");
    }

    #[test]
    fn truncates_long_values() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
