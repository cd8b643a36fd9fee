//! Threshold rules that turn aggregated metrics into recommendations.
//!
//! Rules are independent: every rule whose condition holds fires, and a rule whose
//! input is absent is skipped rather than evaluated against zero.

use crate::bench::BenchmarkMetrics;
use crate::errorlog::ErrorCategory;
use crate::security::{SecurityIssue, SecurityIssueKind};
use crate::stats::{percentage, AccessMetrics, ErrorMetrics};
use crate::{Category, Recommendation, Severity};

// ---------------------------------------------------------------------------
// Access logs
// ---------------------------------------------------------------------------

pub fn for_access(metrics: &AccessMetrics, issues: &[SecurityIssue]) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let total = metrics.total_requests;

    let server_error_pct = metrics.status_breakdown.server_error.percentage;
    if server_error_pct > 5.0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Errors,
            format!("{server_error_pct:.2}% of requests returned a 5xx status"),
            &[
                "Check the error log for upstream failures around the same time",
                "Verify upstream health and tune proxy_next_upstream for idempotent requests",
                "Review proxy_read_timeout and proxy_connect_timeout against upstream latency",
            ],
        ));
    }

    let not_found_pct = percentage(metrics.status_count(404), total);
    if not_found_pct > 10.0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Errors,
            format!("{not_found_pct:.2}% of requests returned 404 Not Found"),
            &[
                "Look for broken links or stale references in the top requested paths",
                "Add redirects for moved content",
                "Consider rate limiting clients that scan for non-existent paths",
            ],
        ));
    }

    if let Some(rt) = &metrics.response_times {
        if rt.p95 > 1000.0 {
            out.push(Recommendation::new(
                Severity::High,
                Category::Performance,
                format!("p95 response time is {:.0}ms", rt.p95),
                &[
                    "Enable proxy_cache or fastcgi_cache for cacheable responses",
                    "Profile the slowest upstream endpoints",
                    "Enable keepalive connections to upstreams",
                ],
            ));
        } else if rt.p95 > 500.0 {
            out.push(Recommendation::new(
                Severity::Medium,
                Category::Performance,
                format!("p95 response time is {:.0}ms", rt.p95),
                &[
                    "Enable gzip compression for text responses",
                    "Review upstream response times for the top paths",
                ],
            ));
        }
    }

    let bot_pct = metrics.bot_traffic.percentage;
    if bot_pct > 30.0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Traffic,
            format!("{bot_pct:.2}% of requests come from bots or scripted clients"),
            &[
                "Apply limit_req to automated user agents",
                "Serve a robots.txt that restricts crawl scope",
                "Block abusive user agents with a map on $http_user_agent",
            ],
        ));
    }

    if let Some(top) = metrics.top_clients.first() {
        if top.percentage > 50.0 {
            out.push(Recommendation::new(
                Severity::High,
                Category::Traffic,
                format!(
                    "Client {} accounts for {:.2}% of all requests",
                    top.value, top.percentage
                ),
                &[
                    "Confirm whether the client is a load balancer, proxy or health checker",
                    "Configure limit_req_zone and limit_conn per client address",
                    "Use real_ip_header if requests arrive through a proxy",
                ],
            ));
        }
    }

    for issue in issues {
        out.push(security_recommendation(issue));
    }

    out
}

fn security_recommendation(issue: &SecurityIssue) -> Recommendation {
    let suggestions: &[&str] = match issue.kind {
        SecurityIssueKind::SqlInjection => &[
            "Put a web application firewall such as ModSecurity in front of the application",
            "Use parameterized queries in the application",
            "Block or rate limit the offending client addresses",
        ],
        SecurityIssueKind::PathTraversal => &[
            "Make sure root and alias directives never expose paths outside the web root",
            "Deny requests containing .. with a location rule",
            "Block or rate limit the offending client addresses",
        ],
    };
    Recommendation::new(
        Severity::High,
        Category::Security,
        issue.message.clone(),
        suggestions,
    )
}

// ---------------------------------------------------------------------------
// Error logs
// ---------------------------------------------------------------------------

pub fn for_errors(metrics: &ErrorMetrics) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if metrics.critical_count > 0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Reliability,
            format!(
                "{} critical-level (crit/alert/emerg) errors logged",
                metrics.critical_count
            ),
            &[
                "Investigate critical entries first; they usually mean a worker or upstream failed",
                "Check system resources (memory, disk, file descriptors) at those times",
            ],
        ));
    }

    let timeouts = metrics.category_count(ErrorCategory::UpstreamTimeout);
    if timeouts > 0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Performance,
            format!("{timeouts} upstream timeouts"),
            &[
                "Raise proxy_read_timeout only if the upstream is legitimately slow",
                "Profile the upstream endpoints that time out",
                "Enable keepalive to upstreams to cut connection setup time",
            ],
        ));
    }

    let unreachable = metrics.category_count(ErrorCategory::ConnectionRefused)
        + metrics.category_count(ErrorCategory::NoLiveUpstreams);
    if unreachable > 0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Reliability,
            format!("{unreachable} failed connections to upstream servers"),
            &[
                "Verify the upstream processes are running and listening on the configured address",
                "Tune max_fails and fail_timeout in the upstream block",
                "Add a backup server to the upstream group",
            ],
        ));
    }

    let fd_exhausted = metrics.category_count(ErrorCategory::TooManyOpenFiles);
    if fd_exhausted > 0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Capacity,
            format!("{fd_exhausted} 'too many open files' errors"),
            &[
                "Raise worker_rlimit_nofile",
                "Raise the system file descriptor limit (ulimit -n / LimitNOFILE)",
                "Check worker_connections against the descriptor limit",
            ],
        ));
    }

    let denied = metrics.category_count(ErrorCategory::PermissionDenied);
    if denied > 0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Configuration,
            format!("{denied} permission denied errors"),
            &[
                "Check ownership and mode of the served files and sockets",
                "Confirm the nginx worker user can traverse every parent directory",
                "Check SELinux or AppArmor denials",
            ],
        ));
    }

    let too_large = metrics.category_count(ErrorCategory::BodyTooLarge);
    if too_large > 0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Configuration,
            format!("{too_large} request bodies exceeded client_max_body_size"),
            &[
                "Raise client_max_body_size for the upload locations that need it",
                "Keep the default limit elsewhere",
            ],
        ));
    }

    let ssl = metrics.category_count(ErrorCategory::Ssl);
    if ssl > 0 {
        out.push(Recommendation::new(
            Severity::Medium,
            Category::Security,
            format!("{ssl} SSL/TLS errors"),
            &[
                "Check certificate validity and the full chain",
                "Review ssl_protocols and ssl_ciphers for client compatibility",
            ],
        ));
    }

    let not_found = metrics.category_count(ErrorCategory::FileNotFound);
    let not_found_pct = percentage(not_found, metrics.total_errors);
    if not_found_pct > 10.0 {
        out.push(Recommendation::new(
            Severity::Low,
            Category::Configuration,
            format!("{not_found_pct:.2}% of logged errors are missing files"),
            &[
                "Fix broken links or add the missing assets",
                "Set log_not_found off for noisy paths such as favicon.ico",
            ],
        ));
    }

    out
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

pub fn for_benchmark(metrics: &BenchmarkMetrics) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(avg) = metrics.latency.avg {
        let severity = match avg {
            a if a > 1000.0 => Some(Severity::High),
            a if a > 500.0 => Some(Severity::Medium),
            a if a > 200.0 => Some(Severity::Low),
            _ => None,
        };
        if let Some(severity) = severity {
            out.push(Recommendation::new(
                severity,
                Category::Performance,
                format!("Average latency is {avg:.2}ms"),
                &[
                    "Enable response caching for hot endpoints",
                    "Enable keepalive connections to upstreams",
                    "Check worker_processes matches the available CPU cores",
                ],
            ));
        }
    }

    if let Some(rps) = metrics.throughput.requests_per_sec {
        if rps < 100.0 {
            out.push(Recommendation::new(
                Severity::Medium,
                Category::Performance,
                format!("Throughput is only {rps:.2} requests/sec"),
                &[
                    "Raise worker_connections",
                    "Enable sendfile, tcp_nopush and tcp_nodelay",
                    "Check whether the load generator itself is the bottleneck",
                ],
            ));
        } else if rps > 10_000.0 {
            out.push(Recommendation::new(
                Severity::Info,
                Category::Performance,
                format!("Throughput is {rps:.2} requests/sec"),
                &["Current configuration handles high load; keep this run as a baseline"],
            ));
        }
    }

    if let Some(rate) = metrics.error_rate() {
        let severity = match rate {
            r if r > 5.0 => Some(Severity::High),
            r if r > 1.0 => Some(Severity::Medium),
            _ => None,
        };
        if let Some(severity) = severity {
            out.push(Recommendation::new(
                severity,
                Category::Errors,
                format!("{rate:.2}% of requests failed"),
                &[
                    "Correlate failures with the nginx error log for the test window",
                    "Check upstream capacity under the tested concurrency",
                ],
            ));
        }
    }

    let socket_errors = metrics.socket_error_total();
    if socket_errors > 0 {
        out.push(Recommendation::new(
            Severity::High,
            Category::Reliability,
            format!("{socket_errors} socket errors during the run"),
            &[
                "Raise worker_connections and the file descriptor limit",
                "Raise net.core.somaxconn and the listen backlog",
                "Check keepalive_timeout and keepalive_requests",
            ],
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::SocketErrors;
    use crate::stats::{aggregate_access, aggregate_errors};
    use crate::{access, errorlog, security, AnalyzerOptions};
    use ngxscope_core::SourceKind;

    fn access_line(client: &str, path: &str, status: u16, ua: &str, rt: &str) -> String {
        format!(
            r#"{client} - - [15/Jan/2024:10:30:00 +0000] "GET {path} HTTP/1.1" {status} 100 "-" "{ua}" rt={rt}"#
        )
    }

    fn access_metrics(lines: &[String]) -> AccessMetrics {
        let records = access::parse(&lines.join("\n"));
        aggregate_access(&records, &AnalyzerOptions::default())
    }

    #[test]
    fn healthy_access_log_has_no_recommendations() {
        let lines: Vec<String> = (0..10)
            .map(|i| access_line(&format!("10.0.0.{i}"), "/", 200, "Mozilla/5.0", "0.010"))
            .collect();
        assert!(for_access(&access_metrics(&lines), &[]).is_empty());
    }

    #[test]
    fn server_errors_and_slow_p95_fire_together() {
        let mut lines: Vec<String> = (0..9)
            .map(|i| access_line(&format!("10.0.0.{i}"), "/", 200, "Mozilla/5.0", "1.500"))
            .collect();
        lines.push(access_line("10.0.0.99", "/api", 502, "Mozilla/5.0", "2.000"));
        let recs = for_access(&access_metrics(&lines), &[]);
        assert!(recs
            .iter()
            .any(|r| r.category == Category::Errors && r.severity == Severity::High));
        assert!(recs
            .iter()
            .any(|r| r.category == Category::Performance && r.severity == Severity::High));
    }

    #[test]
    fn missing_response_times_skip_latency_rules() {
        let lines = vec![r#"10.0.0.1 - - [15/Jan/2024:10:30:00 +0000] "GET / HTTP/1.1" 200 1 "-" "Mozilla/5.0""#.to_string()];
        let metrics = access_metrics(&lines);
        assert!(metrics.response_times.is_none());
        assert!(!for_access(&metrics, &[])
            .iter()
            .any(|r| r.category == Category::Performance));
    }

    #[test]
    fn dominant_client_and_bots_fire() {
        let lines: Vec<String> = (0..4)
            .map(|_| access_line("10.0.0.1", "/", 200, "curl/8.0", "0.010"))
            .collect();
        let recs = for_access(&access_metrics(&lines), &[]);
        assert!(recs
            .iter()
            .any(|r| r.category == Category::Traffic && r.severity == Severity::High));
        assert!(recs
            .iter()
            .any(|r| r.category == Category::Traffic && r.severity == Severity::Medium));
    }

    #[test]
    fn not_found_rate_is_medium() {
        let mut lines: Vec<String> = (0..8)
            .map(|i| access_line(&format!("10.0.0.{i}"), "/", 200, "Mozilla/5.0", "0.010"))
            .collect();
        lines.push(access_line("10.0.1.1", "/gone", 404, "Mozilla/5.0", "0.010"));
        lines.push(access_line("10.0.1.2", "/gone", 404, "Mozilla/5.0", "0.010"));
        let recs = for_access(&access_metrics(&lines), &[]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Medium);
    }

    /// Twenty requests from distinct clients; `special` of them get the given
    /// status, user agent and client.
    fn twenty_with(special: usize, status: u16, ua: &str, client: Option<&str>) -> AccessMetrics {
        let lines: Vec<String> = (0..20)
            .map(|i| {
                if i < special {
                    let c = client.map_or_else(|| format!("10.0.1.{i}"), str::to_string);
                    access_line(&c, "/", status, ua, "0.010")
                } else {
                    access_line(&format!("10.0.0.{i}"), "/", 200, "Mozilla/5.0", "0.010")
                }
            })
            .collect();
        access_metrics(&lines)
    }

    #[test]
    fn access_thresholds_are_exclusive() {
        let fires = |m: &AccessMetrics, sev: Severity, cat: Category| {
            for_access(m, &[])
                .iter()
                .any(|r| r.severity == sev && r.category == cat)
        };
        let cases = [
            // (special lines, status, ua, client, severity, category, fires)
            (1, 500, "Mozilla/5.0", None, Severity::High, Category::Errors, false),
            (2, 500, "Mozilla/5.0", None, Severity::High, Category::Errors, true),
            (2, 404, "Mozilla/5.0", None, Severity::Medium, Category::Errors, false),
            (3, 404, "Mozilla/5.0", None, Severity::Medium, Category::Errors, true),
            (6, 200, "curl/8.0", None, Severity::Medium, Category::Traffic, false),
            (7, 200, "curl/8.0", None, Severity::Medium, Category::Traffic, true),
            (10, 200, "Mozilla/5.0", Some("10.9.9.9"), Severity::High, Category::Traffic, false),
            (11, 200, "Mozilla/5.0", Some("10.9.9.9"), Severity::High, Category::Traffic, true),
        ];
        for (special, status, ua, client, sev, cat, expected) in cases {
            let m = twenty_with(special, status, ua, client);
            assert_eq!(
                fires(&m, sev, cat),
                expected,
                "{special}/20 with status {status}, ua {ua}, client {client:?}"
            );
        }
    }

    #[test]
    fn p95_bands() {
        let perf = |rt: &str| {
            let lines: Vec<String> = (0..10)
                .map(|i| access_line(&format!("10.0.0.{i}"), "/", 200, "Mozilla/5.0", rt))
                .collect();
            for_access(&access_metrics(&lines), &[])
                .iter()
                .find(|r| r.category == Category::Performance)
                .map(|r| r.severity)
        };
        assert_eq!(perf("0.500"), None);
        assert_eq!(perf("0.700"), Some(Severity::Medium));
        assert_eq!(perf("1.000"), Some(Severity::Medium));
        assert_eq!(perf("1.200"), Some(Severity::High));
    }

    #[test]
    fn security_issue_becomes_high_security_recommendation() {
        let lines = vec![access_line("10.0.0.1", "/../../etc/passwd", 400, "Mozilla/5.0", "0.010")];
        let metrics = access_metrics(&lines);
        let issues = security::scan_paths(&metrics.top_paths);
        let recs = for_access(&metrics, &issues);
        assert!(recs
            .iter()
            .any(|r| r.category == Category::Security && r.severity == Severity::High));
    }

    #[test]
    fn error_log_rules() {
        let text = "\
2024/01/15 10:30:00 [crit] 1#0: *1 connect() to unix:/run/php.sock failed (2: No such file or directory)
2024/01/15 10:30:01 [error] 1#0: *2 upstream timed out (110: Connection timed out) while reading response header from upstream, client: 10.0.0.1, server: x, request: \"GET / HTTP/1.1\"
2024/01/15 10:30:02 [error] 1#0: *3 connect() failed (111: Connection refused) while connecting to upstream, client: 10.0.0.2
2024/01/15 10:30:03 [alert] 1#0: accept4() failed (24: Too many open files)
";
        let metrics = aggregate_errors(&errorlog::parse(text), &AnalyzerOptions::default());
        let recs = for_errors(&metrics);
        let has = |sev, cat| recs.iter().any(|r| r.severity == sev && r.category == cat);
        assert!(has(Severity::High, Category::Reliability));
        assert!(has(Severity::High, Category::Performance));
        assert!(has(Severity::High, Category::Capacity));
        assert!(!has(Severity::Medium, Category::Security));
    }

    #[test]
    fn benchmark_rules() {
        let mut m = BenchmarkMetrics::empty(SourceKind::Wrk);
        assert!(for_benchmark(&m).is_empty());

        m.latency.avg = Some(1200.0);
        m.throughput.requests_per_sec = Some(50.0);
        m.error_count = Some(60);
        m.total_requests = Some(1000);
        m.socket_errors = Some(SocketErrors {
            timeout: 3,
            ..SocketErrors::default()
        });
        let recs = for_benchmark(&m);
        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].severity, Severity::High);
        assert_eq!(recs[1].severity, Severity::Medium);
        assert_eq!(recs[2].severity, Severity::High);
        assert_eq!(recs[3].category, Category::Reliability);
    }

    #[test]
    fn benchmark_latency_bands() {
        let sev = |avg: f64| {
            let mut m = BenchmarkMetrics::empty(SourceKind::Ab);
            m.latency.avg = Some(avg);
            for_benchmark(&m).first().map(|r| r.severity)
        };
        assert_eq!(sev(1500.0), Some(Severity::High));
        assert_eq!(sev(700.0), Some(Severity::Medium));
        assert_eq!(sev(300.0), Some(Severity::Low));
        assert_eq!(sev(150.0), None);
    }

    #[test]
    fn benchmark_error_rate_bands() {
        let sev = |errors: u64| {
            let mut m = BenchmarkMetrics::empty(SourceKind::Wrk);
            m.error_count = Some(errors);
            m.total_requests = Some(1000);
            let recs = for_benchmark(&m);
            assert!(recs.len() <= 1);
            recs.first().map(|r| (r.severity, r.category))
        };
        assert_eq!(sev(10), None);
        assert_eq!(sev(30), Some((Severity::Medium, Category::Errors)));
        assert_eq!(sev(50), Some((Severity::Medium, Category::Errors)));
        assert_eq!(sev(60), Some((Severity::High, Category::Errors)));
    }

    #[test]
    fn very_high_throughput_is_info() {
        let mut m = BenchmarkMetrics::empty(SourceKind::Wrk);
        m.throughput.requests_per_sec = Some(25_000.0);
        let recs = for_benchmark(&m);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].severity, Severity::Info);
    }
}
