//! Input format detection.
//!
//! Signatures are tried in a fixed order and the first match wins. Input carrying the
//! markers of two formats resolves to whichever is listed first.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use ngxscope_core::{RequestedKind, ScopeError, SourceKind};

static RE_ERROR_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2} \[[a-z]+\]").unwrap()
});
static RE_ACCESS_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:GET|POST|PUT|DELETE|HEAD|OPTIONS|PATCH|CONNECT|TRACE) \S+ HTTP/\d(?:\.\d)?""#)
        .unwrap()
});
static RE_WRK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Thread Stats|\d+ threads and \d+ connections").unwrap());
static RE_AUTOCANNON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[│|][ \t]*Latency[ \t]*[│|]|Req/Bytes counts sampled").unwrap()
});

/// One entry of the detection table.
struct Signature {
    kind: SourceKind,
    matches: fn(&str) -> bool,
}

/// Detection order. Error logs come before access logs because an nginx error line
/// embeds the quoted request line (`request: "GET / HTTP/1.1"`).
const SIGNATURES: [Signature; 7] = [
    Signature {
        kind: SourceKind::ErrorLog,
        matches: |t| RE_ERROR_LOG.is_match(t),
    },
    Signature {
        kind: SourceKind::AccessLog,
        matches: |t| RE_ACCESS_LOG.is_match(t),
    },
    Signature {
        kind: SourceKind::Wrk,
        matches: |t| RE_WRK.is_match(t),
    },
    Signature {
        kind: SourceKind::Ab,
        matches: |t| {
            t.contains("This is ApacheBench")
                || (t.contains("Requests per second:") && t.contains("[#/sec]"))
        },
    },
    Signature {
        kind: SourceKind::K6,
        matches: |t| t.contains("http_req_duration"),
    },
    Signature {
        kind: SourceKind::Autocannon,
        matches: |t| RE_AUTOCANNON.is_match(t),
    },
    Signature {
        kind: SourceKind::Siege,
        matches: |t| t.contains("Transaction rate:") || t.contains("\"transaction_rate\""),
    },
];

/// Detect the format of `text` from its content alone.
pub fn detect_format(text: &str) -> Result<SourceKind, ScopeError> {
    if text.trim().is_empty() {
        return Err(ScopeError::FormatUndetected);
    }
    match SIGNATURES.iter().find(|sig| (sig.matches)(text)) {
        Some(sig) => {
            debug!(kind = %sig.kind, "detected input format");
            Ok(sig.kind)
        }
        None => {
            debug!(bytes = text.len(), "no format signature matched");
            Err(ScopeError::FormatUndetected)
        }
    }
}

/// Resolve a requested kind: explicit kinds pass through, `Auto` runs detection.
pub fn resolve(text: &str, requested: RequestedKind) -> Result<SourceKind, ScopeError> {
    match requested {
        RequestedKind::Explicit(kind) => Ok(kind),
        RequestedKind::Auto => detect_format(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS: &str = r#"192.168.1.10 - - [15/Jan/2024:10:30:00 +0000] "GET /index.html HTTP/1.1" 200 1024 "-" "Mozilla/5.0""#;
    const ERROR: &str = r#"2024/01/15 10:30:00 [error] 1234#0: *5 open() "/var/www/missing" failed (2: No such file or directory), client: 10.0.0.1, server: example.com, request: "GET /missing HTTP/1.1""#;

    #[test]
    fn access_log_without_benchmark_banner_is_access() {
        let text = format!("{ACCESS}\nnot a log line\n{ACCESS}\n");
        assert_eq!(detect_format(&text).unwrap(), SourceKind::AccessLog);
    }

    #[test]
    fn error_log_wins_over_embedded_request() {
        assert_eq!(detect_format(ERROR).unwrap(), SourceKind::ErrorLog);
    }

    #[test]
    fn detects_benchmark_banners() {
        let cases = [
            (
                "Running 30s test @ http://localhost:8080/\n  4 threads and 100 connections\n  Thread Stats   Avg",
                SourceKind::Wrk,
            ),
            (
                "This is ApacheBench, Version 2.3 <$Revision: 1903618 $>",
                SourceKind::Ab,
            ),
            (
                "     http_req_duration..............: avg=10ms",
                SourceKind::K6,
            ),
            (r#"{"metrics":{"http_req_duration":{"avg":1}}}"#, SourceKind::K6),
            (
                "│ Latency │ 0 ms │ 1 ms │",
                SourceKind::Autocannon,
            ),
            ("Transaction rate:\t      165.72 trans/sec", SourceKind::Siege),
            (r#"{ "transaction_rate": 99.5 }"#, SourceKind::Siege),
        ];
        for (text, expected) in cases {
            assert_eq!(detect_format(text).unwrap(), expected, "input: {text}");
        }
    }

    #[test]
    fn first_match_wins_on_mixed_input() {
        let text = format!("{ACCESS}\nThis is ApacheBench, Version 2.3\n");
        assert_eq!(detect_format(&text).unwrap(), SourceKind::AccessLog);
    }

    #[test]
    fn unrecognised_or_empty_input_fails() {
        for text in ["", "   \n\t", "hello world\nnothing to see"] {
            assert!(matches!(
                detect_format(text),
                Err(ScopeError::FormatUndetected)
            ));
        }
    }

    #[test]
    fn explicit_kind_skips_detection() {
        let kind = resolve("garbage", RequestedKind::Explicit(SourceKind::Siege)).unwrap();
        assert_eq!(kind, SourceKind::Siege);
        assert!(resolve("garbage", RequestedKind::Auto).is_err());
    }
}
