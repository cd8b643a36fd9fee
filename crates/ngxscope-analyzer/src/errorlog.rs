//! nginx error log parser and message classifier.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

static RE_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}) \[([a-z]+)\] (?:\d+#\d+: )?(?:\*\d+ )?(.+)$",
    )
    .unwrap()
});
static RE_CLIENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r", client: ([^,]+)").unwrap());
static RE_REQUEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#", request: "([^"]*)""#).unwrap());

const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Coarse cause of an error log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    UpstreamTimeout,
    ConnectionRefused,
    NoLiveUpstreams,
    TooManyOpenFiles,
    PermissionDenied,
    FileNotFound,
    BodyTooLarge,
    Ssl,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamTimeout => "upstream-timeout",
            Self::ConnectionRefused => "connection-refused",
            Self::NoLiveUpstreams => "no-live-upstreams",
            Self::TooManyOpenFiles => "too-many-open-files",
            Self::PermissionDenied => "permission-denied",
            Self::FileNotFound => "file-not-found",
            Self::BodyTooLarge => "body-too-large",
            Self::Ssl => "ssl",
            Self::Other => "other",
        }
    }
}

/// Ordered classification rules; the first matching pattern wins.
static CATEGORY_RULES: LazyLock<Vec<(Regex, ErrorCategory)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)upstream timed out").unwrap(), ErrorCategory::UpstreamTimeout),
        (Regex::new(r"(?i)no live upstreams").unwrap(), ErrorCategory::NoLiveUpstreams),
        (
            Regex::new(r"(?i)connection refused|connect\(\) failed \(111").unwrap(),
            ErrorCategory::ConnectionRefused,
        ),
        (
            Regex::new(r"(?i)too many open files|worker_connections are not enough").unwrap(),
            ErrorCategory::TooManyOpenFiles,
        ),
        (Regex::new(r"(?i)permission denied").unwrap(), ErrorCategory::PermissionDenied),
        (
            Regex::new(r"(?i)no such file or directory|is not found").unwrap(),
            ErrorCategory::FileNotFound,
        ),
        (
            Regex::new(r"(?i)client intended to send too large body").unwrap(),
            ErrorCategory::BodyTooLarge,
        ),
        (Regex::new(r"(?i)\bssl").unwrap(), ErrorCategory::Ssl),
    ]
});

/// One parsed error log line.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub time: Option<NaiveDateTime>,
    /// Severity token as logged (`error`, `warn`, `crit`, ...).
    pub level: String,
    /// Message without the trailing `, client: ...` request context.
    pub message: String,
    pub client: Option<String>,
    pub request: Option<String>,
    pub category: ErrorCategory,
}

/// Parse a single line. Returns `None` when the line does not follow the format.
pub fn parse_line(line: &str) -> Option<ErrorRecord> {
    let caps = RE_ERROR.captures(line.trim())?;
    let full = &caps[3];

    let message = full
        .split(", client: ")
        .next()
        .unwrap_or(full)
        .trim()
        .to_string();
    if message.is_empty() {
        return None;
    }

    Some(ErrorRecord {
        time: NaiveDateTime::parse_from_str(&caps[1], TIME_FORMAT).ok(),
        level: caps[2].to_string(),
        category: classify(full),
        client: RE_CLIENT.captures(full).map(|c| c[1].trim().to_string()),
        request: RE_REQUEST.captures(full).map(|c| c[1].to_string()),
        message,
    })
}

/// Parse every line of `text`, silently dropping lines that do not match.
pub fn parse(text: &str) -> Vec<ErrorRecord> {
    text.lines().filter_map(parse_line).collect()
}

/// Classify a raw error message.
pub fn classify(message: &str) -> ErrorCategory {
    CATEGORY_RULES
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Other)
}

/// Levels nginx uses for conditions that need immediate attention.
pub fn is_critical_level(level: &str) -> bool {
    matches!(level, "crit" | "alert" | "emerg")
}
