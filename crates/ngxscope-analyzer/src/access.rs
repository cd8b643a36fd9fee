//! Access log line parser (nginx `combined` format, optionally with `rt=<seconds>`).

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

static RE_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\S+) \S+ \S+ \[([^\]]+)\] "([A-Z]+) (\S+)(?: [^"]*)?" (\d{3}) (\d+|-)(?: "((?:[^"\\]|\\.)*)" "((?:[^"\\]|\\.)*)")?"#,
    )
    .unwrap()
});
static RE_RT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brt=(\d+(?:\.\d+)?)").unwrap());

const TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One parsed access log line.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRecord {
    pub client: String,
    /// Raw `time_local` text as logged.
    pub timestamp: String,
    pub time: Option<DateTime<FixedOffset>>,
    pub method: String,
    /// Request path with the query string removed.
    pub path: String,
    pub status: u16,
    pub bytes: u64,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub response_time_ms: Option<f64>,
}

/// Parse a single line. Returns `None` when the line does not follow the format.
pub fn parse_line(line: &str) -> Option<AccessRecord> {
    let line = line.trim();
    let caps = RE_ACCESS.captures(line)?;

    let status: u16 = caps[5].parse().ok()?;
    let bytes = caps[6].parse().unwrap_or(0);
    let timestamp = caps[2].to_string();
    let time = DateTime::parse_from_str(&timestamp, TIME_FORMAT).ok();

    let tail = &line[caps.get(0).map_or(line.len(), |m| m.end())..];
    let response_time_ms = RE_RT
        .captures(tail)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|secs| secs * 1000.0);

    Some(AccessRecord {
        client: caps[1].to_string(),
        timestamp,
        time,
        method: caps[3].to_string(),
        path: strip_query(&caps[4]).to_string(),
        status,
        bytes,
        referrer: caps.get(7).map(|m| m.as_str()).and_then(non_dash),
        user_agent: caps.get(8).map(|m| m.as_str()).and_then(non_dash),
        response_time_ms,
    })
}

/// Parse every line of `text`, silently dropping lines that do not match.
pub fn parse(text: &str) -> Vec<AccessRecord> {
    text.lines().filter_map(parse_line).collect()
}

fn strip_query(target: &str) -> &str {
    target.split('?').next().unwrap_or(target)
}

fn non_dash(s: &str) -> Option<String> {
    if s.is_empty() || s == "-" {
        None
    } else {
        Some(s.to_string())
    }
}
