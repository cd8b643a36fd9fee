//! Statistics aggregation: order statistics, frequency tables and the per-log metric sets.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::access::AccessRecord;
use crate::errorlog::{is_critical_level, ErrorCategory, ErrorRecord};
use crate::security::{self, BotTraffic};
use crate::units::round2;
use crate::{AnalyzerOptions, RankedEntry};

/// Serialize a percentage rounded to two decimals.
pub fn serialize_pct<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(round2(*v))
}

/// `count * 100 / total`, or 0 for an empty sample.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

// ---------------------------------------------------------------------------
// Order statistics
// ---------------------------------------------------------------------------

/// Nearest-rank percentile over an ascending-sorted sample.
/// `index = ceil(p/100 * n) - 1`, clamped to `[0, n-1]`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    // Multiply before dividing so integral ranks such as 95 * 20 / 100 stay exact.
    let rank = (p * n as f64 / 100.0).ceil() as i64 - 1;
    let idx = rank.clamp(0, n as i64 - 1) as usize;
    Some(sorted[idx])
}

/// Median of an ascending-sorted sample; mean of the two middle values when `n` is even.
pub fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

/// Response time summary in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub avg: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
    pub samples: usize,
}

impl ResponseTimeStats {
    /// Summarize a sample; `None` when the sample is empty.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Some(Self {
            avg,
            median: median(&sorted)?,
            p95: percentile(&sorted, 95.0)?,
            p99: percentile(&sorted, 99.0)?,
            max: *sorted.last()?,
            samples: sorted.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Frequency tables
// ---------------------------------------------------------------------------

/// Frequency counter that remembers first-seen order, so ranking ties stay stable.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        if let Some(&i) = self.index.get(key) {
            self.entries[i].1 += 1;
        } else {
            self.index.insert(key.to_string(), self.entries.len());
            self.entries.push((key.to_string(), 1));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Top `n` entries by descending count; ties keep first-seen order.
    pub fn top(&self, n: usize, total: u64) -> Vec<RankedEntry> {
        let mut ranked: Vec<&(String, u64)> = self.entries.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(value, count)| RankedEntry {
                value: value.clone(),
                count: *count,
                percentage: percentage(*count, total),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Shared metric pieces
// ---------------------------------------------------------------------------

/// Count and share of one status class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Share {
    pub count: u64,
    #[serde(serialize_with = "serialize_pct")]
    pub percentage: f64,
}

impl Share {
    fn new(count: u64, total: u64) -> Self {
        Self {
            count,
            percentage: percentage(count, total),
        }
    }
}

/// HTTP status classes for an access log. Informational (1xx) and any
/// nonstandard status count as `success`, so the four shares cover every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub success: Share,
    pub redirect: Share,
    pub client_error: Share,
    pub server_error: Share,
}

impl StatusBreakdown {
    pub fn from_counts(status_codes: &BTreeMap<u16, u64>, total: u64) -> Self {
        let mut classes = [0u64; 4];
        for (&status, &count) in status_codes {
            let class = match status / 100 {
                3 => 1,
                4 => 2,
                5 => 3,
                _ => 0,
            };
            classes[class] = classes[class].saturating_add(count);
        }
        Self {
            success: Share::new(classes[0], total),
            redirect: Share::new(classes[1], total),
            client_error: Share::new(classes[2], total),
            server_error: Share::new(classes[3], total),
        }
    }
}

/// First and last timestamp seen, as wall-clock time in the log's own zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    fn extend(range: &mut Option<TimeRange>, t: NaiveDateTime) {
        match range {
            Some(r) => {
                if t < r.start {
                    r.start = t;
                }
                if t > r.end {
                    r.end = t;
                }
            }
            None => *range = Some(TimeRange { start: t, end: t }),
        }
    }
}

// ---------------------------------------------------------------------------
// Access log metrics
// ---------------------------------------------------------------------------

/// Aggregate result of an access log analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessMetrics {
    pub total_requests: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub status_breakdown: StatusBreakdown,
    pub methods: BTreeMap<String, u64>,
    pub top_paths: Vec<RankedEntry>,
    pub top_clients: Vec<RankedEntry>,
    pub top_user_agents: Vec<RankedEntry>,
    pub unique_clients: usize,
    pub total_bytes: u64,
    pub response_times: Option<ResponseTimeStats>,
    pub bot_traffic: BotTraffic,
    pub time_range: Option<TimeRange>,
    /// Hour of day (0-23) to request count.
    pub hourly: BTreeMap<u32, u64>,
    pub peak_hour: Option<u32>,
}

impl AccessMetrics {
    pub fn status_count(&self, status: u16) -> u64 {
        self.status_codes.get(&status).copied().unwrap_or(0)
    }
}

/// Reduce parsed access records to an [`AccessMetrics`].
pub fn aggregate_access(records: &[AccessRecord], options: &AnalyzerOptions) -> AccessMetrics {
    let total = records.len() as u64;

    let mut status_codes: BTreeMap<u16, u64> = BTreeMap::new();
    let mut methods: BTreeMap<String, u64> = BTreeMap::new();
    let mut hourly: BTreeMap<u32, u64> = BTreeMap::new();
    let mut paths = Counter::new();
    let mut clients = Counter::new();
    let mut agents = Counter::new();
    let mut timings = Vec::new();
    let mut total_bytes = 0u64;
    let mut time_range = None;

    for r in records {
        *status_codes.entry(r.status).or_default() += 1;
        *methods.entry(r.method.clone()).or_default() += 1;
        paths.add(&r.path);
        clients.add(&r.client);
        agents.add(r.user_agent.as_deref().unwrap_or("-"));
        total_bytes = total_bytes.saturating_add(r.bytes);

        if let Some(ms) = r.response_time_ms {
            timings.push(ms);
        }
        if let Some(t) = r.time {
            let local = t.naive_local();
            TimeRange::extend(&mut time_range, local);
            *hourly.entry(local.hour()).or_default() += 1;
        }
    }

    let peak_hour = hourly
        .iter()
        .fold(None::<(u32, u64)>, |best, (&h, &c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((h, c)),
        })
        .map(|(h, _)| h);

    AccessMetrics {
        total_requests: total,
        status_breakdown: StatusBreakdown::from_counts(&status_codes, total),
        status_codes,
        methods,
        top_paths: paths.top(options.top_n, total),
        top_clients: clients.top(options.top_n, total),
        top_user_agents: agents.top(options.top_n, total),
        unique_clients: clients.len(),
        total_bytes,
        response_times: ResponseTimeStats::from_samples(&timings),
        bot_traffic: security::bot_traffic(agents.iter(), total, &options.bot_signatures),
        time_range,
        hourly,
        peak_hour,
    }
}

// ---------------------------------------------------------------------------
// Error log metrics
// ---------------------------------------------------------------------------

/// Aggregate result of an error log analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorMetrics {
    pub total_errors: u64,
    /// Severity token to count.
    pub levels: BTreeMap<String, u64>,
    pub top_messages: Vec<RankedEntry>,
    pub top_clients: Vec<RankedEntry>,
    pub categories: BTreeMap<ErrorCategory, u64>,
    pub critical_count: u64,
    pub time_range: Option<TimeRange>,
}

impl ErrorMetrics {
    pub fn category_count(&self, category: ErrorCategory) -> u64 {
        self.categories.get(&category).copied().unwrap_or(0)
    }
}

/// Reduce parsed error records to an [`ErrorMetrics`].
pub fn aggregate_errors(records: &[ErrorRecord], options: &AnalyzerOptions) -> ErrorMetrics {
    let total = records.len() as u64;

    let mut levels: BTreeMap<String, u64> = BTreeMap::new();
    let mut categories: BTreeMap<ErrorCategory, u64> = BTreeMap::new();
    let mut messages = Counter::new();
    let mut clients = Counter::new();
    let mut critical_count = 0u64;
    let mut time_range = None;

    for r in records {
        *levels.entry(r.level.clone()).or_default() += 1;
        *categories.entry(r.category).or_default() += 1;
        messages.add(&r.message);
        if let Some(ref client) = r.client {
            clients.add(client);
        }
        if is_critical_level(&r.level) {
            critical_count += 1;
        }
        if let Some(t) = r.time {
            TimeRange::extend(&mut time_range, t);
        }
    }

    ErrorMetrics {
        total_errors: total,
        levels,
        top_messages: messages.top(options.top_n, total),
        top_clients: clients.top(options.top_n, total),
        categories,
        critical_count,
        time_range,
    }
}
