//! Letter grade for a benchmark run.

use std::fmt;

use serde::Serialize;

use crate::bench::BenchmarkMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    fn from_score(score: i32) -> Self {
        match score {
            90.. => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade a run. Missing fields deduct nothing.
pub fn grade(metrics: &BenchmarkMetrics) -> Grade {
    Grade::from_score(score(metrics))
}

/// Start at 100 and deduct for latency, error rate and socket errors.
fn score(m: &BenchmarkMetrics) -> i32 {
    let mut score = 100;

    if let Some(avg) = m.latency.avg {
        score -= match avg {
            a if a > 1000.0 => 40,
            a if a > 500.0 => 25,
            a if a > 200.0 => 15,
            a if a > 100.0 => 5,
            _ => 0,
        };
    }

    if let Some(rate) = m.error_rate() {
        score -= match rate {
            r if r > 10.0 => 30,
            r if r > 5.0 => 20,
            r if r > 1.0 => 10,
            r if r > 0.0 => 5,
            _ => 0,
        };
    }

    score -= match m.socket_error_total() {
        n if n > 100 => 20,
        n if n > 10 => 10,
        n if n > 0 => 5,
        _ => 0,
    };

    score
}
