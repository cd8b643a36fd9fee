use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScopeError;

/// A concrete input format understood by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    AccessLog,
    ErrorLog,
    Wrk,
    Ab,
    K6,
    Autocannon,
    Siege,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessLog => "access",
            Self::ErrorLog => "error",
            Self::Wrk => "wrk",
            Self::Ab => "ab",
            Self::K6 => "k6",
            Self::Autocannon => "autocannon",
            Self::Siege => "siege",
        }
    }

    pub fn is_log(&self) -> bool {
        matches!(self, Self::AccessLog | Self::ErrorLog)
    }

    pub fn is_benchmark(&self) -> bool {
        !self.is_log()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" | "access-log" | "access_log" => Ok(Self::AccessLog),
            "error" | "error-log" | "error_log" => Ok(Self::ErrorLog),
            "wrk" => Ok(Self::Wrk),
            "ab" | "apachebench" => Ok(Self::Ab),
            "k6" => Ok(Self::K6),
            "autocannon" => Ok(Self::Autocannon),
            "siege" => Ok(Self::Siege),
            other => Err(ScopeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Kind requested by the caller: either a concrete kind or "auto".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestedKind {
    #[default]
    Auto,
    Explicit(SourceKind),
}

impl FromStr for RequestedKind {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse().map(Self::Explicit)
    }
}

impl From<SourceKind> for RequestedKind {
    fn from(kind: SourceKind) -> Self {
        Self::Explicit(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_kinds() {
        assert_eq!("access".parse::<SourceKind>().unwrap(), SourceKind::AccessLog);
        assert_eq!("access-log".parse::<SourceKind>().unwrap(), SourceKind::AccessLog);
        assert_eq!("Error".parse::<SourceKind>().unwrap(), SourceKind::ErrorLog);
    }

    #[test]
    fn parse_tool_kinds() {
        for kind in ["wrk", "ab", "k6", "autocannon", "siege"] {
            let parsed: SourceKind = kind.parse().unwrap();
            assert!(parsed.is_benchmark());
            assert_eq!(parsed.as_str(), kind);
        }
    }

    #[test]
    fn parse_unknown_kind() {
        let err = "jmeter".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, ScopeError::UnsupportedFormat(ref s) if s == "jmeter"));
    }

    #[test]
    fn requested_kind_auto() {
        assert_eq!("auto".parse::<RequestedKind>().unwrap(), RequestedKind::Auto);
        assert_eq!("".parse::<RequestedKind>().unwrap(), RequestedKind::Auto);
        assert_eq!(
            "k6".parse::<RequestedKind>().unwrap(),
            RequestedKind::Explicit(SourceKind::K6)
        );
    }
}
