use std::path::{Path, PathBuf};

use ngxscope_analyzer::AnalyzerOptions;
use serde::Deserialize;
use thiserror::Error;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "ngxscope.toml";

const MAX_TOP_N: usize = 100;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// TOML data model
// ---------------------------------------------------------------------------

/// Top-level TOML config file (`ngxscope.toml`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScopeConfig {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Tunables passed through to the analyzer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Length of ranked lists (default: 10).
    pub top_n: usize,
    /// User-agent substrings counted as bots, on top of the built-in list.
    pub extra_bot_signatures: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            extra_bot_signatures: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Print JSON instead of the text report.
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level used for the `ngxscope` targets when `RUST_LOG` is unset (default: warn).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

fn default_top_n() -> usize {
    10
}
fn default_level() -> String {
    "warn".to_string()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
pub fn load(path: &Path) -> Result<ScopeConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Load `explicit` if given, else `ngxscope.toml` in `dir` if it exists, else defaults.
/// An explicit path that does not exist is an error.
pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<ScopeConfig> {
    if let Some(path) = explicit {
        return load(path);
    }
    let candidate: PathBuf = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        load(&candidate)
    } else {
        Ok(ScopeConfig::default())
    }
}

/// Parse a TOML string into a config and validate it.
pub fn parse(toml_str: &str) -> Result<ScopeConfig> {
    let config: ScopeConfig = toml::from_str(toml_str)?;
    validate(&config)?;
    Ok(config)
}

impl ScopeConfig {
    /// Analyzer options: built-in bot signatures plus the configured extras.
    pub fn to_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            top_n: self.analysis.top_n,
            ..AnalyzerOptions::default()
        }
        .with_extra_bots(&self.analysis.extra_bot_signatures)
    }

    /// Default tracing filter directive, e.g. `ngxscope=warn`.
    pub fn log_directive(&self) -> String {
        format!("ngxscope={}", self.logging.level)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &ScopeConfig) -> Result<()> {
    let top_n = config.analysis.top_n;
    if !(1..=MAX_TOP_N).contains(&top_n) {
        return Err(ConfigError::Validation(format!(
            "analysis.top_n must be between 1 and {MAX_TOP_N}, got {top_n}"
        )));
    }

    if config
        .analysis
        .extra_bot_signatures
        .iter()
        .any(|s| s.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "analysis.extra_bot_signatures must not contain empty strings".into(),
        ));
    }

    let level = config.logging.level.as_str();
    if !LOG_LEVELS.contains(&level) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of {}, got '{level}'",
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
[analysis]
top_n = 25
extra_bot_signatures = ["UptimeRobot", "pingdom"]

[output]
json = true

[logging]
level = "debug"
"#;

    #[test]
    fn parse_full_config() {
        let config = parse(FULL_TOML).unwrap();
        assert_eq!(config.analysis.top_n, 25);
        assert_eq!(
            config.analysis.extra_bot_signatures,
            vec!["UptimeRobot", "pingdom"]
        );
        assert!(config.output.json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.log_directive(), "ngxscope=debug");
    }

    #[test]
    fn defaults_are_applied() {
        let config = parse("").unwrap();
        assert_eq!(config, ScopeConfig::default());
        assert_eq!(config.analysis.top_n, 10);
        assert!(config.analysis.extra_bot_signatures.is_empty());
        assert!(!config.output.json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = parse("[analysis]\nextra_bot_signatures = [\"statuscake\"]\n").unwrap();
        assert_eq!(config.analysis.top_n, 10);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = parse("[analysis]\ntop = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = parse("[metrics]\nenabled = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_top_n_range() {
        for bad in ["0", "101"] {
            let err = parse(&format!("[analysis]\ntop_n = {bad}\n")).unwrap_err();
            assert!(matches!(err, ConfigError::Validation(_)), "top_n = {bad}");
        }
        assert!(parse("[analysis]\ntop_n = 100\n").is_ok());
    }

    #[test]
    fn validate_empty_bot_signature() {
        let err = parse("[analysis]\nextra_bot_signatures = [\"  \"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn validate_log_level() {
        let err = parse("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn options_merge_bot_signatures() {
        let config = parse(FULL_TOML).unwrap();
        let options = config.to_options();
        assert_eq!(options.top_n, 25);
        assert!(options.bot_signatures.contains(&"uptimerobot".to_string()));
        assert!(options.bot_signatures.contains(&"pingdom".to_string()));
        // Built-in list is kept.
        assert!(options.bot_signatures.contains(&"curl".to_string()));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, FULL_TOML).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.analysis.top_n, 25);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn discover_prefers_explicit_then_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            discover(None, dir.path()).unwrap(),
            ScopeConfig::default()
        );

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[output]\njson = true\n").unwrap();
        assert!(discover(None, dir.path()).unwrap().output.json);

        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[analysis]\ntop_n = 3\n").unwrap();
        let config = discover(Some(&explicit), dir.path()).unwrap();
        assert_eq!(config.analysis.top_n, 3);
        assert!(!config.output.json);

        let missing = dir.path().join("missing.toml");
        assert!(discover(Some(&missing), dir.path()).is_err());
    }
}
