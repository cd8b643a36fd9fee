pub mod bench;
pub mod detect;
pub mod logs;

use std::io;
use std::path::Path;

use ngxscope_analyzer::{format_report, AnalysisResult};
use ngxscope_core::ScopeError;

/// Read an input file, naming the path in the error. Invalid UTF-8 bytes
/// become U+FFFD instead of failing the whole file.
pub fn read_input(path: &Path) -> Result<String, ScopeError> {
    let bytes = std::fs::read(path).map_err(|e| {
        ScopeError::Io(io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Text report, or pretty JSON when `json` is set.
pub fn render(result: &AnalysisResult, json: bool) -> Result<String, ScopeError> {
    if json {
        serde_json::to_string_pretty(result).map_err(|e| ScopeError::Serialize(e.to_string()))
    } else {
        Ok(format_report(result))
    }
}
