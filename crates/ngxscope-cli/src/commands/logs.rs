use std::path::Path;

use ngxscope_analyzer::{AnalysisResult, Analyzer};
use ngxscope_core::{RequestedKind, ScopeError};
use tracing::debug;

pub fn run(analyzer: &Analyzer, file: &Path, kind: &str, json: bool) -> Result<(), ScopeError> {
    let requested: RequestedKind = kind.parse()?;
    let text = super::read_input(file)?;
    debug!(file = %file.display(), bytes = text.len(), ?requested, "analyzing log");

    let analysis = analyzer.analyze_log(&text, requested)?;
    println!("{}", super::render(&AnalysisResult::Log(analysis), json)?);
    Ok(())
}
