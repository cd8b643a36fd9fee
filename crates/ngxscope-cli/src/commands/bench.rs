use std::path::Path;

use ngxscope_analyzer::{AnalysisResult, Analyzer};
use ngxscope_core::{RequestedKind, ScopeError};
use tracing::debug;

pub fn run(analyzer: &Analyzer, file: &Path, tool: &str, json: bool) -> Result<(), ScopeError> {
    let requested = parse_tool(tool)?;
    let text = super::read_input(file)?;
    debug!(file = %file.display(), bytes = text.len(), ?requested, "analyzing benchmark");

    let analysis = analyzer.analyze_benchmark(&text, requested)?;
    println!("{}", super::render(&AnalysisResult::Benchmark(analysis), json)?);
    Ok(())
}

/// Any name that is not a known kind is an unknown tool here.
fn parse_tool(tool: &str) -> Result<RequestedKind, ScopeError> {
    tool.parse()
        .map_err(|_| ScopeError::UnknownTool(tool.to_string()))
}
