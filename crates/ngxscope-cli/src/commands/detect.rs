use std::path::Path;

use ngxscope_analyzer::detect_format;
use ngxscope_core::ScopeError;

pub fn run(file: &Path) -> Result<(), ScopeError> {
    let text = super::read_input(file)?;
    let kind = detect_format(&text)?;
    println!("{kind}");
    Ok(())
}
