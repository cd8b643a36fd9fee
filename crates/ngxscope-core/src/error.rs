/// ngxscope error types
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("could not detect input format; pass the kind explicitly")]
    FormatUndetected,

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("unknown benchmark tool: {0}")]
    UnknownTool(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
