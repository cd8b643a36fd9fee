pub mod error;
pub mod kind;

pub use error::ScopeError;
pub use kind::{RequestedKind, SourceKind};
