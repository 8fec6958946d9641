//! Editor-neutral navigation types and their LSP conversions.

pub mod lsp;
pub mod navigation;

pub use navigation::{IdeLocation, IdePosition, IdeRange};
