pub mod definition;
pub mod document;
pub mod ide;
pub mod progress;
pub mod server;

pub use definition::{DefinitionIndex, DefinitionProvider, IndexSynchronizer, LocationKey, normalize_path};
pub use server::{ConfigError, JaiLanguageServer, LaunchOptions, ServerSettings};
