pub(crate) mod handler;
pub(crate) mod project_config;
pub mod settings;
pub(crate) mod state;

pub use settings::{ConfigError, ServerSettings};
pub use state::{JaiLanguageServer, LaunchOptions};
