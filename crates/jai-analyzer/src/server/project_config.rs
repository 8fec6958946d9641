use std::path::{Path, PathBuf};

use serde_json::Value;

use super::settings::{ConfigError, ServerSettings};

pub(crate) const PROJECT_CONFIG_FILENAME: &str = "jai-analyzer.toml";

/// Walks parent directories from `start` looking for `jai-analyzer.toml`.
/// Returns the path to the first one found, or `None`.
pub(crate) fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    loop {
        let candidate = dir.join(PROJECT_CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Reads a project config file into the same JSON shape the editor sends,
/// so both go through [`ServerSettings::merged_with_payload`].
pub(crate) fn load_project_config(path: &Path) -> Result<Value, ConfigError> {
    let project_error = |reason: String| ConfigError::ProjectFile {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|error| project_error(error.to_string()))?;
    let table: toml::Table = toml::from_str(&content).map_err(|error| project_error(error.to_string()))?;
    serde_json::to_value(table).map_err(|error| project_error(error.to_string()))
}

/// Layers the nearest project config above `workspace_root` over `base`.
///
/// Without a config file `base` is returned unchanged.
pub(crate) fn apply_project_config(
    base: &ServerSettings,
    workspace_root: &Path,
) -> Result<ServerSettings, ConfigError> {
    let Some(path) = find_project_config(workspace_root) else {
        return Ok(base.clone());
    };
    let payload = load_project_config(&path)?;
    base.merged_with_payload(&payload).map_err(|error| match error {
        ConfigError::MalformedSettings {
            reason,
        } => ConfigError::ProjectFile {
            path,
            reason,
        },
        other => other,
    })
}

#[cfg(test)]
#[path = "../../tests/src/server/project_config_tests.rs"]
mod tests;
