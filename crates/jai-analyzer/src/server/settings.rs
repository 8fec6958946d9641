use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use crate::definition::{NormalizedPath, SnapshotLocation, normalize_fs_path, normalize_path};

pub(crate) const SETTINGS_SECTION_KEY: &str = "jai-analyzer";
const DEFAULT_COMPILER_PATH: &str = "jai";
const DEFAULT_COMPILER_TIMEOUT_MS: u64 = 30_000;
const MIN_COMPILER_TIMEOUT_MS: u64 = 1_000;
const MAX_COMPILER_TIMEOUT_MS: u64 = 600_000;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    pub compiler: CompilerSettings,
    pub indexing: IndexingSettings,
    pub logging: LoggingSettings,
}

impl ServerSettings {
    pub fn from_lsp_payload(payload: Option<&Value>) -> Result<Self, ConfigError> {
        match payload {
            Some(payload) => Self::default().merged_with_payload(payload),
            None => Ok(Self::default()),
        }
    }

    /// Settings given on the command line, layered over the defaults.
    pub fn from_cli(
        jai_path: Option<&str>,
        build_file: Option<&str>,
        build_args: &[String],
    ) -> Result<Self, ConfigError> {
        let mut compiler = serde_json::Map::new();
        if let Some(path) = jai_path {
            compiler.insert("path".to_string(), json!(path));
        }
        if let Some(build_file) = build_file {
            compiler.insert("buildFile".to_string(), json!(build_file));
        }
        if !build_args.is_empty() {
            compiler.insert("buildArgs".to_string(), json!(build_args));
        }
        Self::from_lsp_payload(Some(&json!({ "compiler": compiler })))
    }

    /// Apply a settings payload on top of `self`.
    ///
    /// The payload may hold the settings directly or under the
    /// `"jai-analyzer"` key. Fields that are absent keep their current value.
    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Result<Self, ConfigError> {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            let patch = serde_json::from_value::<ServerSettingsPatch>(candidate.clone()).map_err(|error| {
                ConfigError::MalformedSettings {
                    reason: error.to_string(),
                }
            })?;
            merged.apply_patch(patch)?;
        }

        merged.normalize();
        merged.validate()?;
        Ok(merged)
    }

    fn apply_patch(
        &mut self,
        patch: ServerSettingsPatch,
    ) -> Result<(), ConfigError> {
        if let Some(compiler) = patch.compiler {
            self.compiler.apply_patch(compiler)?;
        }
        if let Some(indexing) = patch.indexing {
            self.indexing.apply_patch(indexing);
        }
        if let Some(logging) = patch.logging {
            self.logging.apply_patch(logging);
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.compiler.normalize();
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.compiler.build_file.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptyBuildFile);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    /// Compiler executable, a bare name resolved through `PATH` by default.
    pub path: String,
    /// Entry file compiled once at startup; relative paths resolve against
    /// the workspace root.
    pub build_file: Option<String>,
    pub build_args: Vec<String>,
    pub timeout_ms: u64,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_COMPILER_PATH.to_string(),
            build_file: None,
            build_args: Vec::new(),
            timeout_ms: DEFAULT_COMPILER_TIMEOUT_MS,
        }
    }
}

impl CompilerSettings {
    fn apply_patch(
        &mut self,
        patch: CompilerSettingsPatch,
    ) -> Result<(), ConfigError> {
        if let Some(path) = patch.path {
            self.path = path;
        }
        if let Some(build_file) = patch.build_file {
            self.build_file = match build_file {
                Value::Null => None,
                Value::String(file) => Some(file),
                other => {
                    return Err(ConfigError::InvalidBuildFile {
                        found: other.to_string(),
                    });
                },
            };
        }
        if let Some(build_args) = patch.build_args {
            self.build_args = build_args
                .into_iter()
                .enumerate()
                .map(|(index, arg)| match arg {
                    Value::String(arg) => Ok(arg),
                    other => Err(ConfigError::InvalidBuildArg {
                        index,
                        found: other.to_string(),
                    }),
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(timeout_ms) = patch.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let path = self.path.trim();
        self.path = if path.is_empty() {
            DEFAULT_COMPILER_PATH.to_string()
        } else {
            normalize_path(path).to_string()
        };

        self.build_file = self.build_file.as_deref().map(|file| file.trim().to_string());
        self.build_args = self.build_args.iter().map(|arg| arg.trim().to_string()).filter(|arg| !arg.is_empty()).collect();
        self.timeout_ms = self.timeout_ms.clamp(MIN_COMPILER_TIMEOUT_MS, MAX_COMPILER_TIMEOUT_MS);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The build file as an absolute, normalized path.
    pub fn resolved_build_file(
        &self,
        workspace_root: Option<&Path>,
    ) -> Option<NormalizedPath> {
        let file = PathBuf::from(self.build_file.as_deref()?);
        let absolute = match workspace_root {
            Some(root) if file.is_relative() => root.join(file),
            _ => file,
        };
        Some(normalize_fs_path(&absolute))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexingSettings {
    /// Compile a document's unit the first time the document is opened.
    pub on_open: bool,
    /// Recompile a document's unit every time it is saved.
    pub on_save: bool,
    pub snapshot_location: SnapshotLocation,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            on_open: true,
            on_save: true,
            snapshot_location: SnapshotLocation::InstallDir,
        }
    }
}

impl IndexingSettings {
    fn apply_patch(
        &mut self,
        patch: IndexingSettingsPatch,
    ) {
        if let Some(on_open) = patch.on_open {
            self.on_open = on_open;
        }
        if let Some(on_save) = patch.on_save {
            self.on_save = on_save;
        }
        if let Some(snapshot_location) = patch.snapshot_location {
            self.snapshot_location = snapshot_location;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoggingSettings {
    /// Verbosity of `window/logMessage` notifications sent to the editor.
    pub level: LogLevel,
}

impl LoggingSettings {
    fn apply_patch(
        &mut self,
        patch: LoggingSettingsPatch,
    ) {
        if let Some(level) = patch.level {
            self.level = level;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn allows_info(self) -> bool {
        self >= LogLevel::Info
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyBuildFile,
    InvalidBuildFile {
        found: String,
    },
    InvalidBuildArg {
        index: usize,
        found: String,
    },
    MalformedSettings {
        reason: String,
    },
    ProjectFile {
        path: PathBuf,
        reason: String,
    },
    MissingInstallDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::EmptyBuildFile => write!(f, "{SETTINGS_SECTION_KEY}.compiler.buildFile cannot be empty"),
            Self::InvalidBuildFile {
                found,
            } => {
                write!(f, "{SETTINGS_SECTION_KEY}.compiler.buildFile must be a string. Got: {found}")
            },
            Self::InvalidBuildArg {
                index,
                found,
            } => {
                write!(f, "{SETTINGS_SECTION_KEY}.compiler.buildArgs[{index}] must be a string. Got: {found}")
            },
            Self::MalformedSettings {
                reason,
            } => write!(f, "invalid {SETTINGS_SECTION_KEY} settings: {reason}"),
            Self::ProjectFile {
                path,
                reason,
            } => write!(f, "invalid project config {}: {reason}", path.display()),
            Self::MissingInstallDir(path) => {
                write!(f, "install directory {} does not exist", path.display())
            },
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ServerSettingsPatch {
    compiler: Option<CompilerSettingsPatch>,
    indexing: Option<IndexingSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct CompilerSettingsPatch {
    path: Option<String>,
    // Kept loose so a wrong type is reported instead of dropping the patch.
    // `Some(Value::Null)` is an explicit `null`, which clears the build file.
    #[serde(deserialize_with = "present_value")]
    build_file: Option<Value>,
    build_args: Option<Vec<Value>>,
    timeout_ms: Option<u64>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct IndexingSettingsPatch {
    on_open: Option<bool>,
    on_save: Option<bool>,
    snapshot_location: Option<SnapshotLocation>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct LoggingSettingsPatch {
    level: Option<LogLevel>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

/// Distinguishes a field set to `null` from one left out: any present value,
/// `null` included, comes back as `Some`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn payload_candidates(payload: &Value) -> Vec<&Value> {
    let mut candidates = vec![payload];
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped);
    }
    candidates
}

#[cfg(test)]
#[path = "../../tests/src/server/settings_tests.rs"]
mod tests;
