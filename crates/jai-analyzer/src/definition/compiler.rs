use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    process::Stdio,
    sync::RwLock,
    time::Duration,
};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::definition::{location_key::normalize_fs_path, unit::CompilationUnit};

pub const DEFAULT_COMPILER_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the external compiler for one unit.
///
/// A successful return means the compiler exited with status 0; the
/// snapshot it was supposed to write is read separately.
#[tower_lsp::async_trait]
pub trait UnitCompiler: Send + Sync {
    async fn compile(
        &self,
        unit: &CompilationUnit,
    ) -> Result<(), CompileError>;
}

/// Everything needed to build a compiler command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerInvocation {
    pub executable: String,
    /// Root of the installation; the definition extension lives in `src/`.
    pub install_dir: PathBuf,
    pub build_args: Vec<String>,
    pub timeout: Duration,
}

impl CompilerInvocation {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: "jai".to_string(),
            install_dir: install_dir.into(),
            build_args: Vec::new(),
            timeout: DEFAULT_COMPILER_TIMEOUT,
        }
    }
}

/// `<unit> <mode> [build args..] -- import_dir <install>/src/ meta extension`
pub fn compiler_args(
    unit: &CompilationUnit,
    build_args: &[String],
    install_dir: &Path,
) -> Vec<String> {
    let mut args = vec![unit.specifier().to_string(), unit.mode().as_arg().to_string()];
    args.extend(build_args.iter().cloned());
    args.extend([
        "--".to_string(),
        "import_dir".to_string(),
        format!("{}/src/", normalize_fs_path(install_dir).as_str().trim_end_matches('/')),
        "meta".to_string(),
        "extension".to_string(),
    ]);
    args
}

/// The Jai compiler, invoked as a subprocess.
#[derive(Debug)]
pub struct JaiCompiler {
    invocation: RwLock<CompilerInvocation>,
}

impl JaiCompiler {
    pub fn new(invocation: CompilerInvocation) -> Self {
        Self {
            invocation: RwLock::new(invocation),
        }
    }

    pub fn invocation(&self) -> CompilerInvocation {
        self.invocation.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn configure(
        &self,
        invocation: CompilerInvocation,
    ) {
        *self.invocation.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = invocation;
    }
}

#[tower_lsp::async_trait]
impl UnitCompiler for JaiCompiler {
    async fn compile(
        &self,
        unit: &CompilationUnit,
    ) -> Result<(), CompileError> {
        let invocation = self.invocation();
        let args = compiler_args(unit, &invocation.build_args, &invocation.install_dir);
        debug!("[compiler] {} {}", invocation.executable, args.join(" "));

        let mut command = Command::new(&invocation.executable);
        command.kill_on_drop(true).args(&args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = unit.working_dir()
            && dir.is_dir()
        {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => CompileError::CommandNotFound(invocation.executable.clone()),
            _ => CompileError::LaunchFailed {
                command: invocation.executable.clone(),
                reason: error.to_string(),
            },
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|error| CompileError::LaunchFailed {
                command: invocation.executable.clone(),
                reason: error.to_string(),
            })?,
            Err(_) => {
                return Err(CompileError::TimedOut {
                    after: invocation.timeout,
                });
            },
        };

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("[compiler] {unit} exited with {}", output.status);
            for line in stdout.lines().chain(stderr.lines()).filter(|line| line.contains("Error")) {
                warn!("[compiler] {line}");
            }
            debug!("[compiler] stdout: {stdout}");
            debug!("[compiler] stderr: {stderr}");
            return Err(CompileError::Exited {
                code: output.status.code(),
                stderr,
            });
        }

        debug!("[compiler] {unit} finished");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    CommandNotFound(String),
    LaunchFailed {
        command: String,
        reason: String,
    },
    Exited {
        code: Option<i32>,
        stderr: String,
    },
    TimedOut {
        after: Duration,
    },
}

impl Display for CompileError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::CommandNotFound(command) => write!(f, "{command} is not available"),
            Self::LaunchFailed {
                command,
                reason,
            } => {
                write!(f, "failed to launch {command}: {reason}")
            },
            Self::Exited {
                code: Some(code),
                ..
            } => write!(f, "compiler exited with code {code}"),
            Self::Exited {
                code: None,
                ..
            } => write!(f, "compiler was terminated by a signal"),
            Self::TimedOut {
                after,
            } => write!(f, "compiler did not finish within {after:?}"),
        }
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
#[path = "../../tests/src/definition/compiler_tests.rs"]
mod tests;
