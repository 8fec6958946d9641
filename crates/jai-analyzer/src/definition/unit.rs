use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use crate::definition::location_key::{NormalizedPath, normalize_path};

/// File stem that marks a directory as a named module (`module.jai`).
pub const MODULE_MARKER_STEM: &str = "module";
pub const DEFAULT_SOURCE_EXTENSION: &str = "jai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitMode {
    File,
    Module,
}

impl UnitMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Module => "module",
        }
    }
}

/// What the compiler is asked to process for one synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompilationUnit {
    /// A single source file, compiled on its own.
    File {
        path: NormalizedPath,
    },
    /// A directory holding `module.<ext>`, compiled by module name.
    Module {
        name: String,
        directory: NormalizedPath,
    },
}

impl CompilationUnit {
    pub fn file(path: NormalizedPath) -> Self {
        Self::File {
            path,
        }
    }

    /// Pick the unit that covers `active`.
    ///
    /// When the file's directory contains `module.<ext>` the whole module is
    /// compiled so definitions in sibling files are indexed too; otherwise
    /// the file alone is.
    pub fn resolve(active: &NormalizedPath) -> Self {
        let extension = active.extension().unwrap_or(DEFAULT_SOURCE_EXTENSION);

        if let Some(directory) = active.parent()
            && let Some(name) = module_name(directory)
        {
            let marker = format!("{directory}/{MODULE_MARKER_STEM}.{extension}");
            if Path::new(&marker).exists() {
                return Self::Module {
                    name: name.to_owned(),
                    directory: normalize_path(directory),
                };
            }
        }

        Self::file(active.clone())
    }

    pub fn mode(&self) -> UnitMode {
        match self {
            Self::File {
                ..
            } => UnitMode::File,
            Self::Module {
                ..
            } => UnitMode::Module,
        }
    }

    /// The unit argument passed to the compiler: a path or a module name.
    pub fn specifier(&self) -> &str {
        match self {
            Self::File {
                path,
            } => path.as_str(),
            Self::Module {
                name,
                ..
            } => name,
        }
    }

    /// Directory the compiler runs in.
    ///
    /// The file's own directory in file mode; the module directory's parent
    /// in module mode, so the module name resolves from there.
    pub fn working_dir(&self) -> Option<PathBuf> {
        let parent = match self {
            Self::File {
                path,
            } => path.parent(),
            Self::Module {
                directory,
                ..
            } => directory.parent(),
        };
        match parent {
            Some("") => Some(PathBuf::from("/")),
            Some(dir) => Some(PathBuf::from(dir)),
            None => None,
        }
    }
}

impl Display for CompilationUnit {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{} {}", self.mode().as_arg(), self.specifier())
    }
}

fn module_name(directory: &str) -> Option<&str> {
    let name = directory.rsplit('/').next()?;
    if name.is_empty() || name.ends_with(':') {
        return None;
    }
    Some(name)
}

#[cfg(test)]
#[path = "../../tests/src/definition/unit_tests.rs"]
mod tests;
