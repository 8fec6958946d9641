use std::{fmt, path::Path};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DRIVE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]:/").expect("drive prefix pattern is valid"));

/// A file path spelled the same way no matter who reported it.
///
/// The editor and the compiler disagree on separators and on drive-letter
/// case (`c:\src\a.jai` vs `C:/src/a.jai`), so both sides go through
/// [`normalize_path`] before a path becomes part of a [`LocationKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Directory part of the path, without the trailing separator.
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(dir, _)| dir)
    }

    pub fn file_name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical spelling of `path`: `/` separators and an uppercase drive letter.
pub fn normalize_path(path: &str) -> NormalizedPath {
    let mut normalized = path.replace('\\', "/");
    if DRIVE_PREFIX.is_match(&normalized) {
        normalized[..1].make_ascii_uppercase();
    }
    NormalizedPath(normalized)
}

pub fn normalize_fs_path(path: &Path) -> NormalizedPath {
    normalize_path(&path.to_string_lossy())
}

/// Identifies a reference site as `<normalized path>:<line>:<column>`.
///
/// Line and column are 1-based, matching what the compiler's extension
/// writes into `defs.out`. Callers holding 0-based editor positions add one
/// to both coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn new(
        path: &NormalizedPath,
        line: u32,
        column: u32,
    ) -> Self {
        Self(format!("{path}:{line}:{column}"))
    }

    /// Wrap a key exactly as the compiler spelled it.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Split a key back into `(path, line, column)`.
    ///
    /// Splitting happens on the last two `:` so drive letters and any other
    /// colon inside the path stay part of the path.
    pub fn parse(&self) -> Option<(&str, u32, u32)> {
        let mut parts = self.0.rsplitn(3, ':');
        let column = parts.next()?.parse().ok()?;
        let line = parts.next()?.parse().ok()?;
        let path = parts.next().filter(|path| !path.is_empty())?;
        Some((path, line, column))
    }

    /// The same key with its path part run through [`normalize_path`].
    ///
    /// Keys that do not parse are returned unchanged.
    pub fn renormalized(&self) -> Self {
        match self.parse() {
            Some((path, line, column)) => Self::new(&normalize_path(path), line, column),
            None => self.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/src/definition/location_key_tests.rs"]
mod tests;
