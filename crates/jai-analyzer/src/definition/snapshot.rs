//! Reader for the `defs.out` snapshot written by the compiler extension.
//!
//! The file is a JSON array of records:
//!
//! ```json
//! [{ "key": "/src/Foo.jai:10:5", "path": "/src/Foo.jai",
//!    "start": { "line": 3, "column": 1 }, "end": { "line": 3, "column": 9 } }]
//! ```
//!
//! Coordinates are 1-based. Every run rewrites the whole file, so a parsed
//! snapshot is always a complete entry set for the unit that was compiled.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    definition::location_key::LocationKey,
    ide::{IdeLocation, IdePosition, IdeRange},
};

pub const SNAPSHOT_FILE_NAME: &str = "defs.out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPosition {
    pub line: u32,
    pub column: u32,
}

impl SnapshotPosition {
    pub const fn new(
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            line,
            column,
        }
    }

    fn to_ide(self) -> IdePosition {
        IdePosition::new(self.line.saturating_sub(1), self.column.saturating_sub(1))
    }
}

/// One reference site and the definition it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionEntry {
    pub key: LocationKey,
    pub path: String,
    pub start: SnapshotPosition,
    pub end: SnapshotPosition,
}

impl DefinitionEntry {
    /// The definition target in 0-based editor coordinates.
    ///
    /// An end that precedes the start collapses to an empty range at the start.
    pub fn target(&self) -> IdeLocation {
        let start = self.start.to_ide();
        let end = self.end.to_ide().max(start);
        IdeLocation::new(&self.path, IdeRange::new(start, end))
    }
}

pub fn parse_snapshot(content: &str) -> Result<Vec<DefinitionEntry>, serde_json::Error> {
    serde_json::from_str(content)
}

pub async fn read_snapshot(path: &Path) -> Result<Vec<DefinitionEntry>, SnapshotError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|error| SnapshotError::Unreadable {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    parse_snapshot(&content).map_err(|error| SnapshotError::Malformed {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    Unreadable {
        path: PathBuf,
        reason: String,
    },
    Malformed {
        path: PathBuf,
        reason: String,
    },
}

impl Display for SnapshotError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Unreadable {
                path,
                reason,
            } => {
                write!(f, "cannot read snapshot {}: {reason}", path.display())
            },
            Self::Malformed {
                path,
                reason,
            } => {
                write!(f, "snapshot {} is not a valid definition list: {reason}", path.display())
            },
        }
    }
}

impl std::error::Error for SnapshotError {}

#[cfg(test)]
#[path = "../../tests/src/definition/snapshot_tests.rs"]
mod tests;
