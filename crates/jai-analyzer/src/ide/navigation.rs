use std::path::PathBuf;

/// 0-based line/character position as the editor counts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct IdePosition {
    pub line: u32,
    pub character: u32,
}

impl IdePosition {
    pub const fn new(
        line: u32,
        character: u32,
    ) -> Self {
        Self {
            line,
            character,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IdeRange {
    pub start: IdePosition,
    pub end: IdePosition,
}

impl IdeRange {
    pub const fn new(
        start: IdePosition,
        end: IdePosition,
    ) -> Self {
        Self {
            start,
            end,
        }
    }
}

/// A navigation target: a file plus a 0-based, end-exclusive range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdeLocation {
    pub file_path: PathBuf,
    pub range: IdeRange,
}

impl IdeLocation {
    pub fn new(
        file_path: impl Into<PathBuf>,
        range: IdeRange,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            range,
        }
    }
}
