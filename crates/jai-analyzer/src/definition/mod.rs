//! Go-to-definition backed by the compiler's definition snapshot.

pub mod compiler;
pub mod index;
pub mod location_key;
mod perf;
pub mod provider;
pub mod snapshot;
pub mod synchronizer;
pub mod unit;

#[cfg(test)]
#[path = "../../tests/src/definition/test_support.rs"]
pub(crate) mod test_support;

pub use compiler::{CompileError, CompilerInvocation, JaiCompiler, UnitCompiler};
pub use index::DefinitionIndex;
pub use location_key::{LocationKey, NormalizedPath, normalize_fs_path, normalize_path};
pub use provider::{DefinitionProvider, is_source_file, reference_key};
pub use snapshot::{DefinitionEntry, SNAPSHOT_FILE_NAME, SnapshotError, SnapshotPosition};
pub use synchronizer::{IndexSynchronizer, SnapshotLocation, SnapshotSource, SyncError, SyncOutcome};
pub use unit::{CompilationUnit, UnitMode};
