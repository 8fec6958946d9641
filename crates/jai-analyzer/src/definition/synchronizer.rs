//! Keeps the [`DefinitionIndex`] in step with the compiler's snapshot.
//!
//! A synchronization compiles one [`CompilationUnit`], reads the snapshot the
//! compiler extension wrote, and swaps the index. Failures at any step leave
//! the previous index in place; they come back as [`SyncOutcome::Failed`]
//! and are never raised to the editor.
//!
//! At most one compiler run per unit is in flight. Callers that ask for a
//! unit that is already compiling await the running job instead of starting
//! another. The job itself runs on its own task, so a caller that goes away
//! (e.g. a cancelled request) does not cut the compiler short.
//!
//! Different units may share one snapshot file. A job holds that file's lock
//! from the start of its compile until its snapshot is read, so it never
//! ingests output written by another unit's run.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use serde::Deserialize;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};

use crate::definition::{
    compiler::{CompileError, UnitCompiler},
    index::DefinitionIndex,
    snapshot::{DefinitionEntry, SNAPSHOT_FILE_NAME, SnapshotError, read_snapshot},
    unit::CompilationUnit,
};

/// Where the compiler extension writes `defs.out`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotLocation {
    /// Next to the extension metaprogram, in the install directory.
    #[default]
    InstallDir,
    /// In the directory the compiler ran in.
    WorkingDirectory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSource {
    pub location: SnapshotLocation,
    pub install_dir: PathBuf,
}

impl SnapshotSource {
    pub fn new(
        location: SnapshotLocation,
        install_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            location,
            install_dir: install_dir.into(),
        }
    }

    /// Snapshot path for a run of `unit`, or for no particular unit.
    pub fn snapshot_path(
        &self,
        unit: Option<&CompilationUnit>,
    ) -> PathBuf {
        let dir = match self.location {
            SnapshotLocation::InstallDir => self.install_dir.clone(),
            SnapshotLocation::WorkingDirectory => unit
                .and_then(CompilationUnit::working_dir)
                .filter(|dir| dir.is_dir())
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        dir.join(SNAPSHOT_FILE_NAME)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated {
        generation: u64,
        entries: usize,
    },
    Failed(SyncError),
}

impl SyncOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    Compile(CompileError),
    Snapshot(SnapshotError),
    /// The synchronization task ended without reporting a result.
    Aborted,
}

impl Display for SyncError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Compile(error) => write!(f, "{error}"),
            Self::Snapshot(error) => write!(f, "{error}"),
            Self::Aborted => write!(f, "synchronization task ended unexpectedly"),
        }
    }
}

impl std::error::Error for SyncError {}

type PendingSync = Shared<BoxFuture<'static, SyncOutcome>>;

struct InFlight {
    ticket: u64,
    result: PendingSync,
}

pub struct IndexSynchronizer {
    index: Arc<DefinitionIndex>,
    compiler: Arc<dyn UnitCompiler>,
    source: RwLock<SnapshotSource>,
    in_flight: Arc<DashMap<CompilationUnit, InFlight>>,
    snapshot_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
    next_ticket: AtomicU64,
}

impl IndexSynchronizer {
    pub fn new(
        index: Arc<DefinitionIndex>,
        compiler: Arc<dyn UnitCompiler>,
        source: SnapshotSource,
    ) -> Self {
        Self {
            index,
            compiler,
            source: RwLock::new(source),
            in_flight: Arc::new(DashMap::new()),
            snapshot_locks: DashMap::new(),
            next_ticket: AtomicU64::new(1),
        }
    }

    pub fn index(&self) -> &Arc<DefinitionIndex> {
        &self.index
    }

    pub fn snapshot_source(&self) -> SnapshotSource {
        self.source.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn set_snapshot_source(
        &self,
        source: SnapshotSource,
    ) {
        *self.source.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = source;
    }

    pub fn is_in_flight(
        &self,
        unit: &CompilationUnit,
    ) -> bool {
        self.in_flight.contains_key(unit)
    }

    /// Ingest a snapshot left by an earlier run, without compiling.
    pub async fn load_existing(&self) -> SyncOutcome {
        let path = self.snapshot_source().snapshot_path(None);
        let snapshot_lock = self.snapshot_lock(&path);
        let _owner = snapshot_lock.lock().await;
        match read_snapshot(&path).await {
            Ok(entries) => install(&self.index, entries, &path),
            Err(error) => {
                debug!("[sync] no usable snapshot at startup: {error}");
                SyncOutcome::Failed(SyncError::Snapshot(error))
            },
        }
    }

    /// Compile `unit`, ingest its snapshot and replace the index.
    ///
    /// Joins the running job when `unit` is already being compiled.
    pub async fn sync(
        &self,
        unit: CompilationUnit,
    ) -> SyncOutcome {
        let (pending, job) = match self.in_flight.entry(unit.clone()) {
            Entry::Occupied(running) => {
                debug!("[sync] joining in-flight run for {unit}");
                (running.get().result.clone(), None)
            },
            Entry::Vacant(slot) => {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = oneshot::channel();
                let result = receiver
                    .map(|received| received.unwrap_or(SyncOutcome::Failed(SyncError::Aborted)))
                    .boxed()
                    .shared();
                slot.insert(InFlight {
                    ticket,
                    result: result.clone(),
                });
                (result, Some((ticket, sender)))
            },
        };

        if let Some((ticket, sender)) = job {
            self.spawn_job(unit, ticket, sender);
        }

        pending.await
    }

    fn spawn_job(
        &self,
        unit: CompilationUnit,
        ticket: u64,
        sender: oneshot::Sender<SyncOutcome>,
    ) {
        let compiler = Arc::clone(&self.compiler);
        let index = Arc::clone(&self.index);
        let in_flight = Arc::clone(&self.in_flight);
        let snapshot_path = self.snapshot_source().snapshot_path(Some(&unit));
        let snapshot_lock = self.snapshot_lock(&snapshot_path);

        tokio::spawn(async move {
            let outcome = {
                let _owner = snapshot_lock.lock().await;
                info!("[sync] compiling {unit}");
                run_job(compiler.as_ref(), &index, &unit, &snapshot_path).await
            };
            // Unregister before publishing so later callers start a fresh run.
            in_flight.remove_if(&unit, |_, running| running.ticket == ticket);
            let _ = sender.send(outcome);
        });
    }

    fn snapshot_lock(
        &self,
        snapshot_path: &Path,
    ) -> Arc<Mutex<()>> {
        Arc::clone(self.snapshot_locks.entry(snapshot_path.to_path_buf()).or_default().value())
    }
}

async fn run_job(
    compiler: &dyn UnitCompiler,
    index: &DefinitionIndex,
    unit: &CompilationUnit,
    snapshot_path: &Path,
) -> SyncOutcome {
    if let Err(error) = compiler.compile(unit).await {
        warn!("[sync] compiling {unit} failed, keeping previous index: {error}");
        return SyncOutcome::Failed(SyncError::Compile(error));
    }

    match read_snapshot(snapshot_path).await {
        Ok(entries) => install(index, entries, snapshot_path),
        Err(error) => {
            warn!("[sync] ingesting {unit} failed, keeping previous index: {error}");
            SyncOutcome::Failed(SyncError::Snapshot(error))
        },
    }
}

fn install(
    index: &DefinitionIndex,
    entries: Vec<DefinitionEntry>,
    snapshot_path: &Path,
) -> SyncOutcome {
    let count = entries.len();
    let generation = index.replace(entries);
    info!("[sync] indexed {count} definitions from {} (generation {generation})", snapshot_path.display());
    SyncOutcome::Updated {
        generation,
        entries: count,
    }
}

#[cfg(test)]
#[path = "../../tests/src/definition/synchronizer_tests.rs"]
mod tests;
