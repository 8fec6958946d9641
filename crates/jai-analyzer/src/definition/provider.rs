//! Definition provider implementation.

use std::{sync::Arc, time::Instant};

use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::{
    definition::{
        location_key::{LocationKey, NormalizedPath},
        perf::{GotoDefPerf, Resolution},
        synchronizer::{IndexSynchronizer, SyncOutcome},
        unit::{CompilationUnit, DEFAULT_SOURCE_EXTENSION},
    },
    ide::{IdeLocation, IdePosition},
};

/// Key for the reference starting at a 0-based editor position.
pub fn reference_key(
    path: &NormalizedPath,
    position: IdePosition,
) -> LocationKey {
    LocationKey::new(path, position.line.saturating_add(1), position.character.saturating_add(1))
}

/// Whether the compiler can be asked to process `path`.
pub fn is_source_file(path: &NormalizedPath) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(DEFAULT_SOURCE_EXTENSION))
}

/// Answers go-to-definition from the index, resynchronizing on a miss.
pub struct DefinitionProvider {
    synchronizer: Arc<IndexSynchronizer>,
    /// Keys that were still missing right after a resync, with the index
    /// generation at that time. A later miss at the same generation skips
    /// the compiler.
    known_absent: DashMap<LocationKey, u64>,
    primed_units: DashSet<CompilationUnit>,
    goto_def_perf: GotoDefPerf,
}

impl DefinitionProvider {
    pub fn new(synchronizer: Arc<IndexSynchronizer>) -> Self {
        Self {
            synchronizer,
            known_absent: DashMap::new(),
            primed_units: DashSet::new(),
            goto_def_perf: GotoDefPerf::default(),
        }
    }

    pub fn synchronizer(&self) -> &Arc<IndexSynchronizer> {
        &self.synchronizer
    }

    pub fn log_perf_summary(&self) {
        self.goto_def_perf.log_summary();
    }

    /// Index-only lookup; never starts the compiler.
    pub fn lookup(
        &self,
        path: &NormalizedPath,
        position: IdePosition,
    ) -> Option<IdeLocation> {
        self.synchronizer.index().lookup(&reference_key(path, position))
    }

    /// Resolve the reference whose identifier starts at `position`.
    ///
    /// On a miss the unit covering `path` is recompiled before the lookup is
    /// retried, so this can take as long as one compiler run. The retry may
    /// still miss when the compiler's output does not cover the reference.
    pub async fn provide(
        &self,
        path: &NormalizedPath,
        position: IdePosition,
    ) -> Option<IdeLocation> {
        let started = Instant::now();
        let key = reference_key(path, position);
        let index = self.synchronizer.index();

        if let Some(target) = index.lookup(&key) {
            self.goto_def_perf.record(started.elapsed(), Resolution::Cached);
            return Some(target);
        }

        if !is_source_file(path) {
            self.goto_def_perf.record(started.elapsed(), Resolution::NotSource);
            return None;
        }

        let generation = index.generation();
        if self.known_absent.get(&key).is_some_and(|absent_at| *absent_at == generation) {
            debug!("[goto-def] {key} known absent at generation {generation}");
            self.goto_def_perf.record(started.elapsed(), Resolution::KnownAbsent);
            return None;
        }

        let unit = CompilationUnit::resolve(path);
        debug!("[goto-def] {key} missed, resynchronizing {unit}");
        self.primed_units.insert(unit.clone());
        if let SyncOutcome::Failed(error) = self.synchronizer.sync(unit).await {
            debug!("[goto-def] resync for {key} failed: {error}");
        }

        let target = index.lookup(&key);
        match &target {
            Some(_) => {
                self.known_absent.remove(&key);
                self.goto_def_perf.record(started.elapsed(), Resolution::Resynced);
            },
            None => {
                self.known_absent.insert(key, index.generation());
                self.goto_def_perf.record(started.elapsed(), Resolution::Unresolved);
            },
        }
        target
    }

    /// Compile the unit covering `path` if no request has covered it yet.
    ///
    /// Returns `None` when nothing was run.
    pub async fn prime(
        &self,
        path: &NormalizedPath,
    ) -> Option<SyncOutcome> {
        if !is_source_file(path) {
            return None;
        }
        let unit = CompilationUnit::resolve(path);
        if !self.primed_units.insert(unit.clone()) {
            return None;
        }
        Some(self.synchronizer.sync(unit).await)
    }

    /// Recompile the unit covering `path` after its sources changed.
    pub async fn refresh(
        &self,
        path: &NormalizedPath,
    ) -> Option<SyncOutcome> {
        if !is_source_file(path) {
            return None;
        }
        self.forget_absent();
        let unit = CompilationUnit::resolve(path);
        self.primed_units.insert(unit.clone());
        Some(self.synchronizer.sync(unit).await)
    }

    /// Drop every remembered miss so the next one resynchronizes again.
    pub fn forget_absent(&self) {
        self.known_absent.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/src/definition/provider_tests.rs"]
mod tests;
