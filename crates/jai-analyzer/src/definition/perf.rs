use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tracing::info;

/// How a definition request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Resolution {
    /// Found in the index without compiling.
    Cached,
    /// Missed, resynchronized, then found.
    Resynced,
    /// Missed, resynchronized, still missing.
    Unresolved,
    /// Missed at a generation where the key was already known to be absent.
    KnownAbsent,
    /// Missed in a file the compiler cannot process.
    NotSource,
}

/// Runtime counters for go-to-definition requests.
///
/// The resync ratio shows how often the query path pays for a compiler run.
#[derive(Default)]
pub(super) struct GotoDefPerf {
    requests: AtomicU64,
    cached: AtomicU64,
    resynced: AtomicU64,
    unresolved: AtomicU64,
    known_absent: AtomicU64,
    not_source: AtomicU64,
    total_elapsed_ns: AtomicU64,
}

impl GotoDefPerf {
    pub(super) fn record(
        &self,
        elapsed: Duration,
        resolution: Resolution,
    ) {
        let requests = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        self.counter(resolution).fetch_add(1, Ordering::Relaxed);

        let elapsed_ns = elapsed.as_nanos().min(u64::MAX as u128) as u64;
        self.total_elapsed_ns.fetch_add(elapsed_ns, Ordering::Relaxed);

        if requests % 200 == 0 {
            self.log_summary();
        }
    }

    pub(super) fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub(super) fn count(
        &self,
        resolution: Resolution,
    ) -> u64 {
        self.counter(resolution).load(Ordering::Relaxed)
    }

    fn counter(
        &self,
        resolution: Resolution,
    ) -> &AtomicU64 {
        match resolution {
            Resolution::Cached => &self.cached,
            Resolution::Resynced => &self.resynced,
            Resolution::Unresolved => &self.unresolved,
            Resolution::KnownAbsent => &self.known_absent,
            Resolution::NotSource => &self.not_source,
        }
    }

    pub(super) fn log_summary(&self) {
        let requests = self.requests();
        if requests == 0 {
            info!("[perf][goto-def] no requests recorded yet");
            return;
        }

        let cached = self.count(Resolution::Cached);
        let resynced = self.count(Resolution::Resynced);
        let unresolved = self.count(Resolution::Unresolved);
        let known_absent = self.count(Resolution::KnownAbsent);
        let not_source = self.count(Resolution::NotSource);
        let total_elapsed_ns = self.total_elapsed_ns.load(Ordering::Relaxed);

        let avg_ms = total_elapsed_ns as f64 / requests as f64 / 1_000_000.0;
        let resync_ratio = (resynced + unresolved) as f64 / requests as f64;

        info!(
            "[perf][goto-def] requests={requests}, cached={cached}, resynced={resynced}, \
             unresolved={unresolved}, known_absent={known_absent}, not_source={not_source}, \
             resync_ratio={resync_ratio:.2}, avg_ms={avg_ms:.2}"
        );
    }
}
