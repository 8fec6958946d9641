//! Scripted stand-in for the Jai compiler used by the definition tests.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::definition::{
    compiler::{CompileError, UnitCompiler},
    unit::CompilationUnit,
};

#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Write this text as the snapshot, then exit 0.
    Write(String),
    /// Exit 0 without touching the snapshot.
    Succeed,
    Fail(CompileError),
}

pub(crate) struct ScriptedCompiler {
    snapshot_path: PathBuf,
    delay: Duration,
    steps: Mutex<VecDeque<Step>>,
    units: Mutex<Vec<CompilationUnit>>,
    runs: AtomicUsize,
}

impl ScriptedCompiler {
    pub(crate) fn new(snapshot_path: &Path) -> Self {
        Self {
            snapshot_path: snapshot_path.to_path_buf(),
            delay: Duration::ZERO,
            steps: Mutex::new(VecDeque::new()),
            units: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(
        mut self,
        delay: Duration,
    ) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn then(
        self,
        step: Step,
    ) -> Self {
        self.steps.lock().expect("steps lock").push_back(step);
        self
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub(crate) fn units(&self) -> Vec<CompilationUnit> {
        self.units.lock().expect("units lock").clone()
    }
}

#[tower_lsp::async_trait]
impl UnitCompiler for ScriptedCompiler {
    async fn compile(
        &self,
        unit: &CompilationUnit,
    ) -> Result<(), CompileError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.units.lock().expect("units lock").push(unit.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let step = self.steps.lock().expect("steps lock").pop_front().unwrap_or(Step::Succeed);
        match step {
            Step::Write(text) => {
                std::fs::write(&self.snapshot_path, text).expect("write scripted snapshot");
                Ok(())
            },
            Step::Succeed => Ok(()),
            Step::Fail(error) => Err(error),
        }
    }
}

pub(crate) fn snapshot_json(records: &[(&str, &str, (u32, u32), (u32, u32))]) -> String {
    let records: Vec<_> = records
        .iter()
        .map(|(key, path, start, end)| {
            serde_json::json!({
                "key": key,
                "path": path,
                "start": { "line": start.0, "column": start.1 },
                "end": { "line": end.0, "column": end.1 },
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}
