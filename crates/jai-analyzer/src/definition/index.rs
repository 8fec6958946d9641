use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    definition::{location_key::LocationKey, snapshot::DefinitionEntry},
    ide::IdeLocation,
};

#[derive(Debug, Default)]
struct IndexTable {
    generation: u64,
    targets: HashMap<LocationKey, IdeLocation>,
}

/// Reference-site → definition map, rebuilt wholesale from each snapshot.
///
/// `replace` builds the new table off to the side and swaps it in under a
/// short write lock, so a reader sees either the previous snapshot or the
/// new one in full. There is no way to edit individual entries.
#[derive(Debug, Default)]
pub struct DefinitionIndex {
    table: RwLock<Arc<IndexTable>>,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(
        &self,
        key: &LocationKey,
    ) -> Option<IdeLocation> {
        self.current().targets.get(key).cloned()
    }

    /// Discard the current mapping and install one built from `entries`.
    ///
    /// Keys are renormalized so tool-side path spelling matches editor-side
    /// lookups. A later entry with the same key overrides an earlier one.
    /// Returns the generation of the installed table.
    pub fn replace<I>(
        &self,
        entries: I,
    ) -> u64
    where
        I: IntoIterator<Item = DefinitionEntry>,
    {
        let targets = entries.into_iter().map(|entry| (entry.key.renormalized(), entry.target())).collect();

        let mut table = self.table.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let generation = table.generation + 1;
        *table = Arc::new(IndexTable {
            generation,
            targets,
        });
        generation
    }

    /// Number of successful `replace` calls so far; 0 for the startup index.
    pub fn generation(&self) -> u64 {
        self.current().generation
    }

    pub fn len(&self) -> usize {
        self.current().targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current().targets.is_empty()
    }

    fn current(&self) -> Arc<IndexTable> {
        let table = self.table.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&table)
    }
}

#[cfg(test)]
#[path = "../../tests/src/definition/index_tests.rs"]
mod tests;
