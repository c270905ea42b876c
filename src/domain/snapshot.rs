//! Persisted state of one module at one granularity: the graph, the checksums, the unit mapping
//! and the per-framework DI files.
//!
//! Reads never fail. A missing snapshot is a first run; an incomplete, unreadable or corrupt one
//! is logged and replaced by an empty baseline, so that every declaration of the new revision
//! appears added. Writes propagate their errors.

use crate::domain::graph::DependencyGraph;
use crate::domain::level::Granularity;
use crate::domain::ports::SnapshotStore;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub fn graph_file(level: Granularity) -> String {
    format!("graph_{}", level.suffix())
}

pub fn checksums_file(level: Granularity) -> String {
    format!("checksums_{}", level.suffix())
}

pub fn unit_mapping_file(level: Granularity) -> String {
    format!("cu_mapping_{}", level.suffix())
}

/// `<prefix>_<kind>_<suffix>`, e.g. `spring_beans_methodL`.
pub fn framework_file(prefix: &str, kind: &str, level: Granularity) -> String {
    format!("{prefix}_{kind}_{}", level.suffix())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub graph: DependencyGraph,
    pub checksums: BTreeMap<String, i32>,
    /// identifier → compilation unit
    pub unit_mapping: BTreeMap<String, String>,
}

impl Snapshot {
    /// Loads the graph, the checksums and the unit mapping together. They only make sense as a
    /// set: if any one is missing or corrupt while the others exist, the whole snapshot is
    /// discarded and the run starts from an empty baseline.
    pub fn load(store: &dyn SnapshotStore, level: Granularity) -> Self {
        let names = [graph_file(level), checksums_file(level), unit_mapping_file(level)];
        let texts = names.each_ref().map(|name| read_text(store, name));
        let present: Vec<&str> = names
            .iter()
            .zip(&texts)
            .filter(|(_, text)| text.is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        let [Some(graph), Some(checksums), Some(unit_mapping)] = texts else {
            if !present.is_empty() {
                warn!(level = %level, present = ?present, "incomplete snapshot discarded");
            }
            return Self::default();
        };

        match Self::decode(&graph, &checksums, &unit_mapping) {
            Ok(snapshot) => {
                debug!(
                    level = %level,
                    nodes = snapshot.graph.node_count(),
                    checksums = snapshot.checksums.len(),
                    "snapshot loaded"
                );
                snapshot
            }
            Err(e) => {
                warn!(level = %level, error = %format!("{e:#}"), "corrupt snapshot discarded");
                Self::default()
            }
        }
    }

    fn decode(graph: &str, checksums: &str, unit_mapping: &str) -> Result<Self> {
        Ok(Self {
            graph: DependencyGraph::deserialize(graph).context("graph")?,
            checksums: serde_json::from_str(checksums).context("checksums")?,
            unit_mapping: serde_json::from_str(unit_mapping).context("unit mapping")?,
        })
    }

    pub fn save(&self, store: &dyn SnapshotStore, level: Granularity) -> Result<()> {
        let graph = self
            .graph
            .serialize()
            .with_context(|| format!("Failed to serialize {}", graph_file(level)))?;
        store.write(&graph_file(level), &graph)?;
        save_json(store, &checksums_file(level), &self.checksums)?;
        save_json(store, &unit_mapping_file(level), &self.unit_mapping)?;
        Ok(())
    }
}

fn read_text(store: &dyn SnapshotStore, name: &str) -> Option<String> {
    match store.read(name) {
        Ok(text) => text,
        Err(e) => {
            warn!(file = name, error = %e, "snapshot file unreadable, starting from empty");
            None
        }
    }
}

/// Reads a JSON snapshot file, degrading to the default value.
pub fn load_json<T: DeserializeOwned + Default>(store: &dyn SnapshotStore, name: &str) -> T {
    let Some(text) = read_text(store, name) else {
        return T::default();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(file = name, error = %e, "snapshot file corrupt, starting from empty");
        T::default()
    })
}

pub fn save_json<T: Serialize>(store: &dyn SnapshotStore, name: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {name}"))?;
    store.write(name, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::EdgeType;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        files: RefCell<HashMap<String, String>>,
    }

    impl SnapshotStore for MemoryStore {
        fn read(&self, name: &str) -> Result<Option<String>> {
            Ok(self.files.borrow().get(name).cloned())
        }

        fn write(&self, name: &str, contents: &str) -> Result<()> {
            self.files.borrow_mut().insert(name.to_string(), contents.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let store = MemoryStore::default();
        assert_eq!(Snapshot::load(&store, Granularity::Method), Snapshot::default());
    }

    fn saved_snapshot(store: &MemoryStore) -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.graph.connect("a", "b", EdgeType::Delegation);
        snapshot.checksums.insert("a".into(), 7);
        snapshot.unit_mapping.insert("a".into(), "A.java".into());
        snapshot.save(store, Granularity::Type).unwrap();
        snapshot
    }

    #[test]
    fn test_saved_snapshot_loads_back() {
        let store = MemoryStore::default();
        let snapshot = saved_snapshot(&store);
        assert_eq!(Snapshot::load(&store, Granularity::Type), snapshot);
    }

    #[test]
    fn test_corrupt_checksums_discard_the_whole_snapshot() {
        let store = MemoryStore::default();
        saved_snapshot(&store);
        store.write("checksums_typeL", "{not json").unwrap();

        assert_eq!(Snapshot::load(&store, Granularity::Type), Snapshot::default());
    }

    #[test]
    fn test_corrupt_graph_discards_the_whole_snapshot() {
        let store = MemoryStore::default();
        saved_snapshot(&store);
        store.write("graph_typeL", "{ not a graph").unwrap();

        assert_eq!(Snapshot::load(&store, Granularity::Type), Snapshot::default());
    }

    #[test]
    fn test_missing_unit_mapping_discards_the_whole_snapshot() {
        let store = MemoryStore::default();
        saved_snapshot(&store);
        store.files.borrow_mut().remove("cu_mapping_typeL");

        assert_eq!(Snapshot::load(&store, Granularity::Type), Snapshot::default());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(graph_file(Granularity::NonType), "graph_nontypeL");
        assert_eq!(
            framework_file("cdi", "alternatives", Granularity::Method),
            "cdi_alternatives_methodL"
        );
    }
}
