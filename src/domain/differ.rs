use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Classification of one identifier across a revision transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModificationStatus {
    Same,
    Different,
    Added,
    Removed,
    Renamed { from: String, to: String },
}

/// Partition of old and new identifiers produced by [`diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub same: BTreeSet<String>,
    pub different: BTreeSet<String>,
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    /// old identifier → new identifier
    pub renamed: BTreeMap<String, String>,
}

impl ChangeSet {
    /// Status of an identifier of either revision.
    pub fn status(&self, id: &str) -> Option<ModificationStatus> {
        if self.same.contains(id) {
            Some(ModificationStatus::Same)
        } else if self.different.contains(id) {
            Some(ModificationStatus::Different)
        } else if self.added.contains(id) {
            Some(ModificationStatus::Added)
        } else if self.removed.contains(id) {
            Some(ModificationStatus::Removed)
        } else if let Some(to) = self.renamed.get(id) {
            Some(ModificationStatus::Renamed {
                from: id.to_string(),
                to: to.clone(),
            })
        } else {
            self.renamed
                .iter()
                .find(|(_, to)| to.as_str() == id)
                .map(|(from, to)| ModificationStatus::Renamed {
                    from: from.clone(),
                    to: to.clone(),
                })
        }
    }

    /// New identifiers of renamed declarations.
    pub fn rename_targets(&self) -> impl Iterator<Item = &str> {
        self.renamed.values().map(String::as_str)
    }
}

/// Partitions identifiers by comparing checksums of two revisions.
///
/// An identifier only in the new revision and one only in the old revision form a rename when
/// they are the unique carriers of a checksum on both sides. Any ambiguity leaves them as
/// independent additions and removals.
pub fn diff(old: &BTreeMap<String, i32>, new: &BTreeMap<String, i32>) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let mut added_by_hash: BTreeMap<i32, Vec<&str>> = BTreeMap::new();
    let mut removed_by_hash: BTreeMap<i32, Vec<&str>> = BTreeMap::new();

    for (id, hash) in new {
        match old.get(id) {
            Some(old_hash) if old_hash == hash => {
                changes.same.insert(id.clone());
            }
            Some(_) => {
                changes.different.insert(id.clone());
            }
            None => added_by_hash.entry(*hash).or_default().push(id),
        }
    }
    for (id, hash) in old {
        if !new.contains_key(id) {
            removed_by_hash.entry(*hash).or_default().push(id);
        }
    }

    for (hash, added) in &added_by_hash {
        match (added.as_slice(), removed_by_hash.get(hash).map(Vec::as_slice)) {
            ([to], Some([from])) => {
                changes.renamed.insert(from.to_string(), to.to_string());
            }
            _ => changes.added.extend(added.iter().map(|id| id.to_string())),
        }
    }
    for (hash, removed) in &removed_by_hash {
        let renamed_here = removed.len() == 1
            && added_by_hash.get(hash).is_some_and(|added| added.len() == 1);
        if !renamed_here {
            changes.removed.extend(removed.iter().map(|id| id.to_string()));
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checksums(entries: &[(&str, i32)]) -> BTreeMap<String, i32> {
        entries.iter().map(|(id, h)| (id.to_string(), *h)).collect()
    }

    #[test]
    fn test_basic_partition() {
        let old = checksums(&[("a", 1), ("b", 2), ("gone", 3)]);
        let new = checksums(&[("a", 1), ("b", 20), ("fresh", 4)]);
        let changes = diff(&old, &new);
        assert_eq!(changes.same, BTreeSet::from(["a".to_string()]));
        assert_eq!(changes.different, BTreeSet::from(["b".to_string()]));
        assert_eq!(changes.added, BTreeSet::from(["fresh".to_string()]));
        assert_eq!(changes.removed, BTreeSet::from(["gone".to_string()]));
        assert!(changes.renamed.is_empty());
    }

    #[test]
    fn test_unique_hash_match_is_rename() {
        let old = checksums(&[("Foo", 42)]);
        let new = checksums(&[("Bar", 42)]);
        let changes = diff(&old, &new);
        assert_eq!(changes.renamed.get("Foo").map(String::as_str), Some("Bar"));
        assert!(changes.added.is_empty());
        assert!(changes.removed.is_empty());
        assert_eq!(
            changes.status("Bar"),
            Some(ModificationStatus::Renamed {
                from: "Foo".into(),
                to: "Bar".into()
            })
        );
    }

    #[test]
    fn test_ambiguous_matches_are_not_renames() {
        // Two removed candidates share the hash.
        let old = checksums(&[("A", 7), ("B", 7)]);
        let new = checksums(&[("C", 7)]);
        let changes = diff(&old, &new);
        assert!(changes.renamed.is_empty());
        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.removed.len(), 2);

        // Two added candidates share the hash.
        let old = checksums(&[("A", 7)]);
        let new = checksums(&[("C", 7), ("D", 7)]);
        let changes = diff(&old, &new);
        assert!(changes.renamed.is_empty());
        assert_eq!(changes.added.len(), 2);
        assert_eq!(changes.removed.len(), 1);
    }

    #[test]
    fn test_empty_baseline_marks_everything_added() {
        let new = checksums(&[("a", 1), ("b", 1), ("c", 2)]);
        let changes = diff(&BTreeMap::new(), &new);
        assert_eq!(changes.added.len(), 3);
        assert!(changes.renamed.is_empty());
    }

    #[test]
    fn test_partition_completeness() {
        let old = checksums(&[("s", 1), ("d", 2), ("r1", 3), ("r2", 5), ("r3", 5), ("mv", 9)]);
        let new = checksums(&[("s", 1), ("d", 20), ("a1", 4), ("a2", 5), ("moved", 9)]);
        let changes = diff(&old, &new);

        for id in new.keys() {
            let memberships = [
                changes.same.contains(id),
                changes.different.contains(id),
                changes.added.contains(id),
                changes.rename_targets().any(|t| t == id),
            ];
            assert_eq!(memberships.iter().filter(|m| **m).count(), 1, "{id}");
        }
        for id in old.keys().filter(|id| !new.contains_key(*id)) {
            let memberships = [changes.removed.contains(id), changes.renamed.contains_key(id)];
            assert_eq!(memberships.iter().filter(|m| **m).count(), 1, "{id}");
        }
        assert_eq!(changes.renamed.get("mv").map(String::as_str), Some("moved"));
    }
}
