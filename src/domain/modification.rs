//! Modification graph: the union of the old and new dependency graphs, every node tagged with
//! how it changed, and the affected-test selection computed over it.

use crate::domain::differ::ChangeSet;
use crate::domain::edge::EdgeType;
use crate::domain::graph::DependencyGraph;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modification {
    NotModified,
    Modified,
    Added,
    Removed,
    Renamed,
    /// Unchanged content whose outgoing edges differ between the revisions.
    ChangedDependencies,
    /// Not covered by any checksum (library or synthetic nodes without a status).
    Unknown,
}

impl Modification {
    /// Whether tests reaching a node with this status must run.
    pub fn is_relevant(self) -> bool {
        !matches!(self, Modification::NotModified | Modification::Unknown)
    }
}

#[derive(Debug, Clone)]
pub struct ModNode {
    pub id: String,
    pub modification: Modification,
}

/// Triggering node → tests selected through it. The `None` key holds the tests that no changed
/// node reaches; those are excluded from the run.
pub type Selection = BTreeMap<Option<String>, BTreeSet<String>>;

pub struct ModificationGraph {
    pub graph: DiGraph<ModNode, EdgeType>,
    symbol_to_node: HashMap<String, NodeIndex>,
}

impl ModificationGraph {
    /// Union of both revisions, tagged with the diff and then with dependency changes.
    /// Nodes covered by neither stay `Unknown`.
    pub fn build(old: &DependencyGraph, new: &DependencyGraph, changes: &ChangeSet) -> Self {
        let mut combined = Self {
            graph: DiGraph::new(),
            symbol_to_node: HashMap::new(),
        };
        for revision in [new, old] {
            for node in revision.nodes() {
                combined.get_or_create_node(node);
            }
            for (from, to, edge_type) in revision.edges() {
                combined.add_edge(from, to, edge_type);
            }
        }
        combined.apply_changes(changes);
        combined.mark_dependency_changes(old, new);
        combined
    }

    fn get_or_create_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.symbol_to_node.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(ModNode {
            id: id.to_string(),
            modification: Modification::Unknown,
        });
        self.symbol_to_node.insert(id.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, from: &str, to: &str, edge_type: EdgeType) {
        let a = self.get_or_create_node(from);
        let b = self.get_or_create_node(to);
        let exists = self
            .graph
            .edges_connecting(a, b)
            .any(|edge| *edge.weight() == edge_type);
        if !exists {
            self.graph.add_edge(a, b, edge_type);
        }
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.symbol_to_node.get(id).copied()
    }

    pub fn modification(&self, id: &str) -> Modification {
        self.node_index(id)
            .map_or(Modification::Unknown, |idx| self.graph[idx].modification)
    }

    /// Sets a node's status, creating the node if needed.
    pub fn set_modification(&mut self, id: &str, modification: Modification) {
        let idx = self.get_or_create_node(id);
        self.graph[idx].modification = modification;
    }

    /// Sets a node's status only if the node exists.
    pub fn set_modification_if_present(&mut self, id: &str, modification: Modification) {
        if let Some(idx) = self.node_index(id) {
            self.graph[idx].modification = modification;
        }
    }

    /// Applies the revision diff. Renamed nodes are tagged on both sides of the rename.
    fn apply_changes(&mut self, changes: &ChangeSet) {
        let tagged = [
            (&changes.same, Modification::NotModified),
            (&changes.different, Modification::Modified),
            (&changes.added, Modification::Added),
            (&changes.removed, Modification::Removed),
        ];
        for (ids, modification) in tagged {
            for id in ids {
                self.set_modification_if_present(id, modification);
            }
        }
        for (old, new) in &changes.renamed {
            self.set_modification_if_present(old, Modification::Renamed);
            self.set_modification_if_present(new, Modification::Renamed);
        }
    }

    /// Nodes present in both revisions whose outgoing edges differ become `ChangedDependencies`,
    /// unless a content change already made them relevant.
    fn mark_dependency_changes(&mut self, old: &DependencyGraph, new: &DependencyGraph) {
        let pending: Vec<String> = new
            .nodes()
            .filter(|node| old.contains_node(node))
            .filter(|node| !self.modification(node).is_relevant())
            .filter(|node| {
                let before: BTreeSet<(&str, &BTreeSet<EdgeType>)> = old.successors(node).collect();
                let after: BTreeSet<(&str, &BTreeSet<EdgeType>)> = new.successors(node).collect();
                before != after
            })
            .map(str::to_string)
            .collect();
        for id in pending {
            self.set_modification_if_present(&id, Modification::ChangedDependencies);
        }
    }

    /// Nodes with a relevant status, in identifier order.
    pub fn changed_nodes(&self) -> Vec<&str> {
        let mut changed: Vec<&str> = self
            .graph
            .node_weights()
            .filter(|node| node.modification.is_relevant())
            .map(|node| node.id.as_str())
            .collect();
        changed.sort_unstable();
        changed
    }

    /// Every node that transitively depends on `start` over the allowed edge types, `start`
    /// included.
    pub fn dependents(&self, start: &str, allowed: &BTreeSet<EdgeType>) -> BTreeSet<String> {
        let Some(start_idx) = self.node_index(start) else {
            return BTreeSet::new();
        };
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start_idx]);
        let mut reached = BTreeSet::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            reached.insert(self.graph[current].id.clone());
            for edge in self.graph.edges_directed(current, Direction::Incoming) {
                if allowed.contains(edge.weight()) && !visited.contains(&edge.source()) {
                    queue.push_back(edge.source());
                }
            }
        }
        reached
    }

    /// Attributes every test to the first changed node (in identifier order) that it reaches.
    pub fn select_tests(&self, tests: &BTreeSet<String>, allowed: &BTreeSet<EdgeType>) -> Selection {
        let mut remaining = tests.clone();
        let mut selection = Selection::new();
        for changed in self.changed_nodes() {
            if remaining.is_empty() {
                break;
            }
            let reached = self.dependents(changed, allowed);
            let hit: BTreeSet<String> = remaining.intersection(&reached).cloned().collect();
            if hit.is_empty() {
                continue;
            }
            for test in &hit {
                remaining.remove(test);
            }
            selection.insert(Some(changed.to_string()), hit);
        }
        debug!(
            tests = tests.len(),
            excluded = remaining.len(),
            triggers = selection.len(),
            "tests selected"
        );
        selection.insert(None, remaining);
        selection
    }

    pub fn to_report(&self) -> ModificationReport {
        let mut nodes = BTreeMap::new();
        for node in self.graph.node_weights() {
            nodes.insert(node.id.clone(), node.modification);
        }
        let mut edges: Vec<EdgeReport> = self
            .graph
            .edge_references()
            .map(|edge| EdgeReport {
                from: self.graph[edge.source()].id.clone(),
                to: self.graph[edge.target()].id.clone(),
                edge_type: *edge.weight(),
            })
            .collect();
        edges.sort();
        ModificationReport { nodes, edges }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EdgeReport {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModificationReport {
    pub nodes: BTreeMap<String, Modification>,
    pub edges: Vec<EdgeReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str, EdgeType)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for (from, to, t) in edges {
            g.connect(from, to, *t);
        }
        g
    }

    #[test]
    fn test_union_keeps_edges_of_both_revisions() {
        let old = graph(&[("a", "b", EdgeType::Delegation)]);
        let new = graph(&[("a", "c", EdgeType::Delegation)]);
        let combined = ModificationGraph::build(&old, &new, &ChangeSet::default());
        let report = combined.to_report();
        assert_eq!(report.nodes.len(), 3);
        assert_eq!(report.edges.len(), 2);
    }

    #[test]
    fn test_changed_dependencies_detected() {
        let old = graph(&[("a", "b", EdgeType::Delegation)]);
        let new = graph(&[("a", "b", EdgeType::FieldAccess)]);
        let changes = ChangeSet {
            same: ["a".to_string()].into(),
            ..ChangeSet::default()
        };
        let combined = ModificationGraph::build(&old, &new, &changes);
        assert_eq!(combined.modification("a"), Modification::ChangedDependencies);
        assert_eq!(combined.modification("b"), Modification::Unknown);
    }

    #[test]
    fn test_selection_follows_reverse_edges() {
        let edges = [
            ("T.testX()", "A.m()", EdgeType::Delegation),
            ("A.m()", "B.n()", EdgeType::Delegation),
            ("T.testY()", "C.k()", EdgeType::Delegation),
        ];
        let old = graph(&edges);
        let new = graph(&edges);
        let changes = ChangeSet {
            same: ["T.testX()", "A.m()", "T.testY()", "C.k()"].map(String::from).into(),
            different: ["B.n()".to_string()].into(),
            ..ChangeSet::default()
        };
        let combined = ModificationGraph::build(&old, &new, &changes);

        let tests = ["T.testX()", "T.testY()"].map(String::from).into();
        let selection = combined.select_tests(&tests, &EdgeType::traversable(false));
        assert_eq!(
            selection.get(&Some("B.n()".to_string())),
            Some(&BTreeSet::from(["T.testX()".to_string()]))
        );
        assert_eq!(
            selection.get(&None),
            Some(&BTreeSet::from(["T.testY()".to_string()]))
        );
    }

    #[test]
    fn test_standalone_ignores_injection_edges() {
        let edges = [
            ("T.test()", "Bar.<init>(Foo)", EdgeType::Delegation),
            ("Bar.<init>(Foo)", "Foo.<init>()", EdgeType::DiSpring),
        ];
        let g = graph(&edges);
        let mut combined = ModificationGraph::build(&g, &g, &ChangeSet::default());
        combined.set_modification("Foo.<init>()", Modification::Modified);
        let tests = BTreeSet::from(["T.test()".to_string()]);

        let with_di = combined.select_tests(&tests, &EdgeType::traversable(false));
        assert!(with_di.contains_key(&Some("Foo.<init>()".to_string())));

        let standalone = combined.select_tests(&tests, &EdgeType::traversable(true));
        assert_eq!(standalone.get(&None), Some(&tests));
    }

    #[test]
    fn test_each_test_attributed_once() {
        let edges = [
            ("T.test()", "A.a()", EdgeType::Delegation),
            ("T.test()", "B.b()", EdgeType::Delegation),
        ];
        let g = graph(&edges);
        let mut combined = ModificationGraph::build(&g, &g, &ChangeSet::default());
        combined.set_modification("A.a()", Modification::Modified);
        combined.set_modification("B.b()", Modification::Added);
        let tests = BTreeSet::from(["T.test()".to_string()]);
        let selection = combined.select_tests(&tests, &EdgeType::traversable(false));
        assert!(selection.contains_key(&Some("A.a()".to_string())));
        assert!(!selection.contains_key(&Some("B.b()".to_string())));
        assert!(selection[&None].is_empty());
    }
}
