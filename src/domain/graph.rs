use crate::domain::edge::EdgeType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Declaration identifier (qualified name of a type, method, field or synthetic node)
pub type NodeId = String;

type Adjacency = BTreeMap<NodeId, BTreeMap<NodeId, BTreeSet<EdgeType>>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("edge {from} -> {to} references a node that is not in the graph: {missing}")]
    MissingNode {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    #[error("corrupt graph snapshot: {0}")]
    Corrupt(String),
}

/// Dependency Graph - typed multigraph over declaration identifiers.
///
/// Keeps a forward index (from → to → types) and an inverse index
/// (to → from → types). Every mutating operation updates both sides, so the
/// transposed forward index always equals the inverse index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: BTreeSet<NodeId>,
    forward: Adjacency,
    backward: Adjacency,
}

/// One outgoing edge in the persisted adjacency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SerializedEdge {
    target: NodeId,
    #[serde(rename = "type")]
    edge_type: EdgeType,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<NodeId>) {
        self.nodes.insert(id.into());
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward
            .values()
            .flat_map(|targets| targets.values())
            .map(BTreeSet::len)
            .sum()
    }

    /// Removes the node together with every incident edge, in both directions.
    pub fn remove_node(&mut self, id: &str) {
        if !self.nodes.remove(id) {
            return;
        }
        if let Some(targets) = self.forward.remove(id) {
            for to in targets.keys() {
                detach(&mut self.backward, to, id);
            }
        }
        if let Some(sources) = self.backward.remove(id) {
            for from in sources.keys() {
                detach(&mut self.forward, from, id);
            }
        }
    }

    /// Inserts a typed edge. Both endpoints must already be nodes.
    pub fn add_edge(&mut self, from: &str, to: &str, edge_type: EdgeType) -> Result<(), GraphError> {
        for endpoint in [from, to] {
            if !self.nodes.contains(endpoint) {
                return Err(GraphError::MissingNode {
                    from: from.to_string(),
                    to: to.to_string(),
                    missing: endpoint.to_string(),
                });
            }
        }
        self.insert_edge(from, to, edge_type);
        Ok(())
    }

    /// Adds both endpoints as nodes, then inserts the edge.
    ///
    /// Used by collectors, which discover edge targets (e.g. library types)
    /// that are not fingerprinted declarations of the current revision.
    pub fn connect(&mut self, from: &str, to: &str, edge_type: EdgeType) {
        self.nodes.insert(from.to_string());
        self.nodes.insert(to.to_string());
        self.insert_edge(from, to, edge_type);
    }

    fn insert_edge(&mut self, from: &str, to: &str, edge_type: EdgeType) {
        self.forward
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_default()
            .insert(edge_type);
        self.backward
            .entry(to.to_string())
            .or_default()
            .entry(from.to_string())
            .or_default()
            .insert(edge_type);
    }

    /// Removes a single typed edge. Returns whether it existed.
    pub fn remove_edge(&mut self, from: &str, to: &str, edge_type: EdgeType) -> bool {
        if !self.has_edge(from, to, edge_type) {
            return false;
        }
        let types = BTreeSet::from([edge_type]);
        strip(&mut self.forward, from, to, &types);
        strip(&mut self.backward, to, from, &types);
        true
    }

    pub fn has_edge(&self, from: &str, to: &str, edge_type: EdgeType) -> bool {
        self.edge_types(from, to).is_some_and(|types| types.contains(&edge_type))
    }

    pub fn edge_types(&self, from: &str, to: &str) -> Option<&BTreeSet<EdgeType>> {
        self.forward.get(from).and_then(|targets| targets.get(to))
    }

    /// Outgoing edges of `id` as (target, types).
    pub fn successors(&self, id: &str) -> impl Iterator<Item = (&str, &BTreeSet<EdgeType>)> {
        self.forward
            .get(id)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(to, types)| (to.as_str(), types)))
    }

    /// Incoming edges of `id` as (source, types).
    pub fn predecessors(&self, id: &str) -> impl Iterator<Item = (&str, &BTreeSet<EdgeType>)> {
        self.backward
            .get(id)
            .into_iter()
            .flat_map(|sources| sources.iter().map(|(from, types)| (from.as_str(), types)))
    }

    /// All edges as (from, to, type) triples, in stable order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, EdgeType)> {
        self.forward.iter().flat_map(|(from, targets)| {
            targets.iter().flat_map(move |(to, types)| {
                types.iter().map(move |t| (from.as_str(), to.as_str(), *t))
            })
        })
    }

    /// Removes the given edge types from every outgoing edge of `id`.
    ///
    /// Returns the targets that were connected through one of those types.
    pub fn remove_all_edges_from(&mut self, id: &str, types: &BTreeSet<EdgeType>) -> BTreeSet<NodeId> {
        let mut peers = BTreeSet::new();
        let Some(targets) = self.forward.get_mut(id) else {
            return peers;
        };
        for (to, edge_types) in targets.iter_mut() {
            let before = edge_types.len();
            edge_types.retain(|t| !types.contains(t));
            if edge_types.len() != before {
                peers.insert(to.clone());
            }
        }
        targets.retain(|_, edge_types| !edge_types.is_empty());
        if targets.is_empty() {
            self.forward.remove(id);
        }
        for to in &peers {
            strip(&mut self.backward, to, id, types);
        }
        peers
    }

    /// Removes the given edge types from every incoming edge of `id`.
    ///
    /// Returns the sources that were connected through one of those types.
    pub fn remove_all_edges_to(&mut self, id: &str, types: &BTreeSet<EdgeType>) -> BTreeSet<NodeId> {
        let mut peers = BTreeSet::new();
        let Some(sources) = self.backward.get_mut(id) else {
            return peers;
        };
        for (from, edge_types) in sources.iter_mut() {
            let before = edge_types.len();
            edge_types.retain(|t| !types.contains(t));
            if edge_types.len() != before {
                peers.insert(from.clone());
            }
        }
        sources.retain(|_, edge_types| !edge_types.is_empty());
        if sources.is_empty() {
            self.backward.remove(id);
        }
        for from in &peers {
            strip(&mut self.forward, from, id, types);
        }
        peers
    }

    pub fn remove_all_edges_by_type(&mut self, types: &BTreeSet<EdgeType>) {
        for adjacency in [&mut self.forward, &mut self.backward] {
            for peers in adjacency.values_mut() {
                for edge_types in peers.values_mut() {
                    edge_types.retain(|t| !types.contains(t));
                }
                peers.retain(|_, edge_types| !edge_types.is_empty());
            }
            adjacency.retain(|_, peers| !peers.is_empty());
        }
    }

    /// Relabels `old` as `new`, carrying every incident edge over.
    ///
    /// If `new` already exists the edge sets are merged.
    pub fn rename_node(&mut self, old: &str, new: &str) {
        if old == new || !self.nodes.contains(old) {
            return;
        }
        let relabel = |id: &str| if id == old { new.to_string() } else { id.to_string() };

        let mut incident = Vec::new();
        for (to, types) in self.successors(old) {
            incident.extend(types.iter().map(|t| (new.to_string(), relabel(to), *t)));
        }
        for (from, types) in self.predecessors(old) {
            incident.extend(types.iter().map(|t| (relabel(from), new.to_string(), *t)));
        }

        self.remove_node(old);
        self.nodes.insert(new.to_string());
        for (from, to, edge_type) in incident {
            self.insert_edge(&from, &to, edge_type);
        }
    }

    /// Drops every node that has neither incoming nor outgoing edges.
    pub fn remove_nodes_without_edges(&mut self) {
        let forward = &self.forward;
        let backward = &self.backward;
        self.nodes
            .retain(|id| forward.contains_key(id) || backward.contains_key(id));
    }

    /// Persisted form: every node mapped to its outgoing `(target, type)` list.
    pub fn serialize(&self) -> Result<String, GraphError> {
        let listing: BTreeMap<&str, Vec<SerializedEdge>> = self
            .nodes
            .iter()
            .map(|id| {
                let edges = self
                    .successors(id)
                    .flat_map(|(to, types)| {
                        types.iter().map(move |t| SerializedEdge {
                            target: to.to_string(),
                            edge_type: *t,
                        })
                    })
                    .collect();
                (id.as_str(), edges)
            })
            .collect();
        serde_json::to_string_pretty(&listing).map_err(|e| GraphError::Corrupt(e.to_string()))
    }

    /// Rebuilds a graph from [`DependencyGraph::serialize`] output.
    ///
    /// The inverse index is derived from the forward listing.
    pub fn deserialize(text: &str) -> Result<Self, GraphError> {
        let listing: BTreeMap<NodeId, Vec<SerializedEdge>> =
            serde_json::from_str(text).map_err(|e| GraphError::Corrupt(e.to_string()))?;
        let mut graph = Self::new();
        for id in listing.keys() {
            graph.add_node(id.clone());
        }
        for (from, edges) in &listing {
            for edge in edges {
                graph.add_edge(from, &edge.target, edge.edge_type).map_err(|_| {
                    GraphError::Corrupt(format!("edge target {} is not listed as a node", edge.target))
                })?;
            }
        }
        Ok(graph)
    }

    /// True when the forward index, transposed, equals the inverse index.
    pub fn is_consistent(&self) -> bool {
        let mut transposed: Adjacency = BTreeMap::new();
        for (from, to, edge_type) in self.edges() {
            if !self.nodes.contains(from) || !self.nodes.contains(to) {
                return false;
            }
            transposed
                .entry(to.to_string())
                .or_default()
                .entry(from.to_string())
                .or_default()
                .insert(edge_type);
        }
        transposed == self.backward
    }
}

/// Drops `peer` from `adjacency[id]`, cleaning up empty entries.
fn detach(adjacency: &mut Adjacency, id: &str, peer: &str) {
    if let Some(peers) = adjacency.get_mut(id) {
        peers.remove(peer);
        if peers.is_empty() {
            adjacency.remove(id);
        }
    }
}

/// Removes `types` from the edge set `adjacency[id][peer]`.
fn strip(adjacency: &mut Adjacency, id: &str, peer: &str, types: &BTreeSet<EdgeType>) {
    if let Some(peers) = adjacency.get_mut(id) {
        if let Some(edge_types) = peers.get_mut(peer) {
            edge_types.retain(|t| !types.contains(t));
            if edge_types.is_empty() {
                peers.remove(peer);
            }
        }
        if peers.is_empty() {
            adjacency.remove(id);
        }
    }
}
