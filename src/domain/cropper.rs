//! Graph cropping: computes the impacted declarations of a revision transition and strips the
//! edges that have gone stale.
//!
//! One algorithm serves all granularities; [`Granularity`] decides which ripple steps run:
//!
//! 1. units of every different or added declaration;
//! 2. every unit of a package that gained an added or renamed top-level unit or type (shadowing);
//! 3. *(member levels)* sources of edges into removed or renamed declarations, and the units
//!    that held removed declarations;
//! 4. *(method level)* callers of ancestor methods visible to impacted types, overridden or not;
//! 5. *(method level)* targets of inheritance/assignment edges leaving impacted members;
//! 6. all types of the impacted units; their nodes lose every affected outgoing edge.

use crate::domain::differ::ChangeSet;
use crate::domain::edge::EdgeType;
use crate::domain::graph::DependencyGraph;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::index::DeclarationIndex;
use crate::domain::level::{DeclKind, Granularity};
use crate::domain::source::{Member, ParsedRevision};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub struct CropInput<'a> {
    pub level: Granularity,
    pub changes: &'a ChangeSet,
    pub revision: &'a ParsedRevision,
    pub index: &'a DeclarationIndex,
    pub hierarchy: &'a Hierarchy,
    /// identifier → unit, as persisted for the old revision
    pub old_unit_mapping: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CropOutcome {
    pub impacted_units: BTreeSet<String>,
    pub impacted_types: BTreeSet<String>,
    /// Graph-level nodes whose outgoing edges were stripped, removed identifiers included.
    pub impacted_nodes: BTreeSet<String>,
}

pub fn crop(graph: &mut DependencyGraph, input: &CropInput<'_>) -> CropOutcome {
    let cropper = Cropper {
        input,
        affected: input.level.affected_edges(),
    };
    cropper.run(graph)
}

struct Cropper<'a, 'b> {
    input: &'a CropInput<'b>,
    affected: BTreeSet<EdgeType>,
}

impl Cropper<'_, '_> {
    fn run(&self, graph: &mut DependencyGraph) -> CropOutcome {
        let CropInput {
            level,
            changes,
            index,
            ..
        } = *self.input;
        let mut units = BTreeSet::new();

        // Step 3 runs before relabelling so the old identifiers still carry their edges.
        if level.strips_removed_references() {
            let vanished = changes.removed.iter().chain(changes.renamed.keys());
            for id in vanished {
                let sources = graph.remove_all_edges_to(id, &self.affected);
                self.add_units_of(&sources, &mut units);
            }
            for removed in &changes.removed {
                if let Some(unit) = self.input.old_unit_mapping.get(removed)
                    && index.contains(unit)
                {
                    units.insert(unit.clone());
                }
            }
        }

        self.apply_node_changes(graph);

        // Step 1
        let seeds = changes.different.iter().chain(changes.added.iter());
        self.add_units_of(seeds, &mut units);

        // Step 2
        for package in self.shadowing_packages() {
            units.extend(index.units_in_package(&package).map(str::to_string));
        }

        let mut types = self.types_of(&units);

        if level.ripples_inheritance() {
            // Step 4
            let mut callers = BTreeSet::new();
            for type_id in &types {
                for method_id in self.inherited_methods(type_id) {
                    let sources = graph.remove_all_edges_to(&method_id, &BTreeSet::from([EdgeType::Delegation]));
                    self.add_units_of(&sources, &mut callers);
                }
            }
            self.absorb(&mut units, &mut types, callers);

            // Step 5
            let ripple = BTreeSet::from([EdgeType::Inheritance, EdgeType::FieldAssignment]);
            let mut targets = BTreeSet::new();
            for type_id in &types {
                for member_id in index.member_ids(type_id) {
                    let peers = graph.remove_all_edges_from(member_id, &ripple);
                    self.add_units_of(&peers, &mut targets);
                }
            }
            self.absorb(&mut units, &mut types, targets);
        }

        // Step 6
        let mut nodes: BTreeSet<String> = types
            .iter()
            .flat_map(|type_id| self.graph_nodes_of(type_id))
            .collect();
        nodes.extend(changes.removed.iter().cloned());
        for node in &nodes {
            self.strip_owned_edges(graph, node);
        }

        debug!(
            level = %level,
            units = units.len(),
            types = types.len(),
            nodes = nodes.len(),
            "graph cropped"
        );
        CropOutcome {
            impacted_units: units,
            impacted_types: types,
            impacted_nodes: nodes,
        }
    }

    /// Relabels renamed nodes, adds added nodes and drops removed ones.
    fn apply_node_changes(&self, graph: &mut DependencyGraph) {
        let CropInput {
            level,
            changes,
            index,
            ..
        } = *self.input;
        for (old, new) in &changes.renamed {
            graph.rename_node(old, new);
        }
        for added in &changes.added {
            if index.kind_of(added).is_some_and(|kind| level.is_graph_node(kind)) {
                graph.add_node(added.clone());
            }
        }
        for removed in &changes.removed {
            graph.remove_node(removed);
        }
    }

    /// Packages in which an added or renamed top-level declaration may now shadow a reference.
    fn shadowing_packages(&self) -> BTreeSet<String> {
        let CropInput {
            changes,
            revision,
            index,
            ..
        } = *self.input;
        changes
            .added
            .iter()
            .map(String::as_str)
            .chain(changes.rename_targets())
            .filter(|id| match index.kind_of(id) {
                Some(DeclKind::Unit) => true,
                Some(DeclKind::Type) => index.is_top_level(id),
                _ => false,
            })
            .filter_map(|id| index.unit_of(id))
            .filter_map(|unit| index.package_of_unit(revision, unit))
            .map(str::to_string)
            .collect()
    }

    fn add_units_of<I, S>(&self, ids: I, units: &mut BTreeSet<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = self.input.index;
        for id in ids {
            let id = id.as_ref();
            let unit = index
                .unit_of(id)
                .or_else(|| self.input.old_unit_mapping.get(id).map(String::as_str));
            if let Some(unit) = unit
                && index.contains(unit)
            {
                units.insert(unit.to_string());
            }
        }
    }

    fn types_of(&self, units: &BTreeSet<String>) -> BTreeSet<String> {
        units
            .iter()
            .flat_map(|unit| self.input.index.types_in_unit(unit))
            .map(str::to_string)
            .collect()
    }

    /// Adds units discovered by a ripple step that were not impacted yet, with their types.
    fn absorb(&self, units: &mut BTreeSet<String>, types: &mut BTreeSet<String>, discovered: BTreeSet<String>) {
        let fresh: BTreeSet<String> = discovered.difference(units).cloned().collect();
        types.extend(self.types_of(&fresh));
        units.extend(fresh);
    }

    /// Non-private methods of project ancestors visible to `type_id`, overridden ones included:
    /// a new override redirects calls that used to reach the ancestor's method.
    fn inherited_methods(&self, type_id: &str) -> Vec<String> {
        let CropInput {
            revision,
            index,
            hierarchy,
            ..
        } = *self.input;

        let mut inherited = Vec::new();
        for ancestor in hierarchy.member_ancestors(type_id) {
            let (Some(entry), Some(decl)) = (index.type_entry(ancestor), index.type_decl(revision, ancestor)) else {
                continue;
            };
            for member in &entry.members {
                let private = matches!(decl.members.get(member.index), Some(Member::Method(m)) if m.has_modifier("private"));
                if member.kind == DeclKind::Method && !private {
                    inherited.push(member.id.clone());
                }
            }
        }
        inherited
    }

    fn graph_nodes_of(&self, type_id: &str) -> Vec<String> {
        let CropInput { level, index, .. } = *self.input;
        if level.is_graph_node(DeclKind::Type) {
            return vec![type_id.to_string()];
        }
        index.member_ids(type_id).map(str::to_string).collect()
    }

    /// Strips the affected outgoing edges that the node's own collector recreates.
    ///
    /// Write edges leave a field towards its writer and belong to the writer, so they survive.
    fn strip_owned_edges(&self, graph: &mut DependencyGraph, node: &str) {
        let CropInput { level, index, .. } = *self.input;
        if index.kind_of(node) != Some(DeclKind::Field) {
            graph.remove_all_edges_from(node, &self.affected);
            return;
        }
        let write_edge = level.assignment_edge();
        let stale: Vec<(String, EdgeType)> = graph
            .successors(node)
            .flat_map(|(to, types)| {
                let writer = index.kind_of(to) != Some(DeclKind::Field);
                types
                    .iter()
                    .filter(move |t| !(writer && **t == write_edge))
                    .map(move |t| (to.to_string(), *t))
            })
            .filter(|(_, t)| self.affected.contains(t))
            .collect();
        for (to, edge_type) in stale {
            graph.remove_edge(node, &to, edge_type);
        }
    }
}
