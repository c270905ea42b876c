//! Dependency strategies: plug-ins that extend the pipeline with framework-specific edges.

use crate::app::blackboard::Blackboard;
use crate::domain::di::{BeanIndex, BeanSource, DiState, Framework, InjectionPointStore, scan};
use crate::domain::differ::{ChangeSet, diff};
use crate::domain::level::DeclKind;
use crate::domain::modification::{Modification, ModificationGraph};
use crate::domain::snapshot::{framework_file, load_json, save_json};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Extension points of the pipeline, each matching one blackboard transition.
pub trait DependencyStrategy {
    fn name(&self) -> &'static str;

    /// Loads the strategy's persisted state. Unreadable files degrade to empty state.
    fn do_import(&mut self, blackboard: &Blackboard);

    /// Persists the strategy's state; failures are fatal.
    fn do_export(&self, blackboard: &Blackboard) -> Result<()>;

    fn do_change_analysis(&mut self, blackboard: &Blackboard);

    fn do_graph_cropping(&mut self, blackboard: &mut Blackboard);

    fn do_dependency_analysis(&mut self, blackboard: &mut Blackboard) -> Result<()>;

    fn combine_graphs(&self, blackboard: &Blackboard, combined: &mut ModificationGraph);
}

/// Incremental bean/injection-point join for one DI framework.
pub struct DiStrategy<F> {
    framework: F,
    state: DiState,
    old_config: BTreeMap<String, i32>,
    new_config: BTreeMap<String, i32>,
    config_changes: ChangeSet,
    /// Types declaring beans dropped while cropping.
    rescan: BTreeSet<String>,
}

impl<F: Framework> DiStrategy<F> {
    pub fn new(framework: F) -> Self {
        Self {
            framework,
            state: DiState::default(),
            old_config: BTreeMap::new(),
            new_config: BTreeMap::new(),
            config_changes: ChangeSet::default(),
            rescan: BTreeSet::new(),
        }
    }

    fn file(&self, kind: &str, blackboard: &Blackboard) -> String {
        framework_file(self.framework.prefix(), kind, blackboard.settings.level)
    }

    /// Impacted types, the types holding renamed declarations and the types to rescan.
    fn scan_set(&self, blackboard: &Blackboard) -> BTreeSet<String> {
        let index = &blackboard.index;
        let renamed_owners = blackboard.changes.rename_targets().filter_map(|id| match index.kind_of(id)? {
            DeclKind::Type => Some(id.to_string()),
            DeclKind::Unit => None,
            DeclKind::Method | DeclKind::Constructor | DeclKind::Field => index.info(id)?.owner.clone(),
        });
        blackboard
            .crop
            .impacted_types
            .iter()
            .cloned()
            .chain(renamed_owners)
            .chain(self.rescan.iter().filter(|id| index.type_entry(id).is_some()).cloned())
            .collect()
    }
}

impl<F: Framework> DependencyStrategy for DiStrategy<F> {
    fn name(&self) -> &'static str {
        self.framework.prefix()
    }

    fn do_import(&mut self, blackboard: &Blackboard) {
        let store = blackboard.store.as_ref();
        self.state.beans = load_json::<BeanIndex>(store, &self.file("beans", blackboard));
        self.state.points = load_json::<InjectionPointStore>(store, &self.file("injectionpoints", blackboard));
        if let Some(kind) = self.framework.config_file() {
            self.old_config = load_json(store, &self.file(kind, blackboard));
        }
        debug!(
            framework = self.framework.prefix(),
            beans = self.state.beans.len(),
            points = self.state.points.len(),
            "DI state imported"
        );
    }

    fn do_export(&self, blackboard: &Blackboard) -> Result<()> {
        let store = blackboard.store.as_ref();
        save_json(store, &self.file("beans", blackboard), &self.state.beans)
            .with_context(|| format!("Failed to export {} beans", self.framework.prefix()))?;
        save_json(store, &self.file("injectionpoints", blackboard), &self.state.points)
            .with_context(|| format!("Failed to export {} injection points", self.framework.prefix()))?;
        if let Some(kind) = self.framework.config_file() {
            save_json(store, &self.file(kind, blackboard), &self.new_config)?;
        }
        Ok(())
    }

    fn do_change_analysis(&mut self, blackboard: &Blackboard) {
        self.new_config = self.framework.config_entries(&blackboard.revision);
        self.config_changes = diff(&self.old_config, &self.new_config);
    }

    fn do_graph_cropping(&mut self, blackboard: &mut Blackboard) {
        let changes = &blackboard.changes;
        let mut impacted = blackboard.crop.impacted_nodes.clone();
        impacted.extend(changes.rename_targets().map(str::to_string));
        let vanished: BTreeSet<String> = changes
            .removed
            .iter()
            .chain(changes.renamed.keys())
            .cloned()
            .collect();

        self.rescan = self.state.crop(
            &mut blackboard.graph,
            &impacted,
            &vanished,
            self.framework.edge_type(),
            |bean| matches!(bean.source, BeanSource::Config(_)),
        );
        // Configuration nodes are rebuilt from the current descriptors.
        for node in self.old_config.keys() {
            blackboard.graph.remove_node(node);
        }
    }

    fn do_dependency_analysis(&mut self, blackboard: &mut Blackboard) -> Result<()> {
        let types = self.scan_set(blackboard);
        let edge_type = self.framework.edge_type();
        let (ctx, graph) = blackboard.collect_view()?;
        let scanned = scan(&ctx, &types);

        let mut beans = self.framework.collect_beans(&ctx, &scanned);
        beans.merge(self.framework.config_beans(&ctx));
        let points = self.framework.collect_injection_points(&ctx, &scanned);
        self.state.analyze(graph, beans, points, edge_type);
        self.framework.config_edges(&ctx, graph);

        debug!(
            framework = self.framework.prefix(),
            types = types.len(),
            beans = self.state.beans.len(),
            points = self.state.points.len(),
            "DI dependencies analysed"
        );
        Ok(())
    }

    fn combine_graphs(&self, _blackboard: &Blackboard, combined: &mut ModificationGraph) {
        let changes = &self.config_changes;
        let tagged = [
            (&changes.same, Modification::NotModified),
            (&changes.different, Modification::Modified),
            (&changes.added, Modification::Added),
            (&changes.removed, Modification::Removed),
        ];
        for (nodes, modification) in tagged {
            for node in nodes {
                combined.set_modification(node, modification);
            }
        }
        for (old, new) in &changes.renamed {
            combined.set_modification(old, Modification::Renamed);
            combined.set_modification(new, Modification::Renamed);
        }
    }
}
