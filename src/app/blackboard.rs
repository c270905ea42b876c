//! The blackboard: all mutable state of one pipeline run over one module.

use crate::app::strategy::DependencyStrategy;
use crate::config::RunSettings;
use crate::domain::collectors::CollectContext;
use crate::domain::cropper::CropOutcome;
use crate::domain::differ::ChangeSet;
use crate::domain::fingerprint::RevisionFingerprint;
use crate::domain::graph::DependencyGraph;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::index::DeclarationIndex;
use crate::domain::modification::ModificationGraph;
use crate::domain::ports::{ProjectSource, SnapshotStore, SourceModelProvider};
use crate::domain::snapshot::Snapshot;
use crate::domain::source::{LibraryType, ParsedRevision};
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Pipeline position. Every knowledge source moves the run exactly one state forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlackboardState {
    Clean,
    Imported,
    TypeSolverSet,
    Parsed,
    TestsFound,
    NodesChangesSet,
    NewGraphSet,
    DependenciesUpdated,
    ReadyToCalculateAffectedTests,
    Done,
    Failed,
}

impl BlackboardState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BlackboardState::Done | BlackboardState::Failed)
    }
}

impl fmt::Display for BlackboardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlackboardState::Clean => "CLEAN",
            BlackboardState::Imported => "IMPORTED",
            BlackboardState::TypeSolverSet => "TYPE_SOLVER_SET",
            BlackboardState::Parsed => "PARSED",
            BlackboardState::TestsFound => "TESTS_FOUND",
            BlackboardState::NodesChangesSet => "NODES_CHANGES_SET",
            BlackboardState::NewGraphSet => "NEW_GRAPH_SET",
            BlackboardState::DependenciesUpdated => "DEPENDENCIES_UPDATED",
            BlackboardState::ReadyToCalculateAffectedTests => "READY_TO_CALCULATE_AFFECTED_TESTS",
            BlackboardState::Done => "DONE",
            BlackboardState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

pub struct Blackboard {
    pub state: BlackboardState,
    pub settings: RunSettings,
    pub source: Box<dyn ProjectSource>,
    pub store: Box<dyn SnapshotStore>,
    strategies: Vec<Box<dyn DependencyStrategy>>,

    /// Persisted state of the previous run.
    pub old: Snapshot,
    pub libraries: Vec<LibraryType>,
    pub revision: ParsedRevision,
    pub provider: Option<Box<dyn SourceModelProvider>>,
    pub index: DeclarationIndex,
    pub hierarchy: Hierarchy,
    pub fingerprint: RevisionFingerprint,
    /// Old checksums of declarations in units that failed to parse; carried over untouched.
    pub unparsed: Snapshot,
    pub tests: BTreeSet<String>,
    pub changes: ChangeSet,
    /// The new graph, derived from the old one by cropping and re-collection.
    pub graph: DependencyGraph,
    pub crop: CropOutcome,
    pub modification: Option<ModificationGraph>,
}

impl Blackboard {
    pub fn new(
        settings: RunSettings,
        source: Box<dyn ProjectSource>,
        store: Box<dyn SnapshotStore>,
        strategies: Vec<Box<dyn DependencyStrategy>>,
    ) -> Self {
        Self {
            state: BlackboardState::Clean,
            settings,
            source,
            store,
            strategies,
            old: Snapshot::default(),
            libraries: Vec::new(),
            revision: ParsedRevision::default(),
            provider: None,
            index: DeclarationIndex::default(),
            hierarchy: Hierarchy::default(),
            fingerprint: RevisionFingerprint::default(),
            unparsed: Snapshot::default(),
            tests: BTreeSet::new(),
            changes: ChangeSet::default(),
            graph: DependencyGraph::new(),
            crop: CropOutcome::default(),
            modification: None,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs `step` for every plug-in strategy, in registration order. The strategies are
    /// detached while they run so that they can mutate the blackboard.
    pub fn for_each_strategy(
        &mut self,
        mut step: impl FnMut(&mut dyn DependencyStrategy, &mut Blackboard) -> Result<()>,
    ) -> Result<()> {
        let mut strategies = std::mem::take(&mut self.strategies);
        let outcome = strategies
            .iter_mut()
            .try_for_each(|strategy| step(strategy.as_mut(), self));
        self.strategies = strategies;
        outcome
    }

    /// Read-only view of the current revision for the collectors, alongside the graph they
    /// write to.
    pub fn collect_view(&mut self) -> Result<(CollectContext<'_>, &mut DependencyGraph)> {
        let Blackboard {
            settings,
            revision,
            provider,
            index,
            hierarchy,
            graph,
            ..
        } = self;
        let provider = provider
            .as_deref()
            .ok_or_else(|| anyhow!("Type solver is not initialized"))?;
        let ctx = CollectContext {
            level: settings.level,
            revision,
            index,
            hierarchy,
            provider,
        };
        Ok((ctx, graph))
    }

    /// The modification graph, once the graphs have been combined.
    pub fn modification(&self) -> Result<&ModificationGraph> {
        self.modification
            .as_ref()
            .ok_or_else(|| anyhow!("Graphs have not been combined yet (state {})", self.state))
    }
}
