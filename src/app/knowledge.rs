//! Knowledge sources: the pipeline stages, and the control loop that runs them in state order.

use crate::adapters::test_detector::TestDetector;
use crate::app::blackboard::{Blackboard, BlackboardState};
use crate::domain::collectors::collect_dependencies;
use crate::domain::cropper::{CropInput, crop};
use crate::domain::differ::diff;
use crate::domain::fingerprint::fingerprint_revision;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::index::DeclarationIndex;
use crate::domain::modification::ModificationGraph;
use crate::domain::snapshot::Snapshot;
use crate::error::RtsError;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// One pipeline stage: applicable in exactly one state, producing the next.
pub trait KnowledgeSource {
    fn name(&self) -> &'static str;

    fn is_applicable(&self, state: BlackboardState) -> bool;

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState>;
}

/// Loads the previous snapshot and the strategies' persisted state.
pub struct ProjectImporter;

impl KnowledgeSource for ProjectImporter {
    fn name(&self) -> &'static str {
        "ProjectImporter"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::Clean
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        blackboard.old = Snapshot::load(blackboard.store.as_ref(), blackboard.settings.level);
        blackboard.for_each_strategy(|strategy, bb| {
            strategy.do_import(bb);
            Ok(())
        })?;
        Ok(BlackboardState::Imported)
    }
}

/// Loads the external library types the resolver needs for structural ancestors.
pub struct TypeSolverInitializer;

impl KnowledgeSource for TypeSolverInitializer {
    fn name(&self) -> &'static str {
        "TypeSolverInitializer"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::Imported
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        blackboard.libraries = blackboard.source.libraries().context("Failed to load library types")?;
        debug!(types = blackboard.libraries.len(), "library types loaded");
        Ok(BlackboardState::TypeSolverSet)
    }
}

/// Parses the revision and derives its index, hierarchy and checksums.
pub struct Parser;

impl KnowledgeSource for Parser {
    fn name(&self) -> &'static str {
        "Parser"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::TypeSolverSet
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        let revision = blackboard.source.parse().context("Failed to parse the revision")?;
        for failure in &revision.failures {
            warn!(unit = %failure.path, reason = %failure.message, "unit excluded from the revision");
        }
        let provider = blackboard.source.provider(&revision, &blackboard.libraries);
        let index = DeclarationIndex::build(&revision, provider.as_ref());
        blackboard.hierarchy = Hierarchy::build(&index, provider.as_ref());
        blackboard.fingerprint = fingerprint_revision(&revision, &index, blackboard.settings.level);
        info!(
            units = revision.units.len(),
            failures = revision.failures.len(),
            checksums = blackboard.fingerprint.checksums.len(),
            "revision parsed"
        );
        blackboard.index = index;
        blackboard.provider = Some(provider);
        blackboard.revision = revision;
        Ok(BlackboardState::Parsed)
    }
}

pub struct TestFinder {
    detector: Box<dyn TestDetector>,
}

impl TestFinder {
    pub fn new(detector: Box<dyn TestDetector>) -> Self {
        Self { detector }
    }
}

impl KnowledgeSource for TestFinder {
    fn name(&self) -> &'static str {
        "TestFinder"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::Parsed
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        blackboard.tests = self.detector.find_tests(
            &blackboard.revision,
            &blackboard.index,
            &blackboard.hierarchy,
            blackboard.settings.level,
        );
        debug!(tests = blackboard.tests.len(), language = self.detector.language(), "tests found");
        Ok(BlackboardState::TestsFound)
    }
}

/// Diffs the checksums of both revisions.
///
/// Declarations of units that failed to parse are set aside first, so they are neither removed
/// nor changed in this run.
pub struct CodeChangeAnalyzer;

impl KnowledgeSource for CodeChangeAnalyzer {
    fn name(&self) -> &'static str {
        "CodeChangeAnalyzer"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::TestsFound
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        let failed: BTreeSet<&str> = blackboard.revision.failures.iter().map(|f| f.path.as_str()).collect();
        let mut old_checksums = blackboard.old.checksums.clone();
        let mut unparsed = Snapshot::default();
        for (id, unit) in &blackboard.old.unit_mapping {
            if failed.contains(unit.as_str())
                && let Some(hash) = old_checksums.remove(id)
            {
                unparsed.checksums.insert(id.clone(), hash);
                unparsed.unit_mapping.insert(id.clone(), unit.clone());
            }
        }
        blackboard.unparsed = unparsed;

        blackboard.changes = diff(&old_checksums, &blackboard.fingerprint.checksums);
        let changes = &blackboard.changes;
        info!(
            same = changes.same.len(),
            different = changes.different.len(),
            added = changes.added.len(),
            removed = changes.removed.len(),
            renamed = changes.renamed.len(),
            "changes analysed"
        );
        blackboard.for_each_strategy(|strategy, bb| {
            strategy.do_change_analysis(bb);
            Ok(())
        })?;
        Ok(BlackboardState::NodesChangesSet)
    }
}

/// Crops the old graph into the starting point of the new one.
pub struct GraphCropper;

impl KnowledgeSource for GraphCropper {
    fn name(&self) -> &'static str {
        "GraphCropper"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::NodesChangesSet
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        let mut graph = blackboard.old.graph.clone();
        let input = CropInput {
            level: blackboard.settings.level,
            changes: &blackboard.changes,
            revision: &blackboard.revision,
            index: &blackboard.index,
            hierarchy: &blackboard.hierarchy,
            old_unit_mapping: &blackboard.old.unit_mapping,
        };
        blackboard.crop = crop(&mut graph, &input);
        blackboard.graph = graph;
        blackboard.for_each_strategy(|strategy, bb| {
            strategy.do_graph_cropping(bb);
            Ok(())
        })?;
        Ok(BlackboardState::NewGraphSet)
    }
}

/// Recollects the edges of impacted declarations, then lets the strategies add theirs.
pub struct DependencyAnalyzer;

impl KnowledgeSource for DependencyAnalyzer {
    fn name(&self) -> &'static str {
        "DependencyAnalyzer"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::NewGraphSet
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        let impacted = blackboard.crop.impacted_types.clone();
        {
            let (ctx, graph) = blackboard.collect_view()?;
            collect_dependencies(&ctx, graph, &impacted);
        }
        blackboard.for_each_strategy(|strategy, bb| strategy.do_dependency_analysis(bb))?;
        Ok(BlackboardState::DependenciesUpdated)
    }
}

/// Builds the modification graph over the old and new graphs.
pub struct GraphCombiner;

impl KnowledgeSource for GraphCombiner {
    fn name(&self) -> &'static str {
        "GraphCombiner"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::DependenciesUpdated
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        blackboard.graph.remove_nodes_without_edges();
        let mut combined = ModificationGraph::build(&blackboard.old.graph, &blackboard.graph, &blackboard.changes);
        blackboard.for_each_strategy(|strategy, bb| {
            strategy.combine_graphs(bb, &mut combined);
            Ok(())
        })?;
        debug!(
            nodes = combined.graph.node_count(),
            edges = combined.graph.edge_count(),
            changed = combined.changed_nodes().len(),
            "graphs combined"
        );
        blackboard.modification = Some(combined);
        Ok(BlackboardState::ReadyToCalculateAffectedTests)
    }
}

/// Persists the new snapshot, unless the run only selects.
pub struct ProjectExporter;

impl ProjectExporter {
    fn snapshot(blackboard: &Blackboard) -> Snapshot {
        let mut checksums = blackboard.fingerprint.checksums.clone();
        checksums.extend(blackboard.unparsed.checksums.clone());
        let mut unit_mapping = blackboard.fingerprint.unit_mapping.clone();
        unit_mapping.extend(blackboard.unparsed.unit_mapping.clone());
        Snapshot {
            graph: blackboard.graph.clone(),
            checksums,
            unit_mapping,
        }
    }
}

impl KnowledgeSource for ProjectExporter {
    fn name(&self) -> &'static str {
        "ProjectExporter"
    }

    fn is_applicable(&self, state: BlackboardState) -> bool {
        state == BlackboardState::ReadyToCalculateAffectedTests
    }

    fn execute(&self, blackboard: &mut Blackboard) -> Result<BlackboardState> {
        if !blackboard.settings.overwrite {
            debug!("snapshot left untouched");
            return Ok(BlackboardState::Done);
        }
        Self::snapshot(blackboard)
            .save(blackboard.store.as_ref(), blackboard.settings.level)
            .context("Failed to export the snapshot")?;
        blackboard.for_each_strategy(|strategy, bb| strategy.do_export(bb))?;
        Ok(BlackboardState::Done)
    }
}

/// Runs the applicable knowledge source until the blackboard reaches a terminal state.
pub struct Control {
    sources: Vec<Box<dyn KnowledgeSource>>,
}

impl Control {
    pub fn new(sources: Vec<Box<dyn KnowledgeSource>>) -> Self {
        Self { sources }
    }

    /// The full pipeline, in state order.
    pub fn standard(detector: Box<dyn TestDetector>) -> Self {
        Self::new(vec![
            Box::new(ProjectImporter),
            Box::new(TypeSolverInitializer),
            Box::new(Parser),
            Box::new(TestFinder::new(detector)),
            Box::new(CodeChangeAnalyzer),
            Box::new(GraphCropper),
            Box::new(DependencyAnalyzer),
            Box::new(GraphCombiner),
            Box::new(ProjectExporter),
        ])
    }

    /// Mutations made before a failure are kept; the blackboard is left in `Failed`.
    pub fn run(&self, blackboard: &mut Blackboard) -> Result<(), RtsError> {
        let run_started = Instant::now();
        while !blackboard.state.is_terminal() {
            let state = blackboard.state;
            let Some(source) = self.sources.iter().find(|s| s.is_applicable(state)) else {
                blackboard.state = BlackboardState::Failed;
                return Err(RtsError::NoKnowledgeSource(state));
            };
            let started = Instant::now();
            match source.execute(blackboard) {
                Ok(next) => {
                    info!(
                        stage = source.name(),
                        from = %state,
                        to = %next,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "stage finished"
                    );
                    blackboard.state = next;
                }
                Err(e) => {
                    error!(stage = source.name(), state = %state, error = %format!("{e:#}"), "stage failed");
                    blackboard.state = BlackboardState::Failed;
                    return Err(RtsError::Pipeline {
                        state,
                        stage: source.name(),
                        message: format!("{e:#}"),
                    });
                }
            }
        }
        info!(
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            strategies = ?blackboard.strategy_names(),
            "pipeline finished"
        );
        Ok(())
    }
}
