use crate::adapters::fs::snapshot::FileSnapshotStore;
use crate::adapters::json_model::JsonProjectSource;
use crate::adapters::test_detector::{JavaTestDetector, TestDetector};
use crate::app::blackboard::Blackboard;
use crate::app::dto::SelectionReport;
use crate::app::knowledge::Control;
use crate::app::strategy::{DependencyStrategy, DiStrategy};
use crate::config::{RtsConfig, RunSettings};
use crate::domain::di::cdi::Cdi;
use crate::domain::di::guice::Guice;
use crate::domain::di::spring::Spring;
use crate::domain::edge::EdgeType;
use crate::domain::modification::ModificationReport;
use crate::domain::ports::{ProjectSource, SnapshotStore};
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Runs the pipeline over one module with the configured strategies.
pub struct RtsEngine {
    settings: RunSettings,
}

impl RtsEngine {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    fn strategies(&self) -> Vec<Box<dyn DependencyStrategy>> {
        let di = &self.settings.di;
        let mut strategies: Vec<Box<dyn DependencyStrategy>> = Vec::new();
        if di.spring {
            strategies.push(Box::new(DiStrategy::new(Spring)));
        }
        if di.guice {
            strategies.push(Box::new(DiStrategy::new(Guice)));
        }
        if di.cdi {
            strategies.push(Box::new(DiStrategy::new(Cdi)));
        }
        strategies
    }

    fn detector(&self) -> Result<Box<dyn TestDetector>> {
        Ok(match &self.settings.test_filter {
            Some(pattern) => Box::new(JavaTestDetector::with_filter(pattern)?),
            None => Box::new(JavaTestDetector::new()),
        })
    }

    /// Runs every stage and returns the finished blackboard.
    pub fn run(&self, source: Box<dyn ProjectSource>, store: Box<dyn SnapshotStore>) -> Result<Blackboard> {
        let control = Control::standard(self.detector()?);
        let mut blackboard = Blackboard::new(self.settings.clone(), source, store, self.strategies());
        control.run(&mut blackboard)?;
        Ok(blackboard)
    }

    pub fn graph(&self, source: Box<dyn ProjectSource>, store: Box<dyn SnapshotStore>) -> Result<ModificationReport> {
        let blackboard = self.run(source, store)?;
        Ok(blackboard.modification()?.to_report())
    }

    pub fn select(&self, source: Box<dyn ProjectSource>, store: Box<dyn SnapshotStore>) -> Result<SelectionReport> {
        let blackboard = self.run(source, store)?;
        let allowed = EdgeType::traversable(self.settings.standalone);
        let selection = blackboard.modification()?.select_tests(&blackboard.tests, &allowed);
        let report = SelectionReport::new(self.settings.level, self.settings.standalone, selection);
        info!(
            total = report.total_tests,
            selected = report.selected_tests().len(),
            excluded = report.excluded.len(),
            "affected tests calculated"
        );
        Ok(report)
    }
}

/// Source and snapshot store of a module laid out on disk.
pub fn open_module(root: &Path, config: &RtsConfig) -> (Box<dyn ProjectSource>, Box<dyn SnapshotStore>) {
    let snapshot_dir = config.resolve_snapshot_dir(root);
    let source = JsonProjectSource::new(config.resolve_source_dir(root), snapshot_dir.clone());
    (Box::new(source), Box::new(FileSnapshotStore::new(snapshot_dir)))
}
