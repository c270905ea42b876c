//! Shared test utilities for integration tests.
//! Shared by the integration test binaries through `mod common;`.
#![allow(dead_code)]

pub mod fixtures;
pub mod mock;

use rts_graph::app::dto::SelectionReport;
use rts_graph::app::engine::RtsEngine;
use rts_graph::config::RunSettings;
use rts_graph::domain::level::Granularity;
use rts_graph::domain::modification::ModificationReport;

use mock::{MemorySource, MemoryStore};

pub fn settings(level: Granularity) -> RunSettings {
    RunSettings {
        level,
        ..RunSettings::default()
    }
}

pub fn spring_settings(level: Granularity) -> RunSettings {
    let mut settings = settings(level);
    settings.di.spring = true;
    settings
}

/// One `select` run over `source`, persisting into `store`.
pub fn select(settings: &RunSettings, source: MemorySource, store: &MemoryStore) -> SelectionReport {
    RtsEngine::new(settings.clone())
        .select(Box::new(source), Box::new(store.clone()))
        .expect("select run")
}

/// One `graph` run over `source`, persisting into `store`.
pub fn graph(settings: &RunSettings, source: MemorySource, store: &MemoryStore) -> ModificationReport {
    RtsEngine::new(settings.clone())
        .graph(Box::new(source), Box::new(store.clone()))
        .expect("graph run")
}
