//! Mock implementations for integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use rts_graph::adapters::json_model::JsonModelProvider;
use rts_graph::domain::ports::{ProjectSource, SnapshotStore, SourceModelProvider};
use rts_graph::domain::source::{
    CompilationUnit, Descriptor, LibraryType, ParseFailure, ParsedRevision,
};

/// In-memory snapshot store. Clones share their files, so one store survives several runs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    files: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.files.borrow().get(name).cloned()
    }

    pub fn put(&self, name: &str, contents: &str) {
        self.files.borrow_mut().insert(name.to_string(), contents.to_string());
    }

    pub fn names(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name))
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        self.put(name, contents);
        Ok(())
    }
}

/// Store whose writes always fail.
pub struct FailingStore;

impl SnapshotStore for FailingStore {
    fn read(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn write(&self, name: &str, _contents: &str) -> Result<()> {
        Err(anyhow!("no space left on device while writing {name}"))
    }
}

/// Project source serving a fixed revision, resolved by the JSON model provider.
#[derive(Clone, Default)]
pub struct MemorySource {
    revision: ParsedRevision,
    libraries: Vec<LibraryType>,
}

impl MemorySource {
    pub fn new(units: Vec<CompilationUnit>) -> Self {
        Self {
            revision: ParsedRevision {
                units,
                ..ParsedRevision::default()
            },
            libraries: Vec::new(),
        }
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.revision.failures.push(ParseFailure {
            path: path.to_string(),
            message: "unexpected token".to_string(),
        });
        self
    }

    pub fn with_descriptor(mut self, descriptor: Descriptor) -> Self {
        self.revision.descriptor = descriptor;
        self
    }

    pub fn with_library(mut self, name: &str, supertypes: &[&str]) -> Self {
        self.libraries.push(LibraryType {
            name: name.to_string(),
            supertypes: supertypes.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

impl ProjectSource for MemorySource {
    fn libraries(&self) -> Result<Vec<LibraryType>> {
        Ok(self.libraries.clone())
    }

    fn parse(&self) -> Result<ParsedRevision> {
        Ok(self.revision.clone())
    }

    fn provider(&self, revision: &ParsedRevision, libraries: &[LibraryType]) -> Box<dyn SourceModelProvider> {
        Box::new(JsonModelProvider::new(revision, libraries))
    }
}
