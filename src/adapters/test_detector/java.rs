use super::TestDetector;
use crate::domain::collectors::is_test_method;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::index::DeclarationIndex;
use crate::domain::level::{DeclKind, Granularity};
use crate::domain::source::ParsedRevision;
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;

/// JUnit test detector
///
/// Conventions:
/// - JUnit 4/5 test annotations (`@Test`, `@ParameterizedTest`, ...)
/// - public no-argument `test*` methods of JUnit 3 `TestCase` subclasses
/// - abstract classes and interfaces only contribute through their concrete subclasses
pub struct JavaTestDetector {
    /// Narrows the test classes; matched against the class identifier.
    filter: Option<Regex>,
}

impl JavaTestDetector {
    pub fn new() -> Self {
        Self { filter: None }
    }

    pub fn with_filter(pattern: &str) -> Result<Self> {
        let filter = Regex::new(pattern).with_context(|| format!("Invalid test filter: {pattern}"))?;
        Ok(Self { filter: Some(filter) })
    }

    fn included(&self, type_id: &str) -> bool {
        self.filter.as_ref().is_none_or(|f| f.is_match(type_id))
    }
}

impl Default for JavaTestDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDetector for JavaTestDetector {
    fn find_tests(
        &self,
        revision: &ParsedRevision,
        index: &DeclarationIndex,
        hierarchy: &Hierarchy,
        level: Granularity,
    ) -> BTreeSet<String> {
        let mut tests = BTreeSet::new();
        for entry in index.types() {
            let Some(decl) = index.type_decl(revision, &entry.id) else {
                continue;
            };
            if !decl.is_concrete_class() || !self.included(&entry.id) {
                continue;
            }
            let test_methods: Vec<&str> = entry
                .members
                .iter()
                .filter(|m| m.kind == DeclKind::Method)
                .filter(|m| {
                    index
                        .method_decl(revision, &entry.id, m)
                        .is_some_and(|method| is_test_method(method, &entry.id, hierarchy))
                })
                .map(|m| m.id.as_str())
                .collect();
            if test_methods.is_empty() {
                continue;
            }
            match level {
                Granularity::Type => {
                    tests.insert(entry.id.clone());
                }
                Granularity::Method | Granularity::NonType => {
                    tests.extend(test_methods.into_iter().map(str::to_string));
                }
            }
        }
        tests
    }

    fn language(&self) -> &str {
        "java"
    }
}
