//! Test discovery adapters
//!
//! A detector decides which declarations of a parsed revision are tests. At type level the
//! tests are the classes declaring test methods, at member levels the test methods themselves.

mod java;

pub use java::JavaTestDetector;

use crate::domain::hierarchy::Hierarchy;
use crate::domain::index::DeclarationIndex;
use crate::domain::level::Granularity;
use crate::domain::source::ParsedRevision;
use std::collections::BTreeSet;

/// Trait for detecting tests based on framework conventions
pub trait TestDetector: Send + Sync {
    /// Identifiers of every test of the revision, as graph nodes of `level`.
    fn find_tests(
        &self,
        revision: &ParsedRevision,
        index: &DeclarationIndex,
        hierarchy: &Hierarchy,
        level: Granularity,
    ) -> BTreeSet<String>;

    /// Get the language this detector is for
    fn language(&self) -> &str;
}
