use crate::domain::index::DeclarationIndex;
use crate::domain::ports::SourceModelProvider;
use std::collections::{BTreeMap, BTreeSet};

/// Root of every class hierarchy; never contributes inherited methods.
pub const OBJECT: &str = "java.lang.Object";

/// Supertype/subtype relation over the types of one revision.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    ancestors: BTreeMap<String, BTreeSet<String>>,
    subtypes: BTreeMap<String, BTreeSet<String>>,
}

impl Hierarchy {
    pub fn build(index: &DeclarationIndex, provider: &dyn SourceModelProvider) -> Self {
        let mut hierarchy = Self::default();
        for entry in index.types() {
            let ancestors = provider.structural_ancestors(&entry.id);
            for ancestor in &ancestors {
                hierarchy
                    .subtypes
                    .entry(ancestor.clone())
                    .or_default()
                    .insert(entry.id.clone());
            }
            hierarchy.ancestors.insert(entry.id.clone(), ancestors);
        }
        hierarchy
    }

    /// Transitive supertypes, library types included.
    pub fn ancestors(&self, type_id: &str) -> impl Iterator<Item = &str> {
        self.ancestors
            .get(type_id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Transitive subtypes declared in the revision.
    pub fn subtypes(&self, type_id: &str) -> impl Iterator<Item = &str> {
        self.subtypes
            .get(type_id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Ancestors that contribute inherited members (everything except the root object type).
    pub fn member_ancestors(&self, type_id: &str) -> impl Iterator<Item = &str> {
        self.ancestors(type_id).filter(|a| *a != OBJECT)
    }
}
