use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Edge type - granular classification of dependencies between declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    // ============ Control Flow ============
    Delegation, // Caller → Callee

    // ============ Type Hierarchy ============
    /// Overridden (base) method → overriding method
    Inheritance,
    /// Type → extended/implemented supertype (type level only)
    ExtendsImplements,

    // ============ Data Flow ============
    FieldAccess,     // Reader → Field
    FieldAssignment, // Field → Writer

    // ============ Type Usage ============
    StaticUse,      // User → statically referenced type
    AnnotationUse,  // Annotated → annotation type
    ObjectCreation, // Creator → created type (or its constructor)

    // ============ Test Fixtures ============
    /// Test method → set-up / tear-down method
    Junit,

    // ============ Dependency Injection ============
    DiSpring, // Injection point → bean
    DiGuice,
    DiCdi,
}

impl EdgeType {
    pub const ALL: [EdgeType; 12] = [
        EdgeType::Delegation,
        EdgeType::Inheritance,
        EdgeType::ExtendsImplements,
        EdgeType::FieldAccess,
        EdgeType::FieldAssignment,
        EdgeType::StaticUse,
        EdgeType::AnnotationUse,
        EdgeType::ObjectCreation,
        EdgeType::Junit,
        EdgeType::DiSpring,
        EdgeType::DiGuice,
        EdgeType::DiCdi,
    ];

    pub fn is_dependency_injection(self) -> bool {
        matches!(self, EdgeType::DiSpring | EdgeType::DiGuice | EdgeType::DiCdi)
    }

    /// Every edge type, minus the DI ones when `standalone` is set.
    pub fn traversable(standalone: bool) -> BTreeSet<EdgeType> {
        Self::ALL
            .into_iter()
            .filter(|t| !(standalone && t.is_dependency_injection()))
            .collect()
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeType::Delegation => "DELEGATION",
            EdgeType::Inheritance => "INHERITANCE",
            EdgeType::ExtendsImplements => "EXTENDS_IMPLEMENTS",
            EdgeType::FieldAccess => "FIELD_ACCESS",
            EdgeType::FieldAssignment => "FIELD_ASSIGNMENT",
            EdgeType::StaticUse => "STATIC_USE",
            EdgeType::AnnotationUse => "ANNOTATION_USE",
            EdgeType::ObjectCreation => "OBJECT_CREATION",
            EdgeType::Junit => "JUNIT",
            EdgeType::DiSpring => "DI_SPRING",
            EdgeType::DiGuice => "DI_GUICE",
            EdgeType::DiCdi => "DI_CDI",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_excludes_di_edges() {
        let standalone = EdgeType::traversable(true);
        assert!(!standalone.contains(&EdgeType::DiSpring));
        assert!(!standalone.contains(&EdgeType::DiCdi));
        assert!(standalone.contains(&EdgeType::Delegation));
        assert_eq!(EdgeType::traversable(false).len(), EdgeType::ALL.len());
    }

    #[test]
    fn test_serialized_names_match_display() {
        for edge_type in EdgeType::ALL {
            let json = serde_json::to_string(&edge_type).unwrap();
            assert_eq!(json, format!("\"{}\"", edge_type));
        }
    }
}
