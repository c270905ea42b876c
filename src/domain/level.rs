use crate::domain::edge::EdgeType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of declaration behind an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Unit,
    Type,
    Method,
    Constructor,
    Field,
}

/// Granularity of the dependency graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Nodes are type declarations.
    Type,
    /// Nodes are methods, constructors and fields; inheritance ripple applies.
    #[default]
    Method,
    /// Nodes are methods, constructors and fields; no inheritance ripple.
    NonType,
}

impl Granularity {
    /// Suffix of every snapshot file written at this level.
    pub fn suffix(self) -> &'static str {
        match self {
            Granularity::Type => "typeL",
            Granularity::Method => "methodL",
            Granularity::NonType => "nontypeL",
        }
    }

    /// Whether declarations of this kind become graph nodes.
    pub fn is_graph_node(self, kind: DeclKind) -> bool {
        match self {
            Granularity::Type => kind == DeclKind::Type,
            Granularity::Method | Granularity::NonType => {
                matches!(kind, DeclKind::Method | DeclKind::Constructor | DeclKind::Field)
            }
        }
    }

    /// Non-DI edge types recomputed for impacted declarations.
    pub fn affected_edges(self) -> BTreeSet<EdgeType> {
        let edges: &[EdgeType] = match self {
            Granularity::Type => &[
                EdgeType::ExtendsImplements,
                EdgeType::ObjectCreation,
                EdgeType::StaticUse,
                EdgeType::AnnotationUse,
            ],
            Granularity::Method => &[
                EdgeType::Delegation,
                EdgeType::Inheritance,
                EdgeType::FieldAccess,
                EdgeType::FieldAssignment,
                EdgeType::ObjectCreation,
                EdgeType::AnnotationUse,
                EdgeType::Junit,
            ],
            Granularity::NonType => &[
                EdgeType::Delegation,
                EdgeType::Inheritance,
                EdgeType::FieldAccess,
                EdgeType::ObjectCreation,
                EdgeType::AnnotationUse,
                EdgeType::Junit,
            ],
        };
        edges.iter().copied().collect()
    }

    /// Cropping step 3: strip edges into removed and renamed declarations.
    pub fn strips_removed_references(self) -> bool {
        !matches!(self, Granularity::Type)
    }

    /// Cropping steps 4 and 5: inherited-method and inheritance/assignment ripples.
    pub fn ripples_inheritance(self) -> bool {
        matches!(self, Granularity::Method)
    }

    /// Edge type used for `field = ..` writes.
    pub fn assignment_edge(self) -> EdgeType {
        match self {
            Granularity::NonType => EdgeType::FieldAccess,
            _ => EdgeType::FieldAssignment,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Type => "type",
            Granularity::Method => "method",
            Granularity::NonType => "non_type",
        })
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "type" | "class" => Ok(Granularity::Type),
            "method" => Ok(Granularity::Method),
            "non_type" | "nontype" => Ok(Granularity::NonType),
            other => Err(format!("unknown granularity: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_method_level_ripples() {
        assert!(Granularity::Method.ripples_inheritance());
        assert!(!Granularity::NonType.ripples_inheritance());
        assert!(Granularity::NonType.strips_removed_references());
        assert!(!Granularity::Type.strips_removed_references());
    }

    #[test]
    fn test_node_filter_per_level() {
        assert!(Granularity::Type.is_graph_node(DeclKind::Type));
        assert!(!Granularity::Type.is_graph_node(DeclKind::Method));
        assert!(Granularity::Method.is_graph_node(DeclKind::Field));
        assert!(!Granularity::NonType.is_graph_node(DeclKind::Unit));
    }

    #[test]
    fn test_parse_level_names() {
        assert_eq!("non-type".parse::<Granularity>(), Ok(Granularity::NonType));
        assert_eq!("TYPE".parse::<Granularity>(), Ok(Granularity::Type));
        assert!("package".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_affected_edges_never_contain_di() {
        for level in [Granularity::Type, Granularity::Method, Granularity::NonType] {
            assert!(level.affected_edges().iter().all(|t| !t.is_dependency_injection()));
        }
    }
}
