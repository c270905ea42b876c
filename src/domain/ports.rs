use crate::domain::source::{CompilationUnit, LibraryType, Member, ParsedRevision, TypeDecl};
use anyhow::Result;
use std::collections::BTreeSet;

/// A declaration handed to [`SourceModelProvider::qualified_id`].
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
    Unit(&'a CompilationUnit),
    Type {
        unit: &'a CompilationUnit,
        /// Identifier of the enclosing type, for nested declarations.
        enclosing: Option<&'a str>,
        decl: &'a TypeDecl,
    },
    Member {
        unit: &'a CompilationUnit,
        /// Identifier of the declaring type.
        owner: &'a str,
        member: &'a Member,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Type,
    Method,
    Constructor,
    Field,
}

/// A symbolic reference at a use site, with its lexical context.
#[derive(Debug, Clone, Copy)]
pub struct Reference<'a> {
    pub kind: ReferenceKind,
    /// Text as written (simple or qualified type name, member name).
    pub text: &'a str,
    /// Identifier pre-resolved by the frontend, if any.
    pub symbol: Option<&'a str>,
    pub unit: &'a CompilationUnit,
    /// Identifier of the innermost enclosing type.
    pub scope: Option<&'a str>,
}

impl<'a> Reference<'a> {
    pub fn to_type(text: &'a str, symbol: Option<&'a str>, unit: &'a CompilationUnit, scope: Option<&'a str>) -> Self {
        Self {
            kind: ReferenceKind::Type,
            text,
            symbol,
            unit,
            scope,
        }
    }
}

/// Source Model Provider port (implemented by Infrastructure)
///
/// Maps declarations to globally unique identifiers and resolves references. Identifier scheme:
/// types `pkg.Outer.Inner`, methods `Owner.name(P1,P2)`, constructors `Owner.<init>(P1)`,
/// fields `Owner.name`, compilation units by path. Parameter types are erased and qualified.
pub trait SourceModelProvider {
    fn qualified_id(&self, declaration: Declaration<'_>) -> String;

    /// `None` is a resolution failure; callers skip the reference.
    fn resolve(&self, reference: &Reference<'_>) -> Option<String>;

    /// Transitive supertypes of a type, excluding the type itself.
    fn structural_ancestors(&self, type_id: &str) -> BTreeSet<String>;
}

/// Project source port: delivers the parsed model of the current revision.
pub trait ProjectSource {
    /// External library types (type-solver setup).
    fn libraries(&self) -> Result<Vec<LibraryType>>;

    /// Parses every compilation unit. Units that fail to parse are reported, not fatal.
    fn parse(&self) -> Result<ParsedRevision>;

    /// Builds the resolver over a parsed revision.
    fn provider(&self, revision: &ParsedRevision, libraries: &[LibraryType]) -> Box<dyn SourceModelProvider>;
}

/// Snapshot persistence port
pub trait SnapshotStore {
    /// Reads one named snapshot file; `None` when it was never written.
    fn read(&self, name: &str) -> Result<Option<String>>;

    /// Writes one named snapshot file so that readers see either the old or the new content.
    fn write(&self, name: &str, contents: &str) -> Result<()>;
}
