//! Declaration index of one revision: identifier → kind, compilation unit and location.

use crate::domain::level::DeclKind;
use crate::domain::ports::{Declaration, SourceModelProvider};
use crate::domain::source::{CompilationUnit, Member, MethodDecl, ParsedRevision, TypeDecl};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclInfo {
    pub kind: DeclKind,
    /// Path of the containing compilation unit.
    pub unit: String,
    /// Declaring type, for members and nested types.
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub id: String,
    pub kind: DeclKind,
    /// `name(P1,P2)` for methods and constructors.
    pub signature: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub id: String,
    pub unit_index: usize,
    /// Index path: top-level type index, then nested indices.
    pub location: Vec<usize>,
    pub members: Vec<MemberEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    decls: BTreeMap<String, DeclInfo>,
    types: BTreeMap<String, TypeEntry>,
    units: BTreeMap<String, usize>,
    packages: BTreeMap<String, BTreeSet<String>>,
}

impl DeclarationIndex {
    pub fn build(revision: &ParsedRevision, provider: &dyn SourceModelProvider) -> Self {
        let mut index = Self::default();
        for (unit_index, unit) in revision.units.iter().enumerate() {
            let unit_id = provider.qualified_id(Declaration::Unit(unit));
            index.units.insert(unit_id.clone(), unit_index);
            index
                .packages
                .entry(unit.package.clone().unwrap_or_default())
                .or_default()
                .insert(unit_id.clone());
            index.decls.insert(
                unit_id.clone(),
                DeclInfo {
                    kind: DeclKind::Unit,
                    unit: unit_id.clone(),
                    owner: None,
                },
            );
            for (position, decl) in unit.types.iter().enumerate() {
                index.add_type(provider, unit, unit_index, &unit_id, None, decl, vec![position]);
            }
        }
        index
    }

    #[allow(clippy::too_many_arguments)]
    fn add_type(
        &mut self,
        provider: &dyn SourceModelProvider,
        unit: &CompilationUnit,
        unit_index: usize,
        unit_id: &str,
        enclosing: Option<&str>,
        decl: &TypeDecl,
        location: Vec<usize>,
    ) {
        let type_id = provider.qualified_id(Declaration::Type {
            unit,
            enclosing,
            decl,
        });
        self.decls.insert(
            type_id.clone(),
            DeclInfo {
                kind: DeclKind::Type,
                unit: unit_id.to_string(),
                owner: enclosing.map(str::to_string),
            },
        );

        let mut members = Vec::new();
        for (index, member) in decl.members.iter().enumerate() {
            let kind = match member {
                Member::Method(_) => DeclKind::Method,
                Member::Constructor(_) => DeclKind::Constructor,
                Member::Field(_) => DeclKind::Field,
                Member::Initializer(_) => continue,
            };
            let id = provider.qualified_id(Declaration::Member {
                unit,
                owner: &type_id,
                member,
            });
            let signature = match kind {
                DeclKind::Method | DeclKind::Constructor => {
                    id.strip_prefix(&type_id).map(|s| s.trim_start_matches('.').to_string())
                }
                _ => None,
            };
            self.decls.insert(
                id.clone(),
                DeclInfo {
                    kind,
                    unit: unit_id.to_string(),
                    owner: Some(type_id.clone()),
                },
            );
            members.push(MemberEntry {
                id,
                kind,
                signature,
                index,
            });
        }

        for (position, nested) in decl.nested.iter().enumerate() {
            let mut nested_location = location.clone();
            nested_location.push(position);
            self.add_type(provider, unit, unit_index, unit_id, Some(type_id.as_str()), nested, nested_location);
        }

        self.types.insert(
            type_id.clone(),
            TypeEntry {
                id: type_id,
                unit_index,
                location,
                members,
            },
        );
    }

    pub fn info(&self, id: &str) -> Option<&DeclInfo> {
        self.decls.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.decls.contains_key(id)
    }

    pub fn kind_of(&self, id: &str) -> Option<DeclKind> {
        self.decls.get(id).map(|info| info.kind)
    }

    pub fn unit_of(&self, id: &str) -> Option<&str> {
        self.decls.get(id).map(|info| info.unit.as_str())
    }

    /// All identifiers of the revision with their kinds.
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &DeclInfo)> {
        self.decls.iter().map(|(id, info)| (id.as_str(), info))
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn package_of_unit<'a>(&self, revision: &'a ParsedRevision, unit_id: &str) -> Option<&'a str> {
        self.unit(revision, unit_id).and_then(|u| u.package.as_deref())
    }

    pub fn units_in_package(&self, package: &str) -> impl Iterator<Item = &str> {
        self.packages
            .get(package)
            .into_iter()
            .flat_map(|units| units.iter().map(String::as_str))
    }

    pub fn unit<'a>(&self, revision: &'a ParsedRevision, unit_id: &str) -> Option<&'a CompilationUnit> {
        self.units.get(unit_id).and_then(|&i| revision.units.get(i))
    }

    /// Type identifiers declared in a unit, nested ones included.
    pub fn types_in_unit(&self, unit_id: &str) -> Vec<&str> {
        self.decls
            .iter()
            .filter(|(_, info)| info.kind == DeclKind::Type && info.unit == unit_id)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeEntry> {
        self.types.values()
    }

    pub fn type_entry(&self, type_id: &str) -> Option<&TypeEntry> {
        self.types.get(type_id)
    }

    pub fn type_decl<'a>(&self, revision: &'a ParsedRevision, type_id: &str) -> Option<&'a TypeDecl> {
        let entry = self.types.get(type_id)?;
        let unit = revision.units.get(entry.unit_index)?;
        let (first, rest) = entry.location.split_first()?;
        let mut decl = unit.types.get(*first)?;
        for &position in rest {
            decl = decl.nested.get(position)?;
        }
        Some(decl)
    }

    /// Identifiers of the members of a type that are methods, constructors or fields.
    pub fn member_ids(&self, type_id: &str) -> impl Iterator<Item = &str> {
        self.types
            .get(type_id)
            .into_iter()
            .flat_map(|entry| entry.members.iter().map(|m| m.id.as_str()))
    }

    /// Method identifier declared by `type_id` with the given signature.
    pub fn method_with_signature(&self, type_id: &str, signature: &str) -> Option<&MemberEntry> {
        self.types.get(type_id)?.members.iter().find(|m| {
            m.kind == DeclKind::Method && m.signature.as_deref() == Some(signature)
        })
    }

    /// The method declaration behind a member entry.
    pub fn method_decl<'a>(&self, revision: &'a ParsedRevision, type_id: &str, member: &MemberEntry) -> Option<&'a MethodDecl> {
        match self.type_decl(revision, type_id)?.members.get(member.index)? {
            Member::Method(m) | Member::Constructor(m) => Some(m),
            _ => None,
        }
    }

    /// Whether the type is declared directly in its compilation unit.
    pub fn is_top_level(&self, type_id: &str) -> bool {
        self.types.get(type_id).is_some_and(|entry| entry.location.len() == 1)
    }
}
