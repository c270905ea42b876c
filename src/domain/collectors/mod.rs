//! Dependency collectors: recompute the typed edges of impacted declarations.
//!
//! Every collector walks the current-revision model of one impacted type, resolves each
//! reference through the [`SourceModelProvider`] and inserts an edge from the owning node to the
//! resolved target. Unresolved references are skipped.

mod junit;
mod member_level;
mod type_level;

pub use junit::{is_lifecycle_method, is_test_method};

use crate::domain::graph::DependencyGraph;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::index::DeclarationIndex;
use crate::domain::level::Granularity;
use crate::domain::ports::{Declaration, Reference, ReferenceKind, SourceModelProvider};
use crate::domain::source::{CompilationUnit, Expr, Member, MethodDecl, ParsedRevision, TypeRef, simple_name};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Everything a collector needs to know about the current revision.
pub struct CollectContext<'a> {
    pub level: Granularity,
    pub revision: &'a ParsedRevision,
    pub index: &'a DeclarationIndex,
    pub hierarchy: &'a Hierarchy,
    pub provider: &'a dyn SourceModelProvider,
}

impl<'a> CollectContext<'a> {
    /// Resolves a reference, logging and skipping failures.
    pub fn resolve(&self, reference: Reference<'_>) -> Option<String> {
        let resolved = self.provider.resolve(&reference);
        if resolved.is_none() {
            trace!(
                reference = reference.text,
                scope = reference.scope.unwrap_or_default(),
                "unresolved reference skipped"
            );
        }
        resolved
    }

    pub fn resolve_type(&self, ty: &TypeRef, unit: &CompilationUnit, scope: &str) -> Option<String> {
        self.resolve(Reference::to_type(&ty.name, ty.symbol.as_deref(), unit, Some(scope)))
    }

    pub fn resolve_member(
        &self,
        kind: ReferenceKind,
        text: &str,
        symbol: Option<&str>,
        unit: &CompilationUnit,
        scope: &str,
    ) -> Option<String> {
        self.resolve(Reference {
            kind,
            text,
            symbol,
            unit,
            scope: Some(scope),
        })
    }
}

/// Recomputes the non-DI edges of every impacted type.
pub fn collect_dependencies(ctx: &CollectContext<'_>, graph: &mut DependencyGraph, impacted_types: &BTreeSet<String>) {
    let before = graph.edge_count();
    for type_id in impacted_types {
        let Some(decl) = ctx.index.type_decl(ctx.revision, type_id) else {
            continue;
        };
        let Some(unit) = ctx
            .index
            .unit_of(type_id)
            .and_then(|unit_id| ctx.index.unit(ctx.revision, unit_id))
        else {
            continue;
        };
        match ctx.level {
            Granularity::Type => type_level::collect(ctx, graph, unit, type_id, decl),
            Granularity::Method | Granularity::NonType => {
                member_level::collect(ctx, graph, unit, type_id, decl);
                junit::collect(ctx, graph, type_id);
            }
        }
    }
    debug!(
        types = impacted_types.len(),
        edges_before = before,
        edges_after = graph.edge_count(),
        "dependencies collected"
    );
}

/// Identifier of the zero-argument constructor of `type_id`, declared or implicit.
pub fn zero_arg_constructor(ctx: &CollectContext<'_>, unit: &CompilationUnit, type_id: &str) -> String {
    let synthetic = Member::Constructor(MethodDecl {
        name: simple_name(type_id).to_string(),
        modifiers: Vec::new(),
        annotations: Vec::new(),
        type_params: Vec::new(),
        params: Vec::new(),
        return_type: None,
        throws: Vec::new(),
        body: Some(Vec::new()),
        comment: None,
    });
    ctx.provider.qualified_id(Declaration::Member {
        unit,
        owner: type_id,
        member: &synthetic,
    })
}

/// Visits every expression reachable from `exprs`, anonymous class bodies included.
pub fn walk<'e>(exprs: &'e [Expr], visit: &mut dyn FnMut(&'e Expr)) {
    for expr in exprs {
        visit(expr);
        for child in expr.children() {
            walk(std::slice::from_ref(child), visit);
        }
        if let Expr::New { body, .. } = expr {
            walk_members(body, visit);
        }
    }
}

/// Visits the bodies and initializers of a member list.
pub fn walk_members<'e>(members: &'e [Member], visit: &mut dyn FnMut(&'e Expr)) {
    for member in members {
        match member {
            Member::Method(m) | Member::Constructor(m) => walk(m.statements(), visit),
            Member::Field(f) => {
                if let Some(init) = &f.initializer {
                    walk(std::slice::from_ref(init), visit);
                }
            }
            Member::Initializer(init) => walk(&init.body, visit),
        }
    }
}
