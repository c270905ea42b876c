use super::{CollectContext, zero_arg_constructor};
use crate::domain::edge::EdgeType;
use crate::domain::graph::DependencyGraph;
use crate::domain::level::DeclKind;
use crate::domain::ports::{Reference, ReferenceKind};
use crate::domain::source::{CompilationUnit, Expr, Member, MethodDecl, TypeDecl, TypeKind};

/// Member-level edges of one type: delegation, object creation, field reads and writes,
/// annotation use and inheritance between overridden and overriding methods.
pub(super) fn collect(
    ctx: &CollectContext<'_>,
    graph: &mut DependencyGraph,
    unit: &CompilationUnit,
    type_id: &str,
    decl: &TypeDecl,
) {
    let Some(entry) = ctx.index.type_entry(type_id) else {
        return;
    };
    for member_entry in &entry.members {
        let Some(member) = decl.members.get(member_entry.index) else {
            continue;
        };
        let owner = member_entry.id.as_str();
        graph.add_node(owner);
        let mut visitor = BodyVisitor {
            ctx,
            graph: &mut *graph,
            unit,
            scope: type_id,
            owner,
        };
        match member {
            Member::Method(m) | Member::Constructor(m) => {
                visitor.visit_all(m.statements());
                visitor.annotations(m);
            }
            Member::Field(f) => {
                if let Some(init) = &f.initializer {
                    visitor.visit(init);
                }
                for annotation in &f.annotations {
                    visitor.annotation(&annotation.name, annotation.symbol.as_deref());
                }
            }
            Member::Initializer(_) => {}
        }
        if let (Member::Method(m), Some(signature)) = (member, member_entry.signature.as_deref()) {
            inheritance(ctx, graph, type_id, owner, m, signature);
        }
    }

    if decl.kind == TypeKind::Class && decl.constructors().next().is_none() {
        implicit_constructor(ctx, graph, unit, type_id, decl);
    }
}

struct BodyVisitor<'c, 'g> {
    ctx: &'c CollectContext<'c>,
    graph: &'g mut DependencyGraph,
    unit: &'c CompilationUnit,
    scope: &'c str,
    owner: &'c str,
}

impl BodyVisitor<'_, '_> {
    fn visit_all(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.visit(expr);
        }
    }

    fn visit(&mut self, expr: &Expr) {
        match expr {
            Expr::Call { name, symbol, .. } => {
                let target = self.resolve(ReferenceKind::Method, name, symbol.as_deref());
                self.link(target, EdgeType::Delegation);
            }
            Expr::New {
                ty, symbol, args, ..
            } => {
                let target = match symbol {
                    Some(_) => self.resolve(ReferenceKind::Constructor, &ty.name, symbol.as_deref()),
                    None if args.is_empty() => self.default_constructor_of(&ty.name, ty.symbol.as_deref()),
                    None => None,
                };
                self.link(target, EdgeType::ObjectCreation);
            }
            Expr::FieldRead { name, symbol, .. } => {
                let target = self.resolve(ReferenceKind::Field, name, symbol.as_deref());
                self.link(target, EdgeType::FieldAccess);
            }
            Expr::Assign { target, value } => {
                if let Expr::FieldRead {
                    name,
                    symbol,
                    receiver,
                } = target.as_ref()
                {
                    if let Some(field) = self.resolve(ReferenceKind::Field, name, symbol.as_deref()) {
                        // Writes point from the field to the writer.
                        self.graph
                            .connect(&field, self.owner, self.ctx.level.assignment_edge());
                    }
                    if let Some(receiver) = receiver {
                        self.visit(receiver);
                    }
                } else {
                    self.visit(target);
                }
                self.visit(value);
                return;
            }
            _ => {}
        }
        for child in expr.children() {
            self.visit(child);
        }
        if let Expr::New { body, .. } = expr {
            // Anonymous class bodies belong to the enclosing member.
            for member in body {
                match member {
                    Member::Method(m) | Member::Constructor(m) => self.visit_all(m.statements()),
                    Member::Field(f) => {
                        if let Some(init) = &f.initializer {
                            self.visit(init);
                        }
                    }
                    Member::Initializer(init) => self.visit_all(&init.body),
                }
            }
        }
    }

    fn annotations(&mut self, method: &MethodDecl) {
        let params = method.params.iter().flat_map(|p| p.annotations.iter());
        for annotation in method.annotations.iter().chain(params) {
            self.annotation(&annotation.name, annotation.symbol.as_deref());
        }
    }

    fn annotation(&mut self, name: &str, symbol: Option<&str>) {
        let target = self
            .ctx
            .resolve(Reference::to_type(name, symbol, self.unit, Some(self.scope)));
        self.link(target, EdgeType::AnnotationUse);
    }

    fn resolve(&self, kind: ReferenceKind, text: &str, symbol: Option<&str>) -> Option<String> {
        self.ctx.resolve_member(kind, text, symbol, self.unit, self.scope)
    }

    /// `new T()` without a frontend symbol targets the zero-argument constructor of `T`.
    fn default_constructor_of(&self, type_name: &str, symbol: Option<&str>) -> Option<String> {
        let type_id = self
            .ctx
            .resolve(Reference::to_type(type_name, symbol, self.unit, Some(self.scope)))?;
        Some(zero_arg_constructor(self.ctx, self.unit, &type_id))
    }

    fn link(&mut self, target: Option<String>, edge_type: EdgeType) {
        if let Some(target) = target {
            self.graph.connect(self.owner, &target, edge_type);
        }
    }
}

/// Overridden → overriding edges for one method, in both directions of the hierarchy so that
/// either side's recomputation restores them.
fn inheritance(
    ctx: &CollectContext<'_>,
    graph: &mut DependencyGraph,
    type_id: &str,
    method_id: &str,
    method: &MethodDecl,
    signature: &str,
) {
    if method.has_modifier("private") || method.has_modifier("static") {
        return;
    }
    for ancestor in ctx.hierarchy.member_ancestors(type_id) {
        if let Some(base) = ctx.index.method_with_signature(ancestor, signature) {
            graph.connect(&base.id, method_id, EdgeType::Inheritance);
        }
    }
    for subtype in ctx.hierarchy.subtypes(type_id) {
        if let Some(overriding) = ctx.index.method_with_signature(subtype, signature) {
            graph.connect(method_id, &overriding.id, EdgeType::Inheritance);
        }
    }
}

/// A class without constructors gets its implicit one: it runs the superclass zero-argument
/// constructor and every field initializer.
fn implicit_constructor(
    ctx: &CollectContext<'_>,
    graph: &mut DependencyGraph,
    unit: &CompilationUnit,
    type_id: &str,
    decl: &TypeDecl,
) {
    let node = zero_arg_constructor(ctx, unit, type_id);
    graph.add_node(node.clone());

    if let Some(superclass) = decl.extends.first()
        && let Some(super_id) = ctx.resolve_type(superclass, unit, type_id)
    {
        let target = zero_arg_constructor(ctx, unit, &super_id);
        graph.connect(&node, &target, EdgeType::Delegation);
    }

    if let Some(entry) = ctx.index.type_entry(type_id) {
        for member in &entry.members {
            let initialized = matches!(
                decl.members.get(member.index),
                Some(Member::Field(f)) if f.initializer.is_some() && !f.has_modifier("static")
            );
            if member.kind == DeclKind::Field && initialized {
                graph.connect(&node, &member.id, EdgeType::FieldAccess);
            }
        }
    }
}
