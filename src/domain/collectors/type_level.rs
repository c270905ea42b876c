use super::{CollectContext, walk_members};
use crate::domain::edge::EdgeType;
use crate::domain::graph::DependencyGraph;
use crate::domain::ports::Reference;
use crate::domain::source::{Annotation, CompilationUnit, Expr, Member, TypeDecl};

/// Type-level edges of one type: supertypes, created types, statically used types and
/// annotation types. Nested types are collected as separate nodes.
pub(super) fn collect(
    ctx: &CollectContext<'_>,
    graph: &mut DependencyGraph,
    unit: &CompilationUnit,
    type_id: &str,
    decl: &TypeDecl,
) {
    graph.add_node(type_id);
    let link = |graph: &mut DependencyGraph, target: Option<String>, edge_type: EdgeType| {
        if let Some(target) = target
            && target != type_id
        {
            graph.connect(type_id, &target, edge_type);
        }
    };

    for supertype in decl.supertypes() {
        link(graph, ctx.resolve_type(supertype, unit, type_id), EdgeType::ExtendsImplements);
    }

    for annotation in annotations_of(decl) {
        let target = ctx.resolve(Reference::to_type(
            &annotation.name,
            annotation.symbol.as_deref(),
            unit,
            Some(type_id),
        ));
        link(graph, target, EdgeType::AnnotationUse);
    }

    let mut used = Vec::new();
    walk_members(&decl.members, &mut |expr| match expr {
        Expr::New { ty, .. } => used.push((ty, EdgeType::ObjectCreation)),
        Expr::TypeName { ty } => used.push((ty, EdgeType::StaticUse)),
        _ => {}
    });
    for (ty, edge_type) in used {
        link(graph, ctx.resolve_type(ty, unit, type_id), edge_type);
    }
}

/// Annotations on the type, its members and their parameters.
fn annotations_of(decl: &TypeDecl) -> impl Iterator<Item = &Annotation> {
    let member_annotations = decl.members.iter().flat_map(|member| {
        let params: Vec<&Annotation> = match member {
            Member::Method(m) | Member::Constructor(m) => {
                m.params.iter().flat_map(|p| p.annotations.iter()).collect()
            }
            _ => Vec::new(),
        };
        member.annotations().iter().chain(params)
    });
    decl.annotations.iter().chain(member_annotations)
}
