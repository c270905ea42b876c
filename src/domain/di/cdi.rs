//! CDI: managed beans, producer methods and fields with their disposers, and alternatives
//! enabled through `beans.xml`.

use super::{
    Bean, BeanIndex, BeanSource, Framework, InjectionPointStore, ScannedType, annotation_names,
    lower_camel, member_node, qualifiers, requests, resolve_type, type_bean_nodes, type_closure,
};
use crate::domain::collectors::CollectContext;
use crate::domain::edge::EdgeType;
use crate::domain::fingerprint::hash_str;
use crate::domain::graph::DependencyGraph;
use crate::domain::index::MemberEntry;
use crate::domain::level::Granularity;
use crate::domain::source::{Annotation, Member, MethodDecl, ParsedRevision};
use std::collections::{BTreeMap, BTreeSet};

const MARKERS: [&str; 1] = ["Qualifier"];

const ALTERNATIVE_PREFIX: &str = "cdi-alternative:";

/// Synthetic graph node of an alternative enabled in `beans.xml`.
pub fn alternative_node(class: &str) -> String {
    format!("{ALTERNATIVE_PREFIX}{class}")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Cdi;

/// `@Named` name: the annotation value, else the given default.
fn bean_name(annotations: &[Annotation], default: impl FnOnce() -> String) -> Option<String> {
    let named = annotations.iter().find(|a| a.simple_name() == "Named")?;
    Some(annotation_names(named).into_iter().next().unwrap_or_else(default))
}

/// `getFoo` → `foo`, any other method name unchanged.
fn property_name(method: &str) -> String {
    match method.strip_prefix("get") {
        Some(rest) if !rest.is_empty() => lower_camel(rest),
        _ => method.to_string(),
    }
}

fn managed(scanned: &ScannedType<'_>) -> bool {
    let decl = scanned.decl;
    if !decl.is_concrete_class() || decl.annotation("Vetoed").is_some() {
        return false;
    }
    let mut constructors = decl.constructors().peekable();
    constructors.peek().is_none() || constructors.any(|c| c.params.is_empty() || c.annotation("Inject").is_some())
}

fn is_disposer(method: &MethodDecl) -> bool {
    method.params.iter().any(|p| p.annotation("Disposes").is_some())
}

impl Cdi {
    /// Disposer methods of `scanned` whose disposed parameter has type `produced`.
    fn disposers<'a>(
        ctx: &CollectContext<'_>,
        scanned: &ScannedType<'a>,
        produced: &str,
    ) -> Vec<&'a MemberEntry> {
        scanned
            .members()
            .filter_map(|(entry, member)| match member {
                Member::Method(method) if is_disposer(method) => Some((entry, method)),
                _ => None,
            })
            .filter(|(_, method)| {
                method
                    .params
                    .iter()
                    .filter(|p| p.annotation("Disposes").is_some())
                    .any(|p| resolve_type(ctx, scanned, &p.ty).as_deref() == Some(produced))
            })
            .map(|(entry, _)| entry)
            .collect()
    }
}

impl Framework for Cdi {
    fn prefix(&self) -> &'static str {
        "cdi"
    }

    fn edge_type(&self) -> EdgeType {
        EdgeType::DiCdi
    }

    fn collect_beans(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> BeanIndex {
        let mut index = BeanIndex::new();
        for scanned in types {
            let id = scanned.id;
            if managed(scanned) {
                let annotations = &scanned.decl.annotations;
                let bean = Bean::new(id, BeanSource::Type(id.to_string()), type_bean_nodes(ctx, id));
                index.register(
                    bean,
                    bean_name(annotations, || lower_camel(&scanned.decl.name)),
                    type_closure(ctx, id),
                    qualifiers(ctx, scanned, annotations, &MARKERS),
                );
            }

            for (entry, member) in scanned.members() {
                if member.annotations().iter().all(|a| a.simple_name() != "Produces") {
                    continue;
                }
                let annotations = member.annotations();
                let node = member_node(ctx, scanned, entry);
                let (bean, name, produced) = match member {
                    Member::Method(method) => {
                        let Some(produced) = method.return_type.as_ref().and_then(|ty| resolve_type(ctx, scanned, ty)) else {
                            continue;
                        };
                        let mut sources = BTreeSet::from([entry.id.clone()]);
                        let mut nodes = BTreeSet::from([node]);
                        for disposer in Cdi::disposers(ctx, scanned, &produced) {
                            sources.insert(disposer.id.clone());
                            nodes.insert(member_node(ctx, scanned, disposer));
                        }
                        let name = bean_name(annotations, || property_name(&method.name));
                        (Bean::new(id, BeanSource::Methods(sources), nodes), name, produced)
                    }
                    Member::Field(field) => {
                        let Some(produced) = resolve_type(ctx, scanned, &field.ty) else {
                            continue;
                        };
                        let name = bean_name(annotations, || field.name.clone());
                        let bean = Bean::new(id, BeanSource::Field(entry.id.clone()), BTreeSet::from([node]));
                        (bean, name, produced)
                    }
                    _ => continue,
                };
                index.register(
                    bean,
                    name,
                    type_closure(ctx, &produced),
                    qualifiers(ctx, scanned, annotations, &MARKERS),
                );
            }
        }
        index
    }

    fn collect_injection_points(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> InjectionPointStore {
        let mut points = InjectionPointStore::new();
        for scanned in types {
            for (entry, member) in scanned.members() {
                let owner = member_node(ctx, scanned, entry);
                match member {
                    Member::Field(field) if field.annotation("Inject").is_some() => {
                        let name = bean_name(&field.annotations, || field.name.clone());
                        let qualifiers = qualifiers(ctx, scanned, &field.annotations, &MARKERS);
                        for request in requests(ctx, scanned, &field.ty, name, &qualifiers) {
                            points.add(owner.clone(), request);
                        }
                    }
                    Member::Method(method) | Member::Constructor(method) => {
                        let injected = method.annotation("Inject").is_some()
                            || method.annotation("Produces").is_some()
                            || is_disposer(method);
                        if !injected {
                            continue;
                        }
                        for param in method.params.iter().filter(|p| p.annotation("Disposes").is_none()) {
                            let name = param
                                .annotation("Named")
                                .and_then(|named| annotation_names(named).into_iter().next());
                            let qualifiers = qualifiers(ctx, scanned, &param.annotations, &MARKERS);
                            for request in requests(ctx, scanned, &param.ty, name, &qualifiers) {
                                points.add(owner.clone(), request);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        points
    }

    fn config_file(&self) -> Option<&'static str> {
        Some("alternatives")
    }

    fn config_entries(&self, revision: &ParsedRevision) -> BTreeMap<String, i32> {
        revision
            .descriptor
            .cdi_alternatives
            .iter()
            .map(|class| (alternative_node(class), hash_str(class)))
            .collect()
    }

    /// `@Alternative` class (or its `@Alternative` producers) → enabling node.
    fn config_edges(&self, ctx: &CollectContext<'_>, graph: &mut DependencyGraph) {
        for class in &ctx.revision.descriptor.cdi_alternatives {
            let node = alternative_node(class);
            graph.add_node(node.clone());
            let (Some(decl), Some(entry)) = (ctx.index.type_decl(ctx.revision, class), ctx.index.type_entry(class))
            else {
                continue;
            };
            let mut sources = BTreeSet::new();
            if decl.annotation("Alternative").is_some() {
                sources.extend(type_bean_nodes(ctx, class));
            }
            for member_entry in &entry.members {
                let producer_alternative = decl.members.get(member_entry.index).is_some_and(|member| {
                    let annotations = member.annotations();
                    annotations.iter().any(|a| a.simple_name() == "Alternative")
                        && annotations.iter().any(|a| a.simple_name() == "Produces")
                });
                if producer_alternative {
                    sources.insert(match ctx.level {
                        Granularity::Type => class.clone(),
                        Granularity::Method | Granularity::NonType => member_entry.id.clone(),
                    });
                }
            }
            for source in sources {
                graph.connect(&source, &node, EdgeType::DiCdi);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names() {
        assert_eq!(property_name("getDataSource"), "dataSource");
        assert_eq!(property_name("get"), "get");
        assert_eq!(property_name("connection"), "connection");
    }

    #[test]
    fn test_named_default() {
        let named = Annotation {
            name: "javax.inject.Named".to_string(),
            symbol: None,
            args: BTreeMap::new(),
        };
        assert_eq!(bean_name(std::slice::from_ref(&named), || "fallback".into()), Some("fallback".to_string()));
        assert_eq!(bean_name(&[], || "fallback".into()), None);
    }

    #[test]
    fn test_alternative_entries() {
        let mut revision = ParsedRevision::default();
        revision.descriptor.cdi_alternatives = vec!["org.acme.MockPayment".to_string()];
        let entries = Cdi.config_entries(&revision);
        assert!(entries.contains_key("cdi-alternative:org.acme.MockPayment"));
    }
}
