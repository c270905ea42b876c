//! Spring: stereotype components, `@Bean` factory methods, XML bean definitions and autowiring.
//!
//! Spring qualifiers are plain strings, so `@Qualifier("x")` and `@Named("x")` act as names on
//! both the bean and the injection side.

use super::{
    Bean, BeanIndex, BeanSource, Framework, InjectionPointStore, InjectionRequest, ScannedType,
    annotation_names, lower_camel, member_node, name_from, requests, resolve_type, type_bean_nodes,
    type_closure,
};
use crate::domain::collectors::{CollectContext, walk};
use crate::domain::edge::EdgeType;
use crate::domain::fingerprint::{combine, hash_str, list};
use crate::domain::graph::DependencyGraph;
use crate::domain::source::{Annotation, Expr, Member, ParsedRevision, XmlBean};
use std::collections::{BTreeMap, BTreeSet};

const STEREOTYPES: [&str; 7] = [
    "Component",
    "Service",
    "Repository",
    "Controller",
    "RestController",
    "Configuration",
    "Named",
];

const INJECT: [&str; 4] = ["Autowired", "Inject", "Resource", "Required"];

const XML_PREFIX: &str = "spring-xml:";

/// Synthetic graph node of an XML bean definition.
pub fn xml_node(id: &str) -> String {
    format!("{XML_PREFIX}{id}")
}

fn xml_hash(bean: &XmlBean) -> i32 {
    combine(&[
        hash_str(&bean.id),
        list(&bean.names, |name| hash_str(name)),
        hash_str(&bean.class),
    ])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Spring;

fn stereotype<'a>(scanned: &ScannedType<'a>) -> Option<&'a Annotation> {
    STEREOTYPES.iter().find_map(|s| scanned.decl.annotation(s))
}

fn injected(annotations: &[Annotation]) -> bool {
    annotations.iter().any(|a| INJECT.contains(&a.simple_name()))
}

/// Name requested by an injection site: `@Resource(name)`, then `@Qualifier`, then `@Named`.
fn requested_name(annotations: &[Annotation]) -> Option<String> {
    annotations
        .iter()
        .find(|a| a.simple_name() == "Resource")
        .and_then(|a| a.arg("name"))
        .map(|name| name.trim_matches('"').to_string())
        .or_else(|| name_from(annotations, "Qualifier"))
        .or_else(|| name_from(annotations, "Named"))
}

/// `getBean("name")`, `getBean(Foo.class)` and `getBean("name", Foo.class)` lookups.
fn bean_lookups(
    ctx: &CollectContext<'_>,
    scanned: &ScannedType<'_>,
    body: &[Expr],
    owner: &str,
    points: &mut InjectionPointStore,
) {
    walk(body, &mut |expr| {
        let Expr::Call { name: method, args, .. } = expr else {
            return;
        };
        if method != "getBean" {
            return;
        }
        let request = InjectionRequest {
            ty: args
                .iter()
                .find_map(Expr::as_class_literal)
                .and_then(|ty| resolve_type(ctx, scanned, ty)),
            name: args.iter().find_map(Expr::as_string_literal).map(str::to_string),
            qualifiers: BTreeSet::new(),
        };
        points.add(owner, request);
    });
}

impl Framework for Spring {
    fn prefix(&self) -> &'static str {
        "spring"
    }

    fn edge_type(&self) -> EdgeType {
        EdgeType::DiSpring
    }

    fn collect_beans(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> BeanIndex {
        let mut index = BeanIndex::new();
        for scanned in types {
            if scanned.decl.is_concrete_class()
                && let Some(annotation) = stereotype(scanned)
            {
                let mut names = annotation_names(annotation);
                if names.is_empty() {
                    names.push(lower_camel(&scanned.decl.name));
                }
                names.extend(name_from(&scanned.decl.annotations, "Qualifier"));
                let bean = Bean::new(
                    scanned.id,
                    BeanSource::Type(scanned.id.to_string()),
                    type_bean_nodes(ctx, scanned.id),
                );
                index.register(bean, names, type_closure(ctx, scanned.id), []);
            }

            for (entry, member) in scanned.members() {
                let Member::Method(method) = member else {
                    continue;
                };
                let Some(annotation) = method.annotation("Bean") else {
                    continue;
                };
                let mut names = annotation_names(annotation);
                if names.is_empty() {
                    names.push(method.name.clone());
                }
                names.extend(name_from(&method.annotations, "Qualifier"));
                let provided = method
                    .return_type
                    .as_ref()
                    .and_then(|ty| resolve_type(ctx, scanned, ty))
                    .map(|id| type_closure(ctx, &id))
                    .unwrap_or_default();
                let bean = Bean::new(
                    scanned.id,
                    BeanSource::Methods(BTreeSet::from([entry.id.clone()])),
                    BTreeSet::from([member_node(ctx, scanned, entry)]),
                );
                index.register(bean, names, provided, []);
            }
        }
        index
    }

    fn collect_injection_points(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> InjectionPointStore {
        let mut points = InjectionPointStore::new();
        let none = BTreeSet::new();
        for scanned in types {
            // A component with a single constructor is autowired through it.
            let implicit_constructor = stereotype(scanned).is_some() && scanned.decl.constructors().count() == 1;
            for (entry, member) in scanned.members() {
                let owner = member_node(ctx, scanned, entry);
                match member {
                    Member::Field(field) => {
                        if injected(&field.annotations) {
                            let name = requested_name(&field.annotations);
                            for request in requests(ctx, scanned, &field.ty, name, &none) {
                                points.add(owner.clone(), request);
                            }
                        }
                        if let Some(init) = &field.initializer {
                            bean_lookups(ctx, scanned, std::slice::from_ref(init), &owner, &mut points);
                        }
                    }
                    Member::Method(method) | Member::Constructor(method) => {
                        let constructor = matches!(member, Member::Constructor(_));
                        let wired = injected(&method.annotations)
                            || method.annotation("Bean").is_some()
                            || (constructor && implicit_constructor);
                        if wired {
                            for param in &method.params {
                                let name = requested_name(&param.annotations);
                                for request in requests(ctx, scanned, &param.ty, name, &none) {
                                    points.add(owner.clone(), request);
                                }
                            }
                        }
                        bean_lookups(ctx, scanned, method.statements(), &owner, &mut points);
                    }
                    Member::Initializer(_) => {}
                }
            }
        }
        points
    }

    fn config_file(&self) -> Option<&'static str> {
        Some("xmlbeans")
    }

    fn config_entries(&self, revision: &ParsedRevision) -> BTreeMap<String, i32> {
        revision
            .descriptor
            .spring_beans
            .iter()
            .map(|bean| (xml_node(&bean.id), xml_hash(bean)))
            .collect()
    }

    fn config_beans(&self, ctx: &CollectContext<'_>) -> BeanIndex {
        let mut index = BeanIndex::new();
        for xml in &ctx.revision.descriptor.spring_beans {
            let node = xml_node(&xml.id);
            let bean = Bean::new(
                node.clone(),
                BeanSource::Config(xml.id.clone()),
                BTreeSet::from([node]),
            );
            let names = std::iter::once(xml.id.clone()).chain(xml.names.iter().cloned());
            index.register(bean, names, type_closure(ctx, &xml.class), []);
        }
        index
    }

    /// XML bean node → constructors (or type) of its class.
    fn config_edges(&self, ctx: &CollectContext<'_>, graph: &mut DependencyGraph) {
        for xml in &ctx.revision.descriptor.spring_beans {
            let node = xml_node(&xml.id);
            graph.add_node(node.clone());
            for target in type_bean_nodes(ctx, &xml.class) {
                graph.connect(&node, &target, EdgeType::DiSpring);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::source::Descriptor;

    fn xml(id: &str, class: &str) -> XmlBean {
        XmlBean {
            id: id.to_string(),
            names: vec![],
            class: class.to_string(),
        }
    }

    #[test]
    fn test_xml_entries_hash_content() {
        let mut revision = ParsedRevision::default();
        revision.descriptor = Descriptor {
            spring_beans: vec![xml("repo", "org.acme.Repo")],
            cdi_alternatives: vec![],
        };
        let before = Spring.config_entries(&revision);
        revision.descriptor.spring_beans[0].class = "org.acme.OtherRepo".to_string();
        let after = Spring.config_entries(&revision);

        assert_eq!(before.keys().collect::<Vec<_>>(), vec!["spring-xml:repo"]);
        assert_ne!(before["spring-xml:repo"], after["spring-xml:repo"]);
    }

    #[test]
    fn test_requested_name_prefers_resource_name() {
        let annotation = |name: &str, key: &str, value: &str| Annotation {
            name: name.to_string(),
            symbol: None,
            args: BTreeMap::from([(key.to_string(), value.to_string())]),
        };
        let annotations = vec![
            annotation("Qualifier", "value", "\"q\""),
            annotation("Resource", "name", "r"),
        ];
        assert_eq!(requested_name(&annotations), Some("r".to_string()));
        assert_eq!(requested_name(&annotations[..1]), Some("q".to_string()));
    }
}
