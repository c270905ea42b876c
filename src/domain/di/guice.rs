//! Guice: module bindings, provider methods, `@ImplementedBy`/`@ProvidedBy`, auto-bound
//! singletons and just-in-time bindings.

use super::{
    Bean, BeanIndex, BeanSource, Framework, InjectionPointStore, InjectionRequest, ScannedType,
    member_node, name_from, qualifiers, requests, resolve_type, resolve_type_name, type_bean_nodes,
    type_closure,
};
use crate::domain::collectors::{CollectContext, walk};
use crate::domain::edge::EdgeType;
use crate::domain::level::Granularity;
use crate::domain::source::{Annotation, Expr, Member, TypeRef};
use std::collections::BTreeSet;

const PROVIDES: [&str; 3] = ["Provides", "ProvidesIntoSet", "ProvidesIntoMap"];

/// Annotations marking a binding annotation declaration.
const MARKERS: [&str; 2] = ["BindingAnnotation", "Qualifier"];

#[derive(Debug, Clone, Copy, Default)]
pub struct Guice;

enum Target<'e> {
    Type(&'e TypeRef),
    Provider(&'e TypeRef),
    Instance,
}

/// `bind(Key.class)[.annotatedWith(..)].to*(..)` found in a module body.
struct Binding<'e> {
    key: &'e TypeRef,
    name: Option<String>,
    qualifier: Option<&'e TypeRef>,
    target: Target<'e>,
}

fn bindings(body: &[Expr]) -> Vec<Binding<'_>> {
    let mut found = Vec::new();
    walk(body, &mut |expr| {
        let Expr::Call {
            name,
            receiver: Some(receiver),
            args,
            ..
        } = expr
        else {
            return;
        };
        let literal = args.first().and_then(Expr::as_class_literal);
        let target = match name.as_str() {
            "to" => literal.map(Target::Type),
            "toProvider" => Some(literal.map_or(Target::Instance, Target::Provider)),
            "toInstance" | "toConstructor" => Some(Target::Instance),
            _ => None,
        };
        if let Some(target) = target
            && let Some(binding) = binding_chain(receiver, target)
        {
            found.push(binding);
        }
    });
    found
}

fn binding_chain<'e>(mut expr: &'e Expr, target: Target<'e>) -> Option<Binding<'e>> {
    let mut name = None;
    let mut qualifier = None;
    loop {
        let Expr::Call {
            name: method,
            receiver,
            args,
            ..
        } = expr
        else {
            return None;
        };
        match method.as_str() {
            "bind" => {
                let key = args.first()?.as_class_literal()?;
                return Some(Binding {
                    key,
                    name,
                    qualifier,
                    target,
                });
            }
            "annotatedWith" => match args.first() {
                Some(Expr::Call { name: n, args, .. }) if n == "named" => {
                    name = args.first().and_then(Expr::as_string_literal).map(str::to_string);
                }
                Some(arg) => qualifier = arg.as_class_literal(),
                None => {}
            },
            _ => return None,
        }
        expr = receiver.as_deref()?;
    }
}

/// Name from `@Named` and the binding annotations of a declaration.
fn binding_key(
    ctx: &CollectContext<'_>,
    scanned: &ScannedType<'_>,
    annotations: &[Annotation],
) -> (Option<String>, BTreeSet<String>) {
    (
        name_from(annotations, "Named"),
        qualifiers(ctx, scanned, annotations, &MARKERS),
    )
}

/// Concrete class Guice can construct on demand.
fn just_in_time(scanned: &ScannedType<'_>) -> bool {
    if !scanned.decl.is_concrete_class() {
        return false;
    }
    let mut constructors = scanned.decl.constructors().peekable();
    constructors.peek().is_none()
        || constructors.any(|c| c.annotation("Inject").is_some() || (c.params.is_empty() && !c.has_modifier("private")))
}

/// `get()` of a provider class plus the provider's own construction.
fn provider_nodes(ctx: &CollectContext<'_>, provider: &str) -> BTreeSet<String> {
    let mut nodes = type_bean_nodes(ctx, provider);
    if ctx.level != Granularity::Type
        && let Some(get) = ctx.index.method_with_signature(provider, "get()")
    {
        nodes.insert(get.id.clone());
    }
    nodes
}

fn annotated_type(ctx: &CollectContext<'_>, scanned: &ScannedType<'_>, annotation: &str) -> Option<String> {
    let value = scanned.decl.annotation(annotation)?.arg("value")?;
    resolve_type_name(ctx, scanned, value)
}

impl Framework for Guice {
    fn prefix(&self) -> &'static str {
        "guice"
    }

    fn edge_type(&self) -> EdgeType {
        EdgeType::DiGuice
    }

    fn collect_beans(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> BeanIndex {
        let mut index = BeanIndex::new();
        for scanned in types {
            let id = scanned.id;
            if just_in_time(scanned) {
                let bean = Bean::new(id, BeanSource::Type(id.to_string()), type_bean_nodes(ctx, id));
                index.register(bean, [], type_closure(ctx, id), []);
            }
            if let Some(annotation) = scanned.decl.annotation("AutoBindSingleton") {
                let mut keys = type_closure(ctx, id);
                keys.extend(
                    annotation
                        .arg("baseClass")
                        .and_then(|base| resolve_type_name(ctx, scanned, base)),
                );
                let bean = Bean::new(id, BeanSource::Type(id.to_string()), type_bean_nodes(ctx, id));
                index.register(bean, [], keys, []);
            }
            if let Some(implementation) = annotated_type(ctx, scanned, "ImplementedBy") {
                let nodes = type_bean_nodes(ctx, &implementation);
                let bean = Bean::new(id, BeanSource::Type(implementation), nodes);
                index.register(bean, [], type_closure(ctx, id), []);
            }
            if let Some(provider) = annotated_type(ctx, scanned, "ProvidedBy") {
                let nodes = provider_nodes(ctx, &provider);
                let bean = Bean::new(id, BeanSource::Type(provider), nodes);
                index.register(bean, [], type_closure(ctx, id), []);
            }

            for (entry, member) in scanned.members() {
                let Member::Method(method) = member else {
                    continue;
                };
                let node = member_node(ctx, scanned, entry);
                let source = BeanSource::Methods(BTreeSet::from([entry.id.clone()]));

                if PROVIDES.iter().any(|p| method.annotation(p).is_some()) {
                    let provided = method
                        .return_type
                        .as_ref()
                        .and_then(|ty| resolve_type(ctx, scanned, ty))
                        .map(|ty| type_closure(ctx, &ty))
                        .unwrap_or_default();
                    let (name, qualifiers) = binding_key(ctx, scanned, &method.annotations);
                    let bean = Bean::new(id, source.clone(), BTreeSet::from([node.clone()]));
                    index.register(bean, name, provided, qualifiers);
                }

                for binding in bindings(method.statements()) {
                    let Some(key) = resolve_type(ctx, scanned, binding.key) else {
                        continue;
                    };
                    let mut nodes = BTreeSet::from([node.clone()]);
                    match binding.target {
                        Target::Type(ty) => {
                            if let Some(target) = resolve_type(ctx, scanned, ty) {
                                nodes.extend(type_bean_nodes(ctx, &target));
                            }
                        }
                        Target::Provider(ty) => {
                            if let Some(provider) = resolve_type(ctx, scanned, ty) {
                                nodes.extend(provider_nodes(ctx, &provider));
                            }
                        }
                        Target::Instance => {}
                    }
                    let qualifier = binding.qualifier.and_then(|q| resolve_type(ctx, scanned, q));
                    let bean = Bean::new(id, source.clone(), nodes);
                    index.register(bean, binding.name, type_closure(ctx, &key), qualifier);
                }
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
                        let (name, qualifiers) = binding_key(ctx, scanned, &field.annotations);
                        for request in requests(ctx, scanned, &field.ty, name, &qualifiers) {
                            points.add(owner.clone(), request);
                        }
                    }
                    Member::Method(method) | Member::Constructor(method) => {
                        let injected = method.annotation("Inject").is_some()
                            || PROVIDES.iter().any(|p| method.annotation(p).is_some());
                        if injected {
                            for param in &method.params {
                                let (name, qualifiers) = binding_key(ctx, scanned, &param.annotations);
                                for request in requests(ctx, scanned, &param.ty, name, &qualifiers) {
                                    points.add(owner.clone(), request);
                                }
                            }
                        }
                        instance_lookups(ctx, scanned, method.statements(), &owner, &mut points);
                    }
                    _ => {}
                }
            }
        }
        points
    }
}

/// `injector.getInstance(Foo.class)` and `getProvider(Foo.class)`.
fn instance_lookups(
    ctx: &CollectContext<'_>,
    scanned: &ScannedType<'_>,
    body: &[Expr],
    owner: &str,
    points: &mut InjectionPointStore,
) {
    walk(body, &mut |expr| {
        let Expr::Call { name, args, .. } = expr else {
            return;
        };
        if name != "getInstance" && name != "getProvider" {
            return;
        }
        if let Some(ty) = args
            .first()
            .and_then(Expr::as_class_literal)
            .and_then(|ty| resolve_type(ctx, scanned, ty))
        {
            points.add(owner, InjectionRequest::by_type(ty));
        }
    });
}
