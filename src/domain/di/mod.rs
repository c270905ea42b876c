//! Dependency injection: bean index, injection points and the join between them.
//!
//! Each framework module scans impacted types for beans and injection points. Beans are indexed
//! under names, under every structural ancestor of the provided type and under qualifier
//! identities. An injection point is joined to the intersection of the lookups for exactly the
//! criteria it specifies.

pub mod cdi;
pub mod guice;
pub mod spring;

use crate::domain::collectors::{CollectContext, zero_arg_constructor};
use crate::domain::edge::EdgeType;
use crate::domain::graph::DependencyGraph;
use crate::domain::hierarchy::OBJECT;
use crate::domain::index::{MemberEntry, TypeEntry};
use crate::domain::level::{DeclKind, Granularity};
use crate::domain::ports::Reference;
use crate::domain::source::{Annotation, CompilationUnit, Member, ParsedRevision, TypeDecl, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, trace};

/// What declares a bean.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum BeanSource {
    /// A managed or component class.
    Type(String),
    /// Producer method with its disposers, or the module method holding a binding.
    Methods(BTreeSet<String>),
    /// Producer field.
    Field(String),
    /// Configuration entry outside the sources (XML bean definition).
    Config(String),
}

impl fmt::Display for BeanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeanSource::Type(id) => write!(f, "type {id}"),
            BeanSource::Methods(ids) => {
                let joined: Vec<&str> = ids.iter().map(String::as_str).collect();
                write!(f, "methods {{{}}}", joined.join(", "))
            }
            BeanSource::Field(id) => write!(f, "field {id}"),
            BeanSource::Config(id) => write!(f, "config {id}"),
        }
    }
}

/// A bean and the graph nodes an injection of it depends on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bean {
    /// Type (or configuration node) whose scan discovers the bean.
    pub declared_in: String,
    pub source: BeanSource,
    pub nodes: BTreeSet<String>,
}

impl Bean {
    pub fn new(declared_in: impl Into<String>, source: BeanSource, nodes: BTreeSet<String>) -> Self {
        Self {
            declared_in: declared_in.into(),
            source,
            nodes,
        }
    }

    fn touches(&self, ids: &BTreeSet<String>) -> bool {
        self.nodes.iter().any(|n| ids.contains(n))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanIndex {
    #[serde(default)]
    beans: BTreeSet<Bean>,
    #[serde(default)]
    by_name: BTreeMap<String, BTreeSet<Bean>>,
    #[serde(default)]
    by_type: BTreeMap<String, BTreeSet<Bean>>,
    #[serde(default)]
    by_qualifier: BTreeMap<String, BTreeSet<Bean>>,
}

impl BeanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a bean without any lookup key.
    pub fn insert(&mut self, bean: &Bean) {
        self.beans.insert(bean.clone());
    }

    pub fn add_by_name(&mut self, name: impl Into<String>, bean: &Bean) {
        self.insert(bean);
        self.by_name.entry(name.into()).or_default().insert(bean.clone());
    }

    pub fn add_by_type(&mut self, type_id: impl Into<String>, bean: &Bean) {
        self.insert(bean);
        self.by_type.entry(type_id.into()).or_default().insert(bean.clone());
    }

    pub fn add_by_qualifier(&mut self, qualifier: impl Into<String>, bean: &Bean) {
        self.insert(bean);
        self.by_qualifier
            .entry(qualifier.into())
            .or_default()
            .insert(bean.clone());
    }

    /// Registers a bean under all of its keys at once.
    pub fn register<N, T, Q>(&mut self, bean: Bean, names: N, types: T, qualifiers: Q)
    where
        N: IntoIterator<Item = String>,
        T: IntoIterator<Item = String>,
        Q: IntoIterator<Item = String>,
    {
        self.insert(&bean);
        for name in names {
            self.add_by_name(name, &bean);
        }
        for type_id in types {
            self.add_by_type(type_id, &bean);
        }
        for qualifier in qualifiers {
            self.add_by_qualifier(qualifier, &bean);
        }
    }

    pub fn remove(&mut self, bean: &Bean) {
        self.beans.remove(bean);
        for keyed in [&mut self.by_name, &mut self.by_type, &mut self.by_qualifier] {
            keyed.retain(|_, beans| {
                beans.remove(bean);
                !beans.is_empty()
            });
        }
    }

    /// Removes and returns every bean matching `predicate`.
    pub fn take_where(&mut self, mut predicate: impl FnMut(&Bean) -> bool) -> Vec<Bean> {
        let taken: Vec<Bean> = self.beans.iter().filter(|b| predicate(b)).cloned().collect();
        for bean in &taken {
            self.remove(bean);
        }
        taken
    }

    /// Beans matching every criterion the request specifies. A request without any criterion
    /// matches nothing.
    pub fn lookup(&self, request: &InjectionRequest) -> Vec<&Bean> {
        let mut criteria = Vec::new();
        if let Some(ty) = &request.ty {
            criteria.push(self.by_type.get(ty));
        }
        if let Some(name) = &request.name {
            criteria.push(self.by_name.get(name));
        }
        for qualifier in &request.qualifiers {
            criteria.push(self.by_qualifier.get(qualifier));
        }
        let Some(sets) = criteria.into_iter().collect::<Option<Vec<_>>>() else {
            return Vec::new();
        };
        let Some((first, rest)) = sets.split_first() else {
            return Vec::new();
        };
        first
            .iter()
            .filter(|bean| rest.iter().all(|set| set.contains(*bean)))
            .collect()
    }

    pub fn merge(&mut self, other: BeanIndex) {
        self.beans.extend(other.beans);
        for (mine, theirs) in [
            (&mut self.by_name, other.by_name),
            (&mut self.by_type, other.by_type),
            (&mut self.by_qualifier, other.by_qualifier),
        ] {
            for (key, beans) in theirs {
                mine.entry(key).or_default().extend(beans);
            }
        }
    }

    pub fn beans(&self) -> impl Iterator<Item = &Bean> {
        self.beans.iter()
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }
}

/// What an injection point asks for. Absent criteria are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InjectionRequest {
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub qualifiers: BTreeSet<String>,
}

impl InjectionRequest {
    pub fn by_type(ty: impl Into<String>) -> Self {
        Self {
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ty.is_none() && self.name.is_none() && self.qualifiers.is_empty()
    }
}

impl fmt::Display for InjectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} name={} qualifiers={:?}",
            self.ty.as_deref().unwrap_or("-"),
            self.name.as_deref().unwrap_or("-"),
            self.qualifiers
        )
    }
}

/// Injection points by owning node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPointStore {
    #[serde(default)]
    points: BTreeMap<String, BTreeSet<InjectionRequest>>,
}

impl InjectionPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, owner: impl Into<String>, request: InjectionRequest) {
        if request.is_empty() {
            return;
        }
        self.points.entry(owner.into()).or_default().insert(request);
    }

    pub fn remove(&mut self, owner: &str) {
        self.points.remove(owner);
    }

    pub fn merge(&mut self, other: InjectionPointStore) {
        for (owner, requests) in other.points {
            self.points.entry(owner).or_default().extend(requests);
        }
    }

    pub fn requests(&self, owner: &str) -> impl Iterator<Item = &InjectionRequest> {
        self.points.get(owner).into_iter().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<InjectionRequest>)> {
        self.points.iter().map(|(owner, requests)| (owner.as_str(), requests))
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Inserts an edge from every injection point to every node of every matching bean.
/// Returns the number of edges inserted.
pub fn join(
    graph: &mut DependencyGraph,
    points: &InjectionPointStore,
    beans: &BeanIndex,
    edge_type: EdgeType,
) -> usize {
    let mut inserted = 0;
    for (owner, requests) in points.iter() {
        for request in requests {
            for bean in beans.lookup(request) {
                for node in &bean.nodes {
                    if node == owner {
                        continue;
                    }
                    if !graph.has_edge(owner, node, edge_type) {
                        inserted += 1;
                    }
                    graph.connect(owner, node, edge_type);
                    trace!(from = owner, to = %node, %request, "injection point joined");
                }
            }
        }
    }
    inserted
}

/// Beans and injection points carried from one run to the next for one framework.
#[derive(Debug, Clone, Default)]
pub struct DiState {
    pub beans: BeanIndex,
    pub points: InjectionPointStore,
}

impl DiState {
    /// Forgets the injection points and beans of impacted or vanished nodes and strips their DI
    /// edges. Beans matching `also_impacted` are dropped as well.
    ///
    /// Returns the declaring types of the dropped beans; they must be rescanned so that beans
    /// still declared there are rediscovered.
    pub fn crop(
        &mut self,
        graph: &mut DependencyGraph,
        impacted: &BTreeSet<String>,
        vanished: &BTreeSet<String>,
        edge_type: EdgeType,
        mut also_impacted: impl FnMut(&Bean) -> bool,
    ) -> BTreeSet<String> {
        let only = BTreeSet::from([edge_type]);
        for node in impacted.iter().chain(vanished) {
            self.points.remove(node);
        }
        for node in impacted {
            graph.remove_all_edges_from(node, &only);
        }
        let dropped = self
            .beans
            .take_where(|bean| bean.touches(impacted) || bean.touches(vanished) || also_impacted(bean));
        for bean in &dropped {
            for node in &bean.nodes {
                graph.remove_all_edges_to(node, &only);
            }
        }
        debug!(%edge_type, beans = dropped.len(), "impacted beans dropped");
        dropped.into_iter().map(|bean| bean.declared_in).collect()
    }

    /// Joins the freshly discovered beans and points against each other and against the cached
    /// ones, then caches them. Cached points are never rejoined with cached beans.
    pub fn analyze(
        &mut self,
        graph: &mut DependencyGraph,
        new_beans: BeanIndex,
        new_points: InjectionPointStore,
        edge_type: EdgeType,
    ) {
        let only = BTreeSet::from([edge_type]);
        for bean in new_beans.beans() {
            for node in &bean.nodes {
                graph.remove_all_edges_to(node, &only);
            }
        }
        for owner in new_points.owners() {
            graph.remove_all_edges_from(owner, &only);
        }

        let fresh = join(graph, &new_points, &new_beans, edge_type)
            + join(graph, &self.points, &new_beans, edge_type)
            + join(graph, &new_points, &self.beans, edge_type);
        debug!(
            %edge_type,
            beans = new_beans.len(),
            points = new_points.len(),
            edges = fresh,
            "injection points joined"
        );

        self.beans.merge(new_beans);
        self.points.merge(new_points);
    }
}

/// Discovery rules of one DI framework.
pub trait Framework {
    /// File-name prefix of the persisted indices.
    fn prefix(&self) -> &'static str;

    fn edge_type(&self) -> EdgeType;

    fn collect_beans(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> BeanIndex;

    fn collect_injection_points(&self, ctx: &CollectContext<'_>, types: &[ScannedType<'_>]) -> InjectionPointStore;

    /// Kind of configuration entries persisted for frameworks configured outside the sources.
    fn config_file(&self) -> Option<&'static str> {
        None
    }

    /// Synthetic node → content hash of every configuration entry of a revision.
    fn config_entries(&self, _revision: &ParsedRevision) -> BTreeMap<String, i32> {
        BTreeMap::new()
    }

    /// Beans declared by configuration entries. They are rediscovered on every run.
    fn config_beans(&self, _ctx: &CollectContext<'_>) -> BeanIndex {
        BeanIndex::new()
    }

    /// Edges between the sources and the synthetic nodes of the current configuration.
    fn config_edges(&self, _ctx: &CollectContext<'_>, _graph: &mut DependencyGraph) {}
}

/// One impacted type as seen by the framework scanners.
pub struct ScannedType<'a> {
    pub id: &'a str,
    pub unit: &'a CompilationUnit,
    pub decl: &'a TypeDecl,
    pub entry: &'a TypeEntry,
}

impl<'a> ScannedType<'a> {
    /// Members paired with their index entries; initializer blocks are skipped.
    pub fn members(&self) -> impl Iterator<Item = (&'a MemberEntry, &'a Member)> {
        let decl = self.decl;
        self.entry
            .members
            .iter()
            .filter_map(move |entry| decl.members.get(entry.index).map(|member| (entry, member)))
    }

    pub fn has_annotation(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.decl.annotation(n).is_some())
    }
}

pub fn scan<'a>(ctx: &CollectContext<'a>, types: &'a BTreeSet<String>) -> Vec<ScannedType<'a>> {
    let index = ctx.index;
    let revision = ctx.revision;
    types
        .iter()
        .filter_map(|id| {
            let entry = index.type_entry(id)?;
            let decl = index.type_decl(revision, id)?;
            let unit = index.unit_of(id).and_then(|u| index.unit(revision, u))?;
            Some(ScannedType {
                id: id.as_str(),
                unit,
                decl,
                entry,
            })
        })
        .collect()
}

/// The node an injection point or bean declared by `entry` is attributed to.
pub fn member_node(ctx: &CollectContext<'_>, scanned: &ScannedType<'_>, entry: &MemberEntry) -> String {
    match ctx.level {
        Granularity::Type => scanned.id.to_string(),
        Granularity::Method | Granularity::NonType => entry.id.clone(),
    }
}

/// Nodes an injection of a class bean depends on: the type itself, or its constructors (the
/// implicit one when none is declared). Types outside the revision contribute nothing.
pub fn type_bean_nodes(ctx: &CollectContext<'_>, type_id: &str) -> BTreeSet<String> {
    let Some(entry) = ctx.index.type_entry(type_id) else {
        return BTreeSet::new();
    };
    if ctx.level == Granularity::Type {
        return BTreeSet::from([type_id.to_string()]);
    }
    let constructors: BTreeSet<String> = entry
        .members
        .iter()
        .filter(|m| m.kind == DeclKind::Constructor)
        .map(|m| m.id.clone())
        .collect();
    if !constructors.is_empty() {
        return constructors;
    }
    ctx.index
        .unit_of(type_id)
        .and_then(|unit| ctx.index.unit(ctx.revision, unit))
        .map(|unit| BTreeSet::from([zero_arg_constructor(ctx, unit, type_id)]))
        .unwrap_or_default()
}

/// The type and all its structural ancestors except the root object type.
pub fn type_closure(ctx: &CollectContext<'_>, type_id: &str) -> BTreeSet<String> {
    let mut types = ctx.provider.structural_ancestors(type_id);
    types.insert(type_id.to_string());
    types.remove(OBJECT);
    types
}

pub fn resolve_type(ctx: &CollectContext<'_>, scanned: &ScannedType<'_>, ty: &TypeRef) -> Option<String> {
    ctx.resolve_type(ty, scanned.unit, scanned.id)
}

/// Resolves a type written as a string (annotation argument, configuration entry).
pub fn resolve_type_name(ctx: &CollectContext<'_>, scanned: &ScannedType<'_>, name: &str) -> Option<String> {
    ctx.resolve(Reference::to_type(name, None, scanned.unit, Some(scanned.id)))
}

fn resolve_annotation(ctx: &CollectContext<'_>, scanned: &ScannedType<'_>, annotation: &Annotation) -> Option<String> {
    ctx.resolve(Reference::to_type(
        &annotation.name,
        annotation.symbol.as_deref(),
        scanned.unit,
        Some(scanned.id),
    ))
}

/// Annotations whose own declaration carries one of `markers` (`@Qualifier`,
/// `@BindingAnnotation`), by resolved identifier.
pub fn qualifiers(
    ctx: &CollectContext<'_>,
    scanned: &ScannedType<'_>,
    annotations: &[Annotation],
    markers: &[&str],
) -> BTreeSet<String> {
    annotations
        .iter()
        .filter_map(|annotation| {
            let id = resolve_annotation(ctx, scanned, annotation)?;
            let decl = ctx.index.type_decl(ctx.revision, &id)?;
            markers
                .iter()
                .any(|m| decl.annotation(m).is_some())
                .then_some(id)
        })
        .collect()
}

/// Names given by an annotation's `value` or `name` argument; array syntax is accepted.
pub fn annotation_names(annotation: &Annotation) -> Vec<String> {
    let Some(raw) = annotation.arg("value").or_else(|| annotation.arg("name")) else {
        return Vec::new();
    };
    raw.trim_matches(|c| c == '{' || c == '}')
        .split(',')
        .map(|part| part.trim().trim_matches('"').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// First name given by any of the annotations called `simple`.
pub fn name_from(annotations: &[Annotation], simple: &str) -> Option<String> {
    annotations
        .iter()
        .filter(|a| a.simple_name() == simple)
        .flat_map(annotation_names)
        .next()
}

pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

const ELEMENT_WRAPPERS: [&str; 10] = [
    "java.util.Collection",
    "java.util.List",
    "java.util.Set",
    "java.util.Optional",
    "javax.inject.Provider",
    "jakarta.inject.Provider",
    "com.google.inject.Provider",
    "org.springframework.beans.factory.ObjectProvider",
    "javax.enterprise.inject.Instance",
    "jakarta.enterprise.inject.Instance",
];

const MAP: &str = "java.util.Map";

fn is_a(ctx: &CollectContext<'_>, type_id: &str, target: &str) -> bool {
    type_id == target || ctx.provider.structural_ancestors(type_id).contains(target)
}

/// Requests for an injected type: the type itself and, for collection, map, optional and provider
/// wrappers, the wrapped element type.
pub fn requests(
    ctx: &CollectContext<'_>,
    scanned: &ScannedType<'_>,
    ty: &TypeRef,
    name: Option<String>,
    qualifiers: &BTreeSet<String>,
) -> Vec<InjectionRequest> {
    let resolved = resolve_type(ctx, scanned, ty);
    let mut out = Vec::new();
    let request = InjectionRequest {
        ty: resolved.clone(),
        name: name.clone(),
        qualifiers: qualifiers.clone(),
    };
    if request.is_empty() {
        return out;
    }
    out.push(request);

    let Some(type_id) = resolved else {
        return out;
    };
    let wrapped = if ELEMENT_WRAPPERS.iter().any(|w| is_a(ctx, &type_id, w)) {
        ty.args.first()
    } else if is_a(ctx, &type_id, MAP) {
        ty.args.get(1)
    } else {
        None
    };
    if let Some(inner) = wrapped {
        out.extend(requests(ctx, scanned, inner, name, qualifiers));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bean(id: &str) -> Bean {
        Bean::new(id, BeanSource::Type(id.to_string()), BTreeSet::from([id.to_string()]))
    }

    #[test]
    fn test_lookup_intersects_specified_criteria() {
        let mut index = BeanIndex::new();
        let b1 = bean("B1");
        let b2 = bean("B2");
        index.register(b1.clone(), [], ["T".to_string()], ["Q".to_string()]);
        index.register(b2.clone(), [], ["T".to_string()], ["Other".to_string()]);

        let request = InjectionRequest {
            ty: Some("T".into()),
            name: None,
            qualifiers: BTreeSet::from(["Q".to_string()]),
        };
        assert_eq!(index.lookup(&request), vec![&b1]);
    }

    #[test]
    fn test_type_only_lookup_returns_every_candidate() {
        let mut index = BeanIndex::new();
        index.register(bean("B1"), [], ["T".to_string()], []);
        index.register(bean("B2"), ["b2".to_string()], ["T".to_string()], []);
        assert_eq!(index.lookup(&InjectionRequest::by_type("T")).len(), 2);
    }

    #[test]
    fn test_unknown_criterion_matches_nothing() {
        let mut index = BeanIndex::new();
        index.register(bean("B1"), ["foo".to_string()], ["T".to_string()], []);
        let request = InjectionRequest {
            ty: Some("T".into()),
            name: Some("bar".into()),
            qualifiers: BTreeSet::new(),
        };
        assert!(index.lookup(&request).is_empty());
        assert!(index.lookup(&InjectionRequest::default()).is_empty());
    }

    #[test]
    fn test_remove_clears_every_key() {
        let mut index = BeanIndex::new();
        let b1 = bean("B1");
        index.register(b1.clone(), ["n".to_string()], ["T".to_string()], ["Q".to_string()]);
        index.remove(&b1);
        assert!(index.is_empty());
        assert_eq!(index, BeanIndex::new());
    }

    #[test]
    fn test_join_edges_every_bean_node() {
        let mut index = BeanIndex::new();
        let producer = Bean::new(
            "P",
            BeanSource::Methods(["P.make()".to_string(), "P.dispose(Foo)".to_string()].into()),
            ["P.make()".to_string(), "P.dispose(Foo)".to_string()].into(),
        );
        index.register(producer, [], ["Foo".to_string()], []);
        let mut points = InjectionPointStore::new();
        points.add("C.foo", InjectionRequest::by_type("Foo"));

        let mut graph = DependencyGraph::new();
        assert_eq!(join(&mut graph, &points, &index, EdgeType::DiCdi), 2);
        assert!(graph.has_edge("C.foo", "P.make()", EdgeType::DiCdi));
        assert!(graph.has_edge("C.foo", "P.dispose(Foo)", EdgeType::DiCdi));
    }

    #[test]
    fn test_analyze_skips_cached_pairs() {
        let mut state = DiState::default();
        state.beans.register(bean("Old"), [], ["T".to_string()], []);
        state.points.add("cached", InjectionRequest::by_type("T"));

        let mut new_beans = BeanIndex::new();
        new_beans.register(bean("New"), [], ["T".to_string()], []);
        let mut new_points = InjectionPointStore::new();
        new_points.add("fresh", InjectionRequest::by_type("T"));

        let mut graph = DependencyGraph::new();
        state.analyze(&mut graph, new_beans, new_points, EdgeType::DiSpring);

        assert!(graph.has_edge("fresh", "New", EdgeType::DiSpring));
        assert!(graph.has_edge("fresh", "Old", EdgeType::DiSpring));
        assert!(graph.has_edge("cached", "New", EdgeType::DiSpring));
        assert!(!graph.has_edge("cached", "Old", EdgeType::DiSpring));
        assert_eq!(state.beans.len(), 2);
    }

    #[test]
    fn test_crop_drops_impacted_beans_and_points() {
        let mut state = DiState::default();
        let b = bean("B");
        state.beans.register(b, [], ["T".to_string()], []);
        state.points.add("P", InjectionRequest::by_type("T"));
        let mut graph = DependencyGraph::new();
        graph.connect("P", "B", EdgeType::DiGuice);
        graph.connect("Q", "B", EdgeType::DiGuice);

        let impacted = BTreeSet::from(["B".to_string()]);
        let rescan = state.crop(&mut graph, &impacted, &BTreeSet::new(), EdgeType::DiGuice, |_| false);

        assert!(state.beans.is_empty());
        assert_eq!(rescan, impacted);
        assert_eq!(state.points.len(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_annotation_names_accepts_arrays() {
        let annotation = Annotation {
            name: "Bean".into(),
            symbol: None,
            args: BTreeMap::from([("name".to_string(), "{\"a\", \"b\"}".to_string())]),
        };
        assert_eq!(annotation_names(&annotation), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(lower_camel("FooService"), "fooService");
    }
}
