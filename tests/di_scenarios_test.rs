//! Dependency-injection edges through full pipeline runs: Spring, Guice and CDI.

mod common;

use std::collections::BTreeSet;

use common::fixtures::{alternative_module, cdi_module, guice_module, spring_module, xml_bean, xml_module};
use common::mock::{MemorySource, MemoryStore};
use common::{graph, select, settings, spring_settings};
use rts_graph::domain::di::{Bean, BeanIndex, BeanSource, InjectionPointStore, InjectionRequest, join};
use rts_graph::domain::edge::EdgeType;
use rts_graph::domain::graph::DependencyGraph;
use rts_graph::domain::level::Granularity;
use rts_graph::domain::modification::{Modification, ModificationReport};
use rts_graph::domain::snapshot::framework_file;
use rts_graph::domain::source::{Descriptor, XmlBean};

const BAR_FOO: &str = "org.acme.Bar.foo";
const BAR_TEST: &str = "org.acme.BarTest.testRun()";

fn has_edge(report: &ModificationReport, from: &str, to: &str, edge_type: EdgeType) -> bool {
    report
        .edges
        .iter()
        .any(|e| e.from == from && e.to == to && e.edge_type == edge_type)
}

#[test]
fn test_spring_field_injection_joins_component() {
    let store = MemoryStore::new();
    let report = graph(&spring_settings(Granularity::Method), MemorySource::new(spring_module("1", false)), &store);

    assert!(has_edge(&report, BAR_FOO, "org.acme.Foo.<init>()", EdgeType::DiSpring));
    assert!(store.get(&framework_file("spring", "beans", Granularity::Method)).is_some());
    assert!(store.get(&framework_file("spring", "injectionpoints", Granularity::Method)).is_some());
}

/// A second `Foo` bean with its own qualifier makes the type-only request ambiguous: both
/// beans are edged and the consumer's test is selected.
#[test]
fn test_scenario_b_type_only_request_joins_both_beans() {
    let store = MemoryStore::new();
    let level = spring_settings(Granularity::Method);
    select(&level, MemorySource::new(spring_module("1", false)), &store);

    let report = graph(&level, MemorySource::new(spring_module("1", true)), &store);

    assert!(has_edge(&report, BAR_FOO, "org.acme.Foo.<init>()", EdgeType::DiSpring));
    assert!(has_edge(&report, BAR_FOO, "org.acme.SpecialFoo.<init>()", EdgeType::DiSpring));
}

#[test]
fn test_scenario_b_selects_consumer_test() {
    let store = MemoryStore::new();
    let level = spring_settings(Granularity::Method);
    select(&level, MemorySource::new(spring_module("1", false)), &store);

    let report = select(&level, MemorySource::new(spring_module("1", true)), &store);

    assert!(report.selected_tests().contains(BAR_TEST));
}

#[test]
fn test_bean_change_reaches_tests_only_through_di_edges() {
    let store = MemoryStore::new();
    let level = spring_settings(Granularity::Method);
    select(&level, MemorySource::new(spring_module("1", false)), &store);

    let mut standalone = level.clone();
    standalone.standalone = true;
    standalone.overwrite = false;
    let report = select(&standalone, MemorySource::new(spring_module("2", false)), &store);
    assert!(report.included.is_empty());
    assert_eq!(report.excluded, BTreeSet::from([BAR_TEST.to_string()]));

    let report = select(&level, MemorySource::new(spring_module("2", false)), &store);
    assert_eq!(
        report.included.get("org.acme.Foo.<init>()"),
        Some(&BTreeSet::from([BAR_TEST.to_string()]))
    );
}

#[test]
fn test_spring_disabled_collects_no_injection_edges() {
    let store = MemoryStore::new();
    let report = graph(&settings(Granularity::Method), MemorySource::new(spring_module("1", false)), &store);

    assert!(report.edges.iter().all(|e| !e.edge_type.is_dependency_injection()));
    assert!(store.get(&framework_file("spring", "beans", Granularity::Method)).is_none());
}

#[test]
fn test_guice_module_binding_and_just_in_time_bean() {
    let store = MemoryStore::new();
    let mut level = settings(Granularity::Method);
    level.di.guice = true;
    let report = graph(&level, MemorySource::new(guice_module("1")), &store);

    let point = "org.acme.Client.service";
    assert!(has_edge(&report, point, "org.acme.ServiceImpl.<init>()", EdgeType::DiGuice));
    assert!(has_edge(&report, point, "org.acme.AppModule.configure()", EdgeType::DiGuice));

    let report = select(&level, MemorySource::new(guice_module("2")), &store);
    assert!(report.selected_tests().contains("org.acme.ClientTest.testRun()"));
}

#[test]
fn test_cdi_qualifier_selects_matching_bean_only() {
    let store = MemoryStore::new();
    let mut level = settings(Granularity::Method);
    level.di.cdi = true;
    let report = graph(&level, MemorySource::new(cdi_module()), &store);

    let point = "org.acme.Car.engine";
    assert!(has_edge(&report, point, "org.acme.FastEngine.<init>()", EdgeType::DiCdi));
    assert!(!has_edge(&report, point, "org.acme.SlowEngine.<init>()", EdgeType::DiCdi));
}

#[test]
fn test_cdi_at_type_level_edges_types() {
    let store = MemoryStore::new();
    let mut level = settings(Granularity::Type);
    level.di.cdi = true;
    let report = graph(&level, MemorySource::new(cdi_module()), &store);

    assert!(has_edge(&report, "org.acme.Car", "org.acme.FastEngine", EdgeType::DiCdi));
    assert!(!has_edge(&report, "org.acme.Car", "org.acme.SlowEngine", EdgeType::DiCdi));
}

/// Request (type T, qualifier Q) against B1 (T, Q) and B2 (T, other): only B1 is joined.
#[test]
fn test_join_requires_every_requested_criterion() {
    let mut beans = BeanIndex::new();
    let b1 = Bean::new("B1", BeanSource::Type("B1".into()), BTreeSet::from(["B1.<init>()".to_string()]));
    let b2 = Bean::new("B2", BeanSource::Type("B2".into()), BTreeSet::from(["B2.<init>()".to_string()]));
    beans.register(b1, [], ["T".to_string()], ["Q".to_string()]);
    beans.register(b2, [], ["T".to_string()], ["Other".to_string()]);

    let mut points = InjectionPointStore::new();
    points.add(
        "Client.field",
        InjectionRequest {
            ty: Some("T".into()),
            name: None,
            qualifiers: BTreeSet::from(["Q".to_string()]),
        },
    );

    let mut graph = DependencyGraph::new();
    let inserted = join(&mut graph, &points, &beans, EdgeType::DiCdi);

    assert_eq!(inserted, 1);
    assert!(graph.has_edge("Client.field", "B1.<init>()", EdgeType::DiCdi));
    assert!(!graph.has_edge("Client.field", "B2.<init>()", EdgeType::DiCdi));
}

fn with_beans(beans: Vec<XmlBean>) -> Descriptor {
    Descriptor {
        spring_beans: beans,
        ..Descriptor::default()
    }
}

/// Renaming an XML bean modifies its synthetic node, which reaches the autowiring component's
/// test.
#[test]
fn test_spring_xml_bean_change_selects_consumer_test() {
    let store = MemoryStore::new();
    let level = spring_settings(Granularity::Method);
    let revision = |names: &[&str]| {
        MemorySource::new(xml_module()).with_descriptor(with_beans(vec![xml_bean("repo", names, "org.acme.Repo")]))
    };
    select(&level, revision(&[]), &store);
    assert!(store.get(&framework_file("spring", "xmlbeans", Granularity::Method)).is_some());

    let report = graph(&level, revision(&["repository"]), &store);
    assert!(has_edge(&report, "org.acme.Service.repo", "spring-xml:repo", EdgeType::DiSpring));
    assert!(has_edge(&report, "spring-xml:repo", "org.acme.Repo.<init>()", EdgeType::DiSpring));
    assert_eq!(report.nodes.get("spring-xml:repo"), Some(&Modification::Modified));

    let selection = select(&level, revision(&["repository"]), &store);
    let triggered = selection.included.get("spring-xml:repo").expect("xml bean triggers the selection");
    assert!(triggered.contains("org.acme.ServiceTest.testRun()"));
}

/// Enabling an alternative in `beans.xml` adds its node and selects the injecting test.
#[test]
fn test_cdi_alternative_enabled_in_descriptor_selects_injecting_test() {
    let store = MemoryStore::new();
    let mut level = settings(Granularity::Method);
    level.di.cdi = true;
    let enabled = || {
        MemorySource::new(alternative_module()).with_descriptor(Descriptor {
            cdi_alternatives: vec!["org.acme.MockEngine".to_string()],
            ..Descriptor::default()
        })
    };
    select(&level, MemorySource::new(alternative_module()), &store);

    let report = graph(&level, enabled(), &store);
    assert!(has_edge(
        &report,
        "org.acme.MockEngine.<init>()",
        "cdi-alternative:org.acme.MockEngine",
        EdgeType::DiCdi
    ));
    assert_eq!(report.nodes.get("cdi-alternative:org.acme.MockEngine"), Some(&Modification::Added));

    let selection = select(&level, enabled(), &store);
    assert!(selection.selected_tests().contains("org.acme.CarTest.testDrive()"));
    assert!(selection.included.contains_key("cdi-alternative:org.acme.MockEngine"));
    assert!(store.get(&framework_file("cdi", "alternatives", Granularity::Method)).is_some());
}
