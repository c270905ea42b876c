//! Test fixture generators for integration tests.
//!
//! Units are written as JSON in the frontend's format, so the fixtures double as examples of
//! the source model.
#![allow(dead_code)]

use rts_graph::domain::source::{CompilationUnit, XmlBean};
use serde_json::{Value, json};

pub const PACKAGE: &str = "org.acme";

pub fn unit(file: &str, types: Value) -> CompilationUnit {
    unit_in(PACKAGE, file, &[], types)
}

pub fn unit_in(package: &str, file: &str, imports: &[&str], types: Value) -> CompilationUnit {
    let path = format!("{}/{file}", package.replace('.', "/"));
    serde_json::from_value(json!({
        "path": path,
        "package": package,
        "imports": imports,
        "types": types,
    }))
    .expect("valid unit fixture")
}

pub fn path_of(file: &str) -> String {
    format!("{}/{file}", PACKAGE.replace('.', "/"))
}

pub fn id(name: &str) -> String {
    format!("{PACKAGE}.{name}")
}

pub fn annotation(name: &str) -> Value {
    json!({ "name": name })
}

pub fn annotation_with(name: &str, value: &str) -> Value {
    json!({ "name": name, "args": { "value": value } })
}

pub fn method(name: &str, body: Vec<Value>) -> Value {
    json!({ "member": "method", "name": name, "modifiers": ["public"], "body": body })
}

pub fn test_method(name: &str, body: Vec<Value>) -> Value {
    json!({
        "member": "method",
        "name": name,
        "modifiers": ["public"],
        "annotations": [annotation("Test")],
        "body": body,
    })
}

pub fn constructor(name: &str, annotations: Vec<Value>, body: Vec<Value>) -> Value {
    json!({
        "member": "constructor",
        "name": name,
        "modifiers": ["public"],
        "annotations": annotations,
        "body": body,
    })
}

pub fn field(name: &str, ty: &str, annotations: Vec<Value>) -> Value {
    json!({ "member": "field", "name": name, "type": { "name": ty }, "annotations": annotations })
}

/// `new Receiver().name()`, pre-resolved to `symbol`.
pub fn call_on_new(receiver: &str, name: &str, symbol: &str) -> Value {
    json!({
        "expr": "call",
        "name": name,
        "receiver": { "expr": "new", "type": { "name": receiver } },
        "symbol": symbol,
    })
}

pub fn call(name: &str, receiver: Option<Value>, args: Vec<Value>) -> Value {
    json!({ "expr": "call", "name": name, "receiver": receiver, "args": args })
}

pub fn class_literal(ty: &str) -> Value {
    json!({ "expr": "type_name", "type": { "name": ty } })
}

pub fn field_read(name: &str, symbol: &str) -> Value {
    json!({ "expr": "field_read", "name": name, "symbol": symbol })
}

pub fn literal(value: &str) -> Value {
    json!({ "expr": "literal", "value": value })
}

/// `A.m()` delegates to `B.n()`; test `T.testX()` calls `A.m()`. `n_body` is the literal
/// returned by `B.n()`.
pub fn scenario_a(n_body: &str) -> Vec<CompilationUnit> {
    vec![
        unit(
            "A.java",
            json!([{
                "name": "A",
                "members": [method("m", vec![call_on_new("B", "n", "org.acme.B.n()")])],
            }]),
        ),
        unit(
            "B.java",
            json!([{ "name": "B", "members": [method("n", vec![literal(n_body)])] }]),
        ),
        unit(
            "T.java",
            json!([{
                "name": "T",
                "members": [test_method("testX", vec![call_on_new("A", "m", "org.acme.A.m()")])],
            }]),
        ),
    ]
}

/// Component `Bar` autowires a `Foo` by type; `BarTest.testRun()` exercises `Bar.run()`, which
/// reads the injected field. `foo_body` is the body of `Foo`'s constructor; `special` adds a
/// second `Foo` bean with a distinct qualifier.
pub fn spring_module(foo_body: &str, special: bool) -> Vec<CompilationUnit> {
    let mut units = vec![
        unit(
            "Foo.java",
            json!([{
                "name": "Foo",
                "annotations": [annotation("Component")],
                "members": [constructor("Foo", vec![], vec![literal(foo_body)])],
            }]),
        ),
        unit(
            "Bar.java",
            json!([{
                "name": "Bar",
                "annotations": [annotation("Component")],
                "members": [
                    field("foo", "Foo", vec![annotation("Autowired")]),
                    method("run", vec![field_read("foo", "org.acme.Bar.foo")]),
                ],
            }]),
        ),
        unit(
            "BarTest.java",
            json!([{
                "name": "BarTest",
                "members": [test_method("testRun", vec![call_on_new("Bar", "run", "org.acme.Bar.run()")])],
            }]),
        ),
    ];
    if special {
        units.push(unit(
            "SpecialFoo.java",
            json!([{
                "name": "SpecialFoo",
                "annotations": [annotation("Component"), annotation_with("Qualifier", "special")],
                "extends": [{ "name": "Foo" }],
                "members": [constructor("SpecialFoo", vec![], vec![])],
            }]),
        ));
    }
    units
}

/// `bind(Service.class).to(ServiceImpl.class)` in a module; `Client` injects `Service`.
pub fn guice_module(impl_body: &str) -> Vec<CompilationUnit> {
    let binding = call(
        "to",
        Some(call("bind", None, vec![class_literal("Service")])),
        vec![class_literal("ServiceImpl")],
    );
    vec![
        unit(
            "Service.java",
            json!([{
                "name": "Service",
                "kind": "interface",
                "members": [{ "member": "method", "name": "handle" }],
            }]),
        ),
        unit(
            "ServiceImpl.java",
            json!([{
                "name": "ServiceImpl",
                "implements": [{ "name": "Service" }],
                "members": [constructor("ServiceImpl", vec![annotation("Inject")], vec![literal(impl_body)])],
            }]),
        ),
        unit(
            "AppModule.java",
            json!([{ "name": "AppModule", "members": [method("configure", vec![binding])] }]),
        ),
        unit(
            "Client.java",
            json!([{
                "name": "Client",
                "members": [
                    field("service", "Service", vec![annotation("Inject")]),
                    method("run", vec![field_read("service", "org.acme.Client.service")]),
                ],
            }]),
        ),
        unit(
            "ClientTest.java",
            json!([{
                "name": "ClientTest",
                "members": [test_method("testRun", vec![call_on_new("Client", "run", "org.acme.Client.run()")])],
            }]),
        ),
    ]
}

/// Two `Engine` beans distinguished by the CDI qualifiers `@Fast` and `@Slow`; `Car` injects
/// the fast one.
pub fn cdi_module() -> Vec<CompilationUnit> {
    let qualifier = |name: &str| {
        json!([{ "name": name, "kind": "annotation", "annotations": [annotation("Qualifier")] }])
    };
    let engine = |name: &str, marker: &str| {
        json!([{
            "name": name,
            "annotations": [annotation(marker)],
            "implements": [{ "name": "Engine" }],
        }])
    };
    vec![
        unit("Fast.java", qualifier("Fast")),
        unit("Slow.java", qualifier("Slow")),
        unit("Engine.java", json!([{ "name": "Engine", "kind": "interface" }])),
        unit("FastEngine.java", engine("FastEngine", "Fast")),
        unit("SlowEngine.java", engine("SlowEngine", "Slow")),
        unit(
            "Car.java",
            json!([{
                "name": "Car",
                "members": [field("engine", "Engine", vec![annotation("Inject"), annotation("Fast")])],
            }]),
        ),
    ]
}

/// `A.m1()` calls `X.<target>()`, its sibling `A.m2()` calls `Y.y()`.
pub fn cropping_module(target: &str) -> Vec<CompilationUnit> {
    vec![
        unit(
            "A.java",
            json!([{
                "name": "A",
                "members": [
                    method("m1", vec![call_on_new("X", target, &format!("org.acme.X.{target}()"))]),
                    method("m2", vec![call_on_new("Y", "y", "org.acme.Y.y()")]),
                ],
            }]),
        ),
        unit(
            "X.java",
            json!([{ "name": "X", "members": [method("x", vec![]), method("z", vec![literal("0")])] }]),
        ),
        unit("Y.java", json!([{ "name": "Y", "members": [method("y", vec![])] }])),
    ]
}

pub fn assign(target: Value, value: Value) -> Value {
    json!({ "expr": "assign", "target": target, "value": value })
}

/// Scenario A with `B` living in `package`; `A` imports it and `B.n()` returns `n_body`.
/// Moving `B` to another package renames `B` and `B.n()` without touching their content.
pub fn moved_callee(package: &str, n_body: &str) -> Vec<CompilationUnit> {
    let b = format!("{package}.B");
    vec![
        unit_in(
            PACKAGE,
            "A.java",
            &[b.as_str()],
            json!([{
                "name": "A",
                "members": [method("m", vec![call_on_new("B", "n", &format!("{b}.n()"))])],
            }]),
        ),
        unit_in(
            package,
            "B.java",
            &[],
            json!([{ "name": "B", "members": [method("n", vec![literal(n_body)])] }]),
        ),
        unit(
            "T.java",
            json!([{
                "name": "T",
                "members": [test_method("testX", vec![call_on_new("A", "m", "org.acme.A.m()")])],
            }]),
        ),
    ]
}

/// `Client extends Sub extends Base`; `Client.call()` invokes `run()` unqualified. With
/// `override_in_sub`, `Sub` declares its own `run()`.
pub fn inheritance_module(override_in_sub: bool) -> Vec<CompilationUnit> {
    let sub_members = if override_in_sub {
        json!([method("run", vec![literal("sub")])])
    } else {
        json!([])
    };
    vec![
        unit(
            "Base.java",
            json!([{ "name": "Base", "members": [method("run", vec![literal("base")])] }]),
        ),
        unit(
            "Sub.java",
            json!([{ "name": "Sub", "extends": [{ "name": "Base" }], "members": sub_members }]),
        ),
        unit(
            "Client.java",
            json!([{
                "name": "Client",
                "extends": [{ "name": "Sub" }],
                "members": [method("call", vec![call("run", None, vec![])])],
            }]),
        ),
    ]
}

/// `Counter.inc()` writes `count`, `Counter.get()` reads it; `CounterTest.testGet()` calls
/// `get()`. `step` is the value `inc()` assigns.
pub fn counter_module(step: &str) -> Vec<CompilationUnit> {
    let count = "org.acme.Counter.count";
    vec![
        unit(
            "Counter.java",
            json!([{
                "name": "Counter",
                "members": [
                    field("count", "int", vec![]),
                    method("inc", vec![assign(field_read("count", count), literal(step))]),
                    method("get", vec![field_read("count", count)]),
                ],
            }]),
        ),
        unit(
            "CounterTest.java",
            json!([{
                "name": "CounterTest",
                "members": [test_method("testGet", vec![call_on_new("Counter", "get", "org.acme.Counter.get()")])],
            }]),
        ),
    ]
}

pub fn xml_bean(id: &str, names: &[&str], class: &str) -> XmlBean {
    XmlBean {
        id: id.to_string(),
        names: names.iter().map(|n| n.to_string()).collect(),
        class: class.to_string(),
    }
}

/// `Repo` is only a bean through an XML definition; component `Service` autowires it and
/// `ServiceTest.testRun()` exercises `Service.run()`.
pub fn xml_module() -> Vec<CompilationUnit> {
    vec![
        unit(
            "Repo.java",
            json!([{ "name": "Repo", "members": [constructor("Repo", vec![], vec![])] }]),
        ),
        unit(
            "Service.java",
            json!([{
                "name": "Service",
                "annotations": [annotation("Component")],
                "members": [
                    field("repo", "Repo", vec![annotation("Autowired")]),
                    method("run", vec![field_read("repo", "org.acme.Service.repo")]),
                ],
            }]),
        ),
        unit(
            "ServiceTest.java",
            json!([{
                "name": "ServiceTest",
                "members": [test_method("testRun", vec![call_on_new("Service", "run", "org.acme.Service.run()")])],
            }]),
        ),
    ]
}

/// `Car` injects an `Engine`; `MockEngine` is an `@Alternative` implementation that only a
/// `beans.xml` entry enables.
pub fn alternative_module() -> Vec<CompilationUnit> {
    let engine = |name: &str, annotations: Value| {
        json!([{ "name": name, "annotations": annotations, "implements": [{ "name": "Engine" }] }])
    };
    vec![
        unit("Engine.java", json!([{ "name": "Engine", "kind": "interface" }])),
        unit("RealEngine.java", engine("RealEngine", json!([]))),
        unit("MockEngine.java", engine("MockEngine", json!([annotation("Alternative")]))),
        unit(
            "Car.java",
            json!([{
                "name": "Car",
                "members": [
                    field("engine", "Engine", vec![annotation("Inject")]),
                    method("drive", vec![field_read("engine", "org.acme.Car.engine")]),
                ],
            }]),
        ),
        unit(
            "CarTest.java",
            json!([{
                "name": "CarTest",
                "members": [test_method("testDrive", vec![call_on_new("Car", "drive", "org.acme.Car.drive()")])],
            }]),
        ),
    ]
}
