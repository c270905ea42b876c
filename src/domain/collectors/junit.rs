use super::CollectContext;
use crate::domain::edge::EdgeType;
use crate::domain::graph::DependencyGraph;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::level::DeclKind;
use crate::domain::source::MethodDecl;

const TEST_ANNOTATIONS: [&str; 5] = [
    "Test",
    "ParameterizedTest",
    "RepeatedTest",
    "TestFactory",
    "TestTemplate",
];

const LIFECYCLE_ANNOTATIONS: [&str; 8] = [
    "Before",
    "BeforeEach",
    "BeforeAll",
    "BeforeClass",
    "After",
    "AfterEach",
    "AfterAll",
    "AfterClass",
];

const JUNIT3_BASE: &str = "junit.framework.TestCase";

/// JUnit 4/5 test annotation, or a public `test*` method of a JUnit 3 `TestCase`.
pub fn is_test_method(method: &MethodDecl, owner: &str, hierarchy: &Hierarchy) -> bool {
    if TEST_ANNOTATIONS.iter().any(|a| method.annotation(a).is_some()) {
        return true;
    }
    method.name.starts_with("test")
        && method.params.is_empty()
        && method.has_modifier("public")
        && is_junit3_case(owner, hierarchy)
}

/// Set-up or tear-down method run around every test of its class.
pub fn is_lifecycle_method(method: &MethodDecl, owner: &str, hierarchy: &Hierarchy) -> bool {
    if LIFECYCLE_ANNOTATIONS.iter().any(|a| method.annotation(a).is_some()) {
        return true;
    }
    matches!(method.name.as_str(), "setUp" | "tearDown")
        && method.params.is_empty()
        && is_junit3_case(owner, hierarchy)
}

fn is_junit3_case(owner: &str, hierarchy: &Hierarchy) -> bool {
    hierarchy.ancestors(owner).any(|a| a == JUNIT3_BASE)
}

/// Test method → lifecycle methods of its class and of every ancestor declared in the revision.
pub(super) fn collect(ctx: &CollectContext<'_>, graph: &mut DependencyGraph, type_id: &str) {
    let Some(entry) = ctx.index.type_entry(type_id) else {
        return;
    };
    let tests: Vec<&str> = entry
        .members
        .iter()
        .filter(|m| m.kind == DeclKind::Method)
        .filter(|m| {
            ctx.index
                .method_decl(ctx.revision, type_id, m)
                .is_some_and(|method| is_test_method(method, type_id, ctx.hierarchy))
        })
        .map(|m| m.id.as_str())
        .collect();
    if tests.is_empty() {
        return;
    }

    let mut fixtures = Vec::new();
    let owners = std::iter::once(type_id).chain(ctx.hierarchy.member_ancestors(type_id));
    for owner in owners {
        let Some(owner_entry) = ctx.index.type_entry(owner) else {
            continue;
        };
        for member in owner_entry.members.iter().filter(|m| m.kind == DeclKind::Method) {
            if ctx
                .index
                .method_decl(ctx.revision, owner, member)
                .is_some_and(|method| is_lifecycle_method(method, owner, ctx.hierarchy))
            {
                fixtures.push(member.id.clone());
            }
        }
    }
    for test in tests {
        for fixture in &fixtures {
            graph.connect(test, fixture, EdgeType::Junit);
        }
    }
}
