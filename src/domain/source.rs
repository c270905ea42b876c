//! Source model: the parsed shape of one revision, as delivered by a source frontend.
//!
//! The frontend parses source text and may pre-resolve references (`symbol` fields). Anything it
//! leaves unresolved is resolved lazily through [`SourceModelProvider`](crate::domain::ports::SourceModelProvider).
//! Field order in these structs is the order the fingerprinter combines them in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Path relative to the module root; also the unit's node identifier.
    pub path: String,
    #[serde(default)]
    pub package: Option<String>,
    /// Import declarations as written, e.g. `java.util.List` or `org.acme.*`.
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
    Record,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub extends: Vec<TypeRef>,
    #[serde(default)]
    pub implements: Vec<TypeRef>,
    #[serde(default)]
    pub enum_constants: Vec<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub nested: Vec<TypeDecl>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TypeDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn annotation(&self, simple_name: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, simple_name)
    }

    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.extends.iter().chain(self.implements.iter())
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Constructor(ctor) => Some(ctor),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn is_concrete_class(&self) -> bool {
        self.kind == TypeKind::Class && !self.has_modifier("abstract")
    }
}

/// A type as written at a use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Written name, possibly qualified (`List`, `java.util.List`, `Outer.Inner`).
    pub name: String,
    #[serde(default)]
    pub args: Vec<TypeRef>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            symbol: None,
        }
    }

    /// Written name without package qualification.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Annotation arguments as written. A single unnamed argument is keyed `value`;
    /// class literals are written as the bare type name (`Foo`, not `Foo.class`).
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl Annotation {
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "snake_case")]
pub enum Member {
    Method(MethodDecl),
    Constructor(MethodDecl),
    Field(FieldDecl),
    Initializer(InitializerDecl),
}

impl Member {
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Member::Method(m) | Member::Constructor(m) => &m.annotations,
            Member::Field(f) => &f.annotations,
            Member::Initializer(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub throws: Vec<TypeRef>,
    /// `None` for abstract and interface methods.
    #[serde(default)]
    pub body: Option<Vec<Expr>>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl MethodDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn annotation(&self, simple_name: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, simple_name)
    }

    pub fn statements(&self) -> &[Expr] {
        self.body.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Param {
    pub fn annotation(&self, simple_name: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, simple_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl FieldDecl {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn annotation(&self, simple_name: &str) -> Option<&Annotation> {
        find_annotation(&self.annotations, simple_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializerDecl {
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub body: Vec<Expr>,
}

/// Expression / statement tree of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    /// Method invocation. `receiver` is `None` for unqualified calls.
    Call {
        name: String,
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        symbol: Option<String>,
    },
    /// `new T(..)`, optionally with an anonymous class body.
    New {
        #[serde(rename = "type")]
        ty: TypeRef,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        body: Vec<Member>,
    },
    FieldRead {
        name: String,
        #[serde(default)]
        receiver: Option<Box<Expr>>,
        #[serde(default)]
        symbol: Option<String>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// A type in expression position: static member scope or class literal.
    TypeName {
        #[serde(rename = "type")]
        ty: TypeRef,
    },
    Literal {
        value: String,
    },
    Local {
        name: String,
    },
    Lambda {
        #[serde(default)]
        params: Vec<String>,
        #[serde(default)]
        body: Vec<Expr>,
    },
    /// Any other construct; only its operator text and children are kept.
    Other {
        #[serde(default)]
        text: String,
        #[serde(default)]
        children: Vec<Expr>,
    },
}

impl Expr {
    /// Direct sub-expressions, in source order. Anonymous class bodies are not included.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Call { receiver, args, .. } => receiver.iter().map(|r| r.as_ref()).chain(args).collect(),
            Expr::New { args, .. } => args.iter().collect(),
            Expr::FieldRead { receiver, .. } => receiver.iter().map(|r| r.as_ref()).collect(),
            Expr::Assign { target, value } => vec![target.as_ref(), value.as_ref()],
            Expr::Lambda { body, .. } => body.iter().collect(),
            Expr::Other { children, .. } => children.iter().collect(),
            Expr::TypeName { .. } | Expr::Literal { .. } | Expr::Local { .. } => Vec::new(),
        }
    }

    /// String value of a literal, without surrounding quotes.
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal { value } => Some(value.trim_matches('"')),
            _ => None,
        }
    }

    /// Type of a class literal (`Foo.class`) in argument position.
    pub fn as_class_literal(&self) -> Option<&TypeRef> {
        match self {
            Expr::TypeName { ty } => Some(ty),
            _ => None,
        }
    }
}

/// A unit file that the frontend failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub path: String,
    pub message: String,
}

/// External (library) type with its direct supertypes, fed to the type solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryType {
    pub name: String,
    #[serde(default)]
    pub supertypes: Vec<String>,
}

/// Framework configuration found next to the sources (XML descriptors and the like).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub spring_beans: Vec<XmlBean>,
    /// Classes enabled as CDI alternatives.
    #[serde(default)]
    pub cdi_alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct XmlBean {
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    pub class: String,
}

/// Everything the parser stage delivers for one revision.
#[derive(Debug, Clone, Default)]
pub struct ParsedRevision {
    pub units: Vec<CompilationUnit>,
    pub failures: Vec<ParseFailure>,
    pub descriptor: Descriptor,
}

pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn find_annotation<'a>(annotations: &'a [Annotation], simple: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.simple_name() == simple)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_deserializes_with_defaults() {
        let json = r#"{
            "path": "src/main/java/org/acme/A.java",
            "package": "org.acme",
            "types": [{
                "name": "A",
                "members": [
                    { "member": "method", "name": "m", "body": [
                        { "expr": "call", "name": "n", "symbol": "org.acme.B.n()" }
                    ]},
                    { "member": "field", "name": "b", "type": { "name": "B" } }
                ]
            }]
        }"#;
        let unit: CompilationUnit = serde_json::from_str(json).unwrap();
        let ty = &unit.types[0];
        assert_eq!(ty.kind, TypeKind::Class);
        assert_eq!(ty.methods().count(), 1);
        assert_eq!(ty.fields().next().unwrap().ty.name, "B");
        assert!(ty.methods().next().unwrap().body.is_some());
    }

    #[test]
    fn test_annotation_lookup_by_simple_name() {
        let field = FieldDecl {
            name: "repo".into(),
            ty: TypeRef::named("Repo"),
            modifiers: vec![],
            annotations: vec![Annotation {
                name: "org.springframework.beans.factory.annotation.Qualifier".into(),
                symbol: None,
                args: BTreeMap::from([("value".to_string(), "primary".to_string())]),
            }],
            initializer: None,
            comment: None,
        };
        let qualifier = field.annotation("Qualifier").unwrap();
        assert_eq!(qualifier.arg("value"), Some("primary"));
        assert!(field.annotation("Autowired").is_none());
    }
}
