//! Structural fingerprints of declarations.
//!
//! A fingerprint folds the hashes of a declaration's children with a fixed multiplier, in a
//! fixed per-declaration field order. String hashes use the classic `s[0]*31^(n-1) + ...`
//! polynomial so fingerprints are stable across processes and platforms.
//!
//! Two variants exist:
//! - *shallow* (type level): covers the type header and its members, skips nested type bodies
//!   and every comment;
//! - *full* (member level): covers one member including its body and doc comment.

use crate::domain::index::DeclarationIndex;
use crate::domain::level::{DeclKind, Granularity};
use crate::domain::source::{
    Annotation, CompilationUnit, Expr, FieldDecl, InitializerDecl, Member, MethodDecl, Param,
    ParsedRevision, TypeDecl, TypeKind, TypeRef,
};
use std::collections::{BTreeMap, HashMap};

const MULTIPLIER: i32 = 31;

/// Checksums of one revision plus each identifier's compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionFingerprint {
    pub checksums: BTreeMap<String, i32>,
    pub unit_mapping: BTreeMap<String, String>,
}

pub fn hash_str(s: &str) -> i32 {
    s.chars()
        .fold(0i32, |acc, c| acc.wrapping_mul(MULTIPLIER).wrapping_add(c as i32))
}

pub fn combine(parts: &[i32]) -> i32 {
    parts
        .iter()
        .fold(0i32, |acc, h| acc.wrapping_mul(MULTIPLIER).wrapping_add(*h))
}

/// Order-sensitive hash of a sequence.
pub fn list<T>(items: impl IntoIterator<Item = T>, mut f: impl FnMut(T) -> i32) -> i32 {
    items
        .into_iter()
        .fold(1i32, |acc, item| acc.wrapping_mul(MULTIPLIER).wrapping_add(f(item)))
}

fn option<T>(value: Option<T>, f: impl FnOnce(T) -> i32) -> i32 {
    value.map(f).unwrap_or(0)
}

/// Per-pass fingerprinter. Results are memoized by identifier for the lifetime of the value,
/// so a new instance must be used for every revision.
#[derive(Debug, Default)]
pub struct Fingerprinter {
    memo: HashMap<String, i32>,
}

impl Fingerprinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package and imports; the unit's types are fingerprinted separately.
    pub fn unit(&mut self, id: &str, unit: &CompilationUnit) -> i32 {
        self.memoized(id, || {
            combine(&[
                option(unit.package.as_deref(), hash_str),
                list(&unit.imports, |i| hash_str(i)),
            ])
        })
    }

    /// Header plus members, nested type bodies and comments excluded.
    pub fn type_shallow(&mut self, id: &str, decl: &TypeDecl) -> i32 {
        self.memoized(id, || {
            combine(&[
                header(decl),
                list(&decl.members, |m| member(m, false)),
                // A nested type contributes its name only.
                list(&decl.nested, |n| hash_str(&n.name)),
            ])
        })
    }

    /// Header and initializer blocks; used when members carry their own fingerprints.
    pub fn type_header(&mut self, id: &str, decl: &TypeDecl) -> i32 {
        self.memoized(id, || {
            let initializers = decl.members.iter().filter_map(|m| match m {
                Member::Initializer(init) => Some(initializer(init)),
                _ => None,
            });
            combine(&[header(decl), list(initializers, |h| h)])
        })
    }

    /// Full fingerprint of one member, body and doc comment included.
    pub fn member(&mut self, id: &str, member_decl: &Member) -> i32 {
        self.memoized(id, || member(member_decl, true))
    }

    fn memoized(&mut self, id: &str, compute: impl FnOnce() -> i32) -> i32 {
        if let Some(&hash) = self.memo.get(id) {
            return hash;
        }
        let hash = compute();
        self.memo.insert(id.to_string(), hash);
        hash
    }
}

/// Fingerprints every declaration the granularity tracks.
///
/// Units are always included (they drive the shadowing rule); types use the shallow variant at
/// type level and the header variant otherwise; members are included at member levels.
pub fn fingerprint_revision(
    revision: &ParsedRevision,
    index: &DeclarationIndex,
    level: Granularity,
) -> RevisionFingerprint {
    let mut fingerprinter = Fingerprinter::new();
    let mut result = RevisionFingerprint::default();

    for unit_id in index.units() {
        if let Some(unit) = index.unit(revision, unit_id) {
            let hash = fingerprinter.unit(unit_id, unit);
            result.checksums.insert(unit_id.to_string(), hash);
            result.unit_mapping.insert(unit_id.to_string(), unit_id.to_string());
        }
    }

    for entry in index.types() {
        let Some(decl) = index.type_decl(revision, &entry.id) else {
            continue;
        };
        let Some(unit_id) = index.unit_of(&entry.id) else {
            continue;
        };
        let hash = match level {
            Granularity::Type => fingerprinter.type_shallow(&entry.id, decl),
            Granularity::Method | Granularity::NonType => fingerprinter.type_header(&entry.id, decl),
        };
        result.checksums.insert(entry.id.clone(), hash);
        result.unit_mapping.insert(entry.id.clone(), unit_id.to_string());

        if level == Granularity::Type {
            continue;
        }
        for member_entry in &entry.members {
            if !matches!(member_entry.kind, DeclKind::Method | DeclKind::Constructor | DeclKind::Field) {
                continue;
            }
            if let Some(member_decl) = decl.members.get(member_entry.index) {
                let hash = fingerprinter.member(&member_entry.id, member_decl);
                result.checksums.insert(member_entry.id.clone(), hash);
                result.unit_mapping.insert(member_entry.id.clone(), unit_id.to_string());
            }
        }
    }
    result
}

fn header(decl: &TypeDecl) -> i32 {
    let kind = match decl.kind {
        TypeKind::Class => 1,
        TypeKind::Interface => 2,
        TypeKind::Enum => 3,
        TypeKind::Annotation => 4,
        TypeKind::Record => 5,
    };
    combine(&[
        list(&decl.supertypes().collect::<Vec<_>>(), |t| type_ref(t)),
        kind,
        list(&decl.type_params, |p| hash_str(p)),
        list(&decl.modifiers, |m| hash_str(m)),
        hash_str(&decl.name),
        list(&decl.annotations, annotation),
        list(&decl.enum_constants, |c| hash_str(c)),
    ])
}

fn type_ref(ty: &TypeRef) -> i32 {
    combine(&[hash_str(&ty.name), list(&ty.args, type_ref)])
}

fn annotation(a: &Annotation) -> i32 {
    combine(&[
        hash_str(&a.name),
        list(&a.args, |(k, v)| combine(&[hash_str(k), hash_str(v)])),
    ])
}

fn member(m: &Member, with_comments: bool) -> i32 {
    match m {
        Member::Method(method) => combine(&[1, method_like(method, with_comments)]),
        Member::Constructor(ctor) => combine(&[2, method_like(ctor, with_comments)]),
        Member::Field(f) => combine(&[3, field(f, with_comments)]),
        Member::Initializer(init) => combine(&[4, initializer(init)]),
    }
}

fn method_like(m: &MethodDecl, with_comments: bool) -> i32 {
    combine(&[
        option(m.body.as_ref(), |body| list(body, expr)),
        list(&m.modifiers, |s| hash_str(s)),
        hash_str(&m.name),
        list(&m.params, param),
        option(m.return_type.as_ref(), type_ref),
        list(&m.throws, type_ref),
        list(&m.type_params, |p| hash_str(p)),
        list(&m.annotations, annotation),
        comment(m.comment.as_deref(), with_comments),
    ])
}

fn param(p: &Param) -> i32 {
    combine(&[list(&p.annotations, annotation), hash_str(&p.name), type_ref(&p.ty)])
}

fn field(f: &FieldDecl, with_comments: bool) -> i32 {
    combine(&[
        list(&f.modifiers, |s| hash_str(s)),
        hash_str(&f.name),
        type_ref(&f.ty),
        option(f.initializer.as_ref(), expr),
        list(&f.annotations, annotation),
        comment(f.comment.as_deref(), with_comments),
    ])
}

fn initializer(init: &InitializerDecl) -> i32 {
    combine(&[i32::from(init.is_static), list(&init.body, expr)])
}

fn comment(text: Option<&str>, with_comments: bool) -> i32 {
    if with_comments { option(text, hash_str) } else { 0 }
}

fn expr(e: &Expr) -> i32 {
    match e {
        Expr::Call {
            name,
            receiver,
            args,
            ..
        } => combine(&[
            11,
            option(receiver.as_deref(), expr),
            hash_str(name),
            list(args, expr),
        ]),
        Expr::New { ty, args, body, .. } => combine(&[
            12,
            type_ref(ty),
            list(args, expr),
            list(body, |m| member(m, false)),
        ]),
        Expr::FieldRead { name, receiver, .. } => {
            combine(&[13, hash_str(name), option(receiver.as_deref(), expr)])
        }
        Expr::Assign { target, value } => combine(&[14, expr(target), expr(value)]),
        Expr::TypeName { ty } => combine(&[15, type_ref(ty)]),
        Expr::Literal { value } => combine(&[16, hash_str(value)]),
        Expr::Local { name } => combine(&[17, hash_str(name)]),
        Expr::Lambda { params, body } => combine(&[
            18,
            list(params, |p| hash_str(p)),
            list(body, expr),
        ]),
        Expr::Other { text, children } => combine(&[19, hash_str(text), list(children, expr)]),
    }
}
