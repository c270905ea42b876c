use crate::domain::ports::{Declaration, Reference, ReferenceKind, SourceModelProvider};
use crate::domain::source::{CompilationUnit, LibraryType, Member, ParsedRevision, TypeDecl, TypeRef};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const PRIMITIVES: [&str; 9] = ["boolean", "byte", "char", "short", "int", "long", "float", "double", "void"];

/// `java.lang` types resolved implicitly even when no library file lists them.
const JAVA_LANG: [&str; 36] = [
    "AutoCloseable",
    "Boolean",
    "Byte",
    "Character",
    "Class",
    "Cloneable",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "FunctionalInterface",
    "IllegalArgumentException",
    "IllegalStateException",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Override",
    "Record",
    "Runnable",
    "RuntimeException",
    "SafeVarargs",
    "Short",
    "String",
    "StringBuilder",
    "SuppressWarnings",
    "System",
    "Thread",
    "Throwable",
    "UnsupportedOperationException",
    "Void",
];

#[derive(Debug, Default)]
struct TypeInfo {
    simple: String,
    unit: usize,
    enclosing: Option<String>,
    type_params: Vec<String>,
    nested: BTreeMap<String, String>,
    /// Resolved direct supertypes, in declaration order.
    supers: Vec<String>,
    methods: Vec<(String, String)>,
    constructors: Vec<String>,
    fields: BTreeMap<String, String>,
}

/// Resolver over one parsed revision plus the external library types.
///
/// Identifiers follow the scheme documented on [`SourceModelProvider`]. Members are looked up
/// by name only, so an overloaded method without a frontend symbol resolves to its first
/// declaration.
pub struct JsonModelProvider {
    units: Vec<CompilationUnit>,
    types: BTreeMap<String, TypeInfo>,
    /// Package → simple name → top-level type id.
    packages: BTreeMap<String, BTreeMap<String, String>>,
    libraries: BTreeMap<String, Vec<String>>,
    ancestors: BTreeMap<String, BTreeSet<String>>,
}

impl JsonModelProvider {
    pub fn new(revision: &ParsedRevision, libraries: &[LibraryType]) -> Self {
        let mut provider = Self {
            units: revision.units.clone(),
            types: BTreeMap::new(),
            packages: BTreeMap::new(),
            libraries: libraries
                .iter()
                .map(|lib| (lib.name.clone(), lib.supertypes.clone()))
                .collect(),
            ancestors: BTreeMap::new(),
        };

        for (unit_index, unit) in revision.units.iter().enumerate() {
            for decl in &unit.types {
                provider.register_type(unit_index, unit, None, decl);
            }
        }
        for unit in &revision.units {
            for decl in &unit.types {
                provider.link_type(unit, None, decl);
            }
        }
        provider.ancestors = provider.compute_ancestors();
        provider
    }

    fn type_id(unit: &CompilationUnit, enclosing: Option<&str>, decl: &TypeDecl) -> String {
        match (enclosing, unit.package.as_deref()) {
            (Some(outer), _) => format!("{outer}.{}", decl.name),
            (None, Some(package)) if !package.is_empty() => format!("{package}.{}", decl.name),
            (None, _) => decl.name.clone(),
        }
    }

    /// First pass: identifiers, nesting and type parameters.
    fn register_type(&mut self, unit_index: usize, unit: &CompilationUnit, enclosing: Option<&str>, decl: &TypeDecl) {
        let id = Self::type_id(unit, enclosing, decl);
        match enclosing {
            Some(outer) => {
                if let Some(info) = self.types.get_mut(outer) {
                    info.nested.insert(decl.name.clone(), id.clone());
                }
            }
            None => {
                self.packages
                    .entry(unit.package.clone().unwrap_or_default())
                    .or_default()
                    .insert(decl.name.clone(), id.clone());
            }
        }
        self.types.insert(
            id.clone(),
            TypeInfo {
                simple: decl.name.clone(),
                unit: unit_index,
                enclosing: enclosing.map(str::to_string),
                type_params: decl.type_params.clone(),
                ..TypeInfo::default()
            },
        );
        for nested in &decl.nested {
            self.register_type(unit_index, unit, Some(id.as_str()), nested);
        }
    }

    /// Second pass: supertypes and member identifiers, which need every type registered.
    fn link_type(&mut self, unit: &CompilationUnit, enclosing: Option<&str>, decl: &TypeDecl) {
        let id = Self::type_id(unit, enclosing, decl);
        let supers: Vec<String> = decl
            .supertypes()
            .filter_map(|ty| self.resolve_type_ref(ty, unit, Some(id.as_str())))
            .collect();

        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        let mut fields = BTreeMap::new();
        for member in &decl.members {
            let member_id = self.member_id(unit, &id, member);
            match member {
                Member::Method(m) => methods.push((m.name.clone(), member_id)),
                Member::Constructor(_) => constructors.push(member_id),
                Member::Field(f) => {
                    fields.insert(f.name.clone(), member_id);
                }
                Member::Initializer(_) => {}
            }
        }

        if let Some(info) = self.types.get_mut(&id) {
            info.supers = supers;
            info.methods = methods;
            info.constructors = constructors;
            info.fields = fields;
        }
        for nested in &decl.nested {
            self.link_type(unit, Some(id.as_str()), nested);
        }
    }

    fn compute_ancestors(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.types
            .keys()
            .chain(self.libraries.keys())
            .map(|id| {
                let mut seen = BTreeSet::new();
                let mut queue: VecDeque<&str> = self.direct_supertypes(id).iter().map(String::as_str).collect();
                while let Some(next) = queue.pop_front() {
                    if next == id || !seen.insert(next.to_string()) {
                        continue;
                    }
                    queue.extend(self.direct_supertypes(next).iter().map(String::as_str));
                }
                (id.clone(), seen)
            })
            .collect()
    }

    fn direct_supertypes(&self, id: &str) -> &[String] {
        match self.types.get(id) {
            Some(info) => &info.supers,
            None => self.libraries.get(id).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    fn is_known(&self, id: &str) -> bool {
        self.types.contains_key(id) || self.libraries.contains_key(id)
    }

    fn resolve_type_ref(&self, ty: &TypeRef, unit: &CompilationUnit, scope: Option<&str>) -> Option<String> {
        match &ty.symbol {
            Some(symbol) => Some(symbol.clone()),
            None => self.resolve_type_name(&ty.name, unit, scope),
        }
    }

    /// Resolves a written type name in the lexical context of `unit` and `scope`.
    fn resolve_type_name(&self, name: &str, unit: &CompilationUnit, scope: Option<&str>) -> Option<String> {
        let name = name.split('<').next().unwrap_or(name).trim();
        if name.is_empty() || PRIMITIVES.contains(&name) {
            return None;
        }
        if self.is_known(name) {
            return Some(name.to_string());
        }
        let Some((first, rest)) = name.split_once('.') else {
            return self.resolve_simple(name, unit, scope);
        };
        if let Some(base) = self.resolve_simple(first, unit, scope) {
            return Some(rest.split('.').fold(base, |outer, segment| {
                self.types
                    .get(&outer)
                    .and_then(|info| info.nested.get(segment).cloned())
                    .unwrap_or_else(|| format!("{outer}.{segment}"))
            }));
        }
        // Package-qualified name of a type outside the project.
        first.starts_with(|c: char| c.is_ascii_lowercase()).then(|| name.to_string())
    }

    fn resolve_simple(&self, name: &str, unit: &CompilationUnit, scope: Option<&str>) -> Option<String> {
        let mut current = scope.map(str::to_string);
        while let Some(type_id) = current {
            let Some(info) = self.types.get(&type_id) else {
                break;
            };
            if info.simple == name {
                return Some(type_id);
            }
            if let Some(nested) = info.nested.get(name) {
                return Some(nested.clone());
            }
            current = info.enclosing.clone();
        }

        let single = unit
            .imports
            .iter()
            .filter(|import| !import.starts_with("static ") && !import.ends_with(".*"))
            .find(|import| import.rsplit('.').next() == Some(name));
        if let Some(import) = single {
            return Some(import.clone());
        }

        let package = unit.package.clone().unwrap_or_default();
        if let Some(id) = self.packages.get(&package).and_then(|types| types.get(name)) {
            return Some(id.clone());
        }

        for import in &unit.imports {
            if import.starts_with("static ") {
                continue;
            }
            if let Some(container) = import.strip_suffix(".*") {
                let candidate = format!("{container}.{name}");
                if self.is_known(&candidate) {
                    return Some(candidate);
                }
            }
        }

        let lang = format!("java.lang.{name}");
        (self.libraries.contains_key(&lang) || JAVA_LANG.contains(&name)).then_some(lang)
    }

    /// Erased, qualified parameter type: type variables erase to `java.lang.Object`, arrays
    /// and varargs keep their dimensions, unresolved names stay as written.
    fn erase(&self, ty: &TypeRef, unit: &CompilationUnit, owner: &str, method_params: &[String]) -> String {
        let mut base = ty.name.split('<').next().unwrap_or(&ty.name).trim();
        let mut dims = 0;
        loop {
            if let Some(stripped) = base.strip_suffix("[]") {
                base = stripped.trim_end();
            } else if let Some(stripped) = base.strip_suffix("...") {
                base = stripped.trim_end();
            } else {
                break;
            }
            dims += 1;
        }

        let erased = if PRIMITIVES.contains(&base) {
            base.to_string()
        } else if method_params.iter().any(|p| p == base) || self.is_type_variable(owner, base) {
            "java.lang.Object".to_string()
        } else {
            ty.symbol
                .clone()
                .or_else(|| self.resolve_type_name(base, unit, Some(owner)))
                .unwrap_or_else(|| base.to_string())
        };
        format!("{erased}{}", "[]".repeat(dims))
    }

    fn is_type_variable(&self, owner: &str, name: &str) -> bool {
        let mut current = Some(owner);
        while let Some(type_id) = current {
            let Some(info) = self.types.get(type_id) else {
                return false;
            };
            if info.type_params.iter().any(|p| p == name) {
                return true;
            }
            current = info.enclosing.as_deref();
        }
        false
    }

    fn member_id(&self, unit: &CompilationUnit, owner: &str, member: &Member) -> String {
        match member {
            Member::Method(m) | Member::Constructor(m) => {
                let params: Vec<String> = m
                    .params
                    .iter()
                    .map(|p| self.erase(&p.ty, unit, owner, &m.type_params))
                    .collect();
                let name = match member {
                    Member::Constructor(_) => "<init>",
                    _ => m.name.as_str(),
                };
                format!("{owner}.{name}({})", params.join(","))
            }
            Member::Field(f) => format!("{owner}.{}", f.name),
            Member::Initializer(init) if init.is_static => format!("{owner}.<clinit>"),
            Member::Initializer(_) => format!("{owner}.<instinit>"),
        }
    }

    /// Scope type, its ancestors breadth-first, then the same for each enclosing type.
    fn lookup_chain(&self, scope: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(scope.to_string());
        while let Some(type_id) = current {
            let mut queue = VecDeque::from([type_id.clone()]);
            while let Some(next) = queue.pop_front() {
                if chain.contains(&next) {
                    continue;
                }
                queue.extend(self.direct_supertypes(&next).iter().cloned());
                chain.push(next);
            }
            current = self.types.get(&type_id).and_then(|info| info.enclosing.clone());
        }
        chain
    }

    fn resolve_member(&self, kind: ReferenceKind, name: &str, scope: &str) -> Option<String> {
        self.lookup_chain(scope).iter().find_map(|type_id| {
            let info = self.types.get(type_id)?;
            match kind {
                ReferenceKind::Method => info.methods.iter().find(|(n, _)| n == name).map(|(_, id)| id.clone()),
                ReferenceKind::Field => info.fields.get(name).cloned(),
                ReferenceKind::Type | ReferenceKind::Constructor => None,
            }
        })
    }

    fn resolve_constructor(&self, reference: &Reference<'_>) -> Option<String> {
        let type_id = self.resolve_type_name(reference.text, reference.unit, reference.scope)?;
        match self.types.get(&type_id) {
            Some(info) => Some(
                info.constructors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| format!("{type_id}.<init>()")),
            ),
            None => Some(format!("{type_id}.<init>()")),
        }
    }

    /// Compilation unit a project type is declared in.
    pub fn unit_of(&self, type_id: &str) -> Option<&str> {
        let info = self.types.get(type_id)?;
        self.units.get(info.unit).map(|unit| unit.path.as_str())
    }
}

impl SourceModelProvider for JsonModelProvider {
    fn qualified_id(&self, declaration: Declaration<'_>) -> String {
        match declaration {
            Declaration::Unit(unit) => unit.path.clone(),
            Declaration::Type { unit, enclosing, decl } => Self::type_id(unit, enclosing, decl),
            Declaration::Member { unit, owner, member } => self.member_id(unit, owner, member),
        }
    }

    fn resolve(&self, reference: &Reference<'_>) -> Option<String> {
        if let Some(symbol) = reference.symbol {
            return Some(symbol.to_string());
        }
        match reference.kind {
            ReferenceKind::Type => self.resolve_type_name(reference.text, reference.unit, reference.scope),
            ReferenceKind::Constructor => self.resolve_constructor(reference),
            ReferenceKind::Method | ReferenceKind::Field => {
                self.resolve_member(reference.kind, reference.text, reference.scope?)
            }
        }
    }

    fn structural_ancestors(&self, type_id: &str) -> BTreeSet<String> {
        self.ancestors.get(type_id).cloned().unwrap_or_default()
    }
}
