//! Cross-file symbol table.
//!
//! The [`Builder`] is the single registry of every class, interface, trait,
//! function and package seen during a run. Types are stored in an arena and
//! handed out as [`TypeId`]s: the first reference to a name mints an
//! unresolved placeholder, and the declaration, whenever it arrives, fills
//! that same slot in place. Files can therefore be parsed in any order and
//! still converge on one graph.
//!
//! Keys are fully qualified names without a leading `\`, compared
//! case-sensitively. Qualifying names against namespaces and imports is the
//! parser's job.

mod artifact;
mod filter;
mod reference;

pub use artifact::{
    package_name, split_qualified, Constant, ConstantDeclaration, DeclaredType, Function,
    FunctionDeclaration, FunctionId, Method, MethodDeclaration, NodeRef, Package, PackageId,
    Property, PropertyDeclaration, TypeDeclaration, TypeId, TypeKind, GLOBAL_PACKAGE,
};
pub use filter::{AcceptAll, ArtifactFilter, PackageFilter};
pub use reference::{Binding, TypeRef};

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::ast::Ast;
use crate::cache::{self, MemoryCache, TokenCache};
use crate::error::ParseError;
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One successfully parsed file and its tree.
#[derive(Debug)]
pub struct CompilationUnit {
    pub file: String,
    pub ast: Ast,
}

/// The declarations one file produced, committed together.
#[derive(Debug, Default)]
pub struct FileDeclarations {
    pub types: Vec<(String, TypeDeclaration)>,
    pub functions: Vec<(String, FunctionDeclaration)>,
}

pub struct Builder {
    types: Vec<DeclaredType>,
    type_index: HashMap<String, TypeId>,
    functions: Vec<Function>,
    function_index: HashMap<String, FunctionId>,
    packages: Vec<Package>,
    package_index: HashMap<String, PackageId>,
    units: Vec<CompilationUnit>,
    filter: Box<dyn ArtifactFilter>,
    cache: Box<dyn TokenCache>,
    anonymous: u32,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("types", &self.types.len())
            .field("functions", &self.functions.len())
            .field("packages", &self.packages.len())
            .field("units", &self.units.len())
            .finish()
    }
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            types: Vec::new(),
            type_index: HashMap::new(),
            functions: Vec::new(),
            function_index: HashMap::new(),
            packages: Vec::new(),
            package_index: HashMap::new(),
            units: Vec::new(),
            filter: Box::new(AcceptAll),
            cache: Box::new(MemoryCache::new()),
            anonymous: 0,
        }
    }

    pub fn with_filter(mut self, filter: impl ArtifactFilter + 'static) -> Self {
        self.filter = Box::new(filter);
        self
    }

    pub fn with_cache(mut self, cache: impl TokenCache + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    // ── Types ─────────────────────────────────────────────────────────────

    /// Return the entry for `name`, creating an unresolved placeholder when
    /// the name has not been seen. Repeated calls yield the same id.
    pub fn get_or_create_placeholder(&mut self, name: &str, kind: TypeKind) -> TypeId {
        let name = name.trim_start_matches('\\');
        if let Some(&id) = self.type_index.get(name) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(DeclaredType::placeholder(id, name, kind));
        self.type_index.insert(name.to_owned(), id);
        trace!(name, kind = kind.as_str(), "placeholder created");
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name.trim_start_matches('\\')).copied()
    }

    /// Resolve a reference against the table, memoizing the first hit in
    /// the reference itself.
    pub fn resolve(&self, reference: &TypeRef) -> Option<TypeId> {
        if let Some(id) = reference.cached() {
            return Some(id);
        }
        let id = self.lookup(reference.name())?;
        Some(reference.memoize(id))
    }

    pub fn ty(&self, id: TypeId) -> &DeclaredType {
        &self.types[id.index()]
    }

    pub fn types(&self) -> impl Iterator<Item = &DeclaredType> {
        self.types.iter()
    }

    /// Placeholders never backed by a declaration.
    pub fn unresolved_types(&self) -> impl Iterator<Item = &DeclaredType> {
        self.types.iter().filter(|t| !t.is_declared())
    }

    /// Fill the entry for `name` with a parsed declaration. The placeholder
    /// created by earlier references, if any, is completed in place. A name
    /// that was already completed is a conflicting redeclaration.
    pub fn complete_declaration(
        &mut self,
        name: &str,
        decl: TypeDeclaration,
    ) -> Result<TypeId, ParseError> {
        let id = self.get_or_create_placeholder(name, decl.kind);
        if let Some(err) = self.type_conflict(name, &decl.file, decl.kind) {
            return Err(err);
        }
        self.apply_type(id, decl);
        Ok(id)
    }

    fn type_conflict(&self, name: &str, file: &str, kind: TypeKind) -> Option<ParseError> {
        let existing = self.ty(self.lookup(name)?);
        if !existing.is_declared() {
            return None;
        }
        Some(ParseError::ConflictingRedeclaration {
            name: existing.name().to_owned(),
            kind: kind.as_str().to_owned(),
            first_file: existing.file().unwrap_or_default().to_owned(),
            file: file.to_owned(),
        })
    }

    fn apply_type(&mut self, id: TypeId, decl: TypeDeclaration) {
        let name = self.ty(id).name().to_owned();
        let package = self.get_package(split_qualified(&name).0);
        self.packages[package.index()].types.push(id);

        if !decl.tokens.is_empty() {
            self.cache.store(&cache::type_key(&name), decl.tokens);
        }
        let mut methods = Vec::with_capacity(decl.methods.len());
        for m in decl.methods {
            if !m.tokens.is_empty() {
                self.cache
                    .store(&cache::method_key(&name, &m.name), m.tokens);
            }
            methods.push(Method {
                name: m.name,
                owner: id,
                modifiers: m.modifiers,
                by_reference: m.by_reference,
                location: m.location,
                span: m.span,
                comment: m.comment,
            });
        }

        let ty = &mut self.types[id.index()];
        ty.kind = decl.kind;
        ty.declared = true;
        ty.file = Some(decl.file);
        ty.package = Some(package);
        ty.modifiers = decl.modifiers;
        ty.anonymous = decl.anonymous;
        ty.parent = decl.parent;
        ty.interfaces = decl.interfaces;
        ty.traits = decl.traits;
        ty.methods = methods;
        ty.properties = decl
            .properties
            .into_iter()
            .map(|p| Property {
                name: p.name,
                owner: id,
                modifiers: p.modifiers,
                location: p.location,
                span: p.span,
                comment: p.comment,
            })
            .collect();
        ty.constants = decl
            .constants
            .into_iter()
            .map(|c| Constant {
                name: c.name,
                owner: id,
                modifiers: c.modifiers,
                location: c.location,
                span: c.span,
            })
            .collect();
        ty.location = decl.location;
        ty.span = decl.span;
        ty.comment = decl.comment;
        trace!(name = %name, kind = ty.kind.as_str(), "declaration completed");
    }

    /// A fresh qualified name for an anonymous class in `namespace`.
    pub fn next_anonymous_name(&mut self, namespace: &str) -> String {
        self.anonymous += 1;
        if namespace.is_empty() {
            format!("class@anonymous#{}", self.anonymous)
        } else {
            format!("{}\\class@anonymous#{}", namespace, self.anonymous)
        }
    }

    // ── Functions ─────────────────────────────────────────────────────────

    pub fn declare_function(
        &mut self,
        name: &str,
        decl: FunctionDeclaration,
    ) -> Result<FunctionId, ParseError> {
        let name = name.trim_start_matches('\\');
        if let Some(err) = self.function_conflict(name, &decl.file) {
            return Err(err);
        }
        Ok(self.apply_function(name, decl))
    }

    fn function_conflict(&self, name: &str, file: &str) -> Option<ParseError> {
        let existing = self.function(self.lookup_function(name)?);
        Some(ParseError::ConflictingRedeclaration {
            name: name.to_owned(),
            kind: "function".to_owned(),
            first_file: existing.file.clone(),
            file: file.to_owned(),
        })
    }

    fn apply_function(&mut self, name: &str, mut decl: FunctionDeclaration) -> FunctionId {
        let package = self.get_package(split_qualified(name).0);
        let id = FunctionId(self.functions.len() as u32);
        let tokens = std::mem::take(&mut decl.tokens);
        if !tokens.is_empty() {
            self.cache.store(&cache::function_key(name), tokens);
        }
        self.functions
            .push(Function::from_declaration(id, name, package, decl));
        self.function_index.insert(name.to_owned(), id);
        self.packages[package.index()].functions.push(id);
        trace!(name, "function declared");
        id
    }

    pub fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_index
            .get(name.trim_start_matches('\\'))
            .copied()
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    // ── Packages ──────────────────────────────────────────────────────────

    /// Get or create the package for a namespace (`""` is the global one).
    pub fn get_package(&mut self, namespace: &str) -> PackageId {
        let name = package_name(namespace.trim_start_matches('\\'));
        if let Some(&id) = self.package_index.get(name) {
            return id;
        }
        let id = PackageId(self.packages.len() as u32);
        self.packages.push(Package::new(id, name));
        self.package_index.insert(name.to_owned(), id);
        id
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn find_package(&self, name: &str) -> Option<&Package> {
        self.package_index.get(name).map(|&id| self.package(id))
    }

    /// Packages in first-seen order, as accepted by the filter.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages
            .iter()
            .filter(move |p| self.filter.accept_package(p))
    }

    pub fn package_types<'a>(
        &'a self,
        package: &'a Package,
    ) -> impl Iterator<Item = &'a DeclaredType> {
        package
            .types()
            .iter()
            .map(move |&id| self.ty(id))
            .filter(move |t| self.filter.accept_type(t))
    }

    pub fn package_functions<'a>(
        &'a self,
        package: &'a Package,
    ) -> impl Iterator<Item = &'a Function> {
        package
            .functions()
            .iter()
            .map(move |&id| self.function(id))
            .filter(move |f| self.filter.accept_function(f))
    }

    // ── Compilation units ─────────────────────────────────────────────────

    /// The id the next committed file will receive.
    pub fn next_file_id(&self) -> FileId {
        FileId(self.units.len() as u32)
    }

    /// Register a parsed file and all of its declarations.
    ///
    /// Every declaration is checked for conflicts, against the table and
    /// within the file, before any of them is applied. On error nothing
    /// from the file is registered.
    pub fn commit(&mut self, ast: Ast, decls: FileDeclarations) -> Result<FileId, ParseError> {
        let file = ast.file().to_owned();

        let mut seen = HashSet::new();
        for (name, decl) in &decls.types {
            if let Some(err) = self.type_conflict(name, &decl.file, decl.kind) {
                return Err(err);
            }
            if !seen.insert(name.as_str()) {
                return Err(ParseError::ConflictingRedeclaration {
                    name: name.clone(),
                    kind: decl.kind.as_str().to_owned(),
                    first_file: decl.file.clone(),
                    file: decl.file.clone(),
                });
            }
        }
        let mut seen = HashSet::new();
        for (name, decl) in &decls.functions {
            let name = name.trim_start_matches('\\');
            if let Some(err) = self.function_conflict(name, &decl.file) {
                return Err(err);
            }
            if !seen.insert(name) {
                return Err(ParseError::ConflictingRedeclaration {
                    name: name.to_owned(),
                    kind: "function".to_owned(),
                    first_file: decl.file.clone(),
                    file: decl.file.clone(),
                });
            }
        }

        let id = self.next_file_id();
        self.units.push(CompilationUnit { file, ast });
        for (name, decl) in decls.types {
            let ty = self.get_or_create_placeholder(&name, decl.kind);
            self.apply_type(ty, decl);
        }
        for (name, decl) in decls.functions {
            self.apply_function(name.trim_start_matches('\\'), decl);
        }
        Ok(id)
    }

    pub fn unit(&self, id: FileId) -> &CompilationUnit {
        &self.units[id.index()]
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn ast(&self, id: FileId) -> &Ast {
        &self.unit(id).ast
    }

    /// Token sequence stored for a cache key (see [`crate::cache`]).
    pub fn tokens(&self, key: &str) -> Option<Vec<Token>> {
        self.cache.restore(key)
    }
}
