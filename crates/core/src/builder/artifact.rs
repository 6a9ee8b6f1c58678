//! The objects the symbol table hands out: types, their members, functions
//! and packages.

use serde::Serialize;

use super::{FileId, TypeRef};
use crate::ast::{Modifiers, NodeId, Span};
use crate::token::Token;

/// Name of the package that holds global-namespace declarations.
pub const GLOBAL_PACKAGE: &str = "+global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub(super) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FunctionId(pub(super) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageId(pub(super) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FunctionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PackageId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Locates a node in the tree of a committed compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub file: FileId,
    pub node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Trait,
    /// Referenced in a position that does not tell which kind it is.
    Unknown,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Trait => "trait",
            TypeKind::Unknown => "type",
        }
    }
}

/// Split a qualified name into its namespace and local part.
pub fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('\\') {
        Some(i) => (&name[..i], &name[i + 1..]),
        None => ("", name),
    }
}

/// Package name for a namespace, `+global` for the global namespace.
pub fn package_name(namespace: &str) -> &str {
    if namespace.is_empty() {
        GLOBAL_PACKAGE
    } else {
        namespace
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    /// The type the method is declared in.
    pub owner: TypeId,
    pub modifiers: Modifiers,
    pub by_reference: bool,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub owner: TypeId,
    pub modifiers: Modifiers,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Constant {
    pub name: String,
    pub owner: TypeId,
    pub modifiers: Modifiers,
    pub location: Option<NodeRef>,
    pub span: Span,
}

/// A class, interface or trait, or a placeholder standing in for one.
///
/// Placeholders are created on first reference and completed in place when
/// the declaration is parsed, so a `TypeId` handed out early stays valid.
#[derive(Debug, Clone)]
pub struct DeclaredType {
    id: TypeId,
    name: String,
    pub(super) kind: TypeKind,
    pub(super) declared: bool,
    pub(super) file: Option<String>,
    pub(super) package: Option<PackageId>,
    pub modifiers: Modifiers,
    pub anonymous: bool,
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub traits: Vec<TypeRef>,
    pub methods: Vec<Method>,
    pub properties: Vec<Property>,
    pub constants: Vec<Constant>,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
}

impl DeclaredType {
    pub(super) fn placeholder(id: TypeId, name: &str, kind: TypeKind) -> Self {
        DeclaredType {
            id,
            name: name.to_owned(),
            kind,
            declared: false,
            file: None,
            package: None,
            modifiers: Modifiers::empty(),
            anonymous: false,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
            location: None,
            span: Span::default(),
            comment: None,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name without a leading `\`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simple_name(&self) -> &str {
        split_qualified(&self.name).1
    }

    pub fn namespace(&self) -> &str {
        split_qualified(&self.name).0
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether a declaration has been parsed for this name.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn package(&self) -> Option<PackageId> {
        self.package
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifiers::ABSTRACT)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    id: FunctionId,
    name: String,
    pub(super) package: PackageId,
    pub file: String,
    pub by_reference: bool,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
}

impl Function {
    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn simple_name(&self) -> &str {
        split_qualified(&self.name).1
    }

    pub fn package(&self) -> PackageId {
        self.package
    }
}

/// A namespace and everything declared under it across all files.
#[derive(Debug, Clone)]
pub struct Package {
    id: PackageId,
    name: String,
    pub(super) types: Vec<TypeId>,
    pub(super) functions: Vec<FunctionId>,
}

impl Package {
    pub(super) fn new(id: PackageId, name: &str) -> Self {
        Package {
            id,
            name: name.to_owned(),
            types: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    pub fn functions(&self) -> &[FunctionId] {
        &self.functions
    }
}

/// A method as the parser hands it to the builder.
#[derive(Debug, Clone, Default)]
pub struct MethodDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub by_reference: bool,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
    pub tokens: Vec<Token>,
}

#[derive(Debug, Clone, Default)]
pub struct PropertyDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantDeclaration {
    pub name: String,
    pub modifiers: Modifiers,
    pub location: Option<NodeRef>,
    pub span: Span,
}

/// Everything parsed for one class, interface or trait declaration.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub kind: TypeKind,
    pub file: String,
    pub modifiers: Modifiers,
    pub anonymous: bool,
    pub parent: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub traits: Vec<TypeRef>,
    pub methods: Vec<MethodDeclaration>,
    pub properties: Vec<PropertyDeclaration>,
    pub constants: Vec<ConstantDeclaration>,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
    pub tokens: Vec<Token>,
}

impl TypeDeclaration {
    pub fn new(kind: TypeKind, file: &str) -> Self {
        TypeDeclaration {
            kind,
            file: file.to_owned(),
            modifiers: Modifiers::empty(),
            anonymous: false,
            parent: None,
            interfaces: Vec::new(),
            traits: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
            location: None,
            span: Span::default(),
            comment: None,
            tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionDeclaration {
    pub file: String,
    pub by_reference: bool,
    pub location: Option<NodeRef>,
    pub span: Span,
    pub comment: Option<String>,
    pub tokens: Vec<Token>,
}

impl Function {
    pub(super) fn from_declaration(
        id: FunctionId,
        name: &str,
        package: PackageId,
        decl: FunctionDeclaration,
    ) -> Self {
        Function {
            id,
            name: name.to_owned(),
            package,
            file: decl.file,
            by_reference: decl.by_reference,
            location: decl.location,
            span: decl.span,
            comment: decl.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_parts() {
        assert_eq!(split_qualified("App\\Model\\User"), ("App\\Model", "User"));
        assert_eq!(split_qualified("User"), ("", "User"));
        assert_eq!(package_name(""), GLOBAL_PACKAGE);
        assert_eq!(package_name("App"), "App");
    }
}
