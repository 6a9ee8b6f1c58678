use std::cell::OnceCell;

use super::{TypeId, TypeKind};

/// How a reference is bound to the type it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// A plain class, interface or trait name.
    Named,
    /// `self`: the lexically enclosing type.
    SelfType,
    /// `parent`: the enclosing type's declared parent class.
    Parent,
    /// `static`: the type the call is made on at run time. The stored name is
    /// the lexically enclosing type, the closest static approximation.
    LateStatic,
}

/// A named-type reference carried by an AST node.
///
/// Holds the fully qualified name (no leading `\`) as the lookup key into the
/// [`Builder`](super::Builder) plus a cell that memoizes the first successful
/// resolution.
#[derive(Debug, Clone)]
pub struct TypeRef {
    name: String,
    kind: TypeKind,
    binding: Binding,
    resolved: OnceCell<TypeId>,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, kind: TypeKind, binding: Binding) -> Self {
        TypeRef {
            name: name.into(),
            kind,
            binding,
            resolved: OnceCell::new(),
        }
    }

    pub fn named(name: impl Into<String>, kind: TypeKind) -> Self {
        Self::new(name, kind, Binding::Named)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind expected at the reference site; `Unknown` when the syntax
    /// does not tell (e.g. `instanceof`).
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn is_late_static(&self) -> bool {
        self.binding == Binding::LateStatic
    }

    /// The memoized identity, if this reference has been resolved before.
    pub fn cached(&self) -> Option<TypeId> {
        self.resolved.get().copied()
    }

    pub(super) fn memoize(&self, id: TypeId) -> TypeId {
        *self.resolved.get_or_init(|| id)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.binding == other.binding
    }
}

impl Eq for TypeRef {}
