//! Arena-allocated syntax tree.
//!
//! Every node lives in the [`Ast`] of the file it was parsed from and is
//! addressed by a [`NodeId`]. The parent link is a plain index, so the
//! bidirectional parent/child relation never creates an ownership cycle.
//!
//! The query surface is deliberately small and generic over [`NodeKind`]:
//! [`Ast::child`], [`Ast::first_child_of_kind`],
//! [`Ast::find_children_of_kind`] and [`Ast::parents_of_kind`].

mod display;
mod kind;

pub use kind::NodeKind;

use bitflags::bitflags;
use std::fmt;

use crate::builder::{TypeId, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source region of a node, 1-based, end column inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl Span {
    pub fn contains(&self, other: &Span) -> bool {
        (self.start_line, self.start_column) <= (other.start_line, other.start_column)
            && (other.end_line, other.end_column) <= (self.end_line, self.end_column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

bitflags! {
    /// Declaration modifiers, OR-combined.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const PUBLIC = 1;
        const PROTECTED = 1 << 1;
        const PRIVATE = 1 << 2;
        const STATIC = 1 << 3;
        const ABSTRACT = 1 << 4;
        const FINAL = 1 << 5;
        const READONLY = 1 << 6;
    }
}

impl Modifiers {
    pub const VISIBILITY: Modifiers = Modifiers::PUBLIC
        .union(Modifiers::PROTECTED)
        .union(Modifiers::PRIVATE);

    /// Source keywords for the set flags, in declaration order.
    pub fn keywords(self) -> Vec<&'static str> {
        [
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::FINAL, "final"),
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::STATIC, "static"),
            (Modifiers::READONLY, "readonly"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, kw)| kw)
        .collect()
    }
}

bitflags! {
    /// Syntactic markers that are not modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u32 {
        /// `&$x`, `function &f()`, `=&`
        const REFERENCE = 1;
        /// `...$args`
        const VARIADIC = 1 << 1;
        /// `static function () {}`, `static fn () =>`
        const STATIC = 1 << 2;
        /// `?->`
        const NULLSAFE = 1 << 3;
    }
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, Default)]
pub enum NodeData {
    #[default]
    None,
    /// Class, interface, trait or anonymous class declaration.
    Type(TypeId),
    /// Method, property or class constant of `owner`.
    Member { owner: TypeId, modifiers: Modifiers },
    /// Named-type reference (class, interface, trait, self, parent, static).
    Reference(TypeRef),
    Modifiers(Modifiers),
    Parameter { flags: NodeFlags, modifiers: Modifiers },
    Flags(NodeFlags),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub image: Option<String>,
    pub comment: Option<String>,
    pub span: Span,
    pub data: NodeData,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AstError {
    #[error("no child at index {index} of {kind:?} node")]
    IndexOutOfRange { index: usize, kind: NodeKind },
}

/// The syntax tree of one source file, rooted at a `CompilationUnit` node.
#[derive(Debug, Clone)]
pub struct Ast {
    file: String,
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new(file: &str) -> Self {
        let mut ast = Ast {
            file: file.to_owned(),
            nodes: Vec::new(),
        };
        ast.create(NodeKind::CompilationUnit, Some(file.to_owned()));
        ast
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn create(&mut self, kind: NodeKind, image: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            image,
            comment: None,
            span: Span::default(),
            data: NodeData::None,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Append `child` to `parent`'s children and point it back at `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn image(&self, id: NodeId) -> Option<&str> {
        self.node(id).image()
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn comment(&self, id: NodeId) -> Option<&str> {
        self.node(id).comment.as_deref()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.node(id).data
    }

    /// Modifiers of a member, field, constant or promoted parameter node.
    pub fn modifiers(&self, id: NodeId) -> Modifiers {
        match self.data(id) {
            NodeData::Member { modifiers, .. }
            | NodeData::Modifiers(modifiers)
            | NodeData::Parameter { modifiers, .. } => *modifiers,
            _ => Modifiers::empty(),
        }
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        match self.data(id) {
            NodeData::Flags(flags) | NodeData::Parameter { flags, .. } => *flags,
            _ => NodeFlags::empty(),
        }
    }

    /// The named-type reference a reference node carries.
    pub fn reference(&self, id: NodeId) -> Option<&TypeRef> {
        match self.data(id) {
            NodeData::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn child(&self, id: NodeId, index: usize) -> Result<NodeId, AstError> {
        self.children(id)
            .get(index)
            .copied()
            .ok_or(AstError::IndexOutOfRange {
                index,
                kind: self.kind(id),
            })
    }

    /// First descendant of the given kind in depth-first pre-order: a match
    /// nested under the first child wins over any match under later siblings.
    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        for &child in self.children(id) {
            if self.kind(child) == kind {
                return Some(child);
            }
            if let Some(found) = self.first_child_of_kind(child, kind) {
                return Some(found);
            }
        }
        None
    }

    /// Every descendant of the given kind, in depth-first pre-order.
    pub fn find_children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_children_of_kind(id, kind, &mut out);
        out
    }

    fn collect_children_of_kind(&self, id: NodeId, kind: NodeKind, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            if self.kind(child) == kind {
                out.push(child);
            }
            self.collect_children_of_kind(child, kind, out);
        }
    }

    /// Ancestors of the given kind, outermost first.
    pub fn parents_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if self.kind(p) == kind {
                out.push(p);
            }
            cur = self.parent(p);
        }
        out.reverse();
        out
    }

    /// All descendants of `id` in pre-order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }
}
