//! Read-only traversal over a finished [`Builder`].

use crate::ast::{Ast, NodeId, NodeKind};
use crate::builder::{Builder, DeclaredType, Function, Method, NodeRef, Package, Property, TypeKind};

/// Callbacks invoked by [`walk`]. Every method defaults to a no-op, so an
/// analyzer only implements what it cares about.
pub trait Visitor {
    fn visit_package(&mut self, _builder: &Builder, _package: &Package) {}
    fn visit_class(&mut self, _builder: &Builder, _ty: &DeclaredType) {}
    fn visit_interface(&mut self, _builder: &Builder, _ty: &DeclaredType) {}
    fn visit_trait(&mut self, _builder: &Builder, _ty: &DeclaredType) {}
    fn visit_method(&mut self, _builder: &Builder, _method: &Method) {}
    fn visit_property(&mut self, _builder: &Builder, _property: &Property) {}
    fn visit_function(&mut self, _builder: &Builder, _function: &Function) {}
    /// Called for each node below a method or function declaration, in
    /// pre-order. Functions and classes declared inside a body are not
    /// descended into; they are reported through their own callbacks.
    fn visit_node(&mut self, _ast: &Ast, _node: NodeId) {}
}

/// Drive `visitor` over the filtered package index: each package, its
/// types with their methods and properties, then its functions. Method and
/// function bodies are walked node by node right after their declaration.
pub fn walk<V: Visitor + ?Sized>(builder: &Builder, visitor: &mut V) {
    for package in builder.packages() {
        visitor.visit_package(builder, package);
        for ty in builder.package_types(package) {
            match ty.kind() {
                TypeKind::Class => visitor.visit_class(builder, ty),
                TypeKind::Interface => visitor.visit_interface(builder, ty),
                TypeKind::Trait => visitor.visit_trait(builder, ty),
                TypeKind::Unknown => continue,
            }
            for method in &ty.methods {
                visitor.visit_method(builder, method);
                walk_body(builder, method.location, visitor);
            }
            for property in &ty.properties {
                visitor.visit_property(builder, property);
            }
        }
        for function in builder.package_functions(package) {
            visitor.visit_function(builder, function);
            walk_body(builder, function.location, visitor);
        }
    }
}

fn walk_body<V: Visitor + ?Sized>(builder: &Builder, location: Option<NodeRef>, visitor: &mut V) {
    let Some(location) = location else {
        return;
    };
    let ast = builder.ast(location.file);
    let mut stack: Vec<NodeId> = ast.children(location.node).iter().rev().copied().collect();
    while let Some(node) = stack.pop() {
        // Nested declarations get their own callbacks from `walk`.
        if is_declaration(ast.kind(node)) {
            continue;
        }
        visitor.visit_node(ast, node);
        stack.extend(ast.children(node).iter().rev().copied());
    }
}

fn is_declaration(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Function
            | NodeKind::Class
            | NodeKind::Interface
            | NodeKind::Trait
            | NodeKind::AnonymousClass
    )
}
