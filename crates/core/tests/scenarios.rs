//! End-to-end parser scenarios: forward references, token capture, scope
//! errors and the all-or-nothing commit of a file.

use phpgraph_core::{parse_source, Builder, NodeKind, ParseError, TypeKind};

fn parse(b: &mut Builder, file: &str, source: &str) -> Result<(), ParseError> {
    parse_source(b, source, file).map(|_| ())
}

fn parent_of(b: &Builder, name: &str) -> Option<phpgraph_core::TypeId> {
    let ty = b.ty(b.lookup(name)?);
    b.resolve(ty.parent.as_ref()?)
}

#[test]
fn parent_declared_first_resolves() {
    let mut b = Builder::new();
    parse(&mut b, "ab.php", "<?php class A {} class B extends A {}").unwrap();
    let a = b.lookup("A").unwrap();
    assert_eq!(parent_of(&b, "B"), Some(a));
    assert!(b.ty(a).is_declared());
}

#[test]
fn parent_declared_later_resolves_to_the_same_entry() {
    let mut b = Builder::new();
    parse(&mut b, "ba.php", "<?php class B extends A {} class A {}").unwrap();
    let a = b.lookup("A").unwrap();
    assert_eq!(parent_of(&b, "B"), Some(a));
    assert_eq!(b.ty(a).kind(), TypeKind::Class);
    assert_eq!(b.unresolved_types().count(), 0);
}

#[test]
fn forward_reference_across_files() {
    let mut b = Builder::new();
    parse(&mut b, "b.php", "<?php class B extends A {}").unwrap();
    let placeholder = b.lookup("A").unwrap();
    assert!(!b.ty(placeholder).is_declared());

    parse(&mut b, "a.php", "<?php class A {}").unwrap();
    assert_eq!(b.lookup("A"), Some(placeholder));
    assert!(b.ty(placeholder).is_declared());
    assert_eq!(b.ty(placeholder).file(), Some("a.php"));
    assert_eq!(parent_of(&b, "B"), Some(placeholder));
}

#[test]
fn method_body_span_is_its_braces_despite_nested_scopes() {
    let mut b = Builder::new();
    let source = "<?php\n\
                  class K {\n    \
                  function m() {\n        \
                  if (true) {\n            \
                  if (true) {}\n        \
                  }\n    \
                  }\n\
                  }\n";
    parse(&mut b, "k.php", source).unwrap();
    let ast = &b.units()[0].ast;
    let method = ast.first_child_of_kind(ast.root(), NodeKind::Method).unwrap();
    let body = ast.first_child_of_kind(method, NodeKind::ScopeStatement).unwrap();
    let span = ast.span(body);
    assert_eq!(
        (span.start_line, span.start_column, span.end_line, span.end_column),
        (3, 18, 7, 5)
    );

    let tokens = b.tokens("method:K::m").unwrap();
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts.first(), Some(&"function"));
    assert_eq!(texts.last(), Some(&"}"));
    assert_eq!(texts.iter().filter(|t| **t == "{").count(), 3);
    assert_eq!(texts.iter().filter(|t| **t == "}").count(), 3);
}

#[test]
fn parent_without_extends_is_invalid_state() {
    let mut b = Builder::new();
    let err = parse(
        &mut b,
        "p.php",
        "<?php class A {\n    function f() { return parent::f(); }\n}",
    )
    .unwrap_err();
    match err {
        ParseError::InvalidState { message, file, line, .. } => {
            assert!(message.contains("parent"), "{}", message);
            assert_eq!(file, "p.php");
            assert_eq!(line, 2);
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }
    assert!(b.units().is_empty());
}

#[test]
fn input_ending_inside_class_body_is_unclosed_body() {
    let mut b = Builder::new();
    let err = parse(&mut b, "foo.php", "<?php class Foo {").unwrap_err();
    assert_eq!(
        err,
        ParseError::UnclosedBody {
            file: "foo.php".to_owned()
        }
    );
}

#[test]
fn placeholder_creation_is_idempotent() {
    let mut b = Builder::new();
    let first = b.get_or_create_placeholder("App\\Thing", TypeKind::Unknown);
    let again = b.get_or_create_placeholder("\\App\\Thing", TypeKind::Class);
    assert_eq!(first, again);
    assert_eq!(b.types().count(), 1);

    parse(&mut b, "t.php", "<?php namespace App; class Thing {}").unwrap();
    assert_eq!(b.lookup("App\\Thing"), Some(first));
}

#[test]
fn redeclaring_a_type_in_another_file_conflicts() {
    let mut b = Builder::new();
    parse(&mut b, "one.php", "<?php class Dup {}").unwrap();
    let err = parse(&mut b, "two.php", "<?php class Helper {} interface Dup {}").unwrap_err();
    assert_eq!(
        err,
        ParseError::ConflictingRedeclaration {
            name: "Dup".to_owned(),
            kind: "interface".to_owned(),
            first_file: "one.php".to_owned(),
            file: "two.php".to_owned(),
        }
    );
    // Nothing from the rejected file was registered.
    assert!(!b.ty(b.lookup("Helper").unwrap()).is_declared());
    assert_eq!(b.ty(b.lookup("Dup").unwrap()).kind(), TypeKind::Class);
    assert_eq!(b.units().len(), 1);
}

#[test]
fn redeclaring_a_function_conflicts() {
    let mut b = Builder::new();
    parse(&mut b, "a.php", "<?php namespace Lib; function run() {}").unwrap();
    let err = parse(&mut b, "b.php", "<?php namespace Lib; function run() {}").unwrap_err();
    assert!(matches!(
        err,
        ParseError::ConflictingRedeclaration { ref name, ref kind, .. }
            if name == "Lib\\run" && kind == "function"
    ));
    assert_eq!(b.functions().count(), 1);
}

#[test]
fn failing_file_declares_nothing() {
    let mut b = Builder::new();
    let err = parse(
        &mut b,
        "half.php",
        "<?php class Good {}\nfunction helper() {}\nclass Bad {\n    function f() {",
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::UnclosedBody { .. }));
    assert!(!b.ty(b.lookup("Good").unwrap()).is_declared());
    assert!(b.lookup_function("helper").is_none());
    assert_eq!(b.packages().count(), 0);
    assert!(b.tokens("type:Good").is_none());
}

#[test]
fn first_child_of_kind_is_the_first_of_find_children_of_kind() {
    let mut b = Builder::new();
    parse(
        &mut b,
        "law.php",
        "<?php function f($a) { if ($a) { g($a); } while ($a) { h(); } return k(); }",
    )
    .unwrap();
    let ast = &b.units()[0].ast;
    for kind in [
        NodeKind::FunctionPostfix,
        NodeKind::Variable,
        NodeKind::ScopeStatement,
        NodeKind::ReturnStatement,
        NodeKind::Class,
    ] {
        assert_eq!(
            ast.first_child_of_kind(ast.root(), kind),
            ast.find_children_of_kind(ast.root(), kind).first().copied(),
            "{kind:?}"
        );
    }
}
