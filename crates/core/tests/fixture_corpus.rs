//! Parses the small application under tests/fixtures/app in several file
//! orders and checks that every order converges on the same graph.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use phpgraph_core::builder::TypeKind;
use phpgraph_core::source::FileSystemProvider;
use phpgraph_core::{parse_files, Ast, Builder, NodeId, NodeKind, Settings};

fn collect_php_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "php"))
        .collect();
    paths.sort();
    paths
}

fn fixture_paths() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/app");
    let paths = collect_php_files(&dir);
    assert_eq!(paths.len(), 5, "fixture set changed");
    paths
}

fn parse_all(paths: &[PathBuf]) -> Builder {
    let mut builder = Builder::new();
    let run = parse_files(
        &mut builder,
        &FileSystemProvider,
        paths,
        &Settings::default(),
    );
    let failures: Vec<String> = run
        .failures
        .iter()
        .map(|f| format!("{}: {}", f.path.display(), f.error))
        .collect();
    assert!(failures.is_empty(), "fixtures failed to parse:\n{}", failures.join("\n"));
    builder
}

/// Declared types by name, with their kind and resolved parent name.
fn declared(b: &Builder) -> BTreeMap<String, (TypeKind, Option<String>)> {
    b.types()
        .filter(|t| t.is_declared())
        .map(|t| {
            let parent = t
                .parent
                .as_ref()
                .and_then(|p| b.resolve(p))
                .map(|id| b.ty(id).name().to_owned());
            (t.name().to_owned(), (t.kind(), parent))
        })
        .collect()
}

fn dumps(b: &Builder) -> BTreeMap<String, String> {
    b.units()
        .iter()
        .map(|u| (u.file.clone(), u.ast.dump(u.ast.root())))
        .collect()
}

#[test]
fn fixture_app_declares_expected_graph() {
    let b = parse_all(&fixture_paths());
    let types = declared(&b);
    let names: Vec<&str> = types.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "App\\Domain\\HasKey",
            "App\\Domain\\InvalidEmail",
            "App\\Domain\\Model",
            "App\\Domain\\Timestamps",
            "App\\Domain\\User",
            "App\\Storage\\Repository",
            "App\\Storage\\class@anonymous#1",
        ]
    );
    assert_eq!(
        types["App\\Domain\\User"],
        (TypeKind::Class, Some("App\\Domain\\Model".to_owned()))
    );
    assert_eq!(types["App\\Domain\\HasKey"].0, TypeKind::Interface);
    assert_eq!(types["App\\Domain\\Timestamps"].0, TypeKind::Trait);

    let mut unresolved: Vec<&str> = b.unresolved_types().map(|t| t.name()).collect();
    unresolved.sort();
    assert_eq!(
        unresolved,
        vec![
            "Countable",
            "DateTimeImmutable",
            "InvalidArgumentException",
            "JsonSerializable",
            "LogicException",
            "ReflectionClass",
            "RuntimeException",
        ]
    );

    let functions: Vec<&str> = b.functions().map(|f| f.name()).collect();
    assert!(functions.contains(&"App\\Support\\log_info"));
    assert!(functions.contains(&"App\\Support\\registry"));
    assert!(b.function(b.lookup_function("App\\Support\\registry").unwrap()).by_reference);

    let packages: Vec<&str> = b.packages().map(|p| p.name()).collect();
    assert_eq!(packages, vec!["App\\Domain", "App\\Storage", "App\\Support"]);
}

#[test]
fn every_file_order_converges() {
    let forward = fixture_paths();
    let mut reverse = forward.clone();
    reverse.reverse();
    let mut rotated = forward.clone();
    rotated.rotate_left(2);

    let a = parse_all(&forward);
    for order in [reverse, rotated] {
        let b = parse_all(&order);
        assert_eq!(declared(&a), declared(&b));
        assert_eq!(dumps(&a), dumps(&b));
    }
}

#[test]
fn references_to_one_name_share_one_identity() {
    let b = parse_all(&fixture_paths());
    let model = b.lookup("App\\Domain\\Model").unwrap();
    let mut seen = 0;
    for unit in b.units() {
        for r in unit.ast.find_children_of_kind(unit.ast.root(), NodeKind::ClassReference)
            .into_iter()
            .chain(unit.ast.find_children_of_kind(
                unit.ast.root(),
                NodeKind::ClassOrInterfaceReference,
            ))
        {
            let reference = unit.ast.reference(r).unwrap();
            if reference.name() == "App\\Domain\\Model" {
                assert_eq!(b.resolve(reference), Some(model));
                seen += 1;
            }
        }
    }
    // `extends Model`, `save(Model $model)`.
    assert_eq!(seen, 2);
}

fn assert_spans_nest(ast: &Ast, id: NodeId) {
    let span = ast.span(id);
    assert!(
        span.start_line <= span.end_line,
        "{}: {:?} has inverted span {}",
        ast.file(),
        ast.kind(id),
        span
    );
    for &child in ast.children(id) {
        let inner = ast.span(child);
        assert!(
            span.contains(&inner),
            "{}: {:?} {} does not contain {:?} {}",
            ast.file(),
            ast.kind(id),
            span,
            ast.kind(child),
            inner
        );
        assert_spans_nest(ast, child);
    }
}

#[test]
fn spans_nest_in_every_fixture() {
    let b = parse_all(&fixture_paths());
    for unit in b.units() {
        assert_spans_nest(&unit.ast, unit.ast.root());
    }
}

#[test]
fn declaration_tokens_are_cached() {
    let b = parse_all(&fixture_paths());
    let user = b.tokens("type:App\\Domain\\User").unwrap();
    assert_eq!(user.first().map(|t| t.text.as_str()), Some("final"));
    assert_eq!(user.last().map(|t| t.text.as_str()), Some("}"));

    let save = b.tokens("method:App\\Storage\\Repository::save").unwrap();
    assert_eq!(save[0].text, "public");

    assert!(b.tokens("function:App\\Support\\log_info").is_some());
    assert!(b.tokens("type:JsonSerializable").is_none());
}

#[test]
fn doc_comments_reach_declarations_and_members() {
    let b = parse_all(&fixture_paths());
    let model = b.ty(b.lookup("App\\Domain\\Model").unwrap());
    assert!(model
        .comment
        .as_deref()
        .is_some_and(|c| c.contains("persisted entities")));
    let repo = b.ty(b.lookup("App\\Storage\\Repository").unwrap());
    let items = repo.properties.iter().find(|p| p.name == "$items").unwrap();
    assert_eq!(items.comment.as_deref(), Some("/** @var array<int, Model> */"));
}
