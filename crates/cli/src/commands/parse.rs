use std::path::{Path, PathBuf};
use std::process;

use phpgraph_core::source::FileSystemProvider;
use phpgraph_core::{parse_files, Builder, ParseRun, Settings};
use tracing::debug;
use walkdir::WalkDir;

use crate::OutputFormat;

/// Expand directories into the files below them that the settings accept.
/// Paths given explicitly are kept as they are, whatever their extension.
pub(crate) fn collect_sources(paths: &[PathBuf], settings: &Settings) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && settings.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    debug!(files = files.len(), "sources collected");
    files
}

pub(crate) fn cmd_parse(paths: &[PathBuf], settings: &Settings, output: OutputFormat, quiet: bool) {
    let files = collect_sources(paths, settings);
    let mut builder = Builder::new().with_filter(settings.package_filter());
    let run = parse_files(&mut builder, &FileSystemProvider, &files, settings);

    match output {
        OutputFormat::Json => {
            let report = json_report(&builder, &run);
            let pretty = serde_json::to_string_pretty(&report)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for failure in &run.failures {
                eprintln!("{}", failure.error);
            }
            if !quiet {
                print!("{}", text_report(&builder));
                println!(
                    "parsed {} file(s), {} failed{}",
                    run.parsed.len(),
                    run.failures.len(),
                    if run.stopped_early { ", stopped early" } else { "" }
                );
            }
        }
    }

    if !run.is_success() {
        process::exit(1);
    }
}

fn display_file(file: Option<&str>) -> String {
    file.map(|f| {
        Path::new(f)
            .file_name()
            .map_or_else(|| f.to_owned(), |n| n.to_string_lossy().into_owned())
    })
    .unwrap_or_default()
}

fn text_report(builder: &Builder) -> String {
    let mut out = String::new();
    for package in builder.packages() {
        out.push_str(&format!("package {}\n", package.name()));
        for ty in builder.package_types(package) {
            out.push_str(&format!(
                "  {} {} ({})\n",
                ty.kind().as_str(),
                ty.name(),
                display_file(ty.file())
            ));
        }
        for function in builder.package_functions(package) {
            out.push_str(&format!(
                "  function {} ({})\n",
                function.name(),
                display_file(Some(&function.file))
            ));
        }
    }
    let mut unresolved: Vec<&str> = builder.unresolved_types().map(|t| t.name()).collect();
    unresolved.sort_unstable();
    if !unresolved.is_empty() {
        out.push_str("unresolved\n");
        for name in unresolved {
            out.push_str(&format!("  {}\n", name));
        }
    }
    out
}

fn json_report(builder: &Builder, run: &ParseRun) -> serde_json::Value {
    let packages: Vec<serde_json::Value> = builder
        .packages()
        .map(|package| {
            let types: Vec<serde_json::Value> = builder
                .package_types(package)
                .map(|ty| {
                    serde_json::json!({
                        "name": ty.name(),
                        "kind": ty.kind().as_str(),
                        "file": ty.file(),
                        "line": ty.span.start_line,
                        "methods": ty.methods.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
                    })
                })
                .collect();
            let functions: Vec<serde_json::Value> = builder
                .package_functions(package)
                .map(|f| {
                    serde_json::json!({
                        "name": f.name(),
                        "file": f.file,
                        "line": f.span.start_line,
                    })
                })
                .collect();
            serde_json::json!({
                "name": package.name(),
                "types": types,
                "functions": functions,
            })
        })
        .collect();
    let mut unresolved: Vec<&str> = builder.unresolved_types().map(|t| t.name()).collect();
    unresolved.sort_unstable();

    serde_json::json!({
        "parsed": run.parsed.len(),
        "stopped_early": run.stopped_early,
        "packages": packages,
        "unresolved": unresolved,
        "failures": run.failures.iter().map(|f| f.error.to_json_value()).collect::<Vec<_>>(),
    })
}
