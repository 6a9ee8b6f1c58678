use std::path::Path;
use std::process;

use phpgraph_core::source::{FileSystemProvider, SourceProvider};
use phpgraph_core::{parse_source, Builder, ParseError};

use crate::OutputFormat;

fn report_error(error: &ParseError, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&error.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", error));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => eprintln!("{}", error),
    }
}

pub(crate) fn cmd_dump(file: &Path, output: OutputFormat) {
    let name = file.display().to_string();
    let source = match FileSystemProvider.read_source(file) {
        Ok(source) => source,
        Err(e) => {
            report_error(
                &ParseError::Io {
                    message: e.to_string(),
                    file: name,
                },
                output,
            );
            process::exit(1);
        }
    };

    let mut builder = Builder::new();
    let id = match parse_source(&mut builder, &source, &name) {
        Ok(id) => id,
        Err(e) => {
            report_error(&e, output);
            process::exit(1);
        }
    };

    let ast = builder.ast(id);
    let tree = ast.dump(ast.root());
    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "file": name,
                "nodes": ast.len(),
                "tree": tree.lines().collect::<Vec<_>>(),
            });
            let pretty = serde_json::to_string_pretty(&value)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization error: {}\"}}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => print!("{}", tree),
    }
}
