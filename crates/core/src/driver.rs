//! Run-level orchestration: read, lex and parse a batch of files into one
//! [`Builder`].
//!
//! A file that fails is recorded and skipped; the run continues with the
//! next file unless [`Settings::fail_fast`] is set. Whatever earlier files
//! committed stays in the builder either way.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::builder::{Builder, FileId};
use crate::config::Settings;
use crate::error::ParseError;
use crate::lexer::lex;
use crate::parser::Parser;
use crate::source::SourceProvider;
use crate::token::VecTokenStream;

/// A file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub error: ParseError,
}

/// Outcome of [`parse_files`].
#[derive(Debug, Default)]
pub struct ParseRun {
    /// Files committed to the builder, in input order.
    pub parsed: Vec<(PathBuf, FileId)>,
    pub failures: Vec<ParseFailure>,
    /// Set when `fail_fast` cut the run short.
    pub stopped_early: bool,
}

impl ParseRun {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Lex and parse one file's text, committing it to `builder`.
pub fn parse_source(builder: &mut Builder, source: &str, file: &str) -> Result<FileId, ParseError> {
    let tokens = lex(source, file)?;
    debug!(file, tokens = tokens.len(), "lexed");
    Parser::new(builder, VecTokenStream::new(tokens), file).parse()
}

/// Parse every path in order.
pub fn parse_files<P: SourceProvider + ?Sized>(
    builder: &mut Builder,
    provider: &P,
    paths: &[PathBuf],
    settings: &Settings,
) -> ParseRun {
    let mut run = ParseRun::default();
    for path in paths {
        match parse_path(builder, provider, path) {
            Ok(id) => run.parsed.push((path.clone(), id)),
            Err(error) => {
                warn!(path = %path.display(), %error, "file skipped");
                run.failures.push(ParseFailure {
                    path: path.clone(),
                    error,
                });
                if settings.fail_fast {
                    run.stopped_early = true;
                    break;
                }
            }
        }
    }
    info!(
        parsed = run.parsed.len(),
        failed = run.failures.len(),
        "parse run finished"
    );
    run
}

fn parse_path<P: SourceProvider + ?Sized>(
    builder: &mut Builder,
    provider: &P,
    path: &Path,
) -> Result<FileId, ParseError> {
    let file = path.display().to_string();
    let source = provider
        .read_source(path)
        .map_err(|e| ParseError::Io {
            message: e.to_string(),
            file: file.clone(),
        })?;
    parse_source(builder, &source, &file)
}
