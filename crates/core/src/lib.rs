#![allow(clippy::result_large_err)]
//! phpgraph-core: PHP source parser and cross-file symbol table.
//!
//! Turns PHP files into one AST per file plus a single [`Builder`] that
//! registers every class, interface, trait, function and namespace package
//! seen across the run. References to types are resolved through the
//! builder, so files can be parsed in any order.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`parse_source()`] / [`parse_files()`] -- lex, parse and commit files
//! - [`Builder`] -- the symbol table and package index
//! - [`Ast`], [`NodeKind`], [`NodeId`] -- the per-file tree
//! - [`ParseError`] -- the fatal error raised for a failing file
//! - [`Visitor`] / [`walk()`] -- traversal over the finished graph

pub mod ast;
pub mod builder;
pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;
pub mod token_stack;
pub mod visitor;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Ast, Modifiers, Node, NodeData, NodeFlags, NodeId, NodeKind, Span};
pub use builder::{
    Binding, Builder, CompilationUnit, DeclaredType, FileId, Function, NodeRef, Package,
    TypeId, TypeKind, TypeRef,
};
pub use config::Settings;
pub use error::ParseError;
pub use parser::Parser;
pub use token::{Token, TokenKind, TokenStream, VecTokenStream};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use driver::{parse_files, parse_source, ParseFailure, ParseRun};
pub use lexer::lex;
pub use visitor::{walk, Visitor};
