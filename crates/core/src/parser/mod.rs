//! Recursive-descent PHP parser.
//!
//! A [`Parser`] consumes the token stream of one file, builds that file's
//! [`Ast`] and mints type placeholders in the shared [`Builder`] for every
//! class-like name it meets. Declarations are collected while the file
//! parses and committed to the builder in one step once the whole file has
//! parsed, so a failing file leaves no partial declarations behind.
//!
//! Declaration-level nodes and statements take their spans from a
//! [`TokenStack`] scope; expression nodes span from their first token to the
//! last token consumed.

mod declarations;
mod expressions;
mod statements;
mod types;

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::ast::{Ast, NodeData, NodeId, NodeKind, Span};
use crate::builder::{
    Binding, Builder, FileDeclarations, FileId, NodeRef, TypeDeclaration, TypeId, TypeKind,
    TypeRef,
};
use crate::error::ParseError;
use crate::token::{Token, TokenKind, TokenStream};
use crate::token_stack::TokenStack;

/// A token pulled from the stream ahead of time, with the doc comment that
/// immediately preceded it.
struct Buffered {
    comment: Option<String>,
    token: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportKind {
    Class,
    Function,
    Constant,
}

/// `use` aliases of the active namespace block. Class and function aliases
/// are keyed lowercase, constants as written.
#[derive(Debug, Default)]
struct Imports {
    classes: HashMap<String, String>,
    functions: HashMap<String, String>,
    constants: HashMap<String, String>,
}

/// An open class, interface, trait or anonymous class body.
pub(super) struct TypeScope {
    pub(super) id: TypeId,
    pub(super) name: String,
    pub(super) kind: TypeKind,
    pub(super) parent: Option<TypeRef>,
    pub(super) decl: TypeDeclaration,
}

enum Scope {
    Type(TypeScope),
    /// A named function body; hides any enclosing type.
    Function,
}

pub struct Parser<'b, S: TokenStream> {
    stream: S,
    lookahead: VecDeque<Buffered>,
    last: Option<Token>,
    /// Open `{`, `(` and `[` tokens not yet closed.
    depth: usize,
    stack: TokenStack,
    ast: Ast,
    builder: &'b mut Builder,
    file: String,
    file_id: FileId,
    namespace: String,
    imports: Imports,
    scopes: Vec<Scope>,
    pending: FileDeclarations,
}

impl<'b, S: TokenStream> Parser<'b, S> {
    pub fn new(builder: &'b mut Builder, stream: S, file: &str) -> Self {
        let file_id = builder.next_file_id();
        Parser {
            stream,
            lookahead: VecDeque::new(),
            last: None,
            depth: 0,
            stack: TokenStack::new(),
            ast: Ast::new(file),
            builder,
            file: file.to_owned(),
            file_id,
            namespace: String::new(),
            imports: Imports::default(),
            scopes: Vec::new(),
            pending: FileDeclarations::default(),
        }
    }

    /// Parse the whole stream and commit the file to the builder.
    pub fn parse(mut self) -> Result<FileId, ParseError> {
        debug!(file = %self.file, "parsing");
        let root = self.ast.root();
        self.stack.push();
        while self.peek().is_some() {
            self.parse_top_statement(root)?;
        }
        self.finish(root);
        debug_assert_eq!(self.stack.depth(), 0);

        let Parser {
            ast,
            pending,
            builder,
            file,
            ..
        } = self;
        let types = pending.types.len();
        let functions = pending.functions.len();
        let id = builder.commit(ast, pending)?;
        debug!(file = %file, types, functions, "parsed");
        Ok(id)
    }

    // ── Token access ──────────────────────────────────────────────────────

    /// Make sure at least `n + 1` tokens are buffered. Doc comments are
    /// folded into the token that follows them.
    fn fill(&mut self, n: usize) -> bool {
        while self.lookahead.len() <= n {
            let mut comment = None;
            loop {
                match self.stream.next() {
                    Some(t) if t.kind == TokenKind::DocComment => comment = Some(t.text),
                    Some(token) => {
                        self.lookahead.push_back(Buffered { comment, token });
                        break;
                    }
                    None => return false,
                }
            }
        }
        true
    }

    pub(super) fn peek(&mut self) -> Option<&Token> {
        self.peek_nth(0)
    }

    pub(super) fn peek_nth(&mut self, n: usize) -> Option<&Token> {
        if !self.fill(n) {
            return None;
        }
        self.lookahead.get(n).map(|b| &b.token)
    }

    pub(super) fn peek_kind(&mut self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    pub(super) fn peek_kind_nth(&mut self, n: usize) -> Option<TokenKind> {
        self.peek_nth(n).map(|t| t.kind)
    }

    pub(super) fn at(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    /// Doc comment written directly before the next token.
    pub(super) fn peek_comment(&mut self) -> Option<String> {
        if !self.fill(0) {
            return None;
        }
        self.lookahead.front().and_then(|b| b.comment.clone())
    }

    /// Consume the next token, recording it in every open capture scope.
    pub(super) fn next(&mut self) -> Result<Token, ParseError> {
        if !self.fill(0) {
            return Err(self.end_of_input());
        }
        let token = match self.lookahead.pop_front() {
            Some(b) => b.token,
            None => return Err(self.end_of_input()),
        };
        match token.kind {
            TokenKind::OpenCurly | TokenKind::OpenParen | TokenKind::OpenBracket => {
                self.depth += 1
            }
            TokenKind::CloseCurly | TokenKind::CloseParen | TokenKind::CloseBracket => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }
        self.last = Some(token.clone());
        Ok(self.stack.add(token))
    }

    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            self.next()
        } else {
            Err(self.unexpected(what))
        }
    }

    pub(super) fn accept(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
        if self.at(kind) {
            self.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// An identifier, or a keyword used where PHP allows any name.
    pub(super) fn expect_identifier(&mut self, what: &str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(t) if t.is_identifier_like() => self.next(),
            _ => Err(self.unexpected(what)),
        }
    }

    /// `;`, or a close tag which ends a statement the same way.
    pub(super) fn end_statement(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Semicolon) | Some(TokenKind::CloseTag) => {
                self.next()?;
                Ok(())
            }
            _ => Err(self.unexpected("';'")),
        }
    }

    // ── Errors ────────────────────────────────────────────────────────────

    pub(super) fn unexpected(&mut self, expected: &str) -> ParseError {
        match self.peek() {
            Some(t) => {
                let t = t.clone();
                ParseError::unexpected(&t, expected, &self.file)
            }
            None => self.end_of_input(),
        }
    }

    /// Input ran out: an unclosed body when a bracket is still open,
    /// otherwise a plain end of stream.
    pub(super) fn end_of_input(&self) -> ParseError {
        if self.depth > 0 {
            return ParseError::UnclosedBody {
                file: self.file.clone(),
            };
        }
        let (line, column) = self
            .last
            .as_ref()
            .map_or((0, 0), |t| (t.end_line, t.end_column));
        ParseError::TokenStreamEnd {
            file: self.file.clone(),
            line,
            column,
        }
    }

    pub(super) fn invalid_state(&self, at: &Token, message: impl Into<String>) -> ParseError {
        ParseError::InvalidState {
            message: message.into(),
            file: self.file.clone(),
            line: at.start_line,
            column: at.start_column,
        }
    }

    // ── Spans ─────────────────────────────────────────────────────────────

    /// Start position of the next token.
    pub(super) fn mark(&mut self) -> (u32, u32) {
        if let Some(t) = self.peek() {
            return (t.start_line, t.start_column);
        }
        self.last
            .as_ref()
            .map_or((0, 0), |t| (t.end_line, t.end_column))
    }

    /// Span `node` from `start` to the end of the last consumed token.
    pub(super) fn close(&mut self, node: NodeId, start: (u32, u32)) {
        let (end_line, end_column) = self
            .last
            .as_ref()
            .map_or(start, |t| (t.end_line, t.end_column));
        self.ast.node_mut(node).span = Span {
            start_line: start.0,
            end_line,
            start_column: start.1,
            end_column,
        };
    }

    /// Pop the innermost capture scope and span `node` over its tokens.
    pub(super) fn finish(&mut self, node: NodeId) -> Vec<Token> {
        let tokens = self.stack.pop();
        if let (Some(first), Some(last)) = (tokens.first(), tokens.last()) {
            self.ast.node_mut(node).span = Span {
                start_line: first.start_line,
                end_line: last.end_line,
                start_column: first.start_column,
                end_column: last.end_column,
            };
        }
        tokens
    }

    pub(super) fn node(&mut self, parent: NodeId, kind: NodeKind, image: Option<String>) -> NodeId {
        let node = self.ast.create(kind, image);
        self.ast.add_child(parent, node);
        node
    }

    pub(super) fn node_ref(&self, node: NodeId) -> NodeRef {
        NodeRef {
            file: self.file_id,
            node,
        }
    }

    // ── Names ─────────────────────────────────────────────────────────────

    /// A name as written: `Foo`, `Foo\Bar`, `\Foo\Bar` or `namespace\Foo`.
    pub(super) fn parse_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        if self.at(TokenKind::Namespace) {
            let t = self.next()?;
            name.push_str(&t.text);
            self.expect(TokenKind::Backslash, "'\\'")?;
            name.push('\\');
        } else if self.accept(TokenKind::Backslash)? {
            name.push('\\');
        }
        let first = self.expect_identifier("a name")?;
        name.push_str(&first.text);
        while self.at(TokenKind::Backslash)
            && self.peek_nth(1).is_some_and(Token::is_identifier_like)
        {
            self.next()?;
            let segment = self.next()?;
            name.push('\\');
            name.push_str(&segment.text);
        }
        Ok(name)
    }

    fn in_namespace(&self, local: &str) -> String {
        if self.namespace.is_empty() {
            local.to_owned()
        } else {
            format!("{}\\{}", self.namespace, local)
        }
    }

    /// Fully qualify a class-like name against the current namespace and
    /// its imports. The result never has a leading `\`.
    pub(super) fn qualify(&self, raw: &str) -> String {
        if let Some(absolute) = raw.strip_prefix('\\') {
            return absolute.to_owned();
        }
        if raw
            .get(..10)
            .is_some_and(|p| p.eq_ignore_ascii_case("namespace\\"))
        {
            return self.in_namespace(&raw[10..]);
        }
        let (first, rest) = match raw.find('\\') {
            Some(i) => (&raw[..i], &raw[i..]),
            None => (raw, ""),
        };
        match self.imports.classes.get(&first.to_ascii_lowercase()) {
            Some(target) => format!("{}{}", target, rest),
            None => self.in_namespace(raw),
        }
    }

    /// Qualify a function name when it is imported or written qualified.
    /// Unqualified, unimported names are kept as written: PHP resolves them
    /// against the namespace first and the global scope second at run time.
    pub(super) fn qualify_function(&self, raw: &str) -> String {
        if raw.contains('\\') {
            return self.qualify(raw);
        }
        match self.imports.functions.get(&raw.to_ascii_lowercase()) {
            Some(target) => target.clone(),
            None => raw.to_owned(),
        }
    }

    pub(super) fn qualify_constant(&self, raw: &str) -> String {
        if raw.contains('\\') {
            return self.qualify(raw);
        }
        match self.imports.constants.get(raw) {
            Some(target) => target.clone(),
            None => raw.to_owned(),
        }
    }

    // ── Type scopes ───────────────────────────────────────────────────────

    fn type_scope(&self, at: &Token, keyword: &str) -> Result<&TypeScope, ParseError> {
        match self.scopes.last() {
            Some(Scope::Type(scope)) => Ok(scope),
            _ => Err(self.invalid_state(
                at,
                format!("'{}' used outside of a class scope", keyword),
            )),
        }
    }

    pub(super) fn current_type(&mut self) -> Option<&mut TypeScope> {
        match self.scopes.last_mut() {
            Some(Scope::Type(scope)) => Some(scope),
            _ => None,
        }
    }

    /// Build a reference node for a class-like name. `self`, `parent` and
    /// `static` bind against the innermost open type; any other name is
    /// qualified and registered as a placeholder.
    pub(super) fn reference_from_name(
        &mut self,
        raw: &str,
        at: &Token,
        node_kind: NodeKind,
        kind: TypeKind,
    ) -> Result<NodeId, ParseError> {
        let (node_kind, data) = match raw.to_ascii_lowercase().as_str() {
            "self" => {
                let scope = self.type_scope(at, "self")?;
                let r = TypeRef::new(scope.name.clone(), scope.kind, Binding::SelfType);
                (NodeKind::SelfReference, NodeData::Reference(r))
            }
            "static" => {
                let scope = self.type_scope(at, "static")?;
                let r = TypeRef::new(scope.name.clone(), scope.kind, Binding::LateStatic);
                (NodeKind::StaticReference, NodeData::Reference(r))
            }
            "parent" => {
                let scope = self.type_scope(at, "parent")?;
                match (&scope.parent, scope.kind) {
                    // The using class supplies the parent.
                    (_, TypeKind::Trait) => (NodeKind::ParentReference, NodeData::None),
                    (Some(p), _) => {
                        let r = TypeRef::new(p.name(), TypeKind::Class, Binding::Parent);
                        (NodeKind::ParentReference, NodeData::Reference(r))
                    }
                    (None, k) => {
                        return Err(self.invalid_state(
                            at,
                            format!(
                                "'parent' used in {} {} which does not extend a class",
                                k.as_str(),
                                scope.name
                            ),
                        ))
                    }
                }
            }
            _ => {
                let name = self.qualify(raw);
                self.builder.get_or_create_placeholder(&name, kind);
                (node_kind, NodeData::Reference(TypeRef::named(name, kind)))
            }
        };
        let node = self.ast.create(node_kind, Some(raw.to_owned()));
        self.ast.node_mut(node).data = data;
        Ok(node)
    }

    /// Parse a class-like name (or `static`) into a reference node that is
    /// not yet attached to the tree.
    pub(super) fn parse_class_name(
        &mut self,
        node_kind: NodeKind,
        kind: TypeKind,
    ) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let at = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.end_of_input()),
        };
        let raw = if at.kind == TokenKind::Static {
            self.next()?.text
        } else {
            self.parse_name()?
        };
        let node = self.reference_from_name(&raw, &at, node_kind, kind)?;
        self.close(node, start);
        Ok(node)
    }

    /// [`parse_class_name`](Self::parse_class_name) attached under `parent`,
    /// returning the reference it carries.
    pub(super) fn parse_type_reference(
        &mut self,
        parent: NodeId,
        node_kind: NodeKind,
        kind: TypeKind,
    ) -> Result<Option<TypeRef>, ParseError> {
        let node = self.parse_class_name(node_kind, kind)?;
        self.ast.add_child(parent, node);
        Ok(self.ast.reference(node).cloned())
    }

    // ── File level ────────────────────────────────────────────────────────

    fn parse_top_statement(&mut self, parent: NodeId) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Namespace)
                if self.peek_kind_nth(1) != Some(TokenKind::Backslash) =>
            {
                self.parse_namespace(parent)
            }
            Some(TokenKind::Use) => self.parse_use(),
            Some(TokenKind::Const) => self.parse_constant_definition(parent),
            _ => self.parse_statement(parent),
        }
    }

    fn parse_namespace(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let comment = self.peek_comment();
        self.stack.push();
        self.next()?;
        let name = if self.at(TokenKind::OpenCurly) {
            String::new()
        } else {
            self.parse_name()?.trim_start_matches('\\').to_owned()
        };
        let image = (!name.is_empty()).then(|| name.clone());
        let node = self.node(parent, NodeKind::Namespace, image);
        self.ast.node_mut(node).comment = comment;
        self.namespace = name;
        self.imports = Imports::default();

        if self.accept(TokenKind::OpenCurly)? {
            loop {
                match self.peek_kind() {
                    None => return Err(self.end_of_input()),
                    Some(TokenKind::CloseCurly) => break,
                    Some(_) => self.parse_top_statement(node)?,
                }
            }
            self.next()?;
            self.finish(node);
            self.namespace.clear();
            self.imports = Imports::default();
        } else {
            self.end_statement()?;
            while let Some(kind) = self.peek_kind() {
                if kind == TokenKind::Namespace
                    && self.peek_kind_nth(1) != Some(TokenKind::Backslash)
                {
                    break;
                }
                self.parse_top_statement(node)?;
            }
            self.finish(node);
        }
        Ok(())
    }

    fn import_kind(&mut self) -> Result<ImportKind, ParseError> {
        if self.accept(TokenKind::Function)? {
            Ok(ImportKind::Function)
        } else if self.accept(TokenKind::Const)? {
            Ok(ImportKind::Constant)
        } else {
            Ok(ImportKind::Class)
        }
    }

    fn parse_use(&mut self) -> Result<(), ParseError> {
        self.next()?;
        let kind = self.import_kind()?;
        loop {
            let name = self.parse_name()?;
            let name = name.trim_start_matches('\\').to_owned();
            if self.at(TokenKind::Backslash) && self.peek_kind_nth(1) == Some(TokenKind::OpenCurly)
            {
                self.next()?;
                self.next()?;
                while !self.at(TokenKind::CloseCurly) {
                    let item_kind = match self.import_kind()? {
                        ImportKind::Class => kind,
                        other => other,
                    };
                    let item = self.parse_name()?;
                    let target = format!("{}\\{}", name, item);
                    self.import(item_kind, target)?;
                    if !self.accept(TokenKind::Comma)? {
                        break;
                    }
                }
                self.expect(TokenKind::CloseCurly, "'}'")?;
            } else {
                self.import(kind, name)?;
            }
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.end_statement()
    }

    /// Register `target` under its alias (`as X`, or its last segment).
    fn import(&mut self, kind: ImportKind, target: String) -> Result<(), ParseError> {
        let alias = if self.accept(TokenKind::As)? {
            self.expect_identifier("an alias")?.text
        } else {
            crate::builder::split_qualified(&target).1.to_owned()
        };
        match kind {
            ImportKind::Class => {
                self.imports
                    .classes
                    .insert(alias.to_ascii_lowercase(), target);
            }
            ImportKind::Function => {
                self.imports
                    .functions
                    .insert(alias.to_ascii_lowercase(), target);
            }
            ImportKind::Constant => {
                self.imports.constants.insert(alias, target);
            }
        }
        Ok(())
    }
}
