use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::builder::TypeKind;
use crate::error::ParseError;
use crate::token::{TokenKind, TokenStream};

/// Built-in type names that never become class references.
const SCALAR_TYPES: &[&str] = &[
    "bool", "boolean", "int", "integer", "float", "double", "string", "iterable", "object",
    "mixed", "void", "null", "never", "false", "true", "resource",
];

fn is_scalar(name: &str) -> bool {
    SCALAR_TYPES.iter().any(|s| s.eq_ignore_ascii_case(name))
}

impl<'b, S: TokenStream> Parser<'b, S> {
    /// A parameter, property, constant or return type, attached under
    /// `parent`: `?T`, `A|B`, `A&B` or `(A&B)|null`.
    pub(super) fn parse_type_hint(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.mark();
        if self.accept(TokenKind::Question)? {
            let node = self.node(parent, NodeKind::NullableType, Some("?".to_owned()));
            let inner = self.parse_type_atom()?;
            self.ast.add_child(node, inner);
            self.close(node, start);
            return Ok(node);
        }

        let first = self.parse_type_term()?;
        let separator = match self.peek_kind() {
            Some(TokenKind::Pipe) => TokenKind::Pipe,
            Some(TokenKind::Ampersand) if self.intersection_follows() => TokenKind::Ampersand,
            _ => {
                self.ast.add_child(parent, first);
                return Ok(first);
            }
        };
        let image = if separator == TokenKind::Pipe { "|" } else { "&" };
        let node = self.node(parent, NodeKind::UnionType, Some(image.to_owned()));
        self.ast.add_child(node, first);
        while self.at(separator) {
            if separator == TokenKind::Ampersand && !self.intersection_follows() {
                break;
            }
            self.next()?;
            let term = self.parse_type_term()?;
            self.ast.add_child(node, term);
        }
        self.close(node, start);
        Ok(node)
    }

    /// `&` continues an intersection unless it marks a by-reference
    /// parameter: `A & $x`, `A & ...$xs`.
    fn intersection_follows(&mut self) -> bool {
        !matches!(
            self.peek_kind_nth(1),
            Some(TokenKind::Variable) | Some(TokenKind::Ellipsis) | Some(TokenKind::Ampersand)
        )
    }

    /// One member of a union: an atom or a parenthesised intersection.
    fn parse_type_term(&mut self) -> Result<NodeId, ParseError> {
        if !self.at(TokenKind::OpenParen) {
            return self.parse_type_atom();
        }
        let start = self.mark();
        self.next()?;
        let group = self.ast.create(NodeKind::UnionType, Some("&".to_owned()));
        loop {
            let atom = self.parse_type_atom()?;
            self.ast.add_child(group, atom);
            if !self.accept(TokenKind::Ampersand)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        self.close(group, start);
        Ok(group)
    }

    /// A single named type, detached.
    fn parse_type_atom(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let node = match self.peek_kind() {
            Some(TokenKind::Array) => {
                let t = self.next()?;
                self.ast.create(NodeKind::TypeArray, Some(t.text))
            }
            Some(TokenKind::Callable) => {
                let t = self.next()?;
                self.ast.create(NodeKind::TypeCallable, Some(t.text))
            }
            Some(TokenKind::Static) => {
                return self.parse_class_name(NodeKind::ClassOrInterfaceReference, TypeKind::Unknown)
            }
            Some(TokenKind::Identifier)
                if self.peek_kind_nth(1) != Some(TokenKind::Backslash)
                    && self.peek().is_some_and(|t| is_scalar(&t.text)) =>
            {
                let t = self.next()?;
                self.ast.create(NodeKind::ScalarType, Some(t.text))
            }
            Some(TokenKind::Identifier) | Some(TokenKind::Backslash) | Some(TokenKind::Namespace) => {
                return self.parse_class_name(NodeKind::ClassOrInterfaceReference, TypeKind::Unknown)
            }
            _ => return Err(self.unexpected("a type")),
        };
        self.close(node, start);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeKind};
    use crate::builder::{Builder, TypeKind};
    use crate::lexer::lex;
    use crate::parser::Parser;
    use crate::token::VecTokenStream;

    fn parse(src: &str) -> Builder {
        let mut b = Builder::new();
        let tokens = lex(src, "t.php").unwrap();
        Parser::new(&mut b, VecTokenStream::new(tokens), "t.php")
            .parse()
            .unwrap();
        b
    }

    fn kinds(ast: &Ast, of: NodeKind) -> Vec<NodeKind> {
        let node = ast.first_child_of_kind(ast.root(), of).unwrap();
        ast.children(node).iter().map(|c| ast.kind(*c)).collect()
    }

    #[test]
    fn scalars_never_become_references() {
        let b = parse("<?php function f(int $a, ?string $b, mixed $c): void {}");
        assert!(b.types().next().is_none());
        let ast = &b.units()[0].ast;
        assert_eq!(
            ast.find_children_of_kind(ast.root(), NodeKind::ScalarType).len(),
            4
        );
        let nullable = ast
            .first_child_of_kind(ast.root(), NodeKind::NullableType)
            .unwrap();
        assert_eq!(ast.kind(ast.children(nullable)[0]), NodeKind::ScalarType);
    }

    #[test]
    fn class_hints_register_placeholders() {
        let b = parse("<?php namespace App; function f(Request $r, \\Psr\\Log $l): Response {}");
        let names: Vec<&str> = b.types().map(|t| t.name()).collect();
        assert_eq!(names, vec!["App\\Request", "Psr\\Log", "App\\Response"]);
        assert!(b.types().all(|t| t.kind() == TypeKind::Unknown && !t.is_declared()));
    }

    #[test]
    fn union_and_intersection_types() {
        let b = parse("<?php function f(A|B|null $x, C&D $y, (E&F)|int $z, G & $ref) {}");
        let ast = &b.units()[0].ast;
        let unions = ast.find_children_of_kind(ast.root(), NodeKind::UnionType);
        let images: Vec<_> = unions.iter().map(|u| ast.image(*u).unwrap()).collect();
        assert_eq!(images, vec!["|", "&", "|", "&"]);
        assert_eq!(ast.children(unions[0]).len(), 3);

        let params = ast.find_children_of_kind(ast.root(), NodeKind::FormalParameter);
        assert_eq!(
            ast.kind(ast.children(params[3])[0]),
            NodeKind::ClassOrInterfaceReference
        );
    }

    #[test]
    fn array_callable_and_static_hints() {
        let b = parse("<?php class M { function a(array $a, callable $c): static {} }");
        let ast = &b.units()[0].ast;
        assert_eq!(
            kinds(ast, NodeKind::Method),
            vec![NodeKind::FormalParameters, NodeKind::StaticReference, NodeKind::ScopeStatement]
        );
        assert!(ast.first_child_of_kind(ast.root(), NodeKind::TypeArray).is_some());
        assert!(ast.first_child_of_kind(ast.root(), NodeKind::TypeCallable).is_some());
    }
}
