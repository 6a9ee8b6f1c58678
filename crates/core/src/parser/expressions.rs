use super::Parser;
use crate::ast::{NodeData, NodeFlags, NodeId, NodeKind};
use crate::builder::TypeKind;
use crate::error::ParseError;
use crate::token::{Token, TokenKind, TokenStream};

// Binding power, loosest first.
const OR: u8 = 1;
const XOR: u8 = 2;
const AND: u8 = 3;
const ASSIGN: u8 = 4;
const TERNARY: u8 = 5;
const COALESCE: u8 = 6;
const BOOL_OR: u8 = 7;
const BOOL_AND: u8 = 8;
const BIT_OR: u8 = 9;
const BIT_XOR: u8 = 10;
const BIT_AND: u8 = 11;
const EQUALITY: u8 = 12;
const COMPARISON: u8 = 13;
const CONCAT: u8 = 14;
const SHIFT: u8 = 15;
const ADDITIVE: u8 = 16;
const MULTIPLICATIVE: u8 = 17;
const INSTANCEOF: u8 = 18;
const POW: u8 = 20;

/// Binding power, right associativity and node kind of a binary operator.
fn binary_operator(kind: TokenKind) -> Option<(u8, bool, NodeKind)> {
    use TokenKind::*;
    let op = match kind {
        LogicalOr => (OR, false, NodeKind::LogicalOrExpression),
        LogicalXor => (XOR, false, NodeKind::LogicalXorExpression),
        LogicalAnd => (AND, false, NodeKind::LogicalAndExpression),
        Coalesce => (COALESCE, true, NodeKind::BinaryExpression),
        BooleanOr => (BOOL_OR, false, NodeKind::BooleanOrExpression),
        BooleanAnd => (BOOL_AND, false, NodeKind::BooleanAndExpression),
        Pipe => (BIT_OR, false, NodeKind::BinaryExpression),
        Caret => (BIT_XOR, false, NodeKind::BinaryExpression),
        Ampersand => (BIT_AND, false, NodeKind::BinaryExpression),
        IsEqual | IsNotEqual | IsIdentical | IsNotIdentical | Spaceship => {
            (EQUALITY, false, NodeKind::BinaryExpression)
        }
        Less | LessEqual | Greater | GreaterEqual => {
            (COMPARISON, false, NodeKind::BinaryExpression)
        }
        Dot => (CONCAT, false, NodeKind::BinaryExpression),
        ShiftLeft | ShiftRight => (SHIFT, false, NodeKind::BinaryExpression),
        Plus | Minus => (ADDITIVE, false, NodeKind::BinaryExpression),
        Star | Slash | Percent => (MULTIPLICATIVE, false, NodeKind::BinaryExpression),
        Pow => (POW, true, NodeKind::BinaryExpression),
        _ => return None,
    };
    Some(op)
}

fn is_assignable(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::Variable
            | NodeKind::VariableVariable
            | NodeKind::CompoundVariable
            | NodeKind::MemberPrimaryPrefix
            | NodeKind::ArrayIndexExpression
            | NodeKind::ListExpression
            | NodeKind::Array
    )
}

/// Tokens after which `yield` has no operand.
fn ends_expression(kind: Option<TokenKind>) -> bool {
    matches!(
        kind,
        None | Some(TokenKind::Semicolon)
            | Some(TokenKind::CloseParen)
            | Some(TokenKind::CloseBracket)
            | Some(TokenKind::Comma)
            | Some(TokenKind::CloseTag)
    )
}

impl<'b, S: TokenStream> Parser<'b, S> {
    /// Parse a full expression and return its detached root.
    pub(super) fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary(OR)
    }

    fn parse_binary(&mut self, min: u8) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let mut left = self.parse_unary()?;
        loop {
            let kind = match self.peek_kind() {
                Some(kind) => kind,
                None => return Ok(left),
            };
            if kind == TokenKind::Question {
                if TERNARY < min {
                    return Ok(left);
                }
                left = self.parse_ternary(left, start)?;
                continue;
            }
            if kind == TokenKind::Instanceof {
                if INSTANCEOF < min {
                    return Ok(left);
                }
                left = self.parse_instanceof(left, start)?;
                continue;
            }
            let (power, right, node_kind) = match binary_operator(kind) {
                Some(op) if op.0 >= min => op,
                _ => return Ok(left),
            };
            let op = self.next()?;
            let rhs = self.parse_binary(if right { power } else { power + 1 })?;
            let node = self.ast.create(node_kind, Some(op.text));
            self.ast.add_child(node, left);
            self.ast.add_child(node, rhs);
            self.close(node, start);
            left = node;
        }
    }

    /// `cond ? then : else` and `cond ?: else`.
    fn parse_ternary(&mut self, cond: NodeId, start: (u32, u32)) -> Result<NodeId, ParseError> {
        self.next()?;
        let node = self.ast.create(NodeKind::ConditionalExpression, None);
        self.ast.add_child(node, cond);
        if self.accept(TokenKind::Colon)? {
            self.ast.node_mut(node).image = Some("?:".to_owned());
        } else {
            self.ast.node_mut(node).image = Some("?".to_owned());
            let then = self.parse_binary(ASSIGN)?;
            self.ast.add_child(node, then);
            self.expect(TokenKind::Colon, "':'")?;
        }
        let otherwise = self.parse_binary(COALESCE)?;
        self.ast.add_child(node, otherwise);
        self.close(node, start);
        Ok(node)
    }

    fn parse_instanceof(&mut self, lhs: NodeId, start: (u32, u32)) -> Result<NodeId, ParseError> {
        self.next()?;
        let node = self.ast.create(NodeKind::InstanceOfExpression, None);
        self.ast.add_child(node, lhs);
        let target = match self.peek_kind() {
            Some(TokenKind::Variable) | Some(TokenKind::Dollar) | Some(TokenKind::OpenParen) => {
                self.parse_unary()?
            }
            _ => self.parse_class_name(NodeKind::ClassOrInterfaceReference, TypeKind::Unknown)?,
        };
        self.ast.add_child(node, target);
        self.close(node, start);
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let (kind, text) = match self.peek() {
            Some(t) => (t.kind, t.text.clone()),
            None => return Err(self.end_of_input()),
        };
        let (node_kind, operand_power) = match kind {
            TokenKind::Bang => (NodeKind::UnaryExpression, INSTANCEOF),
            TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::At
            | TokenKind::Ampersand => (NodeKind::UnaryExpression, POW),
            TokenKind::Cast => (NodeKind::CastExpression, POW),
            TokenKind::Ellipsis => (NodeKind::UnaryExpression, ASSIGN),
            TokenKind::Print => (NodeKind::PrintExpression, ASSIGN),
            TokenKind::Throw => (NodeKind::ThrowStatement, ASSIGN),
            TokenKind::Include | TokenKind::IncludeOnce => (NodeKind::IncludeExpression, ASSIGN),
            TokenKind::Require | TokenKind::RequireOnce => (NodeKind::RequireExpression, ASSIGN),
            TokenKind::Increment | TokenKind::Decrement | TokenKind::Clone => {
                self.next()?;
                let node_kind = match kind {
                    TokenKind::Increment => NodeKind::PreIncrementExpression,
                    TokenKind::Decrement => NodeKind::PreDecrementExpression,
                    _ => NodeKind::CloneExpression,
                };
                let node = self.ast.create(node_kind, None);
                let operand = self.parse_unary()?;
                self.ast.add_child(node, operand);
                self.close(node, start);
                return Ok(node);
            }
            TokenKind::Yield => return self.parse_yield(),
            TokenKind::New => {
                let node = self.parse_allocation()?;
                return self.parse_postfix(node, start);
            }
            _ => {
                let primary = self.parse_primary()?;
                return self.parse_postfix(primary, start);
            }
        };
        self.next()?;
        let image = match node_kind {
            NodeKind::CastExpression => text,
            NodeKind::IncludeExpression | NodeKind::RequireExpression => text.to_ascii_lowercase(),
            NodeKind::UnaryExpression => text,
            _ => String::new(),
        };
        let node = self
            .ast
            .create(node_kind, (!image.is_empty()).then_some(image));
        let operand = self.parse_binary(operand_power)?;
        self.ast.add_child(node, operand);
        self.close(node, start);
        Ok(node)
    }

    /// `yield`, `yield value`, `yield key => value`, `yield from expr`.
    fn parse_yield(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        self.next()?;
        let from = self
            .peek()
            .is_some_and(|t| t.kind == TokenKind::Identifier && t.text.eq_ignore_ascii_case("from"));
        let image = if from { "yield from" } else { "yield" };
        let node = self.ast.create(NodeKind::YieldExpression, Some(image.to_owned()));
        if from {
            self.next()?;
            let operand = self.parse_binary(ASSIGN)?;
            self.ast.add_child(node, operand);
        } else if !ends_expression(self.peek_kind()) {
            let value = self.parse_binary(ASSIGN)?;
            self.ast.add_child(node, value);
            if self.accept(TokenKind::DoubleArrow)? {
                let value = self.parse_binary(ASSIGN)?;
                self.ast.add_child(node, value);
            }
        }
        self.close(node, start);
        Ok(node)
    }

    /// Member access, indexing, calls, postfix `++`/`--` and assignment
    /// applied to `base`.
    fn parse_postfix(&mut self, mut base: NodeId, start: (u32, u32)) -> Result<NodeId, ParseError> {
        loop {
            let kind = match self.peek_kind() {
                Some(kind) => kind,
                None => return Ok(base),
            };
            base = match kind {
                TokenKind::Arrow | TokenKind::NullsafeArrow => {
                    let op = self.next()?;
                    let node = self.ast.create(NodeKind::MemberPrimaryPrefix, Some(op.text));
                    if kind == TokenKind::NullsafeArrow {
                        self.ast.node_mut(node).data = NodeData::Flags(NodeFlags::NULLSAFE);
                    }
                    self.ast.add_child(node, base);
                    self.parse_member_access(node)?;
                    self.close(node, start);
                    node
                }
                TokenKind::DoubleColon => {
                    self.next()?;
                    let node = self
                        .ast
                        .create(NodeKind::MemberPrimaryPrefix, Some("::".to_owned()));
                    self.ast.add_child(node, base);
                    self.parse_static_member(node)?;
                    self.close(node, start);
                    node
                }
                TokenKind::OpenBracket => {
                    self.next()?;
                    let node = self.ast.create(NodeKind::ArrayIndexExpression, None);
                    self.ast.add_child(node, base);
                    if !self.at(TokenKind::CloseBracket) {
                        let index = self.parse_expression()?;
                        self.ast.add_child(node, index);
                    }
                    self.expect(TokenKind::CloseBracket, "']'")?;
                    self.close(node, start);
                    node
                }
                TokenKind::OpenParen => {
                    let node = self.ast.create(NodeKind::FunctionPostfix, None);
                    self.ast.add_child(node, base);
                    let args = self.parse_arguments()?;
                    self.ast.add_child(node, args);
                    self.close(node, start);
                    node
                }
                TokenKind::Increment | TokenKind::Decrement => {
                    let op = self.next()?;
                    let node = self.ast.create(NodeKind::PostfixExpression, Some(op.text));
                    self.ast.add_child(node, base);
                    self.close(node, start);
                    return Ok(node);
                }
                k if k.is_assignment() && is_assignable(self.ast.kind(base)) => {
                    let mut op = self.next()?.text;
                    if kind == TokenKind::Equal && self.accept(TokenKind::Ampersand)? {
                        op.push('&');
                    }
                    let node = self.ast.create(NodeKind::AssignmentExpression, Some(op));
                    self.ast.add_child(node, base);
                    let value = self.parse_binary(ASSIGN)?;
                    self.ast.add_child(node, value);
                    self.close(node, start);
                    return Ok(node);
                }
                _ => return Ok(base),
            };
        }
    }

    /// The member after `->` or `?->`: a name, `$var` or `{expr}`, turned
    /// into a method call when arguments follow.
    fn parse_member_access(&mut self, prefix: NodeId) -> Result<(), ParseError> {
        let start = self.mark();
        let (name, dynamic) = match self.peek_kind() {
            Some(TokenKind::Variable) => {
                let var = self.next()?;
                let node = self.ast.create(NodeKind::Variable, Some(var.text));
                self.close(node, start);
                (None, Some(node))
            }
            Some(TokenKind::OpenCurly) => {
                self.next()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseCurly, "'}'")?;
                (None, Some(expr))
            }
            _ => (Some(self.expect_identifier("a member name")?.text), None),
        };
        let kind = if self.at(TokenKind::OpenParen) {
            NodeKind::MethodPostfix
        } else {
            NodeKind::PropertyPostfix
        };
        let node = self.ast.create(kind, name);
        self.ast.add_child(prefix, node);
        if let Some(dynamic) = dynamic {
            self.ast.add_child(node, dynamic);
        }
        if kind == NodeKind::MethodPostfix {
            let args = self.parse_arguments()?;
            self.ast.add_child(node, args);
        }
        self.close(node, start);
        Ok(())
    }

    /// The member after `::`: `$prop`, `CONST`, `class`, `method(...)`.
    fn parse_static_member(&mut self, prefix: NodeId) -> Result<(), ParseError> {
        let start = self.mark();
        let node = match self.peek_kind() {
            Some(TokenKind::Variable) => {
                let var = self.next()?;
                if self.at(TokenKind::OpenParen) {
                    let node = self.ast.create(NodeKind::MethodPostfix, None);
                    let callee = self.ast.create(NodeKind::Variable, Some(var.text));
                    self.close(callee, start);
                    self.ast.add_child(node, callee);
                    node
                } else {
                    self.ast.create(NodeKind::PropertyPostfix, Some(var.text))
                }
            }
            Some(TokenKind::OpenCurly) => {
                self.next()?;
                let expr = self.parse_expression()?;
                self.expect(TokenKind::CloseCurly, "'}'")?;
                let node = self.ast.create(NodeKind::MethodPostfix, None);
                self.ast.add_child(node, expr);
                node
            }
            _ => {
                let name = self.expect_identifier("a member name")?.text;
                let kind = if self.at(TokenKind::OpenParen) {
                    NodeKind::MethodPostfix
                } else {
                    NodeKind::ConstantPostfix
                };
                self.ast.create(kind, Some(name))
            }
        };
        self.ast.add_child(prefix, node);
        if self.ast.kind(node) == NodeKind::MethodPostfix {
            let args = self.parse_arguments()?;
            self.ast.add_child(node, args);
        }
        self.close(node, start);
        Ok(())
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let token: Token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.end_of_input()),
        };
        let node = match token.kind {
            TokenKind::Variable => {
                self.next()?;
                self.ast.create(NodeKind::Variable, Some(token.text))
            }
            TokenKind::Dollar => return self.parse_variable_variable(),
            TokenKind::Integer | TokenKind::Float | TokenKind::StringLiteral => {
                self.next()?;
                self.ast.create(NodeKind::Literal, Some(token.text))
            }
            TokenKind::OpenParen => {
                self.next()?;
                let node = self.ast.create(NodeKind::Expression, None);
                let inner = self.parse_expression()?;
                self.ast.add_child(node, inner);
                self.expect(TokenKind::CloseParen, "')'")?;
                node
            }
            TokenKind::OpenBracket => {
                self.next()?;
                let node = self.ast.create(NodeKind::Array, Some("[".to_owned()));
                self.parse_array_elements(node, TokenKind::CloseBracket)?;
                node
            }
            TokenKind::Array if self.peek_kind_nth(1) == Some(TokenKind::OpenParen) => {
                self.next()?;
                self.next()?;
                let node = self.ast.create(NodeKind::Array, Some("array".to_owned()));
                self.parse_array_elements(node, TokenKind::CloseParen)?;
                node
            }
            TokenKind::List => {
                self.next()?;
                self.expect(TokenKind::OpenParen, "'('")?;
                let node = self.ast.create(NodeKind::ListExpression, None);
                self.parse_array_elements(node, TokenKind::CloseParen)?;
                node
            }
            TokenKind::Isset => {
                self.next()?;
                let node = self.ast.create(NodeKind::IssetExpression, None);
                self.parse_paren_list(node)?;
                node
            }
            TokenKind::Empty | TokenKind::Eval => {
                self.next()?;
                let kind = if token.kind == TokenKind::Empty {
                    NodeKind::EmptyExpression
                } else {
                    NodeKind::EvalExpression
                };
                let node = self.ast.create(kind, None);
                self.parse_paren_list(node)?;
                node
            }
            TokenKind::Exit => {
                self.next()?;
                let node = self
                    .ast
                    .create(NodeKind::ExitExpression, Some(token.text.to_ascii_lowercase()));
                if self.at(TokenKind::OpenParen) {
                    self.parse_paren_list(node)?;
                }
                node
            }
            TokenKind::Function | TokenKind::Fn => return self.parse_closure(),
            TokenKind::Static
                if matches!(
                    self.peek_kind_nth(1),
                    Some(TokenKind::Function) | Some(TokenKind::Fn)
                ) =>
            {
                return self.parse_closure()
            }
            TokenKind::Static => {
                self.next()?;
                self.reference_from_name(
                    &token.text,
                    &token,
                    NodeKind::ClassOrInterfaceReference,
                    TypeKind::Unknown,
                )?
            }
            TokenKind::Identifier | TokenKind::Backslash | TokenKind::Namespace => {
                return self.parse_name_expression(&token)
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.close(node, start);
        Ok(node)
    }

    /// Expressions that start with a name: class access, function calls,
    /// `match`, and constants.
    fn parse_name_expression(&mut self, at: &Token) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let raw = self.parse_name()?;
        let node = match self.peek_kind() {
            Some(TokenKind::DoubleColon) => self.reference_from_name(
                &raw,
                at,
                NodeKind::ClassOrInterfaceReference,
                TypeKind::Unknown,
            )?,
            Some(TokenKind::OpenParen) if raw.eq_ignore_ascii_case("match") => {
                return self.parse_match(start)
            }
            Some(TokenKind::OpenParen) => {
                let name = self.qualify_function(&raw);
                let node = self.ast.create(NodeKind::FunctionPostfix, Some(name));
                let args = self.parse_arguments()?;
                self.ast.add_child(node, args);
                node
            }
            _ => match raw.to_ascii_lowercase().as_str() {
                "true" | "false" | "null" => self.ast.create(NodeKind::Literal, Some(raw)),
                _ => {
                    let name = self.qualify_constant(&raw);
                    self.ast.create(NodeKind::ConstantReference, Some(name))
                }
            },
        };
        self.close(node, start);
        Ok(node)
    }

    /// `$$name` and `${expr}`.
    fn parse_variable_variable(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        self.next()?;
        let node = if self.accept(TokenKind::OpenCurly)? {
            let node = self.ast.create(NodeKind::CompoundVariable, None);
            let inner = self.parse_expression()?;
            self.ast.add_child(node, inner);
            self.expect(TokenKind::CloseCurly, "'}'")?;
            node
        } else {
            let node = self.ast.create(NodeKind::VariableVariable, Some("$".to_owned()));
            let inner = match self.peek_kind() {
                Some(TokenKind::Dollar) => self.parse_variable_variable()?,
                _ => {
                    let inner_start = self.mark();
                    let var = self.expect(TokenKind::Variable, "a variable")?;
                    let inner = self.ast.create(NodeKind::Variable, Some(var.text));
                    self.close(inner, inner_start);
                    inner
                }
            };
            self.ast.add_child(node, inner);
            node
        };
        self.close(node, start);
        Ok(node)
    }

    /// `new Foo(...)`, `new $class`, `new static`, `new class {...}`.
    fn parse_allocation(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        self.next()?;
        let node = self.ast.create(NodeKind::AllocationExpression, None);
        let anonymous = self.at(TokenKind::Class)
            || (self.at(TokenKind::Readonly) && self.peek_kind_nth(1) == Some(TokenKind::Class));
        if anonymous {
            let class = self.parse_anonymous_class()?;
            self.ast.add_child(node, class);
            self.close(node, start);
            return Ok(node);
        }
        match self.peek_kind() {
            Some(TokenKind::Variable) | Some(TokenKind::Dollar) => {
                let target = self.parse_allocation_target()?;
                self.ast.add_child(node, target);
            }
            Some(TokenKind::OpenParen) => {
                let target = self.parse_primary()?;
                self.ast.add_child(node, target);
            }
            _ => {
                self.parse_type_reference(node, NodeKind::ClassReference, TypeKind::Class)?;
            }
        }
        if self.at(TokenKind::OpenParen) {
            let args = self.parse_arguments()?;
            self.ast.add_child(node, args);
        }
        self.close(node, start);
        Ok(node)
    }

    /// `$factory->class`, `$map['key']`, `Foo::$class` after `new`: member
    /// and index access without calls.
    fn parse_allocation_target(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let mut target = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::Arrow) | Some(TokenKind::NullsafeArrow) => {
                    let op = self.next()?;
                    let node = self.ast.create(NodeKind::MemberPrimaryPrefix, Some(op.text));
                    self.ast.add_child(node, target);
                    let member_start = self.mark();
                    let name = self.expect_identifier("a property name")?.text;
                    let member = self.ast.create(NodeKind::PropertyPostfix, Some(name));
                    self.close(member, member_start);
                    self.ast.add_child(node, member);
                    self.close(node, start);
                    target = node;
                }
                Some(TokenKind::DoubleColon) => {
                    self.next()?;
                    let node = self
                        .ast
                        .create(NodeKind::MemberPrimaryPrefix, Some("::".to_owned()));
                    self.ast.add_child(node, target);
                    let member_start = self.mark();
                    let var = self.expect(TokenKind::Variable, "a static property")?;
                    let member = self.ast.create(NodeKind::PropertyPostfix, Some(var.text));
                    self.close(member, member_start);
                    self.ast.add_child(node, member);
                    self.close(node, start);
                    target = node;
                }
                Some(TokenKind::OpenBracket) => {
                    self.next()?;
                    let node = self.ast.create(NodeKind::ArrayIndexExpression, None);
                    self.ast.add_child(node, target);
                    let index = self.parse_expression()?;
                    self.ast.add_child(node, index);
                    self.expect(TokenKind::CloseBracket, "']'")?;
                    self.close(node, start);
                    target = node;
                }
                _ => return Ok(target),
            }
        }
    }

    /// `( args )` as a detached Arguments node. Named-argument labels are
    /// skipped; `f(...)` yields an Arguments node imaged `...`.
    pub(super) fn parse_arguments(&mut self) -> Result<NodeId, ParseError> {
        let start = self.mark();
        self.expect(TokenKind::OpenParen, "'('")?;
        let node = self.ast.create(NodeKind::Arguments, None);
        if self.at(TokenKind::Ellipsis) && self.peek_kind_nth(1) == Some(TokenKind::CloseParen) {
            self.next()?;
            self.ast.node_mut(node).image = Some("...".to_owned());
        }
        while !self.at(TokenKind::CloseParen) {
            if self.peek().is_some_and(Token::is_identifier_like)
                && self.peek_kind_nth(1) == Some(TokenKind::Colon)
            {
                self.next()?;
                self.next()?;
            }
            let arg = self.parse_expression()?;
            self.ast.add_child(node, arg);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        self.close(node, start);
        Ok(node)
    }

    /// `( expr, ... )` with every expression attached to `node`.
    fn parse_paren_list(&mut self, node: NodeId) -> Result<(), ParseError> {
        self.expect(TokenKind::OpenParen, "'('")?;
        while !self.at(TokenKind::CloseParen) {
            let expr = self.parse_expression()?;
            self.ast.add_child(node, expr);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        Ok(())
    }

    /// Elements up to `close`. Skipped slots (`[, $b]`) produce no element.
    fn parse_array_elements(&mut self, node: NodeId, close: TokenKind) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(kind) if kind == close => break,
                Some(TokenKind::Comma) => {
                    self.next()?;
                    continue;
                }
                Some(_) => {}
            }
            let start = self.mark();
            let element = self.ast.create(NodeKind::ArrayElement, None);
            let first = self.parse_expression()?;
            self.ast.add_child(element, first);
            if self.accept(TokenKind::DoubleArrow)? {
                let value = self.parse_expression()?;
                self.ast.add_child(element, value);
            }
            self.close(element, start);
            self.ast.add_child(node, element);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        let what = if close == TokenKind::CloseBracket {
            "']'"
        } else {
            "')'"
        };
        self.expect(close, what)?;
        Ok(())
    }

    /// `match (subject) { a, b => x, default => y }`, after the keyword.
    fn parse_match(&mut self, start: (u32, u32)) -> Result<NodeId, ParseError> {
        let node = self.ast.create(NodeKind::MatchExpression, None);
        self.parse_condition(node)?;
        self.expect(TokenKind::OpenCurly, "'{'")?;
        while !self.at(TokenKind::CloseCurly) {
            let arm_start = self.mark();
            let arm = self.ast.create(NodeKind::MatchArm, None);
            self.ast.add_child(node, arm);
            if self.accept(TokenKind::Default)? {
                self.ast.node_mut(arm).image = Some("default".to_owned());
            } else {
                while !self.at(TokenKind::DoubleArrow) {
                    let condition = self.parse_expression()?;
                    self.ast.add_child(arm, condition);
                    if !self.accept(TokenKind::Comma)? {
                        break;
                    }
                }
            }
            self.expect(TokenKind::DoubleArrow, "'=>'")?;
            let result = self.parse_expression()?;
            self.ast.add_child(arm, result);
            self.close(arm, arm_start);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseCurly, "'}'")?;
        self.close(node, start);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeFlags, NodeId, NodeKind};
    use crate::builder::{Binding, Builder};
    use crate::error::ParseError;
    use crate::lexer::lex;
    use crate::parser::Parser;
    use crate::token::VecTokenStream;

    fn parse(src: &str) -> Result<Builder, ParseError> {
        let mut b = Builder::new();
        let tokens = lex(src, "e.php")?;
        Parser::new(&mut b, VecTokenStream::new(tokens), "e.php").parse()?;
        Ok(b)
    }

    /// The expression of the first expression statement.
    fn expr(ast: &Ast) -> NodeId {
        let stmt = ast
            .first_child_of_kind(ast.root(), NodeKind::Statement)
            .unwrap();
        ast.child(stmt, 0).unwrap()
    }

    fn shape(ast: &Ast, node: NodeId) -> String {
        let children = ast.children(node);
        let label = match ast.image(node) {
            Some(image) => format!("{:?}({})", ast.kind(node), image),
            None => format!("{:?}", ast.kind(node)),
        };
        if children.is_empty() {
            label
        } else {
            let inner: Vec<String> = children.iter().map(|c| shape(ast, *c)).collect();
            format!("{}[{}]", label, inner.join(", "))
        }
    }

    fn shape_of(src: &str) -> String {
        let b = parse(src).unwrap();
        let ast = &b.units()[0].ast;
        shape(ast, expr(ast))
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            shape_of("<?php $a + $b * $c;"),
            "BinaryExpression(+)[Variable($a), BinaryExpression(*)[Variable($b), Variable($c)]]"
        );
        assert_eq!(
            shape_of("<?php $a - $b - $c;"),
            "BinaryExpression(-)[BinaryExpression(-)[Variable($a), Variable($b)], Variable($c)]"
        );
        assert_eq!(
            shape_of("<?php 2 ** 3 ** 4;"),
            "BinaryExpression(**)[Literal(2), BinaryExpression(**)[Literal(3), Literal(4)]]"
        );
        assert_eq!(
            shape_of("<?php $a ?? $b ?? $c;"),
            "BinaryExpression(??)[Variable($a), BinaryExpression(??)[Variable($b), Variable($c)]]"
        );
        assert_eq!(
            shape_of("<?php $a . $b + 1;"),
            "BinaryExpression(.)[Variable($a), BinaryExpression(+)[Variable($b), Literal(1)]]"
        );
        assert_eq!(
            shape_of("<?php -$a ** 2;"),
            "UnaryExpression(-)[BinaryExpression(**)[Variable($a), Literal(2)]]"
        );
    }

    #[test]
    fn assignment_binds_tighter_than_keyword_logic() {
        assert_eq!(
            shape_of("<?php $a = $b and $c;"),
            "LogicalAndExpression(and)[AssignmentExpression(=)[Variable($a), Variable($b)], Variable($c)]"
        );
        assert_eq!(
            shape_of("<?php $a = $b && $c;"),
            "AssignmentExpression(=)[Variable($a), BooleanAndExpression(&&)[Variable($b), Variable($c)]]"
        );
        assert_eq!(
            shape_of("<?php !$x = f();"),
            "UnaryExpression(!)[AssignmentExpression(=)[Variable($x), FunctionPostfix(f)[Arguments]]]"
        );
        assert_eq!(
            shape_of("<?php $r =& $list[0];"),
            "AssignmentExpression(=&)[Variable($r), ArrayIndexExpression[Variable($list), Literal(0)]]"
        );
    }

    #[test]
    fn ternaries_and_instanceof() {
        assert_eq!(
            shape_of("<?php $a ? $b : $c;"),
            "ConditionalExpression(?)[Variable($a), Variable($b), Variable($c)]"
        );
        assert_eq!(
            shape_of("<?php $a ?: $c;"),
            "ConditionalExpression(?:)[Variable($a), Variable($c)]"
        );
        assert_eq!(
            shape_of("<?php !$e instanceof \\Exception;"),
            "UnaryExpression(!)[InstanceOfExpression[Variable($e), ClassOrInterfaceReference(\\Exception)]]"
        );
    }

    #[test]
    fn member_chains_and_calls() {
        assert_eq!(
            shape_of("<?php $user?->profile->save(1, ...$rest);"),
            "MemberPrimaryPrefix(->)[MemberPrimaryPrefix(?->)[Variable($user), PropertyPostfix(profile)], \
             MethodPostfix(save)[Arguments[Literal(1), UnaryExpression(...)[Variable($rest)]]]]"
        );
        assert_eq!(
            shape_of("<?php Foo::BAR;"),
            "MemberPrimaryPrefix(::)[ClassOrInterfaceReference(Foo), ConstantPostfix(BAR)]"
        );
        assert_eq!(
            shape_of("<?php Foo::class;"),
            "MemberPrimaryPrefix(::)[ClassOrInterfaceReference(Foo), ConstantPostfix(class)]"
        );
        assert_eq!(
            shape_of("<?php $fn(...);"),
            "FunctionPostfix[Variable($fn), Arguments(...)]"
        );
        assert_eq!(
            shape_of("<?php strlen(string: $s);"),
            "FunctionPostfix(strlen)[Arguments[Variable($s)]]"
        );

        let b = parse("<?php $user?->name;").unwrap();
        let ast = &b.units()[0].ast;
        assert_eq!(ast.flags(expr(ast)), NodeFlags::NULLSAFE);
    }

    #[test]
    fn variables_arrays_and_constructs() {
        assert_eq!(
            shape_of("<?php $$name;"),
            "VariableVariable($)[Variable($name)]"
        );
        assert_eq!(
            shape_of("<?php ${'a' . 'b'};"),
            "CompoundVariable[BinaryExpression(.)[Literal('a'), Literal('b')]]"
        );
        assert_eq!(
            shape_of("<?php ['k' => 1, &$v];"),
            "Array([)[ArrayElement[Literal('k'), Literal(1)], ArrayElement[UnaryExpression(&)[Variable($v)]]]"
        );
        assert_eq!(
            shape_of("<?php list(, $b) = $pair;"),
            "AssignmentExpression(=)[ListExpression[ArrayElement[Variable($b)]], Variable($pair)]"
        );
        assert_eq!(
            shape_of("<?php isset($a, $b['x']) && !empty($c);"),
            "BooleanAndExpression(&&)[IssetExpression[Variable($a), ArrayIndexExpression[Variable($b), Literal('x')]], \
             UnaryExpression(!)[EmptyExpression[Variable($c)]]]"
        );
        assert_eq!(shape_of("<?php (int) $x;"), "CastExpression((int))[Variable($x)]");
        assert_eq!(
            shape_of("<?php require_once __DIR__ . '/a.php';"),
            "RequireExpression(require_once)[BinaryExpression(.)[ConstantReference(__DIR__), Literal('/a.php')]]"
        );
        assert_eq!(shape_of("<?php die;"), "ExitExpression(die)");
        assert_eq!(shape_of("<?php null;"), "Literal(null)");
    }

    #[test]
    fn yield_forms() {
        let b = parse("<?php function g() { yield; yield $v; yield $k => $v; yield from other(); }")
            .unwrap();
        let ast = &b.units()[0].ast;
        let yields = ast.find_children_of_kind(ast.root(), NodeKind::YieldExpression);
        let arity: Vec<usize> = yields.iter().map(|y| ast.children(*y).len()).collect();
        assert_eq!(arity, vec![0, 1, 2, 1]);
        assert_eq!(ast.image(yields[3]), Some("yield from"));
    }

    #[test]
    fn allocations() {
        let b = parse(
            "<?php namespace App; class Base { static function make() { return [new static, new self(), new parent()]; } }",
        );
        // `parent` without an extends clause is rejected.
        assert!(matches!(b, Err(ParseError::InvalidState { .. })));

        let b = parse("<?php namespace App; new Model(1); new $cls; new $this->factory['x'];").unwrap();
        let ast = &b.units()[0].ast;
        let news = ast.find_children_of_kind(ast.root(), NodeKind::AllocationExpression);
        assert_eq!(
            shape(ast, news[0]),
            "AllocationExpression[ClassReference(Model), Arguments[Literal(1)]]"
        );
        assert_eq!(shape(ast, news[1]), "AllocationExpression[Variable($cls)]");
        assert_eq!(
            ast.kind(ast.children(news[2])[0]),
            NodeKind::ArrayIndexExpression
        );
        assert!(b.lookup("App\\Model").is_some());
    }

    #[test]
    fn self_and_static_bind_to_enclosing_type() {
        let b = parse("<?php class Node { function copy() { return static::create(self::ROOT); } }")
            .unwrap();
        let ast = &b.units()[0].ast;
        let stat = ast
            .first_child_of_kind(ast.root(), NodeKind::StaticReference)
            .unwrap();
        let reference = ast.reference(stat).unwrap();
        assert_eq!(reference.binding(), Binding::LateStatic);
        assert_eq!(reference.name(), "Node");
        let this = ast
            .first_child_of_kind(ast.root(), NodeKind::SelfReference)
            .unwrap();
        assert_eq!(b.resolve(ast.reference(this).unwrap()), b.lookup("Node"));
    }

    #[test]
    fn self_outside_class_is_invalid_state() {
        let err = parse("<?php function f() { return self::X; }").map(|_| ()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidState { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn match_expression() {
        assert_eq!(
            shape_of("<?php match ($x) { 1, 2 => 'low', default => 'high', };"),
            "MatchExpression[Expression[Variable($x)], MatchArm[Literal(1), Literal(2), Literal('low')], \
             MatchArm(default)[Literal('high')]]"
        );
    }
}
