use super::Parser;
use crate::ast::{NodeId, NodeKind};
use crate::builder::TypeKind;
use crate::error::ParseError;
use crate::token::{Token, TokenKind, TokenStream};

impl<'b, S: TokenStream> Parser<'b, S> {
    /// Parse one statement and attach whatever it produced under `parent`.
    /// Tags and empty statements produce no node.
    pub(super) fn parse_statement(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let kind = match self.peek_kind() {
            Some(kind) => kind,
            None => return Err(self.end_of_input()),
        };
        match kind {
            TokenKind::OpenTag | TokenKind::CloseTag | TokenKind::Semicolon => {
                self.next()?;
                Ok(())
            }
            TokenKind::InlineHtml => {
                let start = self.mark();
                let t = self.next()?;
                let node = self.node(parent, NodeKind::InlineHtml, Some(t.text));
                self.close(node, start);
                Ok(())
            }
            TokenKind::OpenCurly => self.parse_scope(parent).map(|_| ()),
            TokenKind::If => self.parse_if(parent),
            TokenKind::While => self.parse_while(parent),
            TokenKind::Do => self.parse_do_while(parent),
            TokenKind::For => self.parse_for(parent),
            TokenKind::Foreach => self.parse_foreach(parent),
            TokenKind::Switch => self.parse_switch(parent),
            TokenKind::Try => self.parse_try(parent),
            TokenKind::Return => self.parse_keyword_statement(parent, NodeKind::ReturnStatement, false),
            TokenKind::Break => self.parse_keyword_statement(parent, NodeKind::BreakStatement, false),
            TokenKind::Continue => {
                self.parse_keyword_statement(parent, NodeKind::ContinueStatement, false)
            }
            TokenKind::Throw => self.parse_keyword_statement(parent, NodeKind::ThrowStatement, false),
            TokenKind::Echo => self.parse_keyword_statement(parent, NodeKind::EchoStatement, true),
            TokenKind::Global => self.parse_keyword_statement(parent, NodeKind::GlobalStatement, true),
            TokenKind::Unset => self.parse_unset(parent),
            TokenKind::Declare => self.parse_declare(parent),
            TokenKind::Goto => self.parse_goto(parent),
            TokenKind::Static if self.peek_kind_nth(1) == Some(TokenKind::Variable) => {
                self.parse_static_variables(parent)
            }
            TokenKind::Abstract | TokenKind::Final | TokenKind::Class | TokenKind::Interface
            | TokenKind::Trait => self.parse_type_declaration(parent).map(|_| ()),
            TokenKind::Readonly
                if matches!(
                    self.peek_kind_nth(1),
                    Some(TokenKind::Class) | Some(TokenKind::Final) | Some(TokenKind::Abstract)
                ) =>
            {
                self.parse_type_declaration(parent).map(|_| ())
            }
            TokenKind::Function if self.function_declaration_follows() => {
                self.parse_function_declaration(parent).map(|_| ())
            }
            TokenKind::Identifier if self.peek_kind_nth(1) == Some(TokenKind::Colon) => {
                self.parse_label(parent)
            }
            _ => self.parse_expression_statement(parent),
        }
    }

    /// `function name(` or `function &name(`, as opposed to a closure.
    fn function_declaration_follows(&mut self) -> bool {
        let offset = if self.peek_kind_nth(1) == Some(TokenKind::Ampersand) {
            2
        } else {
            1
        };
        self.peek_nth(offset).is_some_and(Token::is_identifier_like)
    }

    /// `{ statements }`
    pub(super) fn parse_scope(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        self.stack.push();
        self.expect(TokenKind::OpenCurly, "'{'")?;
        let node = self.node(parent, NodeKind::ScopeStatement, None);
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(TokenKind::CloseCurly) => break,
                Some(_) => self.parse_statement(node)?,
            }
        }
        self.next()?;
        self.finish(node);
        Ok(node)
    }

    /// A control-structure body: one statement, or the alternative syntax
    /// `: statements` running up to one of `ends`. Returns whether the
    /// alternative syntax was used; the end keyword is left for the caller.
    fn parse_body(&mut self, parent: NodeId, ends: &[TokenKind]) -> Result<bool, ParseError> {
        if !self.at(TokenKind::Colon) {
            self.parse_statement(parent)?;
            return Ok(false);
        }
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::ScopeStatement, None);
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(kind) if ends.contains(&kind) => break,
                Some(_) => self.parse_statement(node)?,
            }
        }
        self.finish(node);
        Ok(true)
    }

    /// `( expr )` wrapped in an Expression node.
    pub(super) fn parse_condition(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let start = self.mark();
        self.expect(TokenKind::OpenParen, "'('")?;
        let node = self.node(parent, NodeKind::Expression, None);
        let expr = self.parse_expression()?;
        self.ast.add_child(node, expr);
        self.expect(TokenKind::CloseParen, "')'")?;
        self.close(node, start);
        Ok(node)
    }

    fn close_alternative(&mut self, end: TokenKind, what: &str) -> Result<(), ParseError> {
        self.expect(end, what)?;
        self.end_statement()
    }

    // ── Control flow ──────────────────────────────────────────────────────

    fn parse_if(&mut self, parent: NodeId) -> Result<(), ParseError> {
        const ENDS: &[TokenKind] = &[TokenKind::Elseif, TokenKind::Else, TokenKind::Endif];
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::IfStatement, None);
        self.parse_condition(node)?;
        let alternative = self.parse_body(node, ENDS)?;

        while self.at(TokenKind::Elseif)
            || (self.at(TokenKind::Else) && self.peek_kind_nth(1) == Some(TokenKind::If) && !alternative)
        {
            self.stack.push();
            if self.next()?.kind == TokenKind::Else {
                self.next()?;
            }
            let branch = self.node(node, NodeKind::ElseIfStatement, None);
            self.parse_condition(branch)?;
            self.parse_body(branch, ENDS)?;
            self.finish(branch);
        }
        if self.accept(TokenKind::Else)? {
            self.parse_body(node, &[TokenKind::Endif])?;
        }
        if alternative {
            self.close_alternative(TokenKind::Endif, "'endif'")?;
        }
        self.finish(node);
        Ok(())
    }

    fn parse_while(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::WhileStatement, None);
        self.parse_condition(node)?;
        if self.parse_body(node, &[TokenKind::Endwhile])? {
            self.close_alternative(TokenKind::Endwhile, "'endwhile'")?;
        }
        self.finish(node);
        Ok(())
    }

    fn parse_do_while(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::DoWhileStatement, None);
        self.parse_statement(node)?;
        self.expect(TokenKind::While, "'while'")?;
        self.parse_condition(node)?;
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }

    fn parse_for(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::ForStatement, None);
        self.expect(TokenKind::OpenParen, "'('")?;
        self.parse_for_part(node, NodeKind::ForInit, TokenKind::Semicolon)?;
        self.parse_for_part(node, NodeKind::Expression, TokenKind::Semicolon)?;
        self.parse_for_part(node, NodeKind::ForUpdate, TokenKind::CloseParen)?;
        if self.parse_body(node, &[TokenKind::Endfor])? {
            self.close_alternative(TokenKind::Endfor, "'endfor'")?;
        }
        self.finish(node);
        Ok(())
    }

    /// Comma-separated, possibly empty expression list ended by `end`.
    fn parse_for_part(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        end: TokenKind,
    ) -> Result<(), ParseError> {
        let start = self.mark();
        let node = self.node(parent, kind, None);
        while !self.at(end) {
            let expr = self.parse_expression()?;
            self.ast.add_child(node, expr);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(end, if end == TokenKind::Semicolon { "';'" } else { "')'" })?;
        self.close(node, start);
        Ok(())
    }

    fn parse_foreach(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::ForeachStatement, None);
        self.expect(TokenKind::OpenParen, "'('")?;
        let subject = self.parse_expression()?;
        self.ast.add_child(node, subject);
        self.expect(TokenKind::As, "'as'")?;
        let first = self.parse_expression()?;
        self.ast.add_child(node, first);
        if self.accept(TokenKind::DoubleArrow)? {
            let second = self.parse_expression()?;
            self.ast.add_child(node, second);
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        if self.parse_body(node, &[TokenKind::Endforeach])? {
            self.close_alternative(TokenKind::Endforeach, "'endforeach'")?;
        }
        self.finish(node);
        Ok(())
    }

    fn parse_switch(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::SwitchStatement, None);
        self.parse_condition(node)?;
        let alternative = if self.accept(TokenKind::Colon)? {
            true
        } else {
            self.expect(TokenKind::OpenCurly, "'{'")?;
            false
        };
        let close = if alternative {
            TokenKind::Endswitch
        } else {
            TokenKind::CloseCurly
        };
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(TokenKind::Case) | Some(TokenKind::Default) => {
                    self.parse_switch_label(node, close)?
                }
                Some(kind) if kind == close => break,
                Some(_) => return Err(self.unexpected("'case' or 'default'")),
            }
        }
        if alternative {
            self.close_alternative(TokenKind::Endswitch, "'endswitch'")?;
        } else {
            self.next()?;
        }
        self.finish(node);
        Ok(())
    }

    fn parse_switch_label(&mut self, parent: NodeId, close: TokenKind) -> Result<(), ParseError> {
        self.stack.push();
        let keyword = self.next()?;
        let image = if keyword.kind == TokenKind::Case {
            "case"
        } else {
            "default"
        };
        let node = self.node(parent, NodeKind::SwitchLabel, Some(image.to_owned()));
        if keyword.kind == TokenKind::Case {
            let expr = self.parse_expression()?;
            self.ast.add_child(node, expr);
        }
        if !self.accept(TokenKind::Colon)? {
            self.expect(TokenKind::Semicolon, "':'")?;
        }
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(TokenKind::Case) | Some(TokenKind::Default) => break,
                Some(kind) if kind == close => break,
                Some(_) => self.parse_statement(node)?,
            }
        }
        self.finish(node);
        Ok(())
    }

    fn parse_try(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::TryStatement, None);
        self.parse_scope(node)?;
        while self.at(TokenKind::Catch) {
            self.stack.push();
            self.next()?;
            let catch = self.node(node, NodeKind::CatchStatement, None);
            self.expect(TokenKind::OpenParen, "'('")?;
            loop {
                self.parse_type_reference(catch, NodeKind::ClassReference, TypeKind::Class)?;
                if !self.accept(TokenKind::Pipe)? {
                    break;
                }
            }
            if self.at(TokenKind::Variable) {
                let start = self.mark();
                let var = self.next()?;
                let var = self.node(catch, NodeKind::Variable, Some(var.text));
                self.close(var, start);
            }
            self.expect(TokenKind::CloseParen, "')'")?;
            self.parse_scope(catch)?;
            self.finish(catch);
        }
        if self.at(TokenKind::Finally) {
            self.stack.push();
            self.next()?;
            let finally = self.node(node, NodeKind::FinallyStatement, None);
            self.parse_scope(finally)?;
            self.finish(finally);
        }
        self.finish(node);
        Ok(())
    }

    // ── Simple statements ─────────────────────────────────────────────────

    /// `keyword [expr [, expr]*];`
    fn parse_keyword_statement(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        list: bool,
    ) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, kind, None);
        if !matches!(
            self.peek_kind(),
            Some(TokenKind::Semicolon) | Some(TokenKind::CloseTag)
        ) {
            loop {
                let expr = self.parse_expression()?;
                self.ast.add_child(node, expr);
                if !list || !self.accept(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }

    fn parse_unset(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::UnsetStatement, None);
        self.expect(TokenKind::OpenParen, "'('")?;
        while !self.at(TokenKind::CloseParen) {
            let expr = self.parse_expression()?;
            self.ast.add_child(node, expr);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }

    /// `declare(strict_types=1);`, with an optional body.
    fn parse_declare(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::DeclareStatement, None);
        self.expect(TokenKind::OpenParen, "'('")?;
        loop {
            let start = self.mark();
            let name = self.expect_identifier("a directive name")?;
            let directive = self.node(node, NodeKind::ConstantDeclarator, Some(name.text));
            self.expect(TokenKind::Equal, "'='")?;
            let value = self.parse_expression()?;
            self.ast.add_child(directive, value);
            self.close(directive, start);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        if matches!(
            self.peek_kind(),
            Some(TokenKind::Semicolon) | Some(TokenKind::CloseTag)
        ) {
            self.end_statement()?;
        } else if self.parse_body(node, &[TokenKind::Enddeclare])? {
            self.close_alternative(TokenKind::Enddeclare, "'enddeclare'")?;
        }
        self.finish(node);
        Ok(())
    }

    fn parse_goto(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let label = self.expect(TokenKind::Identifier, "a label")?;
        let node = self.node(parent, NodeKind::GotoStatement, Some(label.text));
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }

    fn parse_label(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        let label = self.next()?;
        self.next()?;
        let node = self.node(parent, NodeKind::LabelStatement, Some(label.text));
        self.finish(node);
        Ok(())
    }

    /// `static $a = 1, $b;` inside a function body.
    fn parse_static_variables(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::StaticVariableDeclaration, None);
        loop {
            let start = self.mark();
            let var = self.expect(TokenKind::Variable, "a variable")?;
            let declarator = self.node(node, NodeKind::VariableDeclarator, Some(var.text));
            if self.accept(TokenKind::Equal)? {
                let value = self.parse_expression()?;
                self.ast.add_child(declarator, value);
            }
            self.close(declarator, start);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }

    fn parse_expression_statement(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        let node = self.node(parent, NodeKind::Statement, None);
        let expr = self.parse_expression()?;
        self.ast.add_child(node, expr);
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }
}
