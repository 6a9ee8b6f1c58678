use super::{Parser, Scope, TypeScope};
use crate::ast::{Modifiers, NodeData, NodeFlags, NodeId, NodeKind};
use crate::builder::{
    ConstantDeclaration, FunctionDeclaration, MethodDeclaration, PropertyDeclaration,
    TypeDeclaration, TypeId, TypeKind,
};
use crate::error::ParseError;
use crate::token::{Token, TokenKind, TokenStream};

fn with_default_visibility(modifiers: Modifiers) -> Modifiers {
    if modifiers.intersects(Modifiers::VISIBILITY) {
        modifiers
    } else {
        modifiers | Modifiers::PUBLIC
    }
}

impl<'b, S: TokenStream> Parser<'b, S> {
    // ── Classes, interfaces and traits ────────────────────────────────────

    pub(super) fn parse_type_declaration(&mut self, parent: NodeId) -> Result<NodeId, ParseError> {
        let comment = self.peek_comment();
        self.stack.push();
        let mut modifiers = Modifiers::empty();
        loop {
            let flag = match self.peek_kind() {
                Some(TokenKind::Abstract) => Modifiers::ABSTRACT,
                Some(TokenKind::Final) => Modifiers::FINAL,
                Some(TokenKind::Readonly) => Modifiers::READONLY,
                _ => break,
            };
            self.next()?;
            modifiers |= flag;
        }

        let keyword = self.next()?;
        let (node_kind, kind) = match keyword.kind {
            TokenKind::Class => (NodeKind::Class, TypeKind::Class),
            TokenKind::Interface => (NodeKind::Interface, TypeKind::Interface),
            TokenKind::Trait => (NodeKind::Trait, TypeKind::Trait),
            _ => {
                return Err(ParseError::unexpected(
                    &keyword,
                    "'class', 'interface' or 'trait'",
                    &self.file,
                ))
            }
        };
        if kind == TypeKind::Interface {
            modifiers |= Modifiers::ABSTRACT;
        }
        let name = self.expect(TokenKind::Identifier, "a type name")?.text;
        let qualified = self.in_namespace(&name);
        let id = self.builder.get_or_create_placeholder(&qualified, kind);

        let node = self.node(parent, node_kind, Some(name));
        let n = self.ast.node_mut(node);
        n.data = NodeData::Type(id);
        n.comment = comment.clone();

        let mut decl = TypeDeclaration::new(kind, &self.file);
        decl.modifiers = modifiers;
        self.parse_type_header(node, &mut decl)?;
        let decl = self.parse_type_body(node, id, &qualified, decl)?;
        self.queue_type(node, qualified, decl, comment);
        Ok(node)
    }

    /// `new class (...) extends X implements Y { ... }`, after `new`.
    pub(super) fn parse_anonymous_class(&mut self) -> Result<NodeId, ParseError> {
        let comment = self.peek_comment();
        self.stack.push();
        let mut modifiers = Modifiers::empty();
        if self.accept(TokenKind::Readonly)? {
            modifiers |= Modifiers::READONLY;
        }
        self.expect(TokenKind::Class, "'class'")?;
        let qualified = self.builder.next_anonymous_name(&self.namespace);
        let id = self
            .builder
            .get_or_create_placeholder(&qualified, TypeKind::Class);

        let node = self
            .ast
            .create(NodeKind::AnonymousClass, Some(qualified.clone()));
        self.ast.node_mut(node).data = NodeData::Type(id);
        if self.at(TokenKind::OpenParen) {
            let args = self.parse_arguments()?;
            self.ast.add_child(node, args);
        }

        let mut decl = TypeDeclaration::new(TypeKind::Class, &self.file);
        decl.modifiers = modifiers;
        decl.anonymous = true;
        self.parse_type_header(node, &mut decl)?;
        let decl = self.parse_type_body(node, id, &qualified, decl)?;
        self.queue_type(node, qualified, decl, comment);
        Ok(node)
    }

    /// `extends` and `implements` clauses.
    fn parse_type_header(
        &mut self,
        node: NodeId,
        decl: &mut TypeDeclaration,
    ) -> Result<(), ParseError> {
        if decl.kind != TypeKind::Trait && self.accept(TokenKind::Extends)? {
            if decl.kind == TypeKind::Interface {
                self.parse_interface_list(node, decl)?;
            } else {
                decl.parent =
                    self.parse_type_reference(node, NodeKind::ClassReference, TypeKind::Class)?;
            }
        }
        if decl.kind == TypeKind::Class && self.accept(TokenKind::Implements)? {
            self.parse_interface_list(node, decl)?;
        }
        Ok(())
    }

    fn parse_interface_list(
        &mut self,
        node: NodeId,
        decl: &mut TypeDeclaration,
    ) -> Result<(), ParseError> {
        loop {
            let r = self.parse_type_reference(
                node,
                NodeKind::ClassOrInterfaceReference,
                TypeKind::Interface,
            )?;
            decl.interfaces.extend(r);
            if !self.accept(TokenKind::Comma)? {
                return Ok(());
            }
        }
    }

    /// Parse `{ members }` with the type pushed as the innermost scope, and
    /// hand back the declaration with its members filled in.
    fn parse_type_body(
        &mut self,
        node: NodeId,
        id: TypeId,
        name: &str,
        decl: TypeDeclaration,
    ) -> Result<TypeDeclaration, ParseError> {
        let kind = decl.kind;
        self.scopes.push(Scope::Type(TypeScope {
            id,
            name: name.to_owned(),
            kind,
            parent: decl.parent.clone(),
            decl,
        }));
        self.expect(TokenKind::OpenCurly, "'{'")?;
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(TokenKind::CloseCurly) => break,
                Some(TokenKind::Use) => self.parse_trait_use(node)?,
                Some(_) => self.parse_member(node)?,
            }
        }
        self.next()?;
        // Scopes are pushed and popped in pairs, so the top is ours.
        match self.scopes.pop() {
            Some(Scope::Type(scope)) => Ok(scope.decl),
            _ => Ok(TypeDeclaration::new(kind, &self.file)),
        }
    }

    fn queue_type(
        &mut self,
        node: NodeId,
        qualified: String,
        mut decl: TypeDeclaration,
        comment: Option<String>,
    ) {
        decl.tokens = self.finish(node);
        decl.span = self.ast.span(node);
        decl.location = Some(self.node_ref(node));
        decl.comment = comment;
        self.pending.types.push((qualified, decl));
    }

    fn owner(&mut self) -> Result<(TypeId, TypeKind), ParseError> {
        match self.current_type() {
            Some(scope) => Ok((scope.id, scope.kind)),
            None => Err(self.unexpected("a statement")),
        }
    }

    fn parse_modifiers(&mut self) -> Result<Modifiers, ParseError> {
        let mut modifiers = Modifiers::empty();
        loop {
            let flag = match self.peek_kind() {
                Some(TokenKind::Public) | Some(TokenKind::Var) => Modifiers::PUBLIC,
                Some(TokenKind::Protected) => Modifiers::PROTECTED,
                Some(TokenKind::Private) => Modifiers::PRIVATE,
                Some(TokenKind::Static) => Modifiers::STATIC,
                Some(TokenKind::Abstract) => Modifiers::ABSTRACT,
                Some(TokenKind::Final) => Modifiers::FINAL,
                Some(TokenKind::Readonly) => Modifiers::READONLY,
                _ => return Ok(modifiers),
            };
            self.next()?;
            modifiers |= flag;
        }
    }

    // ── Members ───────────────────────────────────────────────────────────

    fn parse_member(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let comment = self.peek_comment();
        self.stack.push();
        let modifiers = self.parse_modifiers()?;
        match self.peek_kind() {
            Some(TokenKind::Const) => self.parse_class_constants(parent, modifiers, comment),
            Some(TokenKind::Function) => self.parse_method(parent, modifiers, comment),
            Some(_) => self.parse_property(parent, modifiers, comment),
            None => Err(self.end_of_input()),
        }
    }

    fn parse_method(
        &mut self,
        parent: NodeId,
        modifiers: Modifiers,
        comment: Option<String>,
    ) -> Result<(), ParseError> {
        let (owner, owner_kind) = self.owner()?;
        self.next()?;
        let by_reference = self.accept(TokenKind::Ampersand)?;
        let name = self.expect_identifier("a method name")?.text;
        let mut modifiers = with_default_visibility(modifiers);
        if owner_kind == TypeKind::Interface {
            modifiers |= Modifiers::ABSTRACT;
        }

        let node = self.node(parent, NodeKind::Method, Some(name.clone()));
        let n = self.ast.node_mut(node);
        n.data = NodeData::Member { owner, modifiers };
        n.comment = comment.clone();

        let promotes = name.eq_ignore_ascii_case("__construct");
        self.parse_formal_parameters(node, promotes)?;
        if self.accept(TokenKind::Colon)? {
            self.parse_type_hint(node)?;
        }
        if !self.accept(TokenKind::Semicolon)? {
            self.parse_scope(node)?;
        }

        let tokens = self.finish(node);
        let method = MethodDeclaration {
            name,
            modifiers,
            by_reference,
            location: Some(self.node_ref(node)),
            span: self.ast.span(node),
            comment,
            tokens,
        };
        if let Some(scope) = self.current_type() {
            scope.decl.methods.push(method);
        }
        Ok(())
    }

    fn parse_property(
        &mut self,
        parent: NodeId,
        modifiers: Modifiers,
        comment: Option<String>,
    ) -> Result<(), ParseError> {
        let (owner, _) = self.owner()?;
        let modifiers = with_default_visibility(modifiers);
        let node = self.node(parent, NodeKind::FieldDeclaration, None);
        let n = self.ast.node_mut(node);
        n.data = NodeData::Member { owner, modifiers };
        n.comment = comment.clone();

        if !self.at(TokenKind::Variable) {
            self.parse_type_hint(node)?;
        }
        let mut declarators = Vec::new();
        loop {
            let start = self.mark();
            let var = self.expect(TokenKind::Variable, "a property name")?;
            let declarator = self.node(node, NodeKind::VariableDeclarator, Some(var.text.clone()));
            if self.accept(TokenKind::Equal)? {
                let value = self.parse_expression()?;
                self.ast.add_child(declarator, value);
            }
            self.close(declarator, start);
            declarators.push((var.text, declarator));
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.end_statement()?;
        self.finish(node);

        let span = self.ast.span(node);
        let properties: Vec<PropertyDeclaration> = declarators
            .into_iter()
            .map(|(name, declarator)| PropertyDeclaration {
                name,
                modifiers,
                location: Some(self.node_ref(declarator)),
                span,
                comment: comment.clone(),
            })
            .collect();
        if let Some(scope) = self.current_type() {
            scope.decl.properties.extend(properties);
        }
        Ok(())
    }

    fn parse_class_constants(
        &mut self,
        parent: NodeId,
        modifiers: Modifiers,
        comment: Option<String>,
    ) -> Result<(), ParseError> {
        let (owner, _) = self.owner()?;
        self.next()?;
        let modifiers = with_default_visibility(modifiers);
        let node = self.node(parent, NodeKind::ConstantDefinition, None);
        let n = self.ast.node_mut(node);
        n.data = NodeData::Member { owner, modifiers };
        n.comment = comment;

        // Typed constant: `const int LIMIT = 10;`
        if self.peek_kind_nth(1) != Some(TokenKind::Equal) {
            self.parse_type_hint(node)?;
        }
        let declarators = self.parse_constant_declarators(node)?;
        self.end_statement()?;
        self.finish(node);

        let constants: Vec<ConstantDeclaration> = declarators
            .into_iter()
            .map(|(name, declarator)| ConstantDeclaration {
                name,
                modifiers,
                location: Some(self.node_ref(declarator)),
                span: self.ast.span(declarator),
            })
            .collect();
        if let Some(scope) = self.current_type() {
            scope.decl.constants.extend(constants);
        }
        Ok(())
    }

    /// Top-level `const A = 1, B = 2;`.
    pub(super) fn parse_constant_definition(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let comment = self.peek_comment();
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::ConstantDefinition, None);
        self.ast.node_mut(node).comment = comment;
        self.parse_constant_declarators(node)?;
        self.end_statement()?;
        self.finish(node);
        Ok(())
    }

    fn parse_constant_declarators(
        &mut self,
        parent: NodeId,
    ) -> Result<Vec<(String, NodeId)>, ParseError> {
        let mut out = Vec::new();
        loop {
            let start = self.mark();
            let name = self.expect_identifier("a constant name")?.text;
            let declarator = self.node(parent, NodeKind::ConstantDeclarator, Some(name.clone()));
            self.expect(TokenKind::Equal, "'='")?;
            let value = self.parse_expression()?;
            self.ast.add_child(declarator, value);
            self.close(declarator, start);
            out.push((name, declarator));
            if !self.accept(TokenKind::Comma)? {
                return Ok(out);
            }
        }
    }

    // ── Traits ────────────────────────────────────────────────────────────

    fn parse_trait_use(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::TraitUseStatement, None);
        loop {
            let r = self.parse_type_reference(node, NodeKind::TraitReference, TypeKind::Trait)?;
            if let (Some(r), Some(scope)) = (r, self.current_type()) {
                scope.decl.traits.push(r);
            }
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        if self.at(TokenKind::OpenCurly) {
            self.parse_trait_adaptation(node)?;
        } else {
            self.end_statement()?;
        }
        self.finish(node);
        Ok(())
    }

    /// `{ A::run insteadof B; B::run as protected runB; stop as halt; }`
    fn parse_trait_adaptation(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.stack.push();
        self.next()?;
        let node = self.node(parent, NodeKind::TraitAdaptation, None);
        loop {
            match self.peek_kind() {
                None => return Err(self.end_of_input()),
                Some(TokenKind::CloseCurly) => break,
                Some(_) => self.parse_trait_rule(node)?,
            }
        }
        self.next()?;
        self.finish(node);
        Ok(())
    }

    fn parse_trait_rule(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let start = self.mark();
        let at: Token = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.end_of_input()),
        };
        let first = self.parse_name()?;
        let (trait_ref, method) = if self.at(TokenKind::DoubleColon) {
            let r = self.reference_from_name(&first, &at, NodeKind::TraitReference, TypeKind::Trait)?;
            self.close(r, start);
            self.next()?;
            (Some(r), self.expect_identifier("a method name")?.text)
        } else {
            (None, first)
        };

        let rule = if self.accept(TokenKind::Insteadof)? {
            let rule = self.node(parent, NodeKind::TraitAdaptationPrecedence, Some(method));
            if let Some(r) = trait_ref {
                self.ast.add_child(rule, r);
            }
            loop {
                self.parse_type_reference(rule, NodeKind::TraitReference, TypeKind::Trait)?;
                if !self.accept(TokenKind::Comma)? {
                    break;
                }
            }
            rule
        } else {
            self.expect(TokenKind::As, "'as' or 'insteadof'")?;
            let rule = self.node(parent, NodeKind::TraitAdaptationAlias, Some(method));
            if let Some(r) = trait_ref {
                self.ast.add_child(rule, r);
            }
            let modifiers = self.parse_modifiers()?;
            self.ast.node_mut(rule).data = NodeData::Modifiers(modifiers);
            if !self.at(TokenKind::Semicolon) {
                let alias_start = self.mark();
                let alias = self.expect_identifier("an alias name")?;
                let alias = self.node(rule, NodeKind::Identifier, Some(alias.text));
                self.close(alias, alias_start);
            }
            rule
        };
        self.end_statement()?;
        self.close(rule, start);
        Ok(())
    }

    // ── Functions, closures and parameters ────────────────────────────────

    pub(super) fn parse_function_declaration(
        &mut self,
        parent: NodeId,
    ) -> Result<NodeId, ParseError> {
        let comment = self.peek_comment();
        self.stack.push();
        self.next()?;
        let by_reference = self.accept(TokenKind::Ampersand)?;
        let name = self.expect_identifier("a function name")?.text;
        let qualified = self.in_namespace(&name);

        let node = self.node(parent, NodeKind::Function, Some(name));
        let n = self.ast.node_mut(node);
        n.comment = comment.clone();
        if by_reference {
            n.data = NodeData::Flags(NodeFlags::REFERENCE);
        }

        self.scopes.push(Scope::Function);
        self.parse_formal_parameters(node, false)?;
        if self.accept(TokenKind::Colon)? {
            self.parse_type_hint(node)?;
        }
        self.parse_scope(node)?;
        self.scopes.pop();

        let tokens = self.finish(node);
        let decl = FunctionDeclaration {
            file: self.file.clone(),
            by_reference,
            location: Some(self.node_ref(node)),
            span: self.ast.span(node),
            comment,
            tokens,
        };
        self.pending.functions.push((qualified, decl));
        Ok(node)
    }

    /// `function (...) use (...) {}`, `fn (...) => expr`, optionally
    /// `static`. Returns a detached node.
    pub(super) fn parse_closure(&mut self) -> Result<NodeId, ParseError> {
        self.stack.push();
        let mut flags = NodeFlags::empty();
        if self.accept(TokenKind::Static)? {
            flags |= NodeFlags::STATIC;
        }
        let keyword = self.next()?;
        let arrow = match keyword.kind {
            TokenKind::Fn => true,
            TokenKind::Function => false,
            _ => return Err(ParseError::unexpected(&keyword, "'function' or 'fn'", &self.file)),
        };
        if self.accept(TokenKind::Ampersand)? {
            flags |= NodeFlags::REFERENCE;
        }
        let kind = if arrow {
            NodeKind::ArrowFunction
        } else {
            NodeKind::Closure
        };
        let node = self
            .ast
            .create(kind, Some(keyword.text.to_ascii_lowercase()));
        self.ast.node_mut(node).data = NodeData::Flags(flags);

        self.parse_formal_parameters(node, false)?;
        if !arrow && self.at(TokenKind::Use) {
            self.parse_closure_uses(node)?;
        }
        if self.accept(TokenKind::Colon)? {
            self.parse_type_hint(node)?;
        }
        if arrow {
            self.expect(TokenKind::DoubleArrow, "'=>'")?;
            let body = self.parse_expression()?;
            self.ast.add_child(node, body);
        } else {
            self.parse_scope(node)?;
        }
        self.finish(node);
        Ok(node)
    }

    fn parse_closure_uses(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let start = self.mark();
        self.next()?;
        let node = self.node(parent, NodeKind::ClosureUses, None);
        self.expect(TokenKind::OpenParen, "'('")?;
        while !self.at(TokenKind::CloseParen) {
            let var_start = self.mark();
            let by_reference = self.accept(TokenKind::Ampersand)?;
            let var = self.expect(TokenKind::Variable, "a variable")?;
            let var = self.node(node, NodeKind::Variable, Some(var.text));
            if by_reference {
                self.ast.node_mut(var).data = NodeData::Flags(NodeFlags::REFERENCE);
            }
            self.close(var, var_start);
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        self.close(node, start);
        Ok(())
    }

    /// `( params )`. In a constructor, parameters with visibility modifiers
    /// also declare properties of the enclosing type.
    pub(super) fn parse_formal_parameters(
        &mut self,
        parent: NodeId,
        promotes: bool,
    ) -> Result<NodeId, ParseError> {
        let start = self.mark();
        let node = self.node(parent, NodeKind::FormalParameters, None);
        self.expect(TokenKind::OpenParen, "'('")?;
        while !self.at(TokenKind::CloseParen) {
            self.parse_parameter(node, promotes)?;
            if !self.accept(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        self.close(node, start);
        Ok(node)
    }

    fn parse_parameter(&mut self, parent: NodeId, promotes: bool) -> Result<(), ParseError> {
        let comment = self.peek_comment();
        let start = self.mark();
        let modifiers = self.parse_modifiers()?;
        let node = self.node(parent, NodeKind::FormalParameter, None);
        if !matches!(
            self.peek_kind(),
            Some(TokenKind::Variable) | Some(TokenKind::Ampersand) | Some(TokenKind::Ellipsis)
        ) {
            self.parse_type_hint(node)?;
        }
        let mut flags = NodeFlags::empty();
        if self.accept(TokenKind::Ampersand)? {
            flags |= NodeFlags::REFERENCE;
        }
        if self.accept(TokenKind::Ellipsis)? {
            flags |= NodeFlags::VARIADIC;
        }
        let var = self.expect(TokenKind::Variable, "a parameter name")?;
        if self.accept(TokenKind::Equal)? {
            let default = self.parse_expression()?;
            self.ast.add_child(node, default);
        }
        let n = self.ast.node_mut(node);
        n.image = Some(var.text.clone());
        n.data = NodeData::Parameter { flags, modifiers };
        self.close(node, start);

        if promotes && !modifiers.is_empty() {
            let property = PropertyDeclaration {
                name: var.text,
                modifiers: with_default_visibility(modifiers),
                location: Some(self.node_ref(node)),
                span: self.ast.span(node),
                comment,
            };
            if let Some(scope) = self.current_type() {
                scope.decl.properties.push(property);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Modifiers, NodeData, NodeFlags, NodeKind};
    use crate::builder::{Builder, TypeKind};
    use crate::lexer::lex;
    use crate::parser::Parser;
    use crate::token::VecTokenStream;

    fn parse(src: &str) -> Builder {
        let mut b = Builder::new();
        let tokens = lex(src, "d.php").unwrap();
        Parser::new(&mut b, VecTokenStream::new(tokens), "d.php")
            .parse()
            .unwrap();
        b
    }

    #[test]
    fn class_members_are_collected() {
        let b = parse(
            "<?php namespace App;\n\
             abstract class Repo implements \\Countable {\n\
                 const LIMIT = 10, OFFSET = 0;\n\
                 private static ?int $count = null;\n\
                 protected $a, $b = [];\n\
                 var $legacy;\n\
                 abstract protected function find(int $id): ?self;\n\
                 public static function &make(string ...$args) { return new static(); }\n\
                 function count(): int { return 0; }\n\
             }",
        );
        let repo = b.ty(b.lookup("App\\Repo").unwrap());
        assert!(repo.is_declared());
        assert!(repo.is_abstract());
        assert_eq!(repo.interfaces[0].name(), "Countable");
        let consts: Vec<&str> = repo.constants.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(consts, vec!["LIMIT", "OFFSET"]);
        let props: Vec<&str> = repo.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["$count", "$a", "$b", "$legacy"]);
        assert_eq!(
            repo.properties[0].modifiers,
            Modifiers::PRIVATE | Modifiers::STATIC
        );
        assert_eq!(repo.properties[3].modifiers, Modifiers::PUBLIC);

        let find = repo.method("find").unwrap();
        assert_eq!(find.owner, repo.id());
        assert!(find.modifiers.contains(Modifiers::ABSTRACT | Modifiers::PROTECTED));
        let make = repo.method("make").unwrap();
        assert!(make.by_reference);
        assert!(make.modifiers.contains(Modifiers::STATIC));
        assert_eq!(repo.method("count").unwrap().modifiers, Modifiers::PUBLIC);
    }

    #[test]
    fn interface_extends_many_and_methods_are_abstract() {
        let b = parse("<?php interface A {} interface B {} interface C extends A, B { function run(); }");
        let c = b.ty(b.lookup("C").unwrap());
        assert_eq!(c.kind(), TypeKind::Interface);
        assert_eq!(c.interfaces.len(), 2);
        assert_eq!(b.resolve(&c.interfaces[0]), b.lookup("A"));
        assert!(c.method("run").unwrap().modifiers.contains(Modifiers::ABSTRACT));
    }

    #[test]
    fn trait_use_with_adaptations() {
        let b = parse(
            "<?php trait Hello { function hi() {} } trait World { function hi() {} }\n\
             class Greeter { use Hello, World { Hello::hi insteadof World; World::hi as protected worldHi; hi as shout; } }",
        );
        let g = b.ty(b.lookup("Greeter").unwrap());
        let traits: Vec<&str> = g.traits.iter().map(|t| t.name()).collect();
        assert_eq!(traits, vec!["Hello", "World"]);

        let ast = &b.units()[0].ast;
        let alias = ast.find_children_of_kind(ast.root(), NodeKind::TraitAdaptationAlias);
        assert_eq!(alias.len(), 2);
        assert_eq!(ast.modifiers(alias[0]), Modifiers::PROTECTED);
        let renamed = ast.first_child_of_kind(alias[0], NodeKind::Identifier).unwrap();
        assert_eq!(ast.image(renamed), Some("worldHi"));
        let precedence = ast
            .first_child_of_kind(ast.root(), NodeKind::TraitAdaptationPrecedence)
            .unwrap();
        assert_eq!(ast.children(precedence).len(), 2);
    }

    #[test]
    fn constructor_promotion_declares_properties() {
        let b = parse(
            "<?php class Point { public function __construct(private readonly int $x, public $y = 0, $z = 1) {} }",
        );
        let p = b.ty(b.lookup("Point").unwrap());
        let props: Vec<(&str, Modifiers)> = p
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.modifiers))
            .collect();
        assert_eq!(
            props,
            vec![
                ("$x", Modifiers::PRIVATE | Modifiers::READONLY),
                ("$y", Modifiers::PUBLIC)
            ]
        );
    }

    #[test]
    fn functions_and_closures() {
        let b = parse(
            "<?php namespace Util;\n\
             function &pick(array &$items, callable ...$fns) {\n\
                 $f = static function ($x) use (&$items, $fns) { return $x; };\n\
                 $g = fn(int $y): int => $y * 2;\n\
                 return $items;\n\
             }",
        );
        let id = b.lookup_function("Util\\pick").unwrap();
        let f = b.function(id);
        assert!(f.by_reference);
        assert_eq!(b.package(f.package()).name(), "Util");

        let ast = &b.units()[0].ast;
        let params = ast.find_children_of_kind(ast.root(), NodeKind::FormalParameter);
        assert_eq!(ast.flags(params[0]), NodeFlags::REFERENCE);
        assert_eq!(ast.flags(params[1]), NodeFlags::VARIADIC);
        let closure = ast.first_child_of_kind(ast.root(), NodeKind::Closure).unwrap();
        assert_eq!(ast.flags(closure), NodeFlags::STATIC);
        let uses = ast.first_child_of_kind(closure, NodeKind::ClosureUses).unwrap();
        assert_eq!(ast.children(uses).len(), 2);
        let arrow = ast
            .first_child_of_kind(ast.root(), NodeKind::ArrowFunction)
            .unwrap();
        assert!(ast
            .first_child_of_kind(arrow, NodeKind::BinaryExpression)
            .is_some());
    }

    #[test]
    fn anonymous_class_gets_unique_declared_name() {
        let b = parse(
            "<?php namespace App; interface Job {}\n\
             $a = new class(1) implements Job { public function run() {} };\n\
             $b = new class { };",
        );
        let anon: Vec<_> = b.types().filter(|t| t.anonymous).collect();
        assert_eq!(anon.len(), 2);
        assert_ne!(anon[0].name(), anon[1].name());
        assert!(anon[0].is_declared());
        assert_eq!(anon[0].interfaces[0].name(), "App\\Job");
        assert!(anon[0].method("run").is_some());

        let ast = &b.units()[0].ast;
        let node = ast
            .first_child_of_kind(ast.root(), NodeKind::AnonymousClass)
            .unwrap();
        assert!(matches!(ast.data(node), NodeData::Type(id) if *id == anon[0].id()));
        assert_eq!(
            ast.kind(ast.parent(node).unwrap()),
            NodeKind::AllocationExpression
        );
    }

    #[test]
    fn member_nodes_carry_owner_and_modifiers() {
        let b = parse("<?php class K { final public const A = 1; protected int $p; }");
        let k = b.lookup("K").unwrap();
        let ast = &b.units()[0].ast;
        let constant = ast
            .first_child_of_kind(ast.root(), NodeKind::ConstantDefinition)
            .unwrap();
        match ast.data(constant) {
            NodeData::Member { owner, modifiers } => {
                assert_eq!(*owner, k);
                assert_eq!(*modifiers, Modifiers::FINAL | Modifiers::PUBLIC);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        let field = ast
            .first_child_of_kind(ast.root(), NodeKind::FieldDeclaration)
            .unwrap();
        assert_eq!(ast.modifiers(field), Modifiers::PROTECTED);
        assert!(ast.first_child_of_kind(field, NodeKind::ScalarType).is_some());
    }

    #[test]
    fn member_access_in_method_bodies_is_not_a_class_member() {
        let b = parse(
            "<?php class Svc {\n\
                 private $repo;\n\
                 function f() { return $this->repo->find($this->id)?->name; }\n\
             }",
        );
        let svc = b.ty(b.lookup("Svc").unwrap());
        assert_eq!(svc.properties.len(), 1);
        assert_eq!(svc.methods.len(), 1);

        let ast = &b.units()[0].ast;
        let method = ast.first_child_of_kind(ast.root(), NodeKind::Method).unwrap();
        assert_eq!(
            ast.find_children_of_kind(method, NodeKind::MemberPrimaryPrefix).len(),
            4
        );
        let props: Vec<&str> = ast
            .find_children_of_kind(method, NodeKind::PropertyPostfix)
            .into_iter()
            .filter_map(|n| ast.image(n))
            .collect();
        assert_eq!(props, vec!["repo", "id", "name"]);
        let call = ast.first_child_of_kind(method, NodeKind::MethodPostfix).unwrap();
        assert_eq!(ast.image(call), Some("find"));
    }
}
