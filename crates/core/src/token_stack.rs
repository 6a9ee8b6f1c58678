//! Capture scopes for the tokens consumed while parsing one construct.

use crate::token::Token;

/// A stack of token buffers.
///
/// `push` opens a scope, `add` records a consumed token and `pop` closes the
/// innermost scope and returns the tokens added since its `push`. Tokens of
/// a popped scope flow into the enclosing scope, so an outer construct
/// always sees every token its nested constructs consumed.
///
/// Scopes must be closed in LIFO order before the enclosing construct
/// finishes.
#[derive(Debug, Default)]
pub struct TokenStack {
    scopes: Vec<Vec<Token>>,
}

impl TokenStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Record `token` in the innermost open scope and hand it back.
    pub fn add(&mut self, token: Token) -> Token {
        if let Some(top) = self.scopes.last_mut() {
            top.push(token.clone());
        }
        token
    }

    pub fn pop(&mut self) -> Vec<Token> {
        debug_assert!(!self.scopes.is_empty(), "TokenStack::pop without push");
        let tokens = self.scopes.pop().unwrap_or_default();
        if let Some(parent) = self.scopes.last_mut() {
            parent.extend(tokens.iter().cloned());
        }
        tokens
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// First token of the innermost open scope.
    pub fn first(&self) -> Option<&Token> {
        self.scopes.last().and_then(|s| s.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(text: &str, col: u32) -> Token {
        Token::new(TokenKind::Identifier, text, 1, col)
    }

    #[test]
    fn pop_returns_only_tokens_since_matching_push() {
        let mut s = TokenStack::new();
        s.push();
        s.add(tok("a", 1));
        s.push();
        s.add(tok("b", 3));
        s.add(tok("c", 5));
        let inner = s.pop();
        assert_eq!(
            inner.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        s.add(tok("d", 7));
        let outer = s.pop();
        assert_eq!(
            outer.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn add_returns_token_unchanged() {
        let mut s = TokenStack::new();
        let t = tok("x", 2);
        assert_eq!(s.add(t.clone()), t);
        s.push();
        assert_eq!(s.add(t.clone()), t);
        assert_eq!(s.first(), Some(&t));
    }

    #[test]
    fn three_levels_feed_each_other() {
        let mut s = TokenStack::new();
        s.push();
        s.push();
        s.push();
        s.add(tok("x", 1));
        assert_eq!(s.pop().len(), 1);
        s.add(tok("y", 3));
        assert_eq!(s.pop().len(), 2);
        assert_eq!(s.pop().len(), 2);
    }
}
