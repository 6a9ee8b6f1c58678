//! Token cache boundary.
//!
//! The builder stores the token sequence of every completed type, method and
//! function once, under a key derived from its qualified name, so consumers
//! that want to re-scan raw tokens can restore them without keeping each
//! file's token buffer alive.

use std::collections::HashMap;

use crate::token::Token;

pub trait TokenCache: Send {
    fn store(&mut self, key: &str, tokens: Vec<Token>);
    fn restore(&self, key: &str) -> Option<Vec<Token>>;
}

pub fn type_key(qualified: &str) -> String {
    format!("type:{}", qualified)
}

pub fn method_key(qualified: &str, method: &str) -> String {
    format!("method:{}::{}", qualified, method)
}

pub fn function_key(qualified: &str) -> String {
    format!("function:{}", qualified)
}

/// In-memory [`TokenCache`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, Vec<Token>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TokenCache for MemoryCache {
    fn store(&mut self, key: &str, tokens: Vec<Token>) {
        self.entries.insert(key.to_owned(), tokens);
    }

    fn restore(&self, key: &str) -> Option<Vec<Token>> {
        self.entries.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn store_then_restore() {
        let mut cache = MemoryCache::new();
        let toks = vec![Token::new(TokenKind::Class, "class", 1, 7)];
        cache.store(&type_key("App\\User"), toks.clone());
        assert_eq!(cache.restore("type:App\\User"), Some(toks));
        assert_eq!(cache.restore(&method_key("App\\User", "save")), None);
        assert_eq!(method_key("A", "b"), "method:A::b");
        assert_eq!(function_key("f"), "function:f");
    }
}
