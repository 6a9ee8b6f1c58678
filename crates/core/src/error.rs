use serde::Serialize;

use crate::token::{Token, TokenKind};

/// A fatal condition raised while tokenizing or parsing one file.
///
/// None of these are recovered from inside the parser: the file being parsed
/// is abandoned and the error is handed to whoever asked for the parse.
/// Declarations committed by previously parsed files stay valid.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    /// The current token cannot appear at this point of the grammar.
    #[error("{file}:{line}:{column}: unexpected token '{text}' ({token:?}), expected {expected}")]
    UnexpectedToken {
        text: String,
        token: TokenKind,
        expected: String,
        file: String,
        line: u32,
        column: u32,
    },

    /// Input ran out while a construct was still open.
    #[error("{file}:{line}:{column}: unexpected end of token stream")]
    TokenStreamEnd { file: String, line: u32, column: u32 },

    /// A brace or parenthesis body was never closed before the input ended.
    #[error("{file}: unclosed body, input ended before the closing token")]
    UnclosedBody { file: String },

    /// A context-sensitive keyword or construct was used outside the scope it needs.
    #[error("{file}:{line}:{column}: invalid state: {message}")]
    InvalidState {
        message: String,
        file: String,
        line: u32,
        column: u32,
    },

    /// A declaration was completed a second time for the same qualified name.
    #[error("{file}: cannot redeclare {kind} {name}, first declared in {first_file}")]
    ConflictingRedeclaration {
        name: String,
        #[serde(rename = "declared_kind")]
        kind: String,
        first_file: String,
        file: String,
    },

    /// The tokenizer could not make sense of the source text.
    #[error("{file}:{line}:{column}: {message}")]
    Lex {
        message: String,
        file: String,
        line: u32,
        column: u32,
    },

    /// The source could not be read.
    #[error("{file}: cannot read source: {message}")]
    Io { message: String, file: String },
}

impl ParseError {
    pub fn unexpected(token: &Token, expected: impl Into<String>, file: &str) -> Self {
        ParseError::UnexpectedToken {
            text: token.text.clone(),
            token: token.kind,
            expected: expected.into(),
            file: file.to_owned(),
            line: token.start_line,
            column: token.start_column,
        }
    }

    pub fn lex(file: &str, line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError::Lex {
            message: message.into(),
            file: file.to_owned(),
            line,
            column,
        }
    }

    /// The file the error was raised for.
    pub fn file(&self) -> &str {
        match self {
            ParseError::UnexpectedToken { file, .. }
            | ParseError::TokenStreamEnd { file, .. }
            | ParseError::UnclosedBody { file }
            | ParseError::InvalidState { file, .. }
            | ParseError::ConflictingRedeclaration { file, .. }
            | ParseError::Lex { file, .. }
            | ParseError::Io { file, .. } => file,
        }
    }

    /// Line and column of the error, when it has a location.
    pub fn location(&self) -> Option<(u32, u32)> {
        match self {
            ParseError::UnexpectedToken { line, column, .. }
            | ParseError::TokenStreamEnd { line, column, .. }
            | ParseError::InvalidState { line, column, .. }
            | ParseError::Lex { line, column, .. } => Some((*line, *column)),
            ParseError::UnclosedBody { .. }
            | ParseError::ConflictingRedeclaration { .. }
            | ParseError::Io { .. } => None,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        let (line, column) = match self.location() {
            Some((l, c)) => (Some(l), Some(c)),
            None => (None, None),
        };
        serde_json::json!({
            "column":  column,
            "file":    self.file(),
            "kind":    self.kind_name(),
            "line":    line,
            "message": self.to_string(),
        })
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ParseError::UnexpectedToken { .. } => "unexpected_token",
            ParseError::TokenStreamEnd { .. } => "token_stream_end",
            ParseError::UnclosedBody { .. } => "unclosed_body",
            ParseError::InvalidState { .. } => "invalid_state",
            ParseError::ConflictingRedeclaration { .. } => "conflicting_redeclaration",
            ParseError::Lex { .. } => "lex",
            ParseError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_token_carries_position_and_text() {
        let tok = Token::new(TokenKind::CloseCurly, "}", 3, 7);
        let err = ParseError::unexpected(&tok, "an expression", "a.php");
        assert_eq!(err.location(), Some((3, 7)));
        assert_eq!(err.file(), "a.php");
        let msg = err.to_string();
        assert!(msg.contains("a.php:3:7"), "{}", msg);
        assert!(msg.contains("'}'"), "{}", msg);
    }

    #[test]
    fn json_value_has_null_location_for_unclosed_body() {
        let err = ParseError::UnclosedBody {
            file: "x.php".into(),
        };
        let v = err.to_json_value();
        assert_eq!(v["kind"], "unclosed_body");
        assert!(v["line"].is_null());
        assert_eq!(v["file"], "x.php");
    }

    #[test]
    fn redeclaration_serializes_declared_kind_beside_tag() {
        let err = ParseError::ConflictingRedeclaration {
            name: "App\\User".into(),
            kind: "class".into(),
            first_file: "a.php".into(),
            file: "b.php".into(),
        };
        let v = serde_json::to_value(&err).unwrap();
        assert_eq!(v["kind"], "conflicting_redeclaration");
        assert_eq!(v["declared_kind"], "class");
        assert_eq!(v["first_file"], "a.php");
        assert_eq!(err.to_json_value()["kind"], "conflicting_redeclaration");
    }
}
