//! Token model and the stream interface the parser consumes.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Source framing
    OpenTag,
    CloseTag,
    InlineHtml,
    DocComment,

    // Names and literals
    Identifier,
    Variable,
    Integer,
    Float,
    StringLiteral,
    Cast,

    // Keywords
    Abstract,
    Array,
    As,
    Break,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Echo,
    Else,
    Elseif,
    Empty,
    Enddeclare,
    Endfor,
    Endforeach,
    Endif,
    Endswitch,
    Endwhile,
    Eval,
    Exit,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    Function,
    Global,
    Goto,
    If,
    Implements,
    Include,
    IncludeOnce,
    Instanceof,
    Insteadof,
    Interface,
    Isset,
    List,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Namespace,
    New,
    Print,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    RequireOnce,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,
    Yield,

    // Punctuation
    OpenCurly,
    CloseCurly,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Colon,
    DoubleColon,
    Backslash,
    Arrow,
    NullsafeArrow,
    DoubleArrow,
    Question,
    Dollar,
    At,
    Ellipsis,

    // Operators
    Equal,
    PlusEqual,
    MinusEqual,
    MulEqual,
    DivEqual,
    ConcatEqual,
    ModEqual,
    PowEqual,
    AndEqual,
    OrEqual,
    XorEqual,
    ShiftLeftEqual,
    ShiftRightEqual,
    CoalesceEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    Dot,
    Increment,
    Decrement,
    Ampersand,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,
    BooleanAnd,
    BooleanOr,
    Bang,
    Coalesce,
    IsEqual,
    IsNotEqual,
    IsIdentical,
    IsNotIdentical,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Spaceship,
}

impl TokenKind {
    /// Keywords that PHP still accepts where a plain identifier is expected,
    /// e.g. method names (`$a->list()`) or constant names after `::`.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Abstract
                | Array
                | As
                | Break
                | Callable
                | Case
                | Catch
                | Class
                | Clone
                | Const
                | Continue
                | Declare
                | Default
                | Do
                | Echo
                | Else
                | Elseif
                | Empty
                | Enddeclare
                | Endfor
                | Endforeach
                | Endif
                | Endswitch
                | Endwhile
                | Eval
                | Exit
                | Extends
                | Final
                | Finally
                | Fn
                | For
                | Foreach
                | Function
                | Global
                | Goto
                | If
                | Implements
                | Include
                | IncludeOnce
                | Instanceof
                | Insteadof
                | Interface
                | Isset
                | List
                | LogicalAnd
                | LogicalOr
                | LogicalXor
                | Namespace
                | New
                | Print
                | Private
                | Protected
                | Public
                | Readonly
                | Require
                | RequireOnce
                | Return
                | Static
                | Switch
                | Throw
                | Trait
                | Try
                | Unset
                | Use
                | Var
                | While
                | Yield
        )
    }

    pub fn is_assignment(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Equal
                | PlusEqual
                | MinusEqual
                | MulEqual
                | DivEqual
                | ConcatEqual
                | ModEqual
                | PowEqual
                | AndEqual
                | OrEqual
                | XorEqual
                | ShiftLeftEqual
                | ShiftRightEqual
                | CoalesceEqual
        )
    }
}

/// One lexical token with its source position (1-based, end column inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
    pub start_column: u32,
    pub end_column: u32,
}

impl Token {
    /// A single-line token starting at `line:column`.
    pub fn new(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Self {
        let text = text.into();
        let width = text.chars().count().max(1) as u32;
        Token {
            kind,
            text,
            start_line: line,
            end_line: line,
            start_column: column,
            end_column: column + width - 1,
        }
    }

    pub fn is_identifier_like(&self) -> bool {
        self.kind == TokenKind::Identifier || self.kind.is_keyword()
    }
}

/// Ordered token source with one token of lookahead.
///
/// `next` consumes, `peek` looks at the upcoming token without consuming it,
/// and `current` returns the token most recently consumed. `None` from
/// `next`/`peek` means the stream is exhausted.
pub trait TokenStream {
    fn next(&mut self) -> Option<Token>;
    fn peek(&self) -> Option<&Token>;
    fn current(&self) -> Option<&Token>;
}

/// [`TokenStream`] over an already tokenized buffer.
#[derive(Debug, Clone, Default)]
pub struct VecTokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl VecTokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        VecTokenStream { tokens, pos: 0 }
    }
}

impl TokenStream for VecTokenStream {
    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(t)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }
}
