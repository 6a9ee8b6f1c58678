use crate::error::ParseError;
use crate::token::{Token, TokenKind};

const CAST_TYPES: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real", "string", "binary", "array",
    "object", "unset",
];

/// Operators by length, longest first so that `===` wins over `==`.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("===", TokenKind::IsIdentical),
    ("!==", TokenKind::IsNotIdentical),
    ("<=>", TokenKind::Spaceship),
    ("**=", TokenKind::PowEqual),
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::ShiftLeftEqual),
    (">>=", TokenKind::ShiftRightEqual),
    ("??=", TokenKind::CoalesceEqual),
    ("?->", TokenKind::NullsafeArrow),
    ("==", TokenKind::IsEqual),
    ("!=", TokenKind::IsNotEqual),
    ("<>", TokenKind::IsNotEqual),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("&&", TokenKind::BooleanAnd),
    ("||", TokenKind::BooleanOr),
    ("??", TokenKind::Coalesce),
    ("++", TokenKind::Increment),
    ("--", TokenKind::Decrement),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::MulEqual),
    ("/=", TokenKind::DivEqual),
    (".=", TokenKind::ConcatEqual),
    ("%=", TokenKind::ModEqual),
    ("&=", TokenKind::AndEqual),
    ("|=", TokenKind::OrEqual),
    ("^=", TokenKind::XorEqual),
    ("<<", TokenKind::ShiftLeft),
    (">>", TokenKind::ShiftRight),
    ("->", TokenKind::Arrow),
    ("=>", TokenKind::DoubleArrow),
    ("::", TokenKind::DoubleColon),
    ("**", TokenKind::Pow),
    ("{", TokenKind::OpenCurly),
    ("}", TokenKind::CloseCurly),
    ("(", TokenKind::OpenParen),
    (")", TokenKind::CloseParen),
    ("[", TokenKind::OpenBracket),
    ("]", TokenKind::CloseBracket),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    ("\\", TokenKind::Backslash),
    ("?", TokenKind::Question),
    ("$", TokenKind::Dollar),
    ("@", TokenKind::At),
    ("=", TokenKind::Equal),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    (".", TokenKind::Dot),
    ("&", TokenKind::Ampersand),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Bang),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
];

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word.to_ascii_lowercase().as_str() {
        "abstract" => TokenKind::Abstract,
        "and" => TokenKind::LogicalAnd,
        "array" => TokenKind::Array,
        "as" => TokenKind::As,
        "break" => TokenKind::Break,
        "callable" => TokenKind::Callable,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "clone" => TokenKind::Clone,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "declare" => TokenKind::Declare,
        "default" => TokenKind::Default,
        "die" | "exit" => TokenKind::Exit,
        "do" => TokenKind::Do,
        "echo" => TokenKind::Echo,
        "else" => TokenKind::Else,
        "elseif" => TokenKind::Elseif,
        "empty" => TokenKind::Empty,
        "enddeclare" => TokenKind::Enddeclare,
        "endfor" => TokenKind::Endfor,
        "endforeach" => TokenKind::Endforeach,
        "endif" => TokenKind::Endif,
        "endswitch" => TokenKind::Endswitch,
        "endwhile" => TokenKind::Endwhile,
        "eval" => TokenKind::Eval,
        "extends" => TokenKind::Extends,
        "final" => TokenKind::Final,
        "finally" => TokenKind::Finally,
        "fn" => TokenKind::Fn,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "function" => TokenKind::Function,
        "global" => TokenKind::Global,
        "goto" => TokenKind::Goto,
        "if" => TokenKind::If,
        "implements" => TokenKind::Implements,
        "include" => TokenKind::Include,
        "include_once" => TokenKind::IncludeOnce,
        "instanceof" => TokenKind::Instanceof,
        "insteadof" => TokenKind::Insteadof,
        "interface" => TokenKind::Interface,
        "isset" => TokenKind::Isset,
        "list" => TokenKind::List,
        "namespace" => TokenKind::Namespace,
        "new" => TokenKind::New,
        "or" => TokenKind::LogicalOr,
        "print" => TokenKind::Print,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "public" => TokenKind::Public,
        "readonly" => TokenKind::Readonly,
        "require" => TokenKind::Require,
        "require_once" => TokenKind::RequireOnce,
        "return" => TokenKind::Return,
        "static" => TokenKind::Static,
        "switch" => TokenKind::Switch,
        "throw" => TokenKind::Throw,
        "trait" => TokenKind::Trait,
        "try" => TokenKind::Try,
        "unset" => TokenKind::Unset,
        "use" => TokenKind::Use,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        "xor" => TokenKind::LogicalXor,
        "yield" => TokenKind::Yield,
        _ => return None,
    };
    Some(kind)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || (c as u32) >= 0x80
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || (c as u32) >= 0x80
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Cursor {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn bump_n(&mut self, n: usize, into: &mut String) {
        for _ in 0..n {
            if let Some(c) = self.bump() {
                into.push(c);
            }
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.at(i) == Some(c))
    }

    fn starts_with_ci(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.at(i).map(|x| x.to_ascii_lowercase()) == Some(c))
    }
}

/// Build a token whose text may span several lines.
fn make(kind: TokenKind, text: String, line: u32, column: u32) -> Token {
    let mut end_line = line;
    let mut end_column = column;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev {
            if p == '\n' {
                end_line += 1;
                end_column = 1;
            } else {
                end_column += 1;
            }
        }
        prev = Some(c);
    }
    Token {
        kind,
        text,
        start_line: line,
        end_line,
        start_column: column,
        end_column,
    }
}

/// Tokenize PHP source text. Plain comments are dropped, doc comments kept.
pub fn lex(src: &str, filename: &str) -> Result<Vec<Token>, ParseError> {
    let mut cur = Cursor {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    let mut in_php = false;

    while !cur.at_end() {
        if !in_php {
            in_php = lex_inline_html(&mut cur, &mut tokens);
            continue;
        }

        let c = match cur.at(0) {
            Some(c) => c,
            None => break,
        };
        let (line, column) = (cur.line, cur.column);

        // Close tag
        if cur.starts_with("?>") {
            let mut text = String::new();
            cur.bump_n(2, &mut text);
            if cur.starts_with("\r\n") {
                cur.bump_n(2, &mut text);
            } else if cur.at(0) == Some('\n') {
                cur.bump_n(1, &mut text);
            }
            tokens.push(make(TokenKind::CloseTag, text, line, column));
            in_php = false;
            continue;
        }

        if c.is_whitespace() {
            cur.bump();
            continue;
        }

        // Attribute group, skipped as a whole
        if cur.starts_with("#[") {
            skip_attribute(&mut cur, filename)?;
            continue;
        }

        // Line comment, ends at newline or close tag
        if c == '#' || cur.starts_with("//") {
            while let Some(ch) = cur.at(0) {
                if ch == '\n' || cur.starts_with("?>") {
                    break;
                }
                cur.bump();
            }
            continue;
        }

        // Block and doc comments
        if cur.starts_with("/*") {
            let is_doc = cur.starts_with("/**") && cur.at(3).is_some_and(char::is_whitespace);
            let mut text = String::new();
            cur.bump_n(2, &mut text);
            loop {
                if cur.at_end() {
                    return Err(ParseError::lex(
                        filename,
                        line,
                        column,
                        "unterminated block comment",
                    ));
                }
                if cur.starts_with("*/") {
                    cur.bump_n(2, &mut text);
                    break;
                }
                cur.bump_n(1, &mut text);
            }
            if is_doc {
                tokens.push(make(TokenKind::DocComment, text, line, column));
            }
            continue;
        }

        // Variable
        if c == '$' && cur.at(1).is_some_and(is_ident_start) {
            let mut text = String::new();
            cur.bump_n(1, &mut text);
            while cur.at(0).is_some_and(is_ident_char) {
                cur.bump_n(1, &mut text);
            }
            tokens.push(make(TokenKind::Variable, text, line, column));
            continue;
        }

        // Identifier / keyword
        if is_ident_start(c) {
            let mut text = String::new();
            while cur.at(0).is_some_and(is_ident_char) {
                cur.bump_n(1, &mut text);
            }
            let kind = keyword(&text).unwrap_or(TokenKind::Identifier);
            tokens.push(make(kind, text, line, column));
            continue;
        }

        // Number
        if c.is_ascii_digit() || (c == '.' && cur.at(1).is_some_and(|d| d.is_ascii_digit())) {
            let tok = lex_number(&mut cur, filename)?;
            tokens.push(tok);
            continue;
        }

        // Strings
        if c == '\'' || c == '"' || c == '`' {
            let tok = lex_quoted(&mut cur, c, filename)?;
            tokens.push(tok);
            continue;
        }
        if cur.starts_with("<<<") {
            let tok = lex_heredoc(&mut cur, filename)?;
            tokens.push(tok);
            continue;
        }

        // Cast
        if c == '(' {
            if let Some(len) = cast_length(&cur) {
                let mut text = String::new();
                cur.bump_n(len, &mut text);
                tokens.push(make(TokenKind::Cast, text, line, column));
                continue;
            }
        }

        match OPERATORS.iter().find(|(op, _)| cur.starts_with(op)) {
            Some((op, kind)) => {
                let mut text = String::new();
                cur.bump_n(op.chars().count(), &mut text);
                tokens.push(make(*kind, text, line, column));
            }
            None => {
                return Err(ParseError::lex(
                    filename,
                    line,
                    column,
                    format!("unexpected character '{}'", c),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Consume inline HTML up to and including the next open tag.
/// Returns whether PHP mode was entered.
fn lex_inline_html(cur: &mut Cursor, tokens: &mut Vec<Token>) -> bool {
    let (line, column) = (cur.line, cur.column);
    let mut html = String::new();
    while !cur.at_end() && !cur.starts_with("<?") {
        cur.bump_n(1, &mut html);
    }
    if !html.is_empty() {
        tokens.push(make(TokenKind::InlineHtml, html, line, column));
    }
    if cur.at_end() {
        return false;
    }

    let (line, column) = (cur.line, cur.column);
    let mut text = String::new();
    if cur.starts_with("<?=") {
        cur.bump_n(3, &mut text);
        tokens.push(make(TokenKind::Echo, text, line, column));
    } else if cur.starts_with_ci("<?php") && cur.at(5).map_or(true, char::is_whitespace) {
        cur.bump_n(5, &mut text);
        if cur.at(0).is_some_and(char::is_whitespace) {
            cur.bump_n(1, &mut text);
        }
        tokens.push(make(TokenKind::OpenTag, text, line, column));
    } else {
        cur.bump_n(2, &mut text);
        tokens.push(make(TokenKind::OpenTag, text, line, column));
    }
    true
}

fn skip_attribute(cur: &mut Cursor, filename: &str) -> Result<(), ParseError> {
    let (line, column) = (cur.line, cur.column);
    cur.bump();
    let mut depth = 0usize;
    while let Some(c) = cur.at(0) {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    cur.bump();
                    return Ok(());
                }
            }
            '\'' | '"' => {
                lex_quoted(cur, c, filename)?;
                continue;
            }
            _ => {}
        }
        cur.bump();
    }
    Err(ParseError::lex(filename, line, column, "unterminated attribute"))
}

fn lex_number(cur: &mut Cursor, filename: &str) -> Result<Token, ParseError> {
    let (line, column) = (cur.line, cur.column);
    let mut text = String::new();

    let radix_prefix = cur.at(0) == Some('0')
        && matches!(cur.at(1), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O'));
    if radix_prefix {
        cur.bump_n(2, &mut text);
        while cur.at(0).is_some_and(|d| d.is_ascii_hexdigit() || d == '_') {
            cur.bump_n(1, &mut text);
        }
        if text.len() == 2 {
            return Err(ParseError::lex(
                filename,
                line,
                column,
                format!("invalid numeric literal '{}'", text),
            ));
        }
        return Ok(make(TokenKind::Integer, text, line, column));
    }

    let mut kind = TokenKind::Integer;
    while cur.at(0).is_some_and(|d| d.is_ascii_digit() || d == '_') {
        cur.bump_n(1, &mut text);
    }
    if cur.at(0) == Some('.') && cur.at(1) != Some('.') {
        kind = TokenKind::Float;
        cur.bump_n(1, &mut text);
        while cur.at(0).is_some_and(|d| d.is_ascii_digit() || d == '_') {
            cur.bump_n(1, &mut text);
        }
    }
    if matches!(cur.at(0), Some('e' | 'E')) {
        let signed = matches!(cur.at(1), Some('+' | '-'));
        let digit_at = if signed { 2 } else { 1 };
        if cur.at(digit_at).is_some_and(|d| d.is_ascii_digit()) {
            kind = TokenKind::Float;
            cur.bump_n(digit_at, &mut text);
            while cur.at(0).is_some_and(|d| d.is_ascii_digit()) {
                cur.bump_n(1, &mut text);
            }
        }
    }
    Ok(make(kind, text, line, column))
}

fn lex_quoted(cur: &mut Cursor, quote: char, filename: &str) -> Result<Token, ParseError> {
    let (line, column) = (cur.line, cur.column);
    let mut text = String::new();
    cur.bump_n(1, &mut text);
    loop {
        let c = match cur.at(0) {
            Some(c) => c,
            None => {
                return Err(ParseError::lex(
                    filename,
                    line,
                    column,
                    "unterminated string literal",
                ));
            }
        };
        if c == '\\' {
            cur.bump_n(2, &mut text);
            continue;
        }
        if quote != '\'' && c == '{' && cur.at(1) == Some('$') {
            skip_interpolation(cur, &mut text, filename)?;
            continue;
        }
        cur.bump_n(1, &mut text);
        if c == quote {
            break;
        }
    }
    Ok(make(TokenKind::StringLiteral, text, line, column))
}

/// Consume a `{$...}` interpolation, which may itself contain quoted strings.
fn skip_interpolation(cur: &mut Cursor, text: &mut String, filename: &str) -> Result<(), ParseError> {
    let (line, column) = (cur.line, cur.column);
    let mut depth = 0usize;
    while let Some(c) = cur.at(0) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    cur.bump_n(1, text);
                    return Ok(());
                }
            }
            '\'' | '"' => {
                let inner = lex_quoted(cur, c, filename)?;
                text.push_str(&inner.text);
                continue;
            }
            _ => {}
        }
        cur.bump_n(1, text);
    }
    Err(ParseError::lex(filename, line, column, "unterminated string interpolation"))
}

fn lex_heredoc(cur: &mut Cursor, filename: &str) -> Result<Token, ParseError> {
    let (line, column) = (cur.line, cur.column);
    let mut text = String::new();
    cur.bump_n(3, &mut text);
    while matches!(cur.at(0), Some(' ' | '\t')) {
        cur.bump_n(1, &mut text);
    }
    let quote = match cur.at(0) {
        Some(q @ ('\'' | '"')) => {
            cur.bump_n(1, &mut text);
            Some(q)
        }
        _ => None,
    };
    let mut label = String::new();
    while cur.at(0).is_some_and(is_ident_char) {
        if let Some(c) = cur.bump() {
            label.push(c);
            text.push(c);
        }
    }
    if let Some(q) = quote {
        if cur.at(0) != Some(q) {
            return Err(ParseError::lex(filename, line, column, "malformed heredoc label"));
        }
        cur.bump_n(1, &mut text);
    }
    if label.is_empty() {
        return Err(ParseError::lex(filename, line, column, "missing heredoc label"));
    }

    // Body lines until a line whose first non-blank text is the label.
    loop {
        while cur.at(0).is_some_and(|c| c != '\n') {
            cur.bump_n(1, &mut text);
        }
        if cur.at_end() {
            return Err(ParseError::lex(filename, line, column, "unterminated heredoc"));
        }
        cur.bump_n(1, &mut text);

        let mut indent = 0;
        while matches!(cur.at(indent), Some(' ' | '\t')) {
            indent += 1;
        }
        let closes = label.chars().enumerate().all(|(i, c)| cur.at(indent + i) == Some(c))
            && !cur
                .at(indent + label.chars().count())
                .is_some_and(is_ident_char);
        if closes {
            cur.bump_n(indent + label.chars().count(), &mut text);
            return Ok(make(TokenKind::StringLiteral, text, line, column));
        }
    }
}

/// Length in chars of a cast like `( int )` at the cursor, if there is one.
fn cast_length(cur: &Cursor) -> Option<usize> {
    let mut i = 1;
    while matches!(cur.at(i), Some(' ' | '\t')) {
        i += 1;
    }
    let start = i;
    while cur.at(i).is_some_and(|c| c.is_ascii_alphabetic()) {
        i += 1;
    }
    let word: String = (start..i)
        .filter_map(|j| cur.at(j))
        .collect::<String>()
        .to_ascii_lowercase();
    if !CAST_TYPES.contains(&word.as_str()) {
        return None;
    }
    while matches!(cur.at(i), Some(' ' | '\t')) {
        i += 1;
    }
    (cur.at(i) == Some(')')).then_some(i + 1)
}
