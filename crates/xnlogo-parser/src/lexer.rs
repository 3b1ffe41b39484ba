//! Tokenizer for the accepted Python subset
//!
//! Produces a flat token stream with explicit `Newline`, `Indent` and
//! `Dedent` tokens so the parser never looks at whitespace.

use crate::error::{ParseError, Result};
use crate::normalize::LineMap;
use std::fmt;
use xnlogo_core::{SourceLocation, Span};

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

// Longest first so that `**=` wins over `**` and `*`
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", ":=", "+", "-", "*", "/", "%", "@", "&", "|",
    "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "=",
];

/// Flavor of a string literal, from its prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Plain,
    Bytes,
    Format,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Keyword(&'static str),
    Int(i64),
    Float(f64),
    Str { value: String, kind: StringKind },
    Op(&'static str),
    Newline,
    Indent,
    Dedent,
    EndOfFile,
}

impl TokenKind {
    /// Layout tokens carry no source text of their own
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::EndOfFile
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Name(name) => write!(f, "name '{}'", name),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw),
            TokenKind::Int(value) => write!(f, "number {}", value),
            TokenKind::Float(value) => write!(f, "number {}", value),
            TokenKind::Str { .. } => write!(f, "string literal"),
            TokenKind::Op(op) => write!(f, "'{}'", op),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::EndOfFile => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte range in the lexed text
    pub span: Span,
    /// Position in the original file
    pub location: SourceLocation,
}

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    line_map: LineMap,
    indents: Vec<usize>,
    depth: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_line_map(source, LineMap::identity())
    }

    /// Lex a fragment whose positions are translated through `line_map`
    pub fn with_line_map(source: &'a str, line_map: LineMap) -> Self {
        Lexer {
            source,
            pos: 0,
            line: 1,
            column: 1,
            line_map,
            indents: vec![0],
            depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        loop {
            if self.at_line_start && self.depth == 0 {
                if self.handle_indentation()? {
                    continue;
                }
            }
            self.skip_inline_whitespace();

            let Some(ch) = self.peek() else { break };
            let start = self.pos;
            let location = self.here();

            match ch {
                '#' => self.skip_comment(),
                '\n' | '\r' => {
                    self.consume_line_break();
                    if self.depth == 0 {
                        self.push_newline(start, location);
                        self.at_line_start = true;
                    }
                }
                c if is_ident_start(c) => self.lex_name(start, location)?,
                c if c.is_ascii_digit() => self.lex_number(start, location)?,
                '.' if matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) => {
                    self.lex_number(start, location)?
                }
                '"' | '\'' => {
                    let kind = self.lex_string(StringKind::Plain, false, location)?;
                    self.push(kind, start, location);
                }
                _ => self.lex_operator(ch, start, location)?,
            }
        }

        let end = self.pos;
        let location = self.here();
        if self.depth > 0 {
            return Err(ParseError::UnexpectedEof { location });
        }
        self.push_newline(end, location);
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end, location);
        }
        self.push(TokenKind::EndOfFile, end, location);
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn here(&self) -> SourceLocation {
        self.line_map
            .map(SourceLocation::new(self.line, self.column))
    }

    fn push(&mut self, kind: TokenKind, start: usize, location: SourceLocation) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, self.pos),
            location,
        });
    }

    fn push_newline(&mut self, start: usize, location: SourceLocation) {
        let needed = match self.tokens.last() {
            Some(token) => !matches!(
                token.kind,
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
            ),
            None => false,
        };
        if needed {
            self.tokens.push(Token {
                kind: TokenKind::Newline,
                span: Span::new(start, start),
                location,
            });
        }
    }

    fn consume_line_break(&mut self) {
        if self.peek() == Some('\r') {
            self.bump();
        }
        if self.peek() == Some('\n') {
            self.bump();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.bump();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\x0c') => {
                    self.bump();
                }
                Some('\\') if matches!(self.peek_nth(1), Some('\n') | Some('\r')) => {
                    self.bump();
                    self.consume_line_break();
                }
                _ => break,
            }
        }
    }

    /// Measure the indentation of a new logical line and emit layout
    /// tokens. Returns true when the line was blank and got consumed.
    fn handle_indentation(&mut self) -> Result<bool> {
        let mut width = 0usize;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            self.bump();
        }

        match self.peek() {
            None => {
                self.at_line_start = false;
                return Ok(false);
            }
            Some('#') => {
                self.skip_comment();
                self.consume_line_break();
                return Ok(true);
            }
            Some('\n') | Some('\r') => {
                self.consume_line_break();
                return Ok(true);
            }
            _ => {}
        }

        self.at_line_start = false;
        let start = self.pos;
        let location = self.here();
        let current = self.indents.last().copied().unwrap_or(0);

        if width > current {
            self.indents.push(width);
            self.push(TokenKind::Indent, start, location);
        } else if width < current {
            while self.indents.last().copied().unwrap_or(0) > width {
                self.indents.pop();
                self.push(TokenKind::Dedent, start, location);
            }
            if self.indents.last().copied().unwrap_or(0) != width {
                return Err(ParseError::InconsistentDedent { location });
            }
        }
        Ok(false)
    }

    fn lex_name(&mut self, start: usize, location: SourceLocation) -> Result<()> {
        while let Some(ch) = self.peek() {
            if !is_ident_continue(ch) {
                break;
            }
            self.bump();
        }
        let source = self.source;
        let text = &source[start..self.pos];

        if matches!(self.peek(), Some('"') | Some('\'')) {
            if let Some((kind, raw)) = string_prefix(text) {
                let kind = self.lex_string(kind, raw, location)?;
                self.push(kind, start, location);
                return Ok(());
            }
        }

        let kind = match KEYWORDS.iter().find(|kw| **kw == text) {
            Some(kw) => TokenKind::Keyword(*kw),
            None => TokenKind::Name(text.to_string()),
        };
        self.push(kind, start, location);
        Ok(())
    }

    fn lex_number(&mut self, start: usize, location: SourceLocation) -> Result<()> {
        let invalid = |lexer: &Lexer<'_>| ParseError::InvalidNumber {
            text: lexer.source[start..lexer.pos].to_string(),
            location,
        };

        if self.peek() == Some('0') {
            let base = match self.peek_nth(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(base) = base {
                self.bump();
                self.bump();
                let mut digits = String::new();
                while let Some(ch) = self.peek() {
                    if ch.is_digit(base) {
                        digits.push(ch);
                    } else if ch != '_' {
                        break;
                    }
                    self.bump();
                }
                if matches!(self.peek(), Some(c) if is_ident_continue(c)) {
                    self.bump();
                    return Err(invalid(self));
                }
                if digits.is_empty() {
                    return Err(invalid(self));
                }
                // Literals past i64 keep their magnitude as a float
                let kind = match i64::from_str_radix(&digits, base) {
                    Ok(value) => TokenKind::Int(value),
                    Err(_) => TokenKind::Float(
                        digits
                            .chars()
                            .filter_map(|c| c.to_digit(base))
                            .fold(0.0, |acc, d| acc * f64::from(base) + f64::from(d)),
                    ),
                };
                self.push(kind, start, location);
                return Ok(());
            }
        }

        let mut text = String::new();
        let mut is_float = false;
        self.take_digits(&mut text);

        if self.peek() == Some('.') && self.peek_nth(1) != Some('.') {
            is_float = true;
            text.push('.');
            self.bump();
            self.take_digits(&mut text);
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exponent_follows = match self.peek_nth(1) {
                Some(d) if d.is_ascii_digit() => true,
                Some('+') | Some('-') => matches!(self.peek_nth(2), Some(d) if d.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                text.push('e');
                self.bump();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.bump();
                }
                self.take_digits(&mut text);
            }
        }

        if matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.bump();
            return Err(invalid(self));
        }

        let kind = match text.parse::<i64>() {
            Ok(value) if !is_float => TokenKind::Int(value),
            _ => TokenKind::Float(text.parse::<f64>().map_err(|_| invalid(self))?),
        };
        self.push(kind, start, location);
        Ok(())
    }

    fn take_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else if ch != '_' {
                break;
            }
            self.bump();
        }
    }

    fn lex_string(
        &mut self,
        kind: StringKind,
        raw: bool,
        location: SourceLocation,
    ) -> Result<TokenKind> {
        let Some(quote) = self.bump() else {
            return Err(ParseError::UnterminatedString { location });
        };
        let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(ParseError::UnterminatedString { location });
            };
            match ch {
                c if c == quote => {
                    if !triple {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        break;
                    }
                    value.push(c);
                }
                '\n' if !triple => return Err(ParseError::UnterminatedString { location }),
                '\\' => {
                    let Some(next) = self.bump() else {
                        return Err(ParseError::UnterminatedString { location });
                    };
                    if raw {
                        value.push('\\');
                        value.push(next);
                    } else {
                        self.unescape(next, &mut value);
                    }
                }
                c => value.push(c),
            }
        }

        Ok(TokenKind::Str { value, kind })
    }

    fn unescape(&mut self, esc: char, out: &mut String) {
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' | '\'' | '"' => out.push(esc),
            '\n' => {}
            'x' => self.unescape_hex(2, 'x', out),
            'u' => self.unescape_hex(4, 'u', out),
            'U' => self.unescape_hex(8, 'U', out),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    fn unescape_hex(&mut self, len: usize, marker: char, out: &mut String) {
        let digits: String = self.source[self.pos..]
            .chars()
            .take(len)
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        let decoded = if digits.len() == len {
            u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
        } else {
            None
        };
        match decoded {
            Some(ch) => {
                for _ in 0..len {
                    self.bump();
                }
                out.push(ch);
            }
            None => {
                out.push('\\');
                out.push(marker);
            }
        }
    }

    fn lex_operator(&mut self, ch: char, start: usize, location: SourceLocation) -> Result<()> {
        let source = self.source;
        let rest = &source[self.pos..];
        let Some(op) = OPERATORS.iter().copied().find(|op| rest.starts_with(*op)) else {
            return Err(ParseError::UnexpectedCharacter { ch, location });
        };
        for _ in 0..op.chars().count() {
            self.bump();
        }
        match op {
            "(" | "[" | "{" => self.depth += 1,
            ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        self.push(TokenKind::Op(op), start, location);
        Ok(())
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// String kind and raw flag for a valid literal prefix
fn string_prefix(text: &str) -> Option<(StringKind, bool)> {
    match text.to_ascii_lowercase().as_str() {
        "r" => Some((StringKind::Plain, true)),
        "u" => Some((StringKind::Plain, false)),
        "b" => Some((StringKind::Bytes, false)),
        "br" | "rb" => Some((StringKind::Bytes, true)),
        "f" => Some((StringKind::Format, false)),
        "fr" | "rf" => Some((StringKind::Format, true)),
        _ => None,
    }
}
