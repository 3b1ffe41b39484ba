//! Recursive-descent parser
//!
//! Grammar and precedence follow Python 3 for the constructs the compiler
//! can see. Constructs the compiler rejects later (lambdas, `try`, `async`,
//! comprehensions...) are still parsed so they can be reported with a
//! location instead of failing as syntax errors.

mod expression;
mod statement;

use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::normalize::LineMap;
use xnlogo_core::ast::Stmt;
use xnlogo_core::{SourceLocation, Span};

/// Parse a whole file into its top-level statements
pub fn parse_module(source: &str) -> Result<Vec<Stmt>> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_module()
}

/// Parse a normalized fragment; positions are mapped back through `line_map`
pub fn parse_fragment(text: &str, line_map: LineMap) -> Result<Vec<Stmt>> {
    let tokens = Lexer::with_line_map(text, line_map).tokenize()?;
    Parser::new(tokens).parse_module()
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// End offset of the last consumed non-layout token
    prev_end: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::EndOfFile) {
            let (span, location) = tokens
                .last()
                .map(|t| (Span::new(t.span.end, t.span.end), t.location))
                .unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::EndOfFile,
                span,
                location,
            });
        }
        Parser {
            tokens,
            pos: 0,
            prev_end: 0,
        }
    }

    fn parse_module(mut self) -> Result<Vec<Stmt>> {
        let mut body = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::EndOfFile => break,
                TokenKind::Newline => {
                    self.advance();
                }
                _ => body.extend(self.parse_statement()?),
            }
        }
        Ok(body)
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_nth_kind(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn location(&self) -> SourceLocation {
        self.peek().location
    }

    fn start(&self) -> usize {
        self.peek().span.start
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        if !token.kind.is_layout() {
            self.prev_end = token.span.end;
        }
        token
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Op(o) if *o == op)
    }

    fn at_kw(&self, kw: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<Token> {
        if self.at_op(op) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", op)))
        }
    }

    fn expect_kw(&mut self, kw: &str) -> Result<Token> {
        if self.at_kw(kw) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", kw)))
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        match self.peek_kind() {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    fn expect_newline(&mut self) -> Result<()> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::EndOfFile => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let location = self.location();
        match self.peek_kind() {
            TokenKind::EndOfFile => ParseError::UnexpectedEof { location },
            TokenKind::Indent => ParseError::syntax("unexpected indent", location),
            found => ParseError::syntax(format!("expected {}, found {}", expected, found), location),
        }
    }
}
