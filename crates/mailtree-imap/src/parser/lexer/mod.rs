//! IMAP lexer for tokenizing server responses.
//!
//! The lexer walks response text whose literal payloads have already been
//! pulled out by the transport. Each `{N}` marker in the text is bound,
//! in order, to the next unconsumed payload.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::error::{ParseError, ParseResult};

/// IMAP lexer state.
///
/// Works as a cursor: [`Lexer::peek_token`] looks at the next token without
/// consuming it, [`Lexer::next_token`] consumes it. `Ok(None)` marks the end
/// of input.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    literals: &'a [Vec<u8>],
    next_literal: usize,
    peeked: Option<Option<Token<'a>>>,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over text and its ordered literal payloads.
    #[must_use]
    pub const fn new(input: &'a [u8], literals: &'a [Vec<u8>]) -> Self {
        Self {
            input,
            pos: 0,
            literals,
            next_literal: 0,
            peeked: None,
        }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of literal payloads not yet bound to a marker.
    #[must_use]
    pub const fn unused_literals(&self) -> usize {
        self.literals.len() - self.next_literal
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> ParseResult<Option<&Token<'a>>> {
        if self.peeked.is_none() {
            let token = self.read_token()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.as_ref().and_then(Option::as_ref))
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'a>>> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.read_token(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_token(&mut self) -> ParseResult<Option<Token<'a>>> {
        self.skip_whitespace();

        let Some(byte) = self.peek() else {
            return Ok(None);
        };

        let token = match byte {
            b'(' => {
                self.pos += 1;
                Token::LParen
            }
            b')' => {
                self.pos += 1;
                Token::RParen
            }
            b'"' => self.read_quoted_string()?,
            b'{' => self.read_literal()?,
            _ => self.read_atom()?,
        };

        Ok(Some(token))
    }

    /// Reads a quoted string token.
    fn read_quoted_string(&mut self) -> ParseResult<Token<'a>> {
        let start = self.pos;
        self.pos += 1; // opening quote

        let mut result = Vec::new();

        loop {
            let Some(byte) = self.peek() else {
                return Err(ParseError::UnexpectedEnd(format!(
                    "quoted string not terminated: {}",
                    self.lossy(start, self.pos)
                )));
            };
            self.pos += 1;

            match byte {
                b'"' => break,
                b'\\' => match self.peek() {
                    Some(c @ (b'"' | b'\\')) => {
                        result.push(c);
                        self.pos += 1;
                    }
                    Some(c) => {
                        return Err(ParseError::malformed(
                            format!("invalid escape \\{}", char::from(c)),
                            self.lossy(start, self.pos + 1),
                        ));
                    }
                    None => {
                        return Err(ParseError::UnexpectedEnd(format!(
                            "quoted string not terminated: {}",
                            self.lossy(start, self.pos)
                        )));
                    }
                },
                c => result.push(c),
            }
        }

        Ok(Token::QuotedString(result))
    }

    /// Reads a `{N}` (or `{N+}`) marker and binds it to the next payload.
    fn read_literal(&mut self) -> ParseResult<Token<'a>> {
        let start = self.pos;
        let Some(close) = self.input[start..].iter().position(|&b| b == b'}') else {
            return Err(ParseError::UnexpectedEnd(format!(
                "literal marker not terminated: {}",
                self.lossy(start, self.input.len())
            )));
        };
        let end = start + close + 1;
        self.pos = end;

        let marker = self.lossy(start, end);
        let digits = &self.input[start + 1..end - 1];
        let digits = digits.strip_suffix(b"+").unwrap_or(digits);

        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(ParseError::malformed("invalid literal marker", marker));
        }
        let declared: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ParseError::malformed("literal size out of range", marker.clone()))?;

        let Some(payload) = self.literals.get(self.next_literal) else {
            return Err(ParseError::literal(format!(
                "no literal corresponds to {marker}"
            )));
        };
        if payload.len() != declared {
            return Err(ParseError::literal(format!(
                "expecting literal of size {declared}, got {}",
                payload.len()
            )));
        }
        self.next_literal += 1;

        Ok(Token::Literal(payload))
    }

    /// Reads an atom, keeping any `[...]` section (spaces and parentheses
    /// included) as part of it.
    fn read_atom(&mut self) -> ParseResult<Token<'a>> {
        let start = self.pos;
        let mut depth = 0usize;

        while let Some(b) = self.peek() {
            match b {
                b'[' => depth += 1,
                b']' if depth > 0 => depth -= 1,
                _ if depth == 0 && is_delimiter(b) => break,
                _ => {}
            }
            self.pos += 1;
        }

        if depth > 0 {
            return Err(ParseError::UnexpectedEnd(format!(
                "section not terminated: {}",
                self.lossy(start, self.pos)
            )));
        }

        let s = std::str::from_utf8(&self.input[start..self.pos]).map_err(|_| {
            ParseError::malformed("invalid UTF-8 in atom", self.lossy(start, self.pos))
        })?;

        if s.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(s))
        }
    }

    fn lossy(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.input[start..end.min(self.input.len())]).into_owned()
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = ParseResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Returns true for bytes that end an atom.
#[must_use]
pub const fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'"') || b.is_ascii_whitespace()
}
