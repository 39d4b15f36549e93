//! IMAP token types.

use std::fmt;

/// Token types produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Atom (unquoted run of text, possibly with a `[...]` section).
    Atom(&'a str),
    /// Quoted string, delimiters stripped and escapes resolved.
    QuotedString(Vec<u8>),
    /// Literal marker `{n}` bound to its payload.
    Literal(&'a [u8]),
    /// Opening parenthesis.
    LParen,
    /// Closing parenthesis.
    RParen,
    /// NIL literal.
    Nil,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(s) => f.write_str(s),
            Self::QuotedString(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            Self::Literal(data) => write!(f, "{{{}}}", data.len()),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Nil => f.write_str("NIL"),
        }
    }
}
