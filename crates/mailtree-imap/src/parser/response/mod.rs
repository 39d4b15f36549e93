//! IMAP response parser.
//!
//! Turns the lexer's token stream into a sequence of top-level [`Value`]s.
//! Interpreting what those values mean is left to the FETCH decoder and the
//! structured builders.

#![allow(clippy::missing_errors_doc)]

mod date;
mod fetch;
mod helpers;
mod structure;
mod types;

pub use date::parse_internal_date;
pub use fetch::{FetchDecoder, FetchRecord, FetchTable, FetchValue, decode_fetch};
pub use structure::{parse_address_list, parse_body_structure, parse_envelope};
pub use types::{Address, BodyPart, BodyStructure, EmbeddedMessage, Envelope, Multipart, Params};

use crate::error::{ParseError, ParseResult};
use crate::parser::lexer::{Lexer, Token};
use crate::parser::raw::RawResponse;
use crate::parser::value::{Value, write_joined};

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete response into its top-level values.
    pub fn parse(raw: &RawResponse) -> ParseResult<Vec<Value>> {
        Self::parse_parts(raw.text(), raw.literals())
    }

    /// Parses response text with the given literal payloads.
    pub fn parse_parts(text: &[u8], literals: &[Vec<u8>]) -> ParseResult<Vec<Value>> {
        let mut lexer = Lexer::new(text, literals);
        let mut values = Vec::new();

        while let Some(token) = lexer.next_token()? {
            values.push(Self::parse_value(&mut lexer, token)?);
        }

        if lexer.unused_literals() > 0 {
            return Err(ParseError::literal(format!(
                "{} literal payload(s) without a marker",
                lexer.unused_literals()
            )));
        }

        Ok(values)
    }

    /// Parses text that carries no literals.
    pub fn parse_text(text: &str) -> ParseResult<Vec<Value>> {
        Self::parse_parts(text.as_bytes(), &[])
    }

    /// Builds one value starting at `token`, recursing into lists.
    fn parse_value(lexer: &mut Lexer<'_>, token: Token<'_>) -> ParseResult<Value> {
        match token {
            Token::LParen => {
                let mut items = Vec::new();
                loop {
                    match lexer.next_token()? {
                        Some(Token::RParen) => return Ok(Value::List(items)),
                        Some(token) => items.push(Self::parse_value(lexer, token)?),
                        None => {
                            return Err(ParseError::malformed(
                                "list incomplete before end of response",
                                PartialList(&items).to_string(),
                            ));
                        }
                    }
                }
            }
            Token::RParen => Err(ParseError::malformed(
                "unexpected closing parenthesis",
                ")",
            )),
            Token::Nil => Ok(Value::Nil),
            Token::Literal(data) => Ok(Value::Text(data.to_vec())),
            Token::QuotedString(s) => Ok(Value::Text(s)),
            Token::Atom(s) => parse_atom(s),
        }
    }
}

/// Converts an atom to an integer when it is all decimal digits.
fn parse_atom(s: &str) -> ParseResult<Value> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse()
            .map(Value::Integer)
            .map_err(|_| ParseError::malformed("number out of range", s))
    } else {
        Ok(Value::text(s))
    }
}

/// Renders an unterminated list as `(a b c`.
struct PartialList<'a>(&'a [Value]);

impl std::fmt::Display for PartialList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        write_joined(f, self.0)
    }
}
