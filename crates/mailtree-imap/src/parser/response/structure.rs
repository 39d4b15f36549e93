//! Builders for ENVELOPE, address lists and BODYSTRUCTURE.
//!
//! Each builder reads a parsed sub-tree positionally. Missing trailing
//! positions read as `NIL`, since servers differ in how much they send.

use crate::error::{ParseError, ParseResult};
use crate::parser::value::Value;

use super::date::parse_header_date;
use super::helpers::{field, list, nlist, nnumber, nstring};
use super::types::{Address, BodyPart, BodyStructure, EmbeddedMessage, Envelope, Multipart, Params};

/// Parses an ENVELOPE list.
///
/// Positions: date, subject, from, sender, reply-to, to, cc, bcc,
/// in-reply-to, message-id.
pub fn parse_envelope(value: &Value) -> ParseResult<Envelope> {
    let items = list(value, "envelope")?;

    let date = match nstring(field(items, 0), "envelope date")? {
        Some(text) => {
            let parsed = parse_header_date(&text);
            if parsed.is_none() {
                tracing::debug!(date = %text, "unparseable envelope date");
            }
            parsed
        }
        None => None,
    };

    Ok(Envelope {
        date,
        subject: nstring(field(items, 1), "subject")?,
        from: parse_address_list(field(items, 2))?,
        sender: parse_address_list(field(items, 3))?,
        reply_to: parse_address_list(field(items, 4))?,
        to: parse_address_list(field(items, 5))?,
        cc: parse_address_list(field(items, 6))?,
        bcc: parse_address_list(field(items, 7))?,
        in_reply_to: nstring(field(items, 8), "in-reply-to")?,
        message_id: nstring(field(items, 9), "message-id")?,
    })
}

/// Parses an address list: `NIL`, or a list of `(name route mailbox host)`.
pub fn parse_address_list(value: &Value) -> ParseResult<Option<Vec<Address>>> {
    let Some(items) = nlist(value, "address")? else {
        return Ok(None);
    };

    items
        .iter()
        .map(parse_address)
        .collect::<ParseResult<Vec<_>>>()
        .map(Some)
}

fn parse_address(value: &Value) -> ParseResult<Address> {
    let parts = list(value, "address")?;
    Ok(Address {
        name: nstring(field(parts, 0), "address name")?,
        route: nstring(field(parts, 1), "address route")?,
        mailbox: nstring(field(parts, 2), "address mailbox")?,
        host: nstring(field(parts, 3), "address host")?,
    })
}

/// Parses a BODY or BODYSTRUCTURE list.
///
/// A list whose first element is itself a list is a multipart node: the
/// children come first, then the subtype and optional parameters. Anything
/// else is a single part.
pub fn parse_body_structure(value: &Value) -> ParseResult<BodyStructure> {
    let items = list(value, "body structure")?;

    match items.first() {
        None => Err(ParseError::malformed("empty body structure", value.to_string())),
        Some(Value::List(_)) => parse_multipart(items).map(BodyStructure::Multipart),
        Some(_) => parse_single(items).map(BodyStructure::Single),
    }
}

fn parse_multipart(items: &[Value]) -> ParseResult<Multipart> {
    let split = items
        .iter()
        .position(|item| !matches!(item, Value::List(_)))
        .unwrap_or(items.len());
    let (children, rest) = items.split_at(split);

    let parts = children
        .iter()
        .map(parse_body_structure)
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Multipart {
        parts,
        subtype: nstring(field(rest, 0), "multipart subtype")?.unwrap_or_default(),
        params: parse_params(field(rest, 1))?,
        extension: rest.get(2..).unwrap_or_default().to_vec(),
    })
}

fn parse_single(items: &[Value]) -> ParseResult<BodyPart> {
    let media_type = nstring(field(items, 0), "media type")?.unwrap_or_default();
    let media_subtype = nstring(field(items, 1), "media subtype")?.unwrap_or_default();

    let mut part = BodyPart {
        params: parse_params(field(items, 2))?,
        id: nstring(field(items, 3), "content id")?,
        description: nstring(field(items, 4), "content description")?,
        encoding: nstring(field(items, 5), "content transfer encoding")?,
        size: nnumber(field(items, 6), "body size")?,
        ..BodyPart::default()
    };

    let extension_start = if media_type.eq_ignore_ascii_case("text") {
        part.lines = nnumber(field(items, 7), "body lines")?;
        8
    } else if media_type.eq_ignore_ascii_case("message")
        && media_subtype.eq_ignore_ascii_case("rfc822")
        && items.len() > 7
    {
        part.message = Some(Box::new(EmbeddedMessage {
            envelope: parse_envelope(field(items, 7))?,
            body: parse_body_structure(field(items, 8))?,
        }));
        part.lines = nnumber(field(items, 9), "body lines")?;
        10
    } else {
        7
    };

    part.media_type = media_type;
    part.media_subtype = media_subtype;
    part.extension = items.get(extension_start..).unwrap_or_default().to_vec();

    Ok(part)
}

/// Parses a body parameter list. `NIL` stays distinct from `()`.
fn parse_params(value: &Value) -> ParseResult<Params> {
    let Some(items) = nlist(value, "body parameter")? else {
        return Ok(None);
    };

    if items.len() % 2 != 0 {
        return Err(ParseError::malformed(
            "body parameter list has an odd number of elements",
            value.to_string(),
        ));
    }

    items
        .chunks_exact(2)
        .map(|pair| {
            let key = nstring(&pair[0], "parameter name")?.unwrap_or_default();
            let value = nstring(&pair[1], "parameter value")?.unwrap_or_default();
            Ok((key, value))
        })
        .collect::<ParseResult<Vec<_>>>()
        .map(Some)
}
