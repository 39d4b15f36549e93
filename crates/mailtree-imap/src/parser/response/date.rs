//! Date parsing for INTERNALDATE and ENVELOPE.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::config::TargetZone;
use crate::error::{ParseError, ParseResult};
use crate::parser::value::Value;

/// INTERNALDATE layout: `dd-Mon-yyyy HH:MM:SS +zzzz`, day possibly space-padded.
const INTERNALDATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

/// Byte classes of a well-formed INTERNALDATE, one per position.
///
/// `d` day tens (space or 0-3), `9` digit, `U` upper-case letter, `l`
/// lower-case letter, `s` zone sign; anything else must match literally.
const INTERNALDATE_SHAPE: &[u8; 26] = b"d9-Ull-9999 99:99:99 s9999";

fn has_internal_date_shape(text: &[u8]) -> bool {
    text.len() == INTERNALDATE_SHAPE.len()
        && text.iter().zip(INTERNALDATE_SHAPE).all(|(&b, &class)| match class {
            b'd' => b == b' ' || (b'0'..=b'3').contains(&b),
            b'9' => b.is_ascii_digit(),
            b'U' => b.is_ascii_uppercase(),
            b'l' => b.is_ascii_lowercase(),
            b's' => b == b'+' || b == b'-',
            literal => b == literal,
        })
}

/// Parses INTERNALDATE text into a point in time with its declared offset.
///
/// ```
/// use mailtree_imap::parser::parse_internal_date;
///
/// let dt = parse_internal_date(" 9-Feb-2007 17:08:08 -0430").unwrap();
/// assert_eq!(dt.to_rfc3339(), "2007-02-09T17:08:08-04:30");
/// ```
pub fn parse_internal_date(text: &str) -> ParseResult<DateTime<FixedOffset>> {
    if !has_internal_date_shape(text.as_bytes()) {
        return Err(ParseError::DateParseFailure(format!("{text:?}")));
    }
    DateTime::parse_from_str(text.trim_start(), INTERNALDATE_FORMAT)
        .map_err(|_| ParseError::DateParseFailure(format!("{text:?}")))
}

/// Decodes an INTERNALDATE value and re-expresses it as naive time in `zone`.
pub(crate) fn normalize_internal_date(value: &Value, zone: TargetZone) -> ParseResult<NaiveDateTime> {
    let text = value
        .as_str()
        .ok_or_else(|| ParseError::DateParseFailure(value.to_string()))?;
    let dt = parse_internal_date(text)?;
    Ok(zone.naive_local(&dt))
}

/// Parses an RFC 2822 header date, tolerating a trailing zone comment.
pub(crate) fn parse_header_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc2822(text).ok().or_else(|| {
        let stripped = text.strip_suffix(')')?;
        let open = stripped.rfind('(')?;
        DateTime::parse_from_rfc2822(stripped[..open].trim_end()).ok()
    })
}
