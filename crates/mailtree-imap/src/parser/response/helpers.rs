//! Positional accessors over parsed values.
//!
//! Servers omit optional trailing fields, so every lookup past the end of a
//! list reads as `NIL` instead of indexing out of bounds.

use crate::error::{ParseError, ParseResult};
use crate::parser::value::Value;

static NIL: Value = Value::Nil;

/// Returns the element at `index`, or `NIL` when the list is shorter.
pub fn field(items: &[Value], index: usize) -> &Value {
    items.get(index).unwrap_or(&NIL)
}

/// Reads an nstring: `NIL` or text. Numbers are accepted as their digits.
pub fn nstring(value: &Value, what: &str) -> ParseResult<Option<String>> {
    match value {
        Value::Nil => Ok(None),
        Value::Text(bytes) => Ok(Some(String::from_utf8_lossy(bytes).into_owned())),
        Value::Integer(n) => Ok(Some(n.to_string())),
        Value::List(_) => Err(ParseError::malformed(
            format!("expected {what}, got a list"),
            value.to_string(),
        )),
    }
}

/// Reads an optional number.
pub fn nnumber(value: &Value, what: &str) -> ParseResult<Option<u64>> {
    match value {
        Value::Nil => Ok(None),
        Value::Integer(n) => Ok(Some(*n)),
        _ => Err(ParseError::malformed(
            format!("expected {what} number"),
            value.to_string(),
        )),
    }
}

/// Reads a value that must be a list.
pub fn list<'a>(value: &'a Value, what: &str) -> ParseResult<&'a [Value]> {
    value.as_list().ok_or_else(|| {
        ParseError::malformed(format!("expected {what} list"), value.to_string())
    })
}

/// Reads a list that may be `NIL`.
pub fn nlist<'a>(value: &'a Value, what: &str) -> ParseResult<Option<&'a [Value]>> {
    match value {
        Value::Nil => Ok(None),
        _ => list(value, what).map(Some),
    }
}

/// Reads a field name as upper-case text.
pub fn field_name(value: &Value) -> ParseResult<String> {
    match value {
        Value::Text(bytes) => std::str::from_utf8(bytes)
            .map(str::to_ascii_uppercase)
            .map_err(|_| ParseError::malformed("field name is not UTF-8", value.to_string())),
        _ => Err(ParseError::malformed(
            "expected field name",
            value.to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::list;

    #[test]
    fn field_past_end_is_nil() {
        let items = [Value::Integer(1)];
        assert_eq!(field(&items, 0), &Value::Integer(1));
        assert!(field(&items, 5).is_nil());
    }

    #[test]
    fn nstring_shapes() {
        assert_eq!(nstring(&Value::Nil, "subject").unwrap(), None);
        assert_eq!(
            nstring(&Value::from("hi"), "subject").unwrap(),
            Some("hi".to_string())
        );
        assert_eq!(
            nstring(&Value::Integer(42), "subject").unwrap(),
            Some("42".to_string())
        );
        assert!(nstring(&list!["x"], "subject").is_err());
    }

    #[test]
    fn nnumber_rejects_text() {
        assert_eq!(nnumber(&Value::Integer(3), "size").unwrap(), Some(3));
        assert_eq!(nnumber(&Value::Nil, "size").unwrap(), None);
        assert!(nnumber(&Value::from("3k"), "size").is_err());
    }

    #[test]
    fn field_name_is_upper_cased() {
        assert_eq!(field_name(&Value::from("flaGS")).unwrap(), "FLAGS");
        assert_eq!(
            field_name(&Value::from("body[header.fields (from)]")).unwrap(),
            "BODY[HEADER.FIELDS (FROM)]"
        );
        assert!(field_name(&Value::Integer(1)).is_err());
    }
}
