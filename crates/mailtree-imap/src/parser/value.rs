//! Generic parse tree.

use std::fmt;

/// A parsed response value.
///
/// Responses are parsed into this tree first; the FETCH decoder and the
/// structured builders interpret its shape afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// `NIL`.
    Nil,
    /// An atom made only of decimal digits.
    Integer(u64),
    /// An atom, quoted string or literal payload.
    Text(Vec<u8>),
    /// A parenthesized list.
    List(Vec<Value>),
}

impl Value {
    /// Creates a text value.
    #[must_use]
    pub fn text(s: impl Into<Vec<u8>>) -> Self {
        Self::Text(s.into())
    }

    /// Returns true for `NIL`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the integer, if this is one.
    #[must_use]
    pub const fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the raw bytes of a text value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns a text value as `&str` if it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Returns the elements of a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.as_bytes().to_vec())
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

/// Renders the value close to its wire form, for diagnostics.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("NIL"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Self::List(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                f.write_str(")")
            }
        }
    }
}

/// Writes values separated by single spaces.
pub(crate) fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Builds a `Value::List` from a comma-separated list of convertible items.
///
/// ```
/// use mailtree_imap::{list, parser::Value};
///
/// let v = list![123u64, "foo", Value::Nil];
/// assert_eq!(v.to_string(), "(123 \"foo\" NIL)");
/// ```
#[macro_export]
macro_rules! list {
    ($($item:expr),* $(,)?) => {
        $crate::parser::Value::List(vec![$($crate::parser::Value::from($item)),*])
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_nested() {
        let v = list![123u64, "foo", list![list![0u64, 1u64], Value::Nil]];
        assert_eq!(v.to_string(), "(123 \"foo\" ((0 1) NIL))");
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert!(Value::Nil.as_str().is_none());
        assert!(Value::from(None::<u64>).is_nil());
        assert_eq!(list![].as_list().unwrap().len(), 0);
    }

    #[test]
    fn non_utf8_text_has_bytes_but_no_str() {
        let v = Value::Text(vec![0xff, 0xfe]);
        assert_eq!(v.as_bytes(), Some(&[0xff, 0xfe][..]));
        assert!(v.as_str().is_none());
    }
}
