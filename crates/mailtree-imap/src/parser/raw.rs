//! Response text with its literal payloads held out-of-band.

/// One complete server response, as delivered by the transport.
///
/// The text keeps its `{N}` literal markers in place; the payloads those
/// markers announce are stored separately, in the order the markers appear.
/// Lines pushed one after another are joined with CRLF, which the lexer
/// treats as whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    text: Vec<u8>,
    literals: Vec<Vec<u8>>,
}

impl RawResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a response from text and its ordered literal payloads.
    #[must_use]
    pub fn from_parts(text: impl Into<Vec<u8>>, literals: Vec<Vec<u8>>) -> Self {
        Self {
            text: text.into(),
            literals,
        }
    }

    /// Creates a response without literals.
    #[must_use]
    pub fn from_text(text: impl Into<Vec<u8>>) -> Self {
        Self::from_parts(text, Vec::new())
    }

    /// Builds a response from line chunks, each optionally followed by the
    /// literal its trailing `{N}` marker announced.
    ///
    /// ```
    /// use mailtree_imap::parser::RawResponse;
    ///
    /// let raw = RawResponse::from_chunks([
    ///     ("1 (RFC822 {4}", Some("body")),
    ///     (")", None),
    /// ]);
    /// assert_eq!(raw.text(), b"1 (RFC822 {4})");
    /// assert_eq!(raw.literals(), [b"body".to_vec()]);
    /// ```
    #[must_use]
    pub fn from_chunks<I, T, L>(chunks: I) -> Self
    where
        I: IntoIterator<Item = (T, Option<L>)>,
        T: AsRef<[u8]>,
        L: AsRef<[u8]>,
    {
        let mut raw = Self::new();
        for (text, literal) in chunks {
            raw.text.extend_from_slice(text.as_ref());
            if let Some(literal) = literal {
                raw.literals.push(literal.as_ref().to_vec());
            }
        }
        raw
    }

    /// Appends a line, separated from previous text by CRLF.
    pub fn push_line(&mut self, line: impl AsRef<[u8]>) {
        if !self.text.is_empty() {
            self.text.extend_from_slice(b"\r\n");
        }
        self.text.extend_from_slice(line.as_ref());
    }

    /// Appends text directly after the current text.
    pub fn push_text(&mut self, text: impl AsRef<[u8]>) {
        self.text.extend_from_slice(text.as_ref());
    }

    /// Appends the payload of the next literal marker.
    pub fn push_literal(&mut self, payload: impl Into<Vec<u8>>) {
        self.literals.push(payload.into());
    }

    /// Returns the response text.
    #[must_use]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Returns the literal payloads in marker order.
    #[must_use]
    pub fn literals(&self) -> &[Vec<u8>] {
        &self.literals
    }

    /// Returns true if the text starts with the given tag followed by a space.
    #[must_use]
    pub fn is_tagged(&self, tag: &str) -> bool {
        self.text
            .strip_prefix(tag.as_bytes())
            .is_some_and(|rest| rest.first() == Some(&b' '))
    }

    /// Returns true for a `+` continuation request.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.text.first() == Some(&b'+')
    }

    /// Returns true for an untagged (`*`) response.
    #[must_use]
    pub fn is_untagged(&self) -> bool {
        self.text.first() == Some(&b'*')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_line_joins_with_crlf() {
        let mut raw = RawResponse::new();
        raw.push_line("2 (FLAGS (Foo))");
        raw.push_line("7 (FLAGS (Baz))");
        assert_eq!(raw.text(), b"2 (FLAGS (Foo))\r\n7 (FLAGS (Baz))");
    }

    #[test]
    fn chunks_collect_literals_in_order() {
        let raw = RawResponse::from_chunks([
            ("1 (RFC822.TEXT {4}", Some("body")),
            (" RFC822 {2}", Some("hi")),
            (")", None),
        ]);
        assert_eq!(raw.text(), b"1 (RFC822.TEXT {4} RFC822 {2})");
        assert_eq!(raw.literals(), [b"body".to_vec(), b"hi".to_vec()]);
    }

    #[test]
    fn classifies_line_prefix() {
        assert!(RawResponse::from_text("A001 OK done").is_tagged("A001"));
        assert!(!RawResponse::from_text("A0011 OK done").is_tagged("A001"));
        assert!(RawResponse::from_text("+ idling").is_continuation());
        assert!(RawResponse::from_text("* 1 EXISTS").is_untagged());
    }
}
