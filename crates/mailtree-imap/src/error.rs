//! Error types for the IMAP library.

use thiserror::Error;

/// Errors raised while turning response text into values and records.
///
/// Every kind is detected at the point of failure. Nothing past a malformed
/// response is ever guessed at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unexpected token or unmatched parenthesis.
    #[error("malformed response: {message} (at {token})")]
    MalformedGrammar {
        /// Description of what went wrong.
        message: String,
        /// The offending token or partial structure.
        token: String,
    },

    /// A `{N}` marker without a payload, or with a payload of another length.
    #[error("literal mismatch: {message}")]
    LiteralMismatch {
        /// Description of the mismatch.
        message: String,
    },

    /// A message number (or UID) that is not an integer.
    #[error("invalid message ID: {0}")]
    InvalidMessageId(String),

    /// A FETCH field list with an odd number of elements.
    #[error("uneven number of response items: {0}")]
    UnevenFieldList(String),

    /// Input ended in the middle of a structure.
    #[error("unexpected end of response: {0}")]
    UnexpectedEnd(String),

    /// INTERNALDATE text that does not match `dd-Mon-yyyy HH:MM:SS +zzzz`.
    #[error("couldn't parse date: {0}")]
    DateParseFailure(String),
}

impl ParseError {
    pub(crate) fn malformed(message: impl Into<String>, token: impl Into<String>) -> Self {
        Self::MalformedGrammar {
            message: message.into(),
            token: token.into(),
        }
    }

    pub(crate) fn literal(message: impl Into<String>) -> Self {
        Self::LiteralMismatch {
            message: message.into(),
        }
    }
}

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Response could not be parsed or decoded.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// I/O error on the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Operation issued in the wrong session state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true if the connection can no longer be used.
    ///
    /// Parse failures, NO/BAD replies and state errors only end the current
    /// command; transport failures, BYE and protocol desyncs end the
    /// connection.
    #[must_use]
    pub const fn is_connection_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Bye(_) | Self::Protocol(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for the pure parsing layer.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_only_end_the_command() {
        let err = Error::from(ParseError::UnevenFieldList("(FOO 1 BAR)".to_string()));
        assert!(!err.is_connection_fatal());
        assert!(!Error::No("nope".to_string()).is_connection_fatal());
        assert!(!Error::InvalidState("not idling".to_string()).is_connection_fatal());
    }

    #[test]
    fn transport_errors_end_the_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed");
        assert!(Error::from(io).is_connection_fatal());
        assert!(Error::Bye("shutting down".to_string()).is_connection_fatal());
    }

    #[test]
    fn parse_error_display_is_transparent() {
        let err = Error::from(ParseError::InvalidMessageId("\"abc\"".to_string()));
        assert_eq!(err.to_string(), "invalid message ID: \"abc\"");
    }
}
