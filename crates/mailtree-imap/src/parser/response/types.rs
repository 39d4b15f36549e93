//! Structured FETCH data types.

use chrono::{DateTime, FixedOffset};

use crate::parser::value::Value;

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header, if present and parseable.
    pub date: Option<DateTime<FixedOffset>>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Option<Vec<Address>>,
    /// Sender addresses.
    pub sender: Option<Vec<Address>>,
    /// Reply-To addresses.
    pub reply_to: Option<Vec<Address>>,
    /// To addresses.
    pub to: Option<Vec<Address>>,
    /// Cc addresses.
    pub cc: Option<Vec<Address>>,
    /// Bcc addresses.
    pub bcc: Option<Vec<Address>>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete).
    pub route: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// Body parameter list, `None` when the server sent `NIL`.
pub type Params = Option<Vec<(String, String)>>;

/// Body structure of a message or of one MIME part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// Single MIME part.
    Single(BodyPart),
    /// Multipart node.
    Multipart(Multipart),
}

impl BodyStructure {
    /// Returns true for a multipart node.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    /// Returns the media type, `multipart` for multipart nodes.
    #[must_use]
    pub fn media_type(&self) -> &str {
        match self {
            Self::Single(part) => &part.media_type,
            Self::Multipart(_) => "multipart",
        }
    }

    /// Returns the media subtype.
    #[must_use]
    pub fn media_subtype(&self) -> &str {
        match self {
            Self::Single(part) => &part.media_subtype,
            Self::Multipart(multi) => &multi.subtype,
        }
    }

    /// Returns the child parts of a multipart node, empty for a single part.
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match self {
            Self::Single(_) => &[],
            Self::Multipart(multi) => &multi.parts,
        }
    }
}

/// A single (non-multipart) body part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyPart {
    /// MIME type, as sent.
    pub media_type: String,
    /// MIME subtype, as sent.
    pub media_subtype: String,
    /// Body parameters.
    pub params: Params,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding.
    pub encoding: Option<String>,
    /// Body size in octets.
    pub size: Option<u64>,
    /// Size in lines, for `text/*` and `message/rfc822` parts.
    pub lines: Option<u64>,
    /// Embedded message of a `message/rfc822` part.
    pub message: Option<Box<EmbeddedMessage>>,
    /// Extension data (MD5, disposition, language, location), verbatim.
    pub extension: Vec<Value>,
}

impl BodyPart {
    /// Returns true for `text/*` parts.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.media_type.eq_ignore_ascii_case("text")
    }

    /// Looks up a parameter by name, ignoring case.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        find_param(self.params.as_deref(), name)
    }
}

/// Envelope and structure of a message embedded in a `message/rfc822` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedMessage {
    /// Envelope of the nested message.
    pub envelope: Envelope,
    /// Body structure of the nested message.
    pub body: BodyStructure,
}

/// A multipart body node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    /// Child parts in the order reported.
    pub parts: Vec<BodyStructure>,
    /// Multipart subtype, as sent.
    pub subtype: String,
    /// Body parameters.
    pub params: Params,
    /// Extension data (disposition, language, location), verbatim.
    pub extension: Vec<Value>,
}

impl Multipart {
    /// Looks up a parameter by name, ignoring case.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        find_param(self.params.as_deref(), name)
    }
}

fn find_param<'a>(params: Option<&'a [(String, String)]>, name: &str) -> Option<&'a str> {
    params?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod address_tests {
        use super::*;

        #[test]
        fn email_with_both_parts() {
            let addr = Address {
                name: Some("Bob Smith".to_string()),
                route: None,
                mailbox: Some("bob".to_string()),
                host: Some("smith.com".to_string()),
            };
            assert_eq!(addr.email(), Some("bob@smith.com".to_string()));
        }

        #[test]
        fn email_without_host() {
            let addr = Address {
                mailbox: Some("undisclosed-recipients".to_string()),
                ..Address::default()
            };
            assert_eq!(addr.email(), None);
        }
    }

    mod body_structure_tests {
        use super::*;

        fn text_part(subtype: &str) -> BodyPart {
            BodyPart {
                media_type: "text".to_string(),
                media_subtype: subtype.to_string(),
                params: Some(vec![("CHARSET".to_string(), "us-ascii".to_string())]),
                encoding: Some("7bit".to_string()),
                size: Some(26),
                lines: Some(1),
                ..BodyPart::default()
            }
        }

        #[test]
        fn param_lookup_ignores_case() {
            let part = text_part("plain");
            assert!(part.is_text());
            assert_eq!(part.param("charset"), Some("us-ascii"));
            assert_eq!(part.param("name"), None);
        }

        #[test]
        fn nil_params_have_no_lookup() {
            let part = BodyPart {
                params: None,
                ..text_part("plain")
            };
            assert_eq!(part.param("charset"), None);
        }

        #[test]
        fn multipart_accessors() {
            let body = BodyStructure::Multipart(Multipart {
                parts: vec![
                    BodyStructure::Single(text_part("html")),
                    BodyStructure::Single(text_part("plain")),
                ],
                subtype: "mixed".to_string(),
                params: Some(vec![("boundary".to_string(), "==x==".to_string())]),
                extension: Vec::new(),
            });
            assert!(body.is_multipart());
            assert_eq!(body.media_type(), "multipart");
            assert_eq!(body.media_subtype(), "mixed");
            assert_eq!(body.parts().len(), 2);
            assert_eq!(body.parts()[1].media_subtype(), "plain");
        }

        #[test]
        fn single_part_has_no_children() {
            let body = BodyStructure::Single(text_part("plain"));
            assert!(!body.is_multipart());
            assert!(body.parts().is_empty());
        }
    }
}
