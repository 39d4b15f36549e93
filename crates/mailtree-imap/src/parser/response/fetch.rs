//! FETCH response decoding.
//!
//! A FETCH batch parses to alternating `(message number, field list)` values.
//! The decoder walks those pairs and builds one [`FetchRecord`] per message.
//! Most fields are stored verbatim; a small table names the fields that get
//! special handling.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDateTime;

use crate::config::{DecodeConfig, KeyMode};
use crate::error::{ParseError, ParseResult};
use crate::parser::raw::RawResponse;
use crate::parser::value::Value;
use crate::types::{Flag, Flags};

use super::ResponseParser;
use super::date::normalize_internal_date;
use super::helpers::field_name;
use super::structure::{parse_body_structure, parse_envelope};
use super::types::{BodyStructure, Envelope};

/// Decoded FETCH records, keyed by UID or sequence number.
pub type FetchTable = BTreeMap<u64, FetchRecord>;

/// A decoded FETCH field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchValue {
    /// Value stored as parsed.
    Value(Value),
    /// INTERNALDATE normalized to the configured zone.
    DateTime(NaiveDateTime),
    /// ENVELOPE.
    Envelope(Box<Envelope>),
    /// BODY or BODYSTRUCTURE.
    BodyStructure(Box<BodyStructure>),
}

impl FetchValue {
    /// Returns the parsed value of a verbatim field.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// How a field is turned into a record entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldHandler {
    Verbatim,
    Uid,
    InternalDate,
    Envelope,
    BodyStructure,
}

/// Fields with special handling. Everything else is stored verbatim.
const FIELD_HANDLERS: &[(&str, FieldHandler)] = &[
    ("UID", FieldHandler::Uid),
    ("INTERNALDATE", FieldHandler::InternalDate),
    ("ENVELOPE", FieldHandler::Envelope),
    ("BODY", FieldHandler::BodyStructure),
    ("BODYSTRUCTURE", FieldHandler::BodyStructure),
];

fn handler_for(name: &str) -> FieldHandler {
    FIELD_HANDLERS
        .iter()
        .find(|(field, _)| *field == name)
        .map_or(FieldHandler::Verbatim, |(_, handler)| *handler)
}

/// Decoded fields of one message.
///
/// Field names are upper-case. A `SEQ` entry with the sequence number is
/// always present, whether the table is keyed by UID or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    seq: u64,
    fields: BTreeMap<String, FetchValue>,
}

impl FetchRecord {
    fn new(seq: u64) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("SEQ".to_string(), FetchValue::Value(Value::Integer(seq)));
        Self { seq, fields }
    }

    /// Returns the message sequence number.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the UID, if it was fetched.
    #[must_use]
    pub fn uid(&self) -> Option<u64> {
        self.value("UID").and_then(Value::as_integer)
    }

    /// Looks up a field by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FetchValue> {
        self.fields.get(&name.to_ascii_uppercase())
    }

    /// Looks up a verbatim field by name, ignoring case.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(FetchValue::as_value)
    }

    /// Returns the FLAGS field as typed flags.
    #[must_use]
    pub fn flags(&self) -> Option<Flags> {
        let items = self.value("FLAGS")?.as_list()?;
        Some(items.iter().filter_map(Value::as_str).map(Flag::parse).collect())
    }

    /// Returns the normalized INTERNALDATE.
    #[must_use]
    pub fn internal_date(&self) -> Option<NaiveDateTime> {
        match self.get("INTERNALDATE")? {
            FetchValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Returns the ENVELOPE.
    #[must_use]
    pub fn envelope(&self) -> Option<&Envelope> {
        match self.get("ENVELOPE")? {
            FetchValue::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }

    /// Returns the BODYSTRUCTURE, falling back to BODY.
    #[must_use]
    pub fn body_structure(&self) -> Option<&BodyStructure> {
        ["BODYSTRUCTURE", "BODY"]
            .into_iter()
            .find_map(|name| match self.fields.get(name)? {
                FetchValue::BodyStructure(body) => Some(body.as_ref()),
                _ => None,
            })
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over field names and values, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FetchValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of fields, `SEQ` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: `SEQ` is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Folds a later record for the same key into this one.
    ///
    /// Fields of the same message are merged, later values winning. A record
    /// for a different message replaces this one whole, so `seq`, `SEQ` and
    /// `UID` always describe a single message.
    fn merge(&mut self, other: Self) {
        if self.seq == other.seq {
            self.fields.extend(other.fields);
        } else {
            tracing::debug!(
                previous = self.seq,
                seq = other.seq,
                "FETCH key reused by another message, replacing record"
            );
            *self = other;
        }
    }
}

/// Decodes FETCH batches into [`FetchTable`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchDecoder {
    config: DecodeConfig,
}

impl FetchDecoder {
    /// Creates a decoder with the given configuration.
    #[must_use]
    pub const fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// Returns the decoder configuration.
    #[must_use]
    pub const fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decodes alternating `(message number, field list)` values.
    pub fn decode(&self, values: Vec<Value>) -> ParseResult<FetchTable> {
        let mut table = FetchTable::new();
        let mut values = values.into_iter();

        while let Some(id) = values.next() {
            let seq = id
                .as_integer()
                .ok_or_else(|| ParseError::InvalidMessageId(id.to_string()))?;

            let Some(fields) = values.next() else {
                return Err(ParseError::UnexpectedEnd(format!(
                    "no field list for message {seq}"
                )));
            };

            let (key, record) = self.decode_message(seq, fields)?;
            tracing::trace!(seq, key, fields = record.len(), "decoded FETCH record");

            match table.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => slot.get_mut().merge(record),
            }
        }

        Ok(table)
    }

    /// Parses and decodes one batch in `n (fields...)` form.
    pub fn decode_raw(&self, raw: &RawResponse) -> ParseResult<FetchTable> {
        self.decode(ResponseParser::parse(raw)?)
    }

    /// Decodes whole server responses.
    ///
    /// Lines of the form `* n FETCH (...)` are unwrapped to their message
    /// number and field list; other untagged lines are skipped. Lines without
    /// the `*` prefix are taken to be in `n (fields...)` form already.
    pub fn decode_responses<'a, I>(&self, responses: I) -> ParseResult<FetchTable>
    where
        I: IntoIterator<Item = &'a RawResponse>,
    {
        let mut pairs = Vec::new();

        for raw in responses {
            let values = ResponseParser::parse(raw)?;
            if raw.is_untagged() {
                if let Some(pair) = unwrap_untagged_fetch(values)? {
                    pairs.extend(pair);
                }
            } else {
                pairs.extend(values);
            }
        }

        self.decode(pairs)
    }

    fn decode_message(&self, seq: u64, fields: Value) -> ParseResult<(u64, FetchRecord)> {
        let Value::List(items) = fields else {
            return Err(ParseError::malformed("bad response type", fields.to_string()));
        };
        if items.len() % 2 != 0 {
            return Err(ParseError::UnevenFieldList(Value::List(items).to_string()));
        }

        let mut key = seq;
        let mut record = FetchRecord::new(seq);

        let mut items = items.into_iter();
        while let (Some(name), Some(value)) = (items.next(), items.next()) {
            let name = field_name(&name)?;

            let decoded = match handler_for(&name) {
                FieldHandler::Verbatim => FetchValue::Value(value),
                FieldHandler::Uid => {
                    let uid = value.as_integer().ok_or_else(|| {
                        ParseError::InvalidMessageId(format!("invalid UID: {value}"))
                    })?;
                    if self.config.key_mode == KeyMode::Uid {
                        key = uid;
                    }
                    FetchValue::Value(value)
                }
                FieldHandler::InternalDate => {
                    FetchValue::DateTime(normalize_internal_date(&value, self.config.zone)?)
                }
                FieldHandler::Envelope => FetchValue::Envelope(Box::new(parse_envelope(&value)?)),
                FieldHandler::BodyStructure => {
                    FetchValue::BodyStructure(Box::new(parse_body_structure(&value)?))
                }
            };

            record.fields.insert(name, decoded);
        }

        Ok((key, record))
    }
}

/// Strips `* n FETCH` framing, returning `None` for other untagged lines.
fn unwrap_untagged_fetch(values: Vec<Value>) -> ParseResult<Option<[Value; 2]>> {
    let is_fetch = values
        .get(2)
        .and_then(Value::as_str)
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("FETCH"));

    if !is_fetch {
        tracing::trace!(line = %DisplayValues(&values), "skipping non-FETCH untagged response");
        return Ok(None);
    }

    let rendered = DisplayValues(&values).to_string();
    let mut values = values.into_iter().skip(1);
    match (values.next(), values.next(), values.next(), values.next()) {
        (Some(id), Some(_), Some(fields), None) => Ok(Some([id, fields])),
        _ => Err(ParseError::malformed("malformed FETCH response", rendered)),
    }
}

struct DisplayValues<'a>(&'a [Value]);

impl std::fmt::Display for DisplayValues<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::parser::value::write_joined(f, self.0)
    }
}

/// Decodes alternating `(message number, field list)` values.
pub fn decode_fetch(values: Vec<Value>, config: &DecodeConfig) -> ParseResult<FetchTable> {
    FetchDecoder::new(*config).decode(values)
}
