//! Sans-I/O response parser.
//!
//! Parsing happens in two stages:
//!
//! - **Lexer + parser**: response text and its out-of-band literals become a
//!   flat sequence of generic [`Value`]s (integers, text, `NIL`, nested lists).
//! - **Decoders**: the FETCH decoder walks that sequence and builds per-message
//!   records, using the envelope and body-structure builders for the fields
//!   that need them.
//!
//! # Example
//!
//! ```
//! use mailtree_imap::config::{DecodeConfig, TargetZone};
//! use mailtree_imap::parser::{FetchDecoder, RawResponse};
//!
//! let raw = RawResponse::from_text("7 (UID 42 FLAGS (\\Seen))");
//! let decoder = FetchDecoder::new(DecodeConfig::builder().zone(TargetZone::utc()).build());
//! let table = decoder.decode_raw(&raw).unwrap();
//!
//! let record = &table[&42];
//! assert_eq!(record.seq(), 7);
//! assert!(record.flags().unwrap().is_seen());
//! ```

pub mod lexer;
mod raw;
pub mod response;
mod value;

pub use lexer::{Lexer, Token};
pub use raw::RawResponse;
pub use response::{
    Address, BodyPart, BodyStructure, EmbeddedMessage, Envelope, FetchDecoder, FetchRecord,
    FetchTable, FetchValue, Multipart, Params, ResponseParser, decode_fetch, parse_address_list,
    parse_body_structure, parse_envelope, parse_internal_date,
};
pub use value::Value;
