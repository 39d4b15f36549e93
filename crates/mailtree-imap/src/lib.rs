//! # mailtree-imap
//!
//! Client-side core of the IMAP4 protocol: turns the server's nested,
//! literal-laden response grammar into typed data, and runs the IDLE push
//! channel under a caller-controlled timeout.
//!
//! ## Features
//!
//! - **Sans-I/O parser**: response text plus out-of-band literal payloads
//!   become a tree of [`Value`]s (integers, text, `NIL`, nested lists)
//! - **FETCH decoding**: per-message records keyed by UID or sequence number,
//!   with INTERNALDATE normalized into a configurable zone
//! - **Structured builders**: ENVELOPE, address lists and BODYSTRUCTURE
//!   (multipart trees, `message/rfc822` parts, extension data)
//! - **IDLE**: `Idle → Listening → Draining → Idle` state machine over any
//!   [`Transport`], with cancel-safe timed waits
//!
//! ## Quick Start
//!
//! ```
//! use mailtree_imap::{DecodeConfig, FetchDecoder, RawResponse, TargetZone};
//!
//! let raw = RawResponse::from_chunks([
//!     ("* 7 FETCH (UID 42 FLAGS (\\Seen) BODY[HEADER.FIELDS (SUBJECT)] {16}", Some("Subject: hello\r\n")),
//!     (")", None),
//! ]);
//!
//! let config = DecodeConfig::builder().zone(TargetZone::utc()).build();
//! let table = FetchDecoder::new(config).decode_responses([&raw]).unwrap();
//!
//! let record = &table[&42];
//! assert_eq!(record.seq(), 7);
//! assert!(record.flags().unwrap().is_seen());
//! ```
//!
//! ## IDLE
//!
//! ```ignore
//! use std::time::Duration;
//! use mailtree_imap::{FramedStream, IdleSession};
//!
//! let mut stream = FramedStream::new(tcp_stream);
//! let mut idle = IdleSession::new(&mut stream);
//! idle.start("A001").await?;
//! for event in idle.wait(Duration::from_secs(600)).await? {
//!     println!("{event}");
//! }
//! let outcome = idle.done().await?;
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: lexer, parser, FETCH decoder and structured builders
//! - [`connection`]: transport boundary, framed stream and IDLE session
//! - [`config`]: decoder and framing configuration
//! - [`types`]: typed views over decoded fields

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use config::{DecodeConfig, DecodeConfigBuilder, FramingConfig, KeyMode, TargetZone};
pub use connection::{
    FramedStream, IdleEvent, IdleEventKind, IdleOutcome, IdleSession, IdleState, Transport,
    classify_untagged,
};
pub use error::{Error, ParseError, ParseResult, Result};
pub use parser::{
    Address, BodyStructure, Envelope, FetchDecoder, FetchRecord, FetchTable, FetchValue,
    RawResponse, ResponseParser, Value, decode_fetch,
};
pub use types::{Flag, Flags};
