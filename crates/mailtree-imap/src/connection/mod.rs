//! Transport boundary and IDLE support.
//!
//! The core never opens sockets. It talks to the server through a
//! [`Transport`]: something that can send one command line and hand back one
//! complete response with its literals split out. [`FramedStream`] implements
//! it over any tokio stream; callers with their own connection layer can
//! implement it directly.

use std::future::Future;

use crate::Result;
use crate::parser::RawResponse;

mod framed;
mod idle;

pub use framed::FramedStream;
pub use idle::{IdleEvent, IdleEventKind, IdleOutcome, IdleSession, IdleState, classify_untagged};

/// A connection that exchanges command lines and complete responses.
///
/// `read_response` must be cancel-safe: the IDLE session bounds it with a
/// timeout and drops the pending future when the timeout elapses.
pub trait Transport {
    /// Sends one command line. The implementation appends CRLF.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send;

    /// Reads the next complete response.
    fn read_response(&mut self) -> impl Future<Output = Result<RawResponse>> + Send;
}
