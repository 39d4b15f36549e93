//! IMAP IDLE support (RFC 2177).
//!
//! An [`IdleSession`] moves through three states:
//!
//! ```text
//! Idle --start()--> Listening --done()--> Draining --tagged OK--> Idle
//!                     |    ^
//!                     +----+ wait(): events or timeout
//! ```
//!
//! A timed-out wait leaves the IDLE command outstanding; only `done()` ends
//! it. Events collected across waits accumulate until `done()` hands them
//! back together with the server's acknowledgement text.

#![allow(clippy::missing_errors_doc)]

use std::fmt;
use std::time::Duration;

use tokio::time::timeout;

use super::Transport;
use crate::error::ParseResult;
use crate::parser::{RawResponse, ResponseParser, Value};
use crate::{Error, Result};

/// Kind of an unsolicited `* <n> <KEYWORD>` response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdleEventKind {
    /// New message count.
    Exists,
    /// A message was expunged.
    Expunge,
    /// Message data (usually flags) changed.
    Fetch,
    /// Recent count changed.
    Recent,
    /// Any other keyword, upper-cased.
    Other(String),
}

impl IdleEventKind {
    /// Classifies a keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "EXISTS" => Self::Exists,
            "EXPUNGE" => Self::Expunge,
            "FETCH" => Self::Fetch,
            "RECENT" => Self::Recent,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the upper-case keyword.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exists => "EXISTS",
            Self::Expunge => "EXPUNGE",
            Self::Fetch => "FETCH",
            Self::Recent => "RECENT",
            Self::Other(keyword) => keyword,
        }
    }
}

impl fmt::Display for IdleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unsolicited mailbox change: a message number or count and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdleEvent {
    /// Message number or count.
    pub number: u64,
    /// What happened.
    pub kind: IdleEventKind,
}

impl IdleEvent {
    /// Creates an event.
    #[must_use]
    pub const fn new(number: u64, kind: IdleEventKind) -> Self {
        Self { number, kind }
    }
}

impl fmt::Display for IdleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.kind)
    }
}

/// Classifies an untagged `* <n> <KEYWORD> ...` response.
///
/// Returns `None` for untagged responses without a leading number (`* OK`,
/// `* BYE`, `* FLAGS`, ...) and for anything that is not untagged. The same
/// shape serves NOOP and EXPUNGE replies outside IDLE.
///
/// ```
/// use mailtree_imap::connection::{IdleEventKind, classify_untagged};
/// use mailtree_imap::parser::RawResponse;
///
/// let event = classify_untagged(&RawResponse::from_text("* 4 EXISTS")).unwrap().unwrap();
/// assert_eq!((event.number, event.kind), (4, IdleEventKind::Exists));
/// ```
pub fn classify_untagged(response: &RawResponse) -> ParseResult<Option<IdleEvent>> {
    if !response.is_untagged() {
        return Ok(None);
    }

    let values = ResponseParser::parse(response)?;
    let event = match values.as_slice() {
        [_, Value::Integer(number), keyword, ..] => keyword
            .as_str()
            .map(|keyword| IdleEvent::new(*number, IdleEventKind::from_keyword(keyword))),
        _ => None,
    };
    Ok(event)
}

/// State of an [`IdleSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleState {
    /// No IDLE command outstanding.
    #[default]
    Idle,
    /// IDLE accepted by the server; waiting for pushed responses.
    Listening,
    /// DONE sent; waiting for the tagged acknowledgement.
    Draining,
}

/// Result of a completed IDLE cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleOutcome {
    /// Text of the tagged acknowledgement, after the status word.
    pub text: String,
    /// Every event collected during the cycle, in arrival order.
    pub events: Vec<IdleEvent>,
}

/// Status of a tagged completion line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    No,
    Bad,
}

/// What one response means to the session.
enum Line {
    Event(IdleEvent),
    Continuation,
    Completion(Status, String),
    Bye(String),
    Ignored,
}

/// IDLE state machine over a [`Transport`].
///
/// The session borrows the transport for its whole lifetime, so no other
/// command can be interleaved with an outstanding IDLE.
pub struct IdleSession<'a, T> {
    transport: &'a mut T,
    state: IdleState,
    tag: Option<String>,
    events: Vec<IdleEvent>,
    completion: Option<String>,
}

impl<'a, T> IdleSession<'a, T>
where
    T: Transport,
{
    /// Creates a session in the `Idle` state.
    pub const fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            state: IdleState::Idle,
            tag: None,
            events: Vec::new(),
            completion: None,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> IdleState {
        self.state
    }

    /// Returns the events collected since `start`.
    #[must_use]
    pub fn events(&self) -> &[IdleEvent] {
        &self.events
    }

    /// Sends `<tag> IDLE` and waits for the server's continuation.
    ///
    /// Untagged responses arriving before the continuation are collected as
    /// events. A tagged NO or BAD is returned as [`Error::No`] or
    /// [`Error::Bad`] and leaves the session `Idle`.
    ///
    /// RFC 2177 asks clients to re-issue IDLE at least every 29 minutes.
    pub async fn start(&mut self, tag: &str) -> Result<()> {
        if self.state != IdleState::Idle {
            return Err(Error::InvalidState(format!(
                "cannot start IDLE while {:?}",
                self.state
            )));
        }

        self.transport.send_line(&format!("{tag} IDLE")).await?;
        self.tag = Some(tag.to_string());
        self.events.clear();
        self.completion = None;

        loop {
            let response = self.transport.read_response().await?;
            match self.interpret(&response)? {
                Line::Continuation => break,
                Line::Event(event) => self.record(event),
                Line::Completion(Status::No, text) => return self.fail(Error::No(text)),
                Line::Completion(Status::Bad, text) => return self.fail(Error::Bad(text)),
                Line::Completion(Status::Ok, _) => {
                    return self.fail(Error::Protocol(
                        "IDLE completed before continuation".to_string(),
                    ));
                }
                Line::Bye(text) => return self.fail(Error::Bye(text)),
                Line::Ignored => {}
            }
        }

        self.state = IdleState::Listening;
        tracing::debug!(tag, "IDLE listening");
        Ok(())
    }

    /// Waits up to `duration` for pushed responses.
    ///
    /// Returns the events received by this call: the first response to arrive
    /// plus any that are already available after it. An elapsed timeout is
    /// not an error; it returns no events and the session keeps `Listening`.
    /// The events are also appended to [`events`](Self::events).
    ///
    /// A read failure is returned as is and leaves the state unchanged;
    /// whether to retry or drop the connection is the caller's decision.
    pub async fn wait(&mut self, duration: Duration) -> Result<Vec<IdleEvent>> {
        if self.state != IdleState::Listening {
            return Err(Error::InvalidState(format!(
                "cannot wait for IDLE events while {:?}",
                self.state
            )));
        }
        if self.completion.is_some() {
            return Ok(Vec::new());
        }

        let first = match timeout(duration, self.transport.read_response()).await {
            Ok(response) => response?,
            Err(_) => {
                tracing::debug!(?duration, "IDLE wait timed out");
                return Ok(Vec::new());
            }
        };

        let start = self.events.len();
        let mut next = Some(first);
        while let Some(response) = next.take() {
            if self.absorb(&response)? {
                break;
            }
            if let Ok(response) = timeout(Duration::ZERO, self.transport.read_response()).await {
                next = Some(response?);
            }
        }

        Ok(self.events[start..].to_vec())
    }

    /// Ends IDLE: sends DONE and reads up to the tagged acknowledgement.
    ///
    /// Returns the acknowledgement text and every event collected during the
    /// cycle, then clears them. If the server already completed the IDLE
    /// during a wait, no DONE is sent.
    pub async fn done(&mut self) -> Result<IdleOutcome> {
        if self.state != IdleState::Listening {
            return Err(Error::InvalidState(format!(
                "cannot end IDLE while {:?}",
                self.state
            )));
        }

        let text = if let Some(text) = self.completion.take() {
            text
        } else {
            if let Err(err) = self.transport.send_line("DONE").await {
                return self.fail(err);
            }
            self.state = IdleState::Draining;
            tracing::debug!("IDLE draining");
            self.drain().await?
        };

        self.state = IdleState::Idle;
        self.tag = None;
        tracing::debug!(events = self.events.len(), "IDLE finished");

        Ok(IdleOutcome {
            text,
            events: std::mem::take(&mut self.events),
        })
    }

    /// Reads until the tagged acknowledgement of DONE.
    ///
    /// Any failure here ends the cycle: the session goes back to `Idle` and
    /// the events collected so far stay readable through `events()`.
    async fn drain(&mut self) -> Result<String> {
        loop {
            let line = match self.transport.read_response().await {
                Ok(response) => self.interpret(&response),
                Err(err) => Err(err),
            };
            let line = match line {
                Ok(line) => line,
                Err(err) => return self.fail(err),
            };
            match line {
                Line::Completion(Status::Ok, text) => return Ok(text),
                Line::Completion(Status::No, text) => return self.fail(Error::No(text)),
                Line::Completion(Status::Bad, text) => return self.fail(Error::Bad(text)),
                Line::Bye(text) => return self.fail(Error::Bye(text)),
                Line::Event(event) => self.record(event),
                Line::Continuation | Line::Ignored => {}
            }
        }
    }

    /// Handles one response read while listening. Returns true once the
    /// server has completed the IDLE.
    fn absorb(&mut self, response: &RawResponse) -> Result<bool> {
        match self.interpret(response)? {
            Line::Event(event) => self.record(event),
            Line::Completion(Status::Ok, text) => {
                tracing::debug!(text = %text, "IDLE completed by server");
                self.completion = Some(text);
                return Ok(true);
            }
            Line::Completion(Status::No, text) => return self.fail(Error::No(text)),
            Line::Completion(Status::Bad, text) => return self.fail(Error::Bad(text)),
            Line::Bye(text) => return self.fail(Error::Bye(text)),
            Line::Continuation | Line::Ignored => {}
        }
        Ok(false)
    }

    fn record(&mut self, event: IdleEvent) {
        tracing::debug!(number = event.number, kind = %event.kind, "IDLE event");
        self.events.push(event);
    }

    /// Drops the outstanding IDLE and returns `err`.
    fn fail<R>(&mut self, err: Error) -> Result<R> {
        tracing::debug!(error = %err, state = ?self.state, "IDLE aborted");
        self.state = IdleState::Idle;
        self.tag = None;
        self.completion = None;
        Err(err)
    }

    fn interpret(&self, response: &RawResponse) -> Result<Line> {
        if response.is_continuation() {
            return Ok(Line::Continuation);
        }

        if response.is_untagged() {
            if let Some(event) = classify_untagged(response)? {
                return Ok(Line::Event(event));
            }
            let (keyword, text) = split_status(response.text(), 1);
            if keyword.eq_ignore_ascii_case("BYE") {
                return Ok(Line::Bye(text));
            }
            tracing::debug!(
                line = %String::from_utf8_lossy(response.text()),
                "ignoring untagged response during IDLE"
            );
            return Ok(Line::Ignored);
        }

        let tag = self.tag.as_deref().unwrap_or_default();
        if !tag.is_empty() && response.is_tagged(tag) {
            let (status, text) = split_status(response.text(), tag.len());
            let status = match status.to_ascii_uppercase().as_str() {
                "OK" => Status::Ok,
                "NO" => Status::No,
                "BAD" => Status::Bad,
                other => {
                    return Err(Error::Protocol(format!(
                        "unexpected completion status {other:?}"
                    )));
                }
            };
            return Ok(Line::Completion(status, text));
        }

        Err(Error::Protocol(format!(
            "unexpected response during IDLE: {}",
            String::from_utf8_lossy(response.text())
        )))
    }
}

/// Splits `<prefix> <STATUS> <text>` into status word and text.
fn split_status(line: &[u8], prefix_len: usize) -> (String, String) {
    let rest = String::from_utf8_lossy(line.get(prefix_len..).unwrap_or_default());
    let rest = rest.trim_start();
    match rest.split_once(' ') {
        Some((status, text)) => (status.to_string(), text.to_string()),
        None => (rest.to_string(), String::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io;

    use tokio_test::io::Builder;

    use super::*;
    use crate::connection::FramedStream;

    fn event(number: u64, kind: IdleEventKind) -> IdleEvent {
        IdleEvent::new(number, kind)
    }

    #[test]
    fn classify_numeric_untagged() {
        let classify = |line: &str| classify_untagged(&RawResponse::from_text(line)).unwrap();

        assert_eq!(classify("* 1 EXISTS"), Some(event(1, IdleEventKind::Exists)));
        assert_eq!(classify("* 3 expunge"), Some(event(3, IdleEventKind::Expunge)));
        assert_eq!(
            classify("* 2 FETCH (FLAGS (\\Seen))"),
            Some(event(2, IdleEventKind::Fetch))
        );
        assert_eq!(
            classify("* 5 Flimflam"),
            Some(event(5, IdleEventKind::Other("FLIMFLAM".to_string())))
        );
        assert_eq!(classify("* OK Still here"), None);
        assert_eq!(classify("A001 OK done"), None);
        assert_eq!(classify("+ idling"), None);
    }

    #[test]
    fn classify_fetch_with_literal() {
        let raw = RawResponse::from_parts("* 4 FETCH (BODY[] {2})", vec![b"hi".to_vec()]);
        assert_eq!(
            classify_untagged(&raw).unwrap(),
            Some(event(4, IdleEventKind::Fetch))
        );
    }

    #[test]
    fn event_display() {
        assert_eq!(event(1, IdleEventKind::Exists).to_string(), "1 EXISTS");
        assert_eq!(IdleEventKind::from_keyword("recent"), IdleEventKind::Recent);
    }

    #[test]
    fn status_split() {
        assert_eq!(
            split_status(b"A001 OK Idle terminated", 4),
            ("OK".to_string(), "Idle terminated".to_string())
        );
        assert_eq!(split_status(b"* BYE", 1), ("BYE".to_string(), String::new()));
    }

    #[tokio::test]
    async fn full_cycle() {
        let mock = Builder::new()
            .write(b"A001 IDLE\r\n")
            .read(b"+ idling\r\n")
            .read(b"* 1 EXISTS\r\n")
            .read(b"* 1 EXPUNGE\r\n")
            .write(b"DONE\r\n")
            .read(b"A001 OK Idle terminated\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A001").await.unwrap();
        assert_eq!(session.state(), IdleState::Listening);

        let events = session.wait(Duration::from_secs(30)).await.unwrap();
        assert_eq!(
            events,
            vec![
                event(1, IdleEventKind::Exists),
                event(1, IdleEventKind::Expunge)
            ]
        );

        let outcome = session.done().await.unwrap();
        assert_eq!(outcome.text, "Idle terminated");
        assert_eq!(outcome.events, events);
        assert_eq!(session.state(), IdleState::Idle);
        assert!(session.events().is_empty());
    }

    #[tokio::test]
    async fn untagged_before_continuation_is_an_event() {
        let mock = Builder::new()
            .write(b"A002 IDLE\r\n")
            .read(b"* 2 RECENT\r\n")
            .read(b"+ idling\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A002").await.unwrap();
        assert_eq!(session.events(), [event(2, IdleEventKind::Recent)]);
    }

    #[tokio::test]
    async fn rejected_idle() {
        let mock = Builder::new()
            .write(b"A003 IDLE\r\n")
            .read(b"A003 NO not now\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        let err = session.start("A003").await.unwrap_err();
        assert!(matches!(err, Error::No(ref text) if text == "not now"));
        assert!(!err.is_connection_fatal());
        assert_eq!(session.state(), IdleState::Idle);
    }

    #[tokio::test]
    async fn done_read_failure_resets_session() {
        let mock = Builder::new()
            .write(b"A008 IDLE\r\n")
            .read(b"+ idling\r\n")
            .read(b"* 4 EXISTS\r\n")
            .write(b"DONE\r\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .write(b"A009 IDLE\r\n")
            .read(b"+ idling\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A008").await.unwrap();
        let events = session.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(events, vec![event(4, IdleEventKind::Exists)]);

        let err = session.done().await.unwrap_err();
        assert!(err.is_connection_fatal());
        assert_eq!(session.state(), IdleState::Idle);
        assert_eq!(session.events(), &[event(4, IdleEventKind::Exists)]);

        let err = session.done().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        session.start("A009").await.unwrap();
        assert_eq!(session.state(), IdleState::Listening);
        assert!(session.events().is_empty());
    }

    #[tokio::test]
    async fn done_drains_late_events() {
        let mock = Builder::new()
            .write(b"A004 IDLE\r\n")
            .read(b"+ idling\r\n")
            .write(b"DONE\r\n")
            .read(b"* 9 EXISTS\r\n")
            .read(b"A004 OK done\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A004").await.unwrap();
        let outcome = session.done().await.unwrap();
        assert_eq!(outcome.events, vec![event(9, IdleEventKind::Exists)]);
        assert_eq!(outcome.text, "done");
    }

    #[tokio::test]
    async fn server_completion_skips_done() {
        let mock = Builder::new()
            .write(b"A005 IDLE\r\n")
            .read(b"+ idling\r\n")
            .read(b"* 3 EXISTS\r\n")
            .read(b"A005 OK IDLE timed out\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A005").await.unwrap();
        let events = session.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(events, vec![event(3, IdleEventKind::Exists)]);
        assert!(session.wait(Duration::from_secs(5)).await.unwrap().is_empty());

        let outcome = session.done().await.unwrap();
        assert_eq!(outcome.text, "IDLE timed out");
        assert_eq!(outcome.events, events);
    }

    #[tokio::test]
    async fn bye_during_idle() {
        let mock = Builder::new()
            .write(b"A006 IDLE\r\n")
            .read(b"+ idling\r\n")
            .read(b"* BYE shutting down\r\n")
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A006").await.unwrap();
        let err = session.wait(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, Error::Bye(ref text) if text == "shutting down"));
        assert!(err.is_connection_fatal());
        assert_eq!(session.state(), IdleState::Idle);
    }

    #[tokio::test]
    async fn status_lines_are_skipped() {
        let mock = Builder::new()
            .write(b"A007 IDLE\r\n")
            .read(b"+ idling\r\n")
            .read(b"* OK Still here\r\n")
            .read(b"* 4 EXISTS\r\n")
            .wait(Duration::from_secs(60))
            .build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        session.start("A007").await.unwrap();
        let events = session.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(events, vec![event(4, IdleEventKind::Exists)]);
    }

    #[tokio::test]
    async fn wrong_state_is_rejected() {
        let mock = Builder::new().build();
        let mut stream = FramedStream::new(mock);
        let mut session = IdleSession::new(&mut stream);

        let err = session.wait(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        let err = session.done().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }
}
