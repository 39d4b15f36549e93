//! Framed I/O for IMAP responses.
//!
//! IMAP responses are CRLF-terminated lines that may announce literals with a
//! trailing `{n}` marker, followed by exactly `n` raw bytes. The framed stream
//! splits those payloads out of the byte stream so the parser receives the
//! marker text and the literal bytes separately.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::config::FramingConfig;
use crate::parser::RawResponse;
use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Framed connection for IMAP responses.
///
/// Bytes read from the stream stay in an internal buffer until a complete
/// response (every announced literal included) is available, so dropping a
/// pending [`read_response`](Self::read_response) future loses nothing.
pub struct FramedStream<S> {
    stream: S,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    config: FramingConfig,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a framed stream with the default limits.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, FramingConfig::default())
    }

    /// Creates a framed stream with the given limits.
    pub fn with_config(stream: S, config: FramingConfig) -> Self {
        Self {
            stream,
            read_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            config,
        }
    }

    /// Reads one complete response, literals included.
    ///
    /// Cancel-safe: if the future is dropped before it completes, the bytes
    /// received so far remain buffered for the next call.
    pub async fn read_response(&mut self) -> Result<RawResponse> {
        loop {
            if let Some(response) = self.decode_buffered()? {
                return Ok(response);
            }

            if self.read_buffer.capacity() == self.read_buffer.len() {
                self.read_buffer.reserve(DEFAULT_BUFFER_SIZE);
            }
            let n = self.stream.read_buf(&mut self.read_buffer).await?;
            if n == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
        }
    }

    /// Splits one complete response off the front of the read buffer.
    ///
    /// Returns `None`, consuming nothing, while the response is incomplete.
    fn decode_buffered(&mut self) -> Result<Option<RawResponse>> {
        let mut response = RawResponse::new();
        let mut pos = 0;

        loop {
            let pending = &self.read_buffer[pos..];
            let Some(end) = find_crlf(pending) else {
                if pending.len() > self.config.max_line_length {
                    return Err(Error::Protocol("line too long".to_string()));
                }
                return Ok(None);
            };
            if end > self.config.max_line_length {
                return Err(Error::Protocol("line too long".to_string()));
            }

            let line = &pending[..end];
            response.push_text(line);
            let literal = parse_literal_length(line);
            pos += end + 2;

            let Some(len) = literal else {
                self.read_buffer.advance(pos);
                return Ok(Some(response));
            };

            if len > self.config.max_literal_size {
                return Err(Error::Protocol(format!(
                    "literal too large: {len} bytes (max {})",
                    self.config.max_literal_size
                )));
            }
            if self.read_buffer.len() - pos < len {
                return Ok(None);
            }
            response.push_literal(&self.read_buffer[pos..pos + len]);
            pos += len;
        }
    }

    /// Writes one command line, appending CRLF.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(line.as_bytes());
        self.write_buffer.extend_from_slice(b"\r\n");

        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// Returns the framing limits.
    pub const fn config(&self) -> &FramingConfig {
        &self.config
    }

    /// Gets a reference to the underlying stream.
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Buffered but unread bytes are lost.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_line(&mut self, line: &str) -> Result<()> {
        tracing::trace!(line, "C:");
        self.write_line(line).await
    }

    async fn read_response(&mut self) -> Result<RawResponse> {
        let response = Self::read_response(self).await?;
        tracing::trace!(line = %String::from_utf8_lossy(response.text()), "S:");
        Ok(response)
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal length from the end of a line (CRLF already removed).
///
/// Matches `{123}` and the non-synchronizing `{123+}`.
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let inner = line.strip_suffix(b"}")?;
    let inner = inner.strip_suffix(b"+").unwrap_or(inner);
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use tokio_test::io::Builder;

    use super::*;

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"hello\r\n"), Some(5));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"no newline"), None);
        assert_eq!(find_crlf(b"just\n"), None);
    }

    #[test]
    fn test_parse_literal_length() {
        assert_eq!(parse_literal_length(b"BODY {123}"), Some(123));
        assert_eq!(parse_literal_length(b"BODY {123+}"), Some(123));
        assert_eq!(parse_literal_length(b"{0}"), Some(0));
        assert_eq!(parse_literal_length(b"no literal"), None);
        assert_eq!(parse_literal_length(b"incomplete {123"), None);
        assert_eq!(parse_literal_length(b"wrong {abc}"), None);
        assert_eq!(parse_literal_length(b"empty {}"), None);
    }

    #[tokio::test]
    async fn test_read_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(response.text(), b"* OK ready");
        assert!(response.literals().is_empty());
    }

    #[tokio::test]
    async fn test_read_with_literal() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {7}\r\n")
            .read(b"hel\r\nlo)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(response.text(), b"* 1 FETCH (BODY[] {7})");
        assert_eq!(response.literals(), [b"hel\r\nlo".to_vec()]);
    }

    #[tokio::test]
    async fn test_read_two_responses_from_one_chunk() {
        let mock = Builder::new().read(b"* 1 EXISTS\r\n* 1 RECENT\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_response().await.unwrap().text(), b"* 1 EXISTS");
        assert_eq!(framed.read_response().await.unwrap().text(), b"* 1 RECENT");
    }

    #[tokio::test]
    async fn test_write_line() {
        let mock = Builder::new().write(b"A001 IDLE\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_line("A001 IDLE").await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_is_io_error() {
        let mock = Builder::new().read(b"* 1 EXI").build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_connection_fatal());
    }

    #[tokio::test]
    async fn test_literal_size_validation() {
        let config = FramingConfig::default().max_literal_size(16);
        let mock = Builder::new().read(b"* 1 FETCH (BODY {17}\r\n").build();
        let mut framed = FramedStream::with_config(mock, config);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let config = FramingConfig::default().max_line_length(64);
        let long_line = "A".repeat(100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::with_config(mock, config);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("line too long"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_read_keeps_partial_line() {
        let mock = Builder::new()
            .read(b"* 3 EXI")
            .wait(Duration::from_secs(10))
            .read(b"STS\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let first = tokio::time::timeout(Duration::from_secs(1), framed.read_response()).await;
        assert!(first.is_err());

        let response = framed.read_response().await.unwrap();
        assert_eq!(response.text(), b"* 3 EXISTS");
    }
}
