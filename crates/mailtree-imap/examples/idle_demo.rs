#![allow(clippy::doc_markdown, clippy::uninlined_format_args)]
//! Example: decode a FETCH batch and run one IDLE cycle
//!
//! A scripted in-process server stands in for a real IMAP server, so the
//! example runs without network access.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=mailtree_imap=debug cargo run --package mailtree-imap --example idle_demo
//! ```

use std::time::Duration;

use mailtree_imap::{
    DecodeConfig, FetchDecoder, FramedStream, IdleSession, RawResponse, TargetZone, Transport,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tracing_subscriber::EnvFilter;

/// Plays the server side: answers FETCH, then pushes two updates during IDLE.
async fn scripted_server(stream: DuplexStream) -> std::io::Result<()> {
    let (read, mut write) = tokio::io::split(stream);
    let mut lines = BufReader::new(read).lines();

    while let Some(line) = lines.next_line().await? {
        if line.ends_with("IDLE") {
            write.write_all(b"+ idling\r\n").await?;
            tokio::time::sleep(Duration::from_millis(50)).await;
            write.write_all(b"* 3 EXISTS\r\n* 1 EXPUNGE\r\n").await?;
        } else if line == "DONE" {
            write.write_all(b"A002 OK IDLE terminated\r\n").await?;
            break;
        } else {
            write
                .write_all(
                    b"* 1 FETCH (UID 7 FLAGS (\\Seen) INTERNALDATE \" 9-Feb-2007 17:08:08 +0100\" \
                      BODY[HEADER.FIELDS (SUBJECT)] {16}\r\nSubject: hello\r\n)\r\n\
                      * 2 FETCH (UID 9 FLAGS ())\r\n\
                      A001 OK FETCH completed\r\n",
                )
                .await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (client, server) = tokio::io::duplex(4096);
    let server = tokio::spawn(scripted_server(server));
    let mut stream = FramedStream::new(client);

    // FETCH
    stream
        .send_line("A001 FETCH 1:2 (UID FLAGS INTERNALDATE BODY.PEEK[HEADER.FIELDS (SUBJECT)])")
        .await?;
    let mut responses: Vec<RawResponse> = Vec::new();
    loop {
        let response = stream.read_response().await?;
        if response.is_tagged("A001") {
            break;
        }
        responses.push(response);
    }

    let decoder = FetchDecoder::new(DecodeConfig::builder().zone(TargetZone::utc()).build());
    let table = decoder.decode_responses(&responses)?;
    for (uid, record) in &table {
        println!("UID {uid} (seq {})", record.seq());
        for (name, value) in record.iter() {
            println!("  {name}: {value:?}");
        }
    }

    // IDLE
    let mut idle = IdleSession::new(&mut stream);
    idle.start("A002").await?;
    let events = idle.wait(Duration::from_secs(5)).await?;
    println!("\nReceived {} event(s) during IDLE:", events.len());
    for event in &events {
        println!("  {event}");
    }
    let outcome = idle.done().await?;
    println!("IDLE finished: {}", outcome.text);

    server.await??;
    Ok(())
}
