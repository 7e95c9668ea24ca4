//! Client helpers for both channels, used by the `send` and `listen`
//! subcommands.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::domain::Notification;
use crate::ingest::IngestResponse;
use crate::{dlog_debug, Error, Result};

/// How long `send_request` waits for a reply.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Send one raw request line and wait for the reply.
pub async fn send_request(addr: &str, request: &str) -> Result<IngestResponse> {
    dlog_debug!("send_request addr={} bytes={}", addr, request.len());
    let stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.into_split();

    // The wire format is one request per line.
    let body = request.replace(['\n', '\r'], " ");
    writer.write_all(body.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    let mut lines = BufReader::new(reader).lines();
    let reply = timeout(REPLY_TIMEOUT, lines.next_line())
        .await
        .map_err(|_| Error::Timeout(REPLY_TIMEOUT))??
        .ok_or(Error::ConnectionClosed)?;

    Ok(serde_json::from_str(&reply)?)
}

/// A live connection to the publish channel.
pub struct Subscription {
    lines: Lines<BufReader<OwnedReadHalf>>,
    // Kept so the socket stays fully open while subscribed.
    _writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Subscription {
    pub async fn connect(addr: &str) -> Result<Self> {
        dlog_debug!("Subscription::connect addr={}", addr);
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            _writer: writer,
        })
    }

    /// Wait for the next notification.
    pub async fn next(&mut self) -> Result<Notification> {
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or(Error::ConnectionClosed)?;
        Ok(serde_json::from_str(&line)?)
    }
}
