//! Request side of the service: one JSON line in, one JSON line out.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::actors::ActorHandle;
use crate::ingest::{IngestHandler, IngestResponse};
use crate::{dlog, dlog_debug, dlog_trace, dlog_warn, Result};

/// TCP listener serving ingest requests.
///
/// Connections are served concurrently; requests on one connection are
/// answered in order.
pub struct RequestServer {
    addr: SocketAddr,
    handle: ActorHandle,
}

impl RequestServer {
    pub async fn bind(addr: &str, handler: Arc<IngestHandler>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        dlog!("Request channel listening on {}", addr);

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        dlog_debug!("RequestServer cancelled");
                        break;
                    }
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            dlog_debug!("Client connected: {}", peer);
                            tokio::spawn(serve_connection(
                                stream,
                                peer,
                                Arc::clone(&handler),
                                cancel_clone.child_token(),
                            ));
                        }
                        Err(e) => dlog_warn!("Request accept failed: {}", e),
                    }
                }
            }
        });

        Ok(Self {
            addr,
            handle: ActorHandle::new(cancel, task),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn stop(self) {
        self.handle.stop().await;
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<IngestHandler>,
    cancel: CancellationToken,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            next = lines.next_line() => match next {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    dlog_warn!("Read from {} failed: {}", peer, e);
                    break;
                }
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        dlog_trace!("Request from {}: {} bytes", peer, line.len());

        let response = handler.handle_raw(&line).await;
        if let Err(e) = write_response(&mut writer, &response).await {
            dlog_warn!("Reply to {} failed: {}", peer, e);
            break;
        }
    }

    dlog_debug!("Client disconnected: {}", peer);
}

async fn write_response<W>(writer: &mut W, response: &IngestResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(response)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
