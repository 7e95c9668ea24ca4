//! Publish side of the service: fan-out of reminder notifications to every
//! connected subscriber.
//!
//! Delivery is fire-and-forget. A subscriber that is not connected when a
//! reminder is published never sees it.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::actors::ActorHandle;
use crate::domain::Notification;
use crate::{dlog, dlog_debug, dlog_warn, Error, Result};

/// Default number of notifications buffered per slow subscriber.
pub const DEFAULT_CAPACITY: usize = 128;

/// Anything that can carry a notification to subscribers.
pub trait Publisher: Send + Sync + 'static {
    /// Hand `notification` to the channel and return how many subscribers
    /// it was queued for. No subscribers is an error.
    fn publish(&self, notification: &Notification) -> Result<usize>;
}

/// In-process fan-out of serialized notifications.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<Arc<str>>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Publisher for BroadcastPublisher {
    fn publish(&self, notification: &Notification) -> Result<usize> {
        let line: Arc<str> = serde_json::to_string(notification)?.into();
        self.tx
            .send(line)
            .map_err(|_| Error::Publish("no subscribers connected".to_string()))
    }
}

/// TCP listener that streams every published notification to each
/// connected socket as one JSON line.
pub struct PublishServer {
    addr: SocketAddr,
    handle: ActorHandle,
}

impl PublishServer {
    pub async fn bind(addr: &str, publisher: BroadcastPublisher) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        dlog!("Publish channel listening on {}", addr);

        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        dlog_debug!("PublishServer cancelled");
                        break;
                    }
                    accepted = listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            dlog_debug!("Subscriber connected: {}", peer);
                            let rx = publisher.subscribe();
                            tokio::spawn(forward(stream, peer, rx, cancel_clone.child_token()));
                        }
                        Err(e) => dlog_warn!("Publish accept failed: {}", e),
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

async fn forward(
    mut stream: TcpStream,
    peer: SocketAddr,
    mut rx: broadcast::Receiver<Arc<str>>,
    cancel: CancellationToken,
) {
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(line) => line,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    dlog_warn!("Subscriber {} lagged; {} notifications dropped", peer, n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        };

        let written = async {
            stream.write_all(line.as_bytes()).await?;
            stream.write_all(b"\n").await?;
            stream.flush().await
        };
        if let Err(e) = written.await {
            dlog_debug!("Subscriber {} gone: {}", peer, e);
            break;
        }
    }
}
