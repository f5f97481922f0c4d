//! # Notification Listener
//!
//! Accepts observer connections and runs one task per observer. Each task drains the
//! observer's event queue onto the socket, one event per line, and watches the read half so a
//! closed connection is noticed even when no events are flowing.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::error::{ChannelError, NotifierError};
use super::registry::{Notifier, ObserverId};
use crate::framing::{Frame, LineReader};

/// The observer-facing TCP endpoint.
pub struct NotificationListener {
    listener: TcpListener,
    notifier: Notifier,
    write_timeout: Duration,
}

impl NotificationListener {
    pub async fn bind(
        addr: &str,
        notifier: Notifier,
        write_timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NotifierError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            notifier,
            write_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts observers until `shutdown` flips to `true`, then closes every observer
    /// connection.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), NotifierError> {
        let addr = self.local_addr().ok();
        info!(?addr, "Notification listener started");

        let mut observers = JoinSet::new();
        let result = loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break Ok(());
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let (id, queue) = self.notifier.register(peer);
                        info!(observer = %id, %peer, "Observer connected");
                        observers.spawn(serve_observer(
                            id,
                            stream,
                            queue,
                            self.notifier.clone(),
                            self.write_timeout,
                        ));
                    }
                    Err(e) if is_transient(&e) => {
                        warn!(error = %e, "Observer connection aborted before accept");
                    }
                    Err(e) => {
                        error!(error = %e, "Notification listener failed");
                        break Err(NotifierError::Accept(e));
                    }
                },
                Some(_) = observers.join_next(), if !observers.is_empty() => {}
            }
        };

        observers.shutdown().await;
        info!("Notification listener stopped");
        result
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset | io::ErrorKind::Interrupted
    )
}

async fn serve_observer(
    id: ObserverId,
    stream: TcpStream,
    mut queue: mpsc::Receiver<Arc<str>>,
    notifier: Notifier,
    write_timeout: Duration,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut input = LineReader::new(read_half);

    let reason = loop {
        tokio::select! {
            event = queue.recv() => {
                let Some(event) = event else {
                    break ChannelError::Closed;
                };
                if let Err(e) = write_event(&mut write_half, &event, write_timeout).await {
                    break e;
                }
            }
            frame = input.next_frame() => match frame {
                Ok(Some(Frame::Line(line))) => {
                    debug!(observer = %id, line = %String::from_utf8_lossy(&line), "Ignoring observer input");
                }
                Ok(Some(Frame::Oversized)) => debug!(observer = %id, "Ignoring oversized observer input"),
                Ok(None) => break ChannelError::Disconnected,
                Err(e) => break ChannelError::Read(e),
            },
        }
    };

    notifier.deregister(id);
    info!(observer = %id, reason = %reason, "Observer disconnected");
}

async fn write_event(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    event: &str,
    write_timeout: Duration,
) -> Result<(), ChannelError> {
    let write = async {
        writer.write_all(event.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    };
    match tokio::time::timeout(write_timeout, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ChannelError::Write(e)),
        Err(_) => Err(ChannelError::Timeout(write_timeout)),
    }
}
