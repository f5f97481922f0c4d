//! Error types for the notifier.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Why an observer channel was closed. Contained inside the notifier: logged, never returned
/// to a broadcaster.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The observer closed its connection.
    #[error("observer disconnected")]
    Disconnected,

    /// The channel was deregistered, so no more events will be queued for it.
    #[error("observer channel closed")]
    Closed,

    /// The observer fell a full queue behind.
    #[error("observer lagging, outgoing queue full")]
    Lagging,

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write timed out after {0:?}")]
    Timeout(Duration),
}

/// Fatal failures of the observer listener.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to bind notification listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("notification listener failed to accept: {0}")]
    Accept(#[source] io::Error),
}
