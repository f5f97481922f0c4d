use std::io;
use thiserror::Error;

/// Fatal failures of the RPC listener.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind RPC listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("RPC listener failed to accept: {0}")]
    Accept(#[source] io::Error),
}
