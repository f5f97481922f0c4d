use std::io;
use thiserror::Error;

use crate::rpc::RemoteError;

/// Errors seen by an [`RpcClient`](super::RpcClient) caller.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("server closed the connection")]
    ConnectionClosed,

    #[error("response id {got} does not match request id {expected}")]
    UnexpectedResponse { expected: u64, got: u64 },

    /// The server answered the call with an error.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}
