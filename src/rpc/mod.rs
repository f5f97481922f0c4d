//! # RPC
//!
//! Remote invocation of the inventory and credential operations: line-delimited JSON over TCP.
//! See [`protocol`] for the wire format and [`RpcServer`] for the listener.
//! The typed caller side lives in [`crate::clients::RpcClient`].

pub mod error;
pub mod protocol;
pub mod server;

pub use error::ServerError;
pub use protocol::{Call, RemoteError, RpcRequest, RpcResponse};
pub use server::RpcServer;
