//! Remote-side handles: [`RpcClient`] for calls and [`NotificationSubscriber`] for events.

pub mod error;
pub mod rpc_client;
pub mod subscriber;

pub use error::RpcError;
pub use rpc_client::RpcClient;
pub use subscriber::NotificationSubscriber;
