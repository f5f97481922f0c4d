//! # RPC Server
//!
//! Publishes [`InventoryService`] and the credential store over line-delimited JSON. One task
//! per connection; requests on a connection are answered in the order they arrive.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::error::ServerError;
use super::protocol::{salvage_id, Call, RemoteError, RpcRequest, RpcResponse};
use crate::credentials::CredentialStore;
use crate::framing::{Frame, LineReader, MAX_LINE_LEN};
use crate::service::InventoryService;

/// Everything a connection needs to answer calls.
#[derive(Clone)]
struct Handler {
    service: InventoryService,
    credentials: Arc<dyn CredentialStore>,
}

pub struct RpcServer {
    listener: TcpListener,
    handler: Handler,
}

impl RpcServer {
    pub async fn bind(
        addr: &str,
        service: InventoryService,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            handler: Handler {
                service,
                credentials,
            },
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections until `shutdown` flips to `true`. Open connections are closed on
    /// the way out.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ServerError> {
        let addr = self.local_addr().ok();
        info!(?addr, "RPC server started");

        let mut connections = JoinSet::new();
        let result = loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break Ok(());
                    }
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let span = info_span!("rpc", %peer);
                        connections.spawn(serve_connection(stream, self.handler.clone()).instrument(span));
                    }
                    Err(e) if is_transient(&e) => {
                        warn!(error = %e, "RPC connection aborted before accept");
                    }
                    Err(e) => {
                        error!(error = %e, "RPC server failed");
                        break Err(ServerError::Accept(e));
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        };

        connections.shutdown().await;
        info!("RPC server stopped");
        result
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset | io::ErrorKind::Interrupted
    )
}

async fn serve_connection(stream: TcpStream, handler: Handler) {
    debug!("Connection opened");
    let (read_half, mut write_half) = stream.into_split();
    let mut input = LineReader::new(read_half);

    loop {
        let frame = match input.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Read failed");
                break;
            }
        };
        let Some(response) = handler.answer(frame).await else {
            continue;
        };
        let mut reply = match serde_json::to_string(&response) {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, id = response.id, "Failed to encode response");
                break;
            }
        };
        reply.push('\n');
        if let Err(e) = write_half.write_all(reply.as_bytes()).await {
            debug!(error = %e, "Write failed");
            break;
        }
    }
    debug!("Connection closed");
}

impl Handler {
    /// Reply for one frame. Blank lines get none.
    async fn answer(&self, frame: Frame) -> Option<RpcResponse> {
        let bytes = match frame {
            Frame::Line(bytes) => bytes,
            Frame::Oversized => {
                warn!(limit = MAX_LINE_LEN, "Oversized request");
                return Some(RpcResponse::new(
                    0,
                    Err(RemoteError::bad_request(format!(
                        "request exceeds {MAX_LINE_LEN} bytes"
                    ))),
                ));
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match String::from_utf8(bytes) {
            Ok(line) => Some(self.respond(&line).await),
            Err(e) => {
                let id = salvage_id(&String::from_utf8_lossy(e.as_bytes()));
                warn!(id, "Request is not UTF-8");
                Some(RpcResponse::new(
                    id,
                    Err(RemoteError::bad_request("request is not valid UTF-8")),
                ))
            }
        }
    }

    async fn respond(&self, line: &str) -> RpcResponse {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(RpcRequest { id, call }) => {
                debug!(id, op = call.op(), "Call");
                let result = self.dispatch(call).await;
                if let Err(e) = &result {
                    debug!(id, kind = ?e.kind, "Call failed");
                }
                RpcResponse::new(id, result)
            }
            Err(e) => {
                let id = salvage_id(line);
                warn!(id, error = %e, "Malformed request");
                RpcResponse::new(id, Err(RemoteError::bad_request(format!("invalid request: {e}"))))
            }
        }
    }

    async fn dispatch(&self, call: Call) -> Result<Value, RemoteError> {
        let service = &self.service;
        let credentials = &self.credentials;
        match call {
            Call::AddProduct(params) => encode(service.add_product(params).await),
            Call::UpdateProduct { product } => encode(service.update_product(product).await),
            Call::DeleteProduct { product_id } => encode(service.delete_product(product_id).await),
            Call::ListProducts => encode(service.list_products().await),
            Call::GetProduct { product_id } => encode(service.get_product(product_id).await),
            Call::Sell {
                product_id,
                quantity,
            } => encode(service.sell(product_id, quantity).await),
            Call::SellDetailed {
                product_id,
                quantity,
            } => encode(service.sell_detailed(product_id, quantity).await),
            Call::SalesReport => encode(service.sales_report().await),
            Call::VerifyCredentials { username, secret } => {
                encode(credentials.verify_credentials(&username, &secret).await)
            }
            Call::UsernameTaken { username } => encode(credentials.username_taken(&username).await),
            Call::EmailTaken { email } => encode(credentials.email_taken(&email).await),
            Call::Register { user } => encode(credentials.register(user).await),
        }
    }
}

fn encode<T, E>(result: Result<T, E>) -> Result<Value, RemoteError>
where
    T: Serialize,
    E: Into<RemoteError>,
{
    let value = match result {
        Ok(value) => value,
        Err(e) => return Err(e.into()),
    };
    serde_json::to_value(value).map_err(|e| RemoteError::internal(e.to_string()))
}
