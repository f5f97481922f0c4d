use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::error::RpcError;
use crate::model::{NewUser, Product, ProductCreate, ProductId, SaleOutcome, SaleRecord, User};
use crate::rpc::{Call, RpcRequest, RpcResponse};

struct Connection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// Reads until the response to `id`. Responses with lower ids belong to calls whose caller
    /// stopped waiting, and are dropped.
    async fn read_response(&mut self, id: u64) -> Result<RpcResponse, RpcError> {
        loop {
            let reply = self
                .lines
                .next_line()
                .await?
                .ok_or(RpcError::ConnectionClosed)?;
            let response: RpcResponse = serde_json::from_str(&reply)?;
            if response.id == id {
                return Ok(response);
            }
            if response.id > id {
                return Err(RpcError::UnexpectedResponse {
                    expected: id,
                    got: response.id,
                });
            }
            debug!(expected = id, got = response.id, "Discarding stale response");
        }
    }
}

/// Typed client for the RPC server.
///
/// Calls from concurrent tasks share the connection and take turns: each call holds the
/// connection from writing its request until its response is read. A call dropped while
/// waiting leaves its response on the wire; the next call skips it.
pub struct RpcClient {
    connection: Mutex<Connection>,
    next_id: AtomicU64,
}

impl RpcClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, RpcError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            connection: Mutex::new(Connection {
                lines: BufReader::new(read_half).lines(),
                writer,
            }),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, call: Call) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, op = call.op(), "Sending request");
        let mut line = serde_json::to_string(&RpcRequest { id, call })?;
        line.push('\n');

        let response = {
            let mut connection = self.connection.lock().await;
            connection.writer.write_all(line.as_bytes()).await?;
            connection.read_response(id).await?
        };

        if let Some(error) = response.error {
            return Err(error.into());
        }
        Ok(serde_json::from_value(response.ok.unwrap_or(Value::Null))?)
    }

    #[instrument(skip(self))]
    pub async fn add_product(&self, params: ProductCreate) -> Result<Product, RpcError> {
        self.call(Call::AddProduct(params)).await
    }

    #[instrument(skip(self))]
    pub async fn update_product(&self, product: Product) -> Result<Product, RpcError> {
        self.call(Call::UpdateProduct { product }).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), RpcError> {
        self.call(Call::DeleteProduct { product_id }).await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, RpcError> {
        self.call(Call::ListProducts).await
    }

    pub async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, RpcError> {
        self.call(Call::GetProduct { product_id }).await
    }

    #[instrument(skip(self))]
    pub async fn sell(&self, product_id: ProductId, quantity: i64) -> Result<bool, RpcError> {
        self.call(Call::Sell {
            product_id,
            quantity,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn sell_detailed(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleOutcome, RpcError> {
        self.call(Call::SellDetailed {
            product_id,
            quantity,
        })
        .await
    }

    pub async fn sales_report(&self) -> Result<Vec<SaleRecord>, RpcError> {
        self.call(Call::SalesReport).await
    }

    #[instrument(skip(self, secret))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        secret: &str,
    ) -> Result<Option<User>, RpcError> {
        self.call(Call::VerifyCredentials {
            username: username.to_string(),
            secret: secret.to_string(),
        })
        .await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, RpcError> {
        self.call(Call::UsernameTaken {
            username: username.to_string(),
        })
        .await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, RpcError> {
        self.call(Call::EmailTaken {
            email: email.to_string(),
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn register(&self, user: NewUser) -> Result<bool, RpcError> {
        self.call(Call::Register { user }).await
    }
}
