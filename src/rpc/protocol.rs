//! Wire types of the RPC protocol: one JSON object per line in each direction.
//!
//! A request carries the call's parameters flattened next to `id` and `op`:
//!
//! ```json
//! {"id":7,"op":"sell","product_id":3,"quantity":2}
//! ```
//!
//! and is answered by a line carrying the same `id` and either `ok` or `error`:
//!
//! ```json
//! {"id":7,"ok":true}
//! {"id":8,"error":{"kind":"not_found","message":"Error updating product: Product not found: 9"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::credentials::CredentialError;
use crate::model::{NewUser, Product, ProductCreate, ProductId};
use crate::service::{ErrorKind, ServiceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: u64,
    #[serde(flatten)]
    pub call: Call,
}

/// Every remotely callable operation.
///
/// Product ids travel as `product_id` because `id` is taken by the request id.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    AddProduct(ProductCreate),
    UpdateProduct { product: Product },
    DeleteProduct { product_id: ProductId },
    ListProducts,
    GetProduct { product_id: ProductId },
    Sell { product_id: ProductId, quantity: i64 },
    SellDetailed { product_id: ProductId, quantity: i64 },
    SalesReport,
    VerifyCredentials { username: String, secret: String },
    UsernameTaken { username: String },
    EmailTaken { email: String },
    Register { user: NewUser },
}

impl Call {
    /// The `op` tag, for logs.
    pub fn op(&self) -> &'static str {
        match self {
            Call::AddProduct(_) => "add_product",
            Call::UpdateProduct { .. } => "update_product",
            Call::DeleteProduct { .. } => "delete_product",
            Call::ListProducts => "list_products",
            Call::GetProduct { .. } => "get_product",
            Call::Sell { .. } => "sell",
            Call::SellDetailed { .. } => "sell_detailed",
            Call::SalesReport => "sales_report",
            Call::VerifyCredentials { .. } => "verify_credentials",
            Call::UsernameTaken { .. } => "username_taken",
            Call::EmailTaken { .. } => "email_taken",
            Call::Register { .. } => "register",
        }
    }
}

// Secrets must not reach the logs, so only the op is shown.
impl std::fmt::Debug for Call {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Call").field(&self.op()).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

impl RpcResponse {
    pub fn new(id: u64, result: Result<Value, RemoteError>) -> Self {
        match result {
            Ok(value) => Self {
                id,
                ok: Some(value),
                error: None,
            },
            Err(error) => Self {
                id,
                ok: None,
                error: Some(error),
            },
        }
    }
}

/// A failure reported by the server for one request.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl From<ServiceError> for RemoteError {
    fn from(e: ServiceError) -> Self {
        Self::new(e.kind(), e.to_string())
    }
}

impl From<CredentialError> for RemoteError {
    fn from(e: CredentialError) -> Self {
        Self::new(ErrorKind::StorageUnavailable, e.to_string())
    }
}

/// Best-effort request id of a line that failed to parse as a request. `0` when none.
pub fn salvage_id(line: &str) -> u64 {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|value| value.get("id").and_then(Value::as_u64))
        .unwrap_or(0)
}
