//! # Store Messages
//!
//! Requests sent from a [`StoreClient`](super::StoreClient) to the store actor. Every variant
//! carries a oneshot sender for its reply.

use tokio::sync::oneshot;

use super::error::StoreError;
use crate::model::{Product, ProductCreate, ProductId, SaleOutcome, SaleRecord};

/// Type alias for the one-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// One unit of work for the store actor.
///
/// The actor handles requests strictly one at a time, so each variant is a single
/// consistency unit: no other request observes it half-applied.
#[derive(Debug)]
pub enum StoreRequest {
    CreateProduct {
        params: ProductCreate,
        respond_to: Response<Product>,
    },
    UpdateProduct {
        product: Product,
        respond_to: Response<Product>,
    },
    DeleteProduct {
        id: ProductId,
        respond_to: Response<()>,
    },
    ListProducts {
        respond_to: Response<Vec<Product>>,
    },
    GetProduct {
        id: ProductId,
        respond_to: Response<Option<Product>>,
    },
    ProcessSale {
        product_id: ProductId,
        quantity: i64,
        respond_to: Response<SaleOutcome>,
    },
    ListSales {
        respond_to: Response<Vec<SaleRecord>>,
    },
    ResetAll {
        respond_to: Response<()>,
    },
}
