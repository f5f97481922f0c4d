//! # Store Client
//!
//! Cloneable handle for sending requests to the store actor.

use tokio::sync::{mpsc, oneshot};
use tracing::instrument;

use super::error::{FrameworkError, StoreError};
use super::message::StoreRequest;
use crate::model::{Product, ProductCreate, ProductId, SaleOutcome, SaleRecord};

/// A type-safe client for interacting with the [`StoreActor`](super::StoreActor).
///
/// Holds only the channel sender, so cloning is cheap. Each method sends one request and
/// waits for its oneshot reply.
#[derive(Clone, Debug)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    #[instrument(skip(self))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<Product, StoreError> {
        self.request(|respond_to| StoreRequest::CreateProduct { params, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn update_product(&self, product: Product) -> Result<Product, StoreError> {
        self.request(|respond_to| StoreRequest::UpdateProduct {
            product,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::DeleteProduct { id, respond_to })
            .await
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.request(|respond_to| StoreRequest::ListProducts { respond_to })
            .await
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.request(|respond_to| StoreRequest::GetProduct { id, respond_to })
            .await
    }

    /// Attempts a sale as one atomic unit.
    ///
    /// Returns [`SaleOutcome::ProductMissing`] or [`SaleOutcome::InsufficientStock`] without
    /// side effects when the sale cannot happen.
    #[instrument(skip(self))]
    pub async fn process_sale(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleOutcome, StoreError> {
        self.request(|respond_to| StoreRequest::ProcessSale {
            product_id,
            quantity,
            respond_to,
        })
        .await
    }

    pub async fn list_sales(&self) -> Result<Vec<SaleRecord>, StoreError> {
        self.request(|respond_to| StoreRequest::ListSales { respond_to })
            .await
    }

    /// Clears every sale and product. Administrative only.
    #[instrument(skip(self))]
    pub async fn reset_all(&self) -> Result<(), StoreError> {
        self.request(|respond_to| StoreRequest::ResetAll { respond_to })
            .await
    }
}
