//! # Mock Store
//!
//! Utilities for testing code that talks to the store without spawning the actor.
//!
//! Use [`create_mock_store`] to get a client and the receiver it sends to, then helpers like
//! [`expect_process_sale`] to assert on the request and answer it.

use tokio::sync::mpsc;

use super::client::StoreClient;
use super::message::{Response, StoreRequest};
use crate::model::{Product, ProductCreate, ProductId, SaleOutcome, SaleRecord};

/// Creates a store client and a receiver for asserting requests.
///
/// The test plays the actor: it receives each request from `receiver` and replies through
/// its oneshot sender, which makes failures and odd answers deterministic.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a CreateProduct request.
pub async fn expect_create_product(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(ProductCreate, Response<Product>)> {
    match receiver.recv().await {
        Some(StoreRequest::CreateProduct { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a DeleteProduct request.
pub async fn expect_delete_product(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(ProductId, Response<()>)> {
    match receiver.recv().await {
        Some(StoreRequest::DeleteProduct { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a ProcessSale request.
pub async fn expect_process_sale(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(ProductId, i64, Response<SaleOutcome>)> {
    match receiver.recv().await {
        Some(StoreRequest::ProcessSale {
            product_id,
            quantity,
            respond_to,
        }) => Some((product_id, quantity, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a ListSales request.
pub async fn expect_list_sales(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<Response<Vec<SaleRecord>>> {
    match receiver.recv().await {
        Some(StoreRequest::ListSales { respond_to }) => Some(respond_to),
        _ => None,
    }
}
