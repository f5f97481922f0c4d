//! # Store Actor
//!
//! The single writer over product and sale state. It owns the repository and the receiver end
//! of the request channel, and processes requests sequentially, which makes every request one
//! consistency unit without locks: two sales against the last unit of stock are simply handled
//! one after the other.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::client::StoreClient;
use super::error::StoreError;
use super::message::StoreRequest;
use super::repository::Repository;
use crate::model::{validate_update, Product, ProductCreate, ProductId, SaleOutcome};

/// The actor that serializes all access to the inventory repository.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `StoreActor::new()` to get the `actor` (server) and `client` (interface).
/// 2.  **Run**: Spawn `actor.run()` in a background task.
/// 3.  **Use**: Clone the client freely; dropping every clone stops the actor.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    repository: Box<dyn Repository>,
}

impl StoreActor {
    /// Creates a new `StoreActor` and its associated `StoreClient`.
    ///
    /// `buffer_size` is the capacity of the request channel. When it is full, client calls
    /// wait for space.
    pub fn new(buffer_size: usize, repository: impl Repository) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let actor = Self {
            receiver,
            repository: Box::new(repository),
        };
        (actor, StoreClient::new(sender))
    }

    /// Runs the actor's event loop, processing requests until every client is dropped.
    pub async fn run(mut self) {
        let backend = self.repository.backend();
        info!(backend, "Store actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::CreateProduct { params, respond_to } => {
                    debug!(?params, "Create");
                    let result = self.create_product(params).await;
                    match &result {
                        Ok(product) => info!(product_id = %product.id, name = %product.name, "Created"),
                        Err(e) => warn!(error = %e, "Create failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::UpdateProduct { product, respond_to } => {
                    debug!(?product, "Update");
                    let id = product.id;
                    let result = self.update_product(product).await;
                    match &result {
                        Ok(_) => info!(product_id = %id, "Updated"),
                        Err(e) => warn!(product_id = %id, error = %e, "Update failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::DeleteProduct { id, respond_to } => {
                    debug!(product_id = %id, "Delete");
                    let result = self.repository.remove_product(id).await;
                    if let Err(e) = &result {
                        warn!(product_id = %id, error = %e, "Delete failed");
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::ListProducts { respond_to } => {
                    let result = self.repository.products().await;
                    debug!(ok = result.is_ok(), "List products");
                    let _ = respond_to.send(result);
                }
                StoreRequest::GetProduct { id, respond_to } => {
                    let result = self.repository.product(id).await;
                    let found = matches!(result, Ok(Some(_)));
                    debug!(product_id = %id, found, "Get");
                    let _ = respond_to.send(result);
                }
                StoreRequest::ProcessSale {
                    product_id,
                    quantity,
                    respond_to,
                } => {
                    debug!(%product_id, quantity, "Sale");
                    let result = self.process_sale(product_id, quantity).await;
                    match &result {
                        Ok(SaleOutcome::Sold { record, remaining }) => {
                            info!(%product_id, quantity, sale_id = %record.id, remaining, "Sold")
                        }
                        Ok(SaleOutcome::InsufficientStock { available }) => {
                            info!(%product_id, quantity, available, "Sale refused: insufficient stock")
                        }
                        Ok(SaleOutcome::ProductMissing) => {
                            info!(%product_id, quantity, "Sale refused: product missing")
                        }
                        Err(e) => warn!(%product_id, quantity, error = %e, "Sale failed"),
                    }
                    let _ = respond_to.send(result);
                }
                StoreRequest::ListSales { respond_to } => {
                    let result = self.repository.sales().await;
                    debug!(ok = result.is_ok(), "List sales");
                    let _ = respond_to.send(result);
                }
                StoreRequest::ResetAll { respond_to } => {
                    let result = self.repository.clear().await;
                    match &result {
                        Ok(()) => info!("Store reset"),
                        Err(e) => warn!(error = %e, "Reset failed"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(backend, "Store actor shutdown");
    }

    async fn create_product(&mut self, params: ProductCreate) -> Result<Product, StoreError> {
        params.validate().map_err(StoreError::Validation)?;
        self.repository.insert_product(params).await
    }

    async fn update_product(&mut self, product: Product) -> Result<Product, StoreError> {
        validate_update(&product).map_err(StoreError::Validation)?;
        if self.repository.replace_product(&product).await? {
            Ok(product)
        } else {
            Err(StoreError::NotFound(product.id))
        }
    }

    async fn process_sale(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleOutcome, StoreError> {
        if quantity <= 0 {
            return Err(StoreError::Validation(format!(
                "sale quantity must be positive, got {quantity}"
            )));
        }
        self.repository.sell(product_id, quantity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::repository::MemoryRepository;

    fn spawn_store() -> StoreClient {
        let (actor, client) = StoreActor::new(8, MemoryRepository::new());
        tokio::spawn(actor.run());
        client
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_products() {
        let store = spawn_store();

        let err = store.create_product(ProductCreate::new("", 1.0, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = store.create_product(ProductCreate::new("Widget", -1.0, 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = store.create_product(ProductCreate::new("Widget", 1.0, -1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        assert!(store.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let store = spawn_store();
        let ghost = Product::new(ProductId(42), "Ghost", 1.0, 1);
        assert_eq!(
            store.update_product(ghost).await,
            Err(StoreError::NotFound(ProductId(42)))
        );
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let store = spawn_store();
        let created = store
            .create_product(ProductCreate::new("Widget", 10.0, 3))
            .await
            .unwrap();

        let mut changed = created.clone();
        changed.name = "Widget Pro".to_string();
        changed.price = 12.5;
        changed.quantity = 40;
        changed.category = Some("Tools".to_string());
        store.update_product(changed.clone()).await.unwrap();

        assert_eq!(store.get_product(created.id).await.unwrap(), Some(changed));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = spawn_store();
        let created = store
            .create_product(ProductCreate::new("Widget", 10.0, 3))
            .await
            .unwrap();

        store.delete_product(created.id).await.unwrap();
        store.delete_product(created.id).await.unwrap();
        store.delete_product(ProductId(12345)).await.unwrap();
        assert_eq!(store.get_product(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sale_rejects_non_positive_quantity() {
        let store = spawn_store();
        let created = store
            .create_product(ProductCreate::new("Widget", 10.0, 3))
            .await
            .unwrap();

        let err = store.process_sale(created.id, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let err = store.process_sale(created.id, -2).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.get_product(created.id).await.unwrap().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_concurrent_sales_of_last_unit() {
        let store = spawn_store();
        let created = store
            .create_product(ProductCreate::new("Last One", 5.0, 1))
            .await
            .unwrap();

        let (a, b) = tokio::join!(
            store.process_sale(created.id, 1),
            store.process_sale(created.id, 1)
        );
        let sold = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|outcome| outcome.is_sold())
            .count();
        assert_eq!(sold, 1);
        assert_eq!(store.get_product(created.id).await.unwrap().unwrap().quantity, 0);
        assert_eq!(store.list_sales().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_all_empties_store_and_restarts_ids() {
        let store = spawn_store();
        let widget = store
            .create_product(ProductCreate::new("Widget", 10.0, 3))
            .await
            .unwrap();
        store
            .create_product(ProductCreate::new("Gadget", 2.5, 8))
            .await
            .unwrap();
        assert!(store.process_sale(widget.id, 1).await.unwrap().is_sold());

        store.reset_all().await.unwrap();

        assert!(store.list_products().await.unwrap().is_empty());
        assert!(store.list_sales().await.unwrap().is_empty());
        let fresh = store
            .create_product(ProductCreate::new("Fresh", 1.0, 1))
            .await
            .unwrap();
        assert_eq!(fresh.id, ProductId(1));
    }

    #[tokio::test]
    async fn test_actor_stops_when_clients_dropped() {
        let (actor, client) = StoreActor::new(4, MemoryRepository::new());
        let handle = tokio::spawn(actor.run());
        drop(client);
        handle.await.unwrap();
    }
}
