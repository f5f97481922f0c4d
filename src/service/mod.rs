//! # Inventory Service
//!
//! The operation surface published to remote clients. It holds no state of its own: every call
//! goes to the store actor, and each successful mutation is announced to observers through the
//! broadcaster. Failed calls announce nothing.

pub mod error;
pub mod events;

pub use error::{ErrorKind, ServiceError};
pub use events::LOW_STOCK_THRESHOLD;

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::model::{Product, ProductCreate, ProductId, SaleOutcome, SaleRecord};
use crate::notifier::Broadcast;
use crate::store::StoreClient;

#[derive(Clone)]
pub struct InventoryService {
    store: StoreClient,
    broadcaster: Arc<dyn Broadcast>,
}

impl InventoryService {
    pub fn new(store: StoreClient, broadcaster: Arc<dyn Broadcast>) -> Self {
        Self { store, broadcaster }
    }

    #[instrument(skip(self))]
    pub async fn add_product(&self, params: ProductCreate) -> Result<Product, ServiceError> {
        let product = self
            .store
            .create_product(params)
            .await
            .map_err(ServiceError::wrap("Error adding product"))?;
        self.broadcaster.broadcast(&events::product_added(&product.name));
        Ok(product)
    }

    /// Overwrites a product. Quantity is taken as given, so this is the restock path too.
    #[instrument(skip(self))]
    pub async fn update_product(&self, product: Product) -> Result<Product, ServiceError> {
        let product = self
            .store
            .update_product(product)
            .await
            .map_err(ServiceError::wrap("Error updating product"))?;
        self.broadcaster.broadcast(&events::product_updated(&product.name));
        Ok(product)
    }

    /// Deletes a product. Deleting an unknown id succeeds and is still announced.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        self.store
            .delete_product(id)
            .await
            .map_err(ServiceError::wrap("Error deleting product"))?;
        self.broadcaster.broadcast(&events::product_deleted(id));
        Ok(())
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        self.store
            .list_products()
            .await
            .map_err(ServiceError::wrap("Error listing products"))
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, ServiceError> {
        self.store
            .get_product(id)
            .await
            .map_err(ServiceError::wrap("Error fetching product"))
    }

    /// Sells `quantity` units. `false` means the product is missing or short on stock; use
    /// [`sell_detailed`](Self::sell_detailed) to tell which.
    pub async fn sell(&self, product_id: ProductId, quantity: i64) -> Result<bool, ServiceError> {
        Ok(self.sell_detailed(product_id, quantity).await?.is_sold())
    }

    /// Sells `quantity` units and reports why a refused sale was refused.
    ///
    /// After a completed sale a low-stock alert goes out first when the remaining stock is
    /// below [`LOW_STOCK_THRESHOLD`], then the sale event.
    #[instrument(skip(self))]
    pub async fn sell_detailed(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleOutcome, ServiceError> {
        let outcome = self
            .store
            .process_sale(product_id, quantity)
            .await
            .map_err(ServiceError::wrap("Error processing sale"))?;

        if let SaleOutcome::Sold { record, remaining } = &outcome {
            if *remaining < LOW_STOCK_THRESHOLD {
                info!(%product_id, remaining, "Low stock");
                self.broadcaster
                    .broadcast(&events::low_stock(&record.product_name, *remaining));
            }
            self.broadcaster
                .broadcast(&events::sale_completed(quantity, product_id));
        } else {
            debug!(%product_id, quantity, ?outcome, "Sale not completed");
        }
        Ok(outcome)
    }

    /// Every recorded sale, newest first.
    pub async fn sales_report(&self) -> Result<Vec<SaleRecord>, ServiceError> {
        self.store
            .list_sales()
            .await
            .map_err(ServiceError::wrap("Error fetching sales report"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mock::{
        create_mock_store, expect_delete_product, expect_list_sales, expect_process_sale,
    };
    use crate::store::{self, MemoryRepository, StoreError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Broadcast for Recorder {
        fn broadcast(&self, message: &str) {
            self.events.lock().unwrap().push(message.to_string());
        }
    }

    fn service() -> (InventoryService, Arc<Recorder>) {
        let (actor, client) = store::new(16, MemoryRepository::new());
        tokio::spawn(actor.run());
        let recorder = Arc::new(Recorder::default());
        (InventoryService::new(client, recorder.clone()), recorder)
    }

    #[tokio::test]
    async fn test_widget_sale() {
        let (service, recorder) = service();
        let widget = service
            .add_product(ProductCreate::new("Widget", 10.0, 3))
            .await
            .unwrap();

        assert!(service.sell(widget.id, 2).await.unwrap());

        let stored = service.get_product(widget.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
        let sales = service.sales_report().await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total_price, 20.0);

        assert_eq!(
            recorder.events(),
            vec![
                "System: New product added - Widget".to_string(),
                "ALERT: Low stock for Widget (Qty: 1)".to_string(),
                format!("Sale: 2 units of item {} sold.", widget.id),
            ]
        );

        assert!(!service.sell(widget.id, 5).await.unwrap());
        assert_eq!(recorder.events().len(), 3);
    }

    #[tokio::test]
    async fn test_no_alert_at_threshold() {
        let (service, recorder) = service();
        let gadget = service
            .add_product(ProductCreate::new("Gadget", 2.5, 10))
            .await
            .unwrap();

        assert!(service.sell(gadget.id, 5).await.unwrap());

        assert_eq!(
            recorder.events().last().unwrap(),
            &format!("Sale: 5 units of item {} sold.", gadget.id)
        );
        assert!(!recorder.events().iter().any(|e| e.starts_with("ALERT")));
    }

    #[tokio::test]
    async fn test_missing_product_sells_nothing_and_stays_quiet() {
        let (service, recorder) = service();

        let outcome = service.sell_detailed(ProductId(99), 1).await.unwrap();

        assert_eq!(outcome, SaleOutcome::ProductMissing);
        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_input_is_not_broadcast() {
        let (service, recorder) = service();

        let err = service
            .add_product(ProductCreate::new("  ", 1.0, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.operation, "Error adding product");

        let missing = Product::new(ProductId(42), "Ghost", 1.0, 1);
        let err = service.update_product(missing).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = service.sell(ProductId(1), 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(recorder.events().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_are_announced() {
        let (service, recorder) = service();
        let mut widget = service
            .add_product(ProductCreate::new("Widget", 10.0, 3))
            .await
            .unwrap();

        widget.name = "Widget Pro".to_string();
        widget.quantity = 50;
        service.update_product(widget.clone()).await.unwrap();
        service.delete_product(widget.id).await.unwrap();
        service.delete_product(widget.id).await.unwrap();

        let events = recorder.events();
        assert_eq!(events[1], "System: Product updated - Widget Pro");
        assert_eq!(events[2], format!("System: Product deleted ID {}", widget.id));
        assert_eq!(events[3], events[2]);
        assert!(service.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_carries_operation() {
        let (client, mut receiver) = create_mock_store(4);
        let recorder = Arc::new(Recorder::default());
        let service = InventoryService::new(client, recorder.clone());

        let sale = tokio::spawn({
            let service = service.clone();
            async move { service.sell(ProductId(1), 1).await }
        });
        let (_, _, respond_to) = expect_process_sale(&mut receiver).await.unwrap();
        respond_to
            .send(Err(StoreError::StorageUnavailable("disk full".into())))
            .unwrap();

        let err = sale.await.unwrap().unwrap_err();
        assert_eq!(err.operation, "Error processing sale");
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(err.to_string(), "Error processing sale: Storage unavailable: disk full");

        let delete = tokio::spawn({
            let service = service.clone();
            async move { service.delete_product(ProductId(1)).await }
        });
        let (_, respond_to) = expect_delete_product(&mut receiver).await.unwrap();
        respond_to
            .send(Err(StoreError::StorageUnavailable("locked".into())))
            .unwrap();
        assert!(delete.await.unwrap().is_err());

        let report = tokio::spawn({
            let service = service.clone();
            async move { service.sales_report().await }
        });
        let respond_to = expect_list_sales(&mut receiver).await.unwrap();
        respond_to.send(Ok(Vec::new())).unwrap();
        assert!(report.await.unwrap().unwrap().is_empty());

        assert!(recorder.events().is_empty());
    }
}
