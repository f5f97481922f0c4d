use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;

use super::Repository;
use crate::model::{Product, ProductCreate, ProductId, SaleId, SaleOutcome, SaleRecord};
use crate::store::error::StoreError;

/// In-memory repository. State lives as long as the store actor that owns it.
#[derive(Debug)]
pub struct MemoryRepository {
    products: BTreeMap<ProductId, Product>,
    sales: Vec<SaleRecord>,
    next_product_id: i64,
    next_sale_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            products: BTreeMap::new(),
            sales: Vec::new(),
            next_product_id: 1,
            next_sale_id: 1,
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_product(&mut self, params: ProductCreate) -> Result<Product, StoreError> {
        let id = ProductId(self.next_product_id);
        self.next_product_id += 1;
        let product = params.into_product(id);
        self.products.insert(id, product.clone());
        Ok(product)
    }

    async fn replace_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        match self.products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_product(&mut self, id: ProductId) -> Result<(), StoreError> {
        self.products.remove(&id);
        Ok(())
    }

    async fn products(&mut self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.values().cloned().collect())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(&id).cloned())
    }

    async fn sell(&mut self, id: ProductId, quantity: i64) -> Result<SaleOutcome, StoreError> {
        let Some(product) = self.products.get_mut(&id) else {
            return Ok(SaleOutcome::ProductMissing);
        };
        if product.quantity < quantity {
            return Ok(SaleOutcome::InsufficientStock {
                available: product.quantity,
            });
        }

        product.quantity -= quantity;
        let record = SaleRecord {
            id: SaleId(self.next_sale_id),
            product_id: id,
            product_name: product.name.clone(),
            quantity,
            total_price: product.price * quantity as f64,
            sale_date: Utc::now(),
        };
        self.next_sale_id += 1;
        self.sales.push(record.clone());

        Ok(SaleOutcome::Sold {
            record,
            remaining: product.quantity,
        })
    }

    async fn sales(&mut self) -> Result<Vec<SaleRecord>, StoreError> {
        let mut sales = self.sales.clone();
        sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date).then(b.id.cmp(&a.id)));
        Ok(sales)
    }

    async fn clear(&mut self) -> Result<(), StoreError> {
        self.sales.clear();
        self.products.clear();
        self.next_product_id = 1;
        self.next_sale_id = 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let mut repo = MemoryRepository::new();
        let first = repo.insert_product(ProductCreate::new("A", 1.0, 1)).await.unwrap();
        repo.remove_product(first.id).await.unwrap();
        let second = repo.insert_product(ProductCreate::new("B", 1.0, 1)).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_clear_restarts_sequences() {
        let mut repo = MemoryRepository::new();
        let product = repo.insert_product(ProductCreate::new("A", 2.0, 5)).await.unwrap();
        repo.sell(product.id, 1).await.unwrap();

        repo.clear().await.unwrap();
        assert!(repo.products().await.unwrap().is_empty());
        assert!(repo.sales().await.unwrap().is_empty());

        let again = repo.insert_product(ProductCreate::new("B", 1.0, 1)).await.unwrap();
        assert_eq!(again.id, ProductId(1));
    }
}
