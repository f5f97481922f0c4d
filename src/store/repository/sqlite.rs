use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use super::Repository;
use crate::model::{
    resolve_sale_name, Product, ProductCreate, ProductId, SaleId, SaleOutcome, SaleRecord,
};
use crate::store::error::StoreError;

/// Text layout of `sales.sale_date`. Sorts lexically and matches SQLite's
/// `CURRENT_TIMESTAMP` apart from the fractional seconds.
const SALE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Opens a SQLite pool, creating the database file when missing.
///
/// In-memory databases live per connection, so they get exactly one connection that is never
/// recycled.
pub async fn open_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };
    pool_options.connect_with(options).await
}

/// Durable repository over the `products` and `sales` tables.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        quantity: row.try_get("quantity")?,
        category: row.try_get("category")?,
    })
}

fn sale_from_row(row: &SqliteRow) -> Result<SaleRecord, StoreError> {
    let captured: Option<String> = row.try_get("product_name")?;
    let current: Option<String> = row.try_get("current_name")?;
    let raw_date: String = row.try_get("sale_date")?;
    Ok(SaleRecord {
        id: SaleId(row.try_get("id")?),
        product_id: ProductId(row.try_get::<Option<i64>, _>("product_id")?.unwrap_or_default()),
        product_name: resolve_sale_name(captured, current),
        quantity: row.try_get::<Option<i64>, _>("quantity")?.unwrap_or_default(),
        total_price: row.try_get::<Option<f64>, _>("total_price")?.unwrap_or_default(),
        sale_date: parse_sale_date(&raw_date)?,
    })
}

fn parse_sale_date(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::StorageUnavailable(format!("invalid sale_date {raw:?}: {e}")))
}

#[async_trait]
impl Repository for SqliteRepository {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn provision(&mut self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                name     TEXT NOT NULL,
                price    REAL NOT NULL,
                quantity INTEGER NOT NULL,
                category TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sales (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id   INTEGER,
                quantity     INTEGER,
                total_price  REAL,
                sale_date    TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                product_name TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Tables created before sale names were captured lack the column.
        let has_name: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('sales') WHERE name = 'product_name'",
        )
        .fetch_one(&self.pool)
        .await?;
        if has_name == 0 {
            sqlx::query("ALTER TABLE sales ADD COLUMN product_name TEXT")
                .execute(&self.pool)
                .await?;
            info!("Added sales.product_name column");
        }

        debug!("Inventory schema ready");
        Ok(())
    }

    async fn insert_product(&mut self, params: ProductCreate) -> Result<Product, StoreError> {
        let result = sqlx::query(
            "INSERT INTO products (name, price, quantity, category) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&params.name)
        .bind(params.price)
        .bind(params.quantity)
        .bind(&params.category)
        .execute(&self.pool)
        .await?;
        Ok(params.into_product(ProductId(result.last_insert_rowid())))
    }

    async fn replace_product(&mut self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE products SET name = ?1, price = ?2, quantity = ?3, category = ?4 WHERE id = ?5",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(product.quantity)
        .bind(&product.category)
        .bind(product.id.0)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_product(&mut self, id: ProductId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn products(&mut self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query("SELECT id, name, price, quantity, category FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query("SELECT id, name, price, quantity, category FROM products WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn sell(&mut self, id: ProductId, quantity: i64) -> Result<SaleOutcome, StoreError> {
        // Any early return or error drops `tx`, which rolls it back.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT quantity, price, name FROM products WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(SaleOutcome::ProductMissing);
        };

        let current: i64 = row.try_get("quantity")?;
        let price: f64 = row.try_get("price")?;
        let name: String = row.try_get("name")?;
        if current < quantity {
            tx.rollback().await?;
            return Ok(SaleOutcome::InsufficientStock { available: current });
        }

        let remaining = current - quantity;
        sqlx::query("UPDATE products SET quantity = ?1 WHERE id = ?2")
            .bind(remaining)
            .bind(id.0)
            .execute(&mut *tx)
            .await?;

        let sale_date = Utc::now();
        let total_price = price * quantity as f64;
        let inserted = sqlx::query(
            "INSERT INTO sales (product_id, quantity, total_price, sale_date, product_name) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(id.0)
        .bind(quantity)
        .bind(total_price)
        .bind(sale_date.format(SALE_DATE_FORMAT).to_string())
        .bind(&name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SaleOutcome::Sold {
            record: SaleRecord {
                id: SaleId(inserted.last_insert_rowid()),
                product_id: id,
                product_name: name,
                quantity,
                total_price,
                sale_date,
            },
            remaining,
        })
    }

    async fn sales(&mut self) -> Result<Vec<SaleRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.product_id, s.product_name, p.name AS current_name,
                   s.quantity, s.total_price, s.sale_date
            FROM sales s
            LEFT JOIN products p ON s.product_id = p.id
            ORDER BY s.sale_date DESC, s.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(sale_from_row).collect()
    }

    async fn clear(&mut self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM sales").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM sqlite_sequence WHERE name IN ('sales', 'products')")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> SqliteRepository {
        let pool = open_pool("sqlite::memory:", 1).await.unwrap();
        let mut repo = SqliteRepository::new(pool);
        repo.provision().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let mut repo = repository().await;
        repo.provision().await.unwrap();
        repo.provision().await.unwrap();
        assert!(repo.products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_debits_and_records() {
        let mut repo = repository().await;
        let product = repo
            .insert_product(ProductCreate::new("Widget", 10.0, 3).with_category("Tools"))
            .await
            .unwrap();

        let outcome = repo.sell(product.id, 2).await.unwrap();
        match outcome {
            SaleOutcome::Sold { record, remaining } => {
                assert_eq!(remaining, 1);
                assert_eq!(record.total_price, 20.0);
                assert_eq!(record.product_name, "Widget");
            }
            other => panic!("Expected a sale, got {:?}", other),
        }

        let stored = repo.product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
        assert_eq!(stored.category.as_deref(), Some("Tools"));
        assert_eq!(repo.sales().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_short_stock_rolls_back() {
        let mut repo = repository().await;
        let product = repo.insert_product(ProductCreate::new("Widget", 10.0, 1)).await.unwrap();

        let outcome = repo.sell(product.id, 5).await.unwrap();
        assert_eq!(outcome, SaleOutcome::InsufficientStock { available: 1 });
        assert_eq!(repo.product(product.id).await.unwrap().unwrap().quantity, 1);
        assert!(repo.sales().await.unwrap().is_empty());

        assert_eq!(
            repo.sell(ProductId(999), 1).await.unwrap(),
            SaleOutcome::ProductMissing
        );
    }

    #[tokio::test]
    async fn test_legacy_sale_names_fall_back() {
        let mut repo = repository().await;
        let product = repo.insert_product(ProductCreate::new("Gadget", 4.0, 10)).await.unwrap();

        // Rows written before names were captured, one for a live product, one for a gone one.
        sqlx::query(
            "INSERT INTO sales (product_id, quantity, total_price, sale_date) \
             VALUES (?1, 1, 4.0, '2024-01-01 10:00:00')",
        )
        .bind(product.id.0)
        .execute(repo.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO sales (product_id, quantity, total_price, sale_date) \
             VALUES (777, 2, 9.0, '2023-01-01 10:00:00')",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let sales = repo.sales().await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].product_name, "Gadget");
        assert_eq!(sales[1].product_name, "Unknown");
        assert!(sales[0].sale_date > sales[1].sale_date);
    }

    #[tokio::test]
    async fn test_adds_missing_name_column() {
        let pool = open_pool("sqlite::memory:", 1).await.unwrap();
        sqlx::query(
            "CREATE TABLE sales (id INTEGER PRIMARY KEY AUTOINCREMENT, product_id INTEGER, \
             quantity INTEGER, total_price REAL, sale_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let mut repo = SqliteRepository::new(pool);
        repo.provision().await.unwrap();

        let product = repo.insert_product(ProductCreate::new("Bolt", 0.5, 10)).await.unwrap();
        assert!(repo.sell(product.id, 4).await.unwrap().is_sold());
        assert_eq!(repo.sales().await.unwrap()[0].product_name, "Bolt");
    }

    #[tokio::test]
    async fn test_clear_restarts_ids() {
        let mut repo = repository().await;
        let first = repo.insert_product(ProductCreate::new("A", 1.0, 5)).await.unwrap();
        repo.sell(first.id, 1).await.unwrap();
        repo.clear().await.unwrap();

        assert!(repo.sales().await.unwrap().is_empty());
        let again = repo.insert_product(ProductCreate::new("B", 1.0, 5)).await.unwrap();
        assert_eq!(again.id, ProductId(1));
    }
}
