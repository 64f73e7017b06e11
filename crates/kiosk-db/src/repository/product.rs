//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - CRUD with validation-friendly typed errors
//! - Low-stock listing for the alerts view
//! - Barcode lookup for scanner-driven checkout
//! - Unique barcode generation (bounded generate-and-check loop)
//!
//! ## Barcode Generation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create/update without a barcode                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  candidate = "KSK" + millis tail + 4 random digits                      │
//! │       │                                                                 │
//! │       ├── already in catalog? → try again (up to 50 times)              │
//! │       │                                                                 │
//! │       └── free → use it                                                 │
//! │                                                                         │
//! │  50 misses in a 10^11 candidate space means something is broken,        │
//! │  so exhaustion fails the whole call instead of retrying forever.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kiosk_core::barcode;
use kiosk_core::{Product, ProductInput, MAX_BARCODE_ATTEMPTS};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, stock, barcode, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the whole catalog, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products at or below the given stock threshold.
    ///
    /// Ordered by stock ascending (emptiest first), then name, so the
    /// alerts view reads top-down in urgency order.
    pub async fn list_low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock <= ?1 ORDER BY stock ASC, name ASC"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Looks a product up by its exact barcode.
    ///
    /// This is the scanner path: the checkout screen resolves each scan
    /// through here before adding a line.
    pub async fn find_by_barcode(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Creates a new product.
    ///
    /// ## Arguments
    /// * `input` - Validated fields; `barcode: None` triggers generation
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product
    /// * `Err(DbError::UniqueViolation)` - Supplied barcode already exists
    /// * `Err(DbError::BarcodeExhausted)` - Generator ran out of attempts
    pub async fn create(&self, input: ProductInput) -> DbResult<Product> {
        let barcode = match input.barcode {
            Some(code) => code,
            None => self.generate_unique_barcode().await?,
        };

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            price_cents: input.price_cents,
            stock: input.stock,
            barcode,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            "INSERT INTO products (id, name, price_cents, stock, barcode, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.barcode)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates an existing product.
    ///
    /// Behaves like `create` with respect to barcodes: an absent/blank
    /// barcode in the payload is replaced with a freshly generated one.
    pub async fn update(&self, id: &str, input: ProductInput) -> DbResult<Product> {
        let barcode = match input.barcode {
            Some(code) => code,
            None => self.generate_unique_barcode().await?,
        };

        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE products SET name = ?2, price_cents = ?3, stock = ?4, barcode = ?5, \
             updated_at = ?6 WHERE id = ?1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(&barcode)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::ProductInUse)` - Some sale item references it;
    ///   sale history is immutable, so the product stays
    /// * `Err(DbError::NotFound)` - No such product
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let in_use: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sale_items WHERE product_id = ?1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if in_use != 0 {
            return Err(DbError::ProductInUse { id: id.to_string() });
        }

        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Generates a barcode that is not yet present in the catalog.
    ///
    /// Bounded generate-and-check loop; see the module docs for why the
    /// bound is fatal rather than retried.
    async fn generate_unique_barcode(&self) -> DbResult<String> {
        for attempt in 0..MAX_BARCODE_ATTEMPTS {
            // uuid v4 is the workspace's randomness source; fold it down
            // to the 4 digits the candidate format wants.
            let random = (Uuid::new_v4().as_u128() % 10_000) as u16;
            let code = barcode::candidate(Utc::now().timestamp_millis(), random);

            let taken: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE barcode = ?1)")
                    .bind(&code)
                    .fetch_one(&self.pool)
                    .await?;

            if taken == 0 {
                if attempt > 0 {
                    debug!(attempt, "Barcode collision retried");
                }
                return Ok(code);
            }
        }

        Err(DbError::BarcodeExhausted {
            attempts: MAX_BARCODE_ATTEMPTS,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn input(name: &str, price_cents: i64, stock: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price_cents,
            stock,
            barcode: None,
        }
    }

    #[tokio::test]
    async fn test_create_generates_unique_barcode() {
        let db = test_db().await;
        let repo = db.products();

        let a = repo.create(input("Coca Cola 500ml", 1800, 12)).await.unwrap();
        let b = repo.create(input("Agua Sin Gas 600ml", 1200, 15)).await.unwrap();

        assert!(barcode::is_generated(&a.barcode));
        assert!(barcode::is_generated(&b.barcode));
        assert_ne!(a.barcode, b.barcode);
    }

    #[tokio::test]
    async fn test_create_with_duplicate_barcode_fails() {
        let db = test_db().await;
        let repo = db.products();

        let mut first = input("Papas Clasicas 100g", 2200, 7);
        first.barcode = Some("7791234567890".to_string());
        repo.create(first).await.unwrap();

        let mut second = input("Papas Onduladas 100g", 2300, 5);
        second.barcode = Some("7791234567890".to_string());
        let err = repo.create(second).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_find_by_barcode() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(input("Chocolate Barra", 1500, 3)).await.unwrap();
        let found = repo.find_by_barcode(&created.barcode).await.unwrap();

        assert_eq!(found.unwrap().id, created.id);
        assert!(repo.find_by_barcode("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_low_stock_ordering() {
        let db = test_db().await;
        let repo = db.products();

        repo.create(input("Galletas Vainilla", 2000, 2)).await.unwrap();
        repo.create(input("Caramelos Menta x10", 1000, 20)).await.unwrap();
        repo.create(input("Chocolate Barra", 1500, 3)).await.unwrap();
        repo.create(input("Alfajor Simple", 900, 2)).await.unwrap();

        let low = repo.list_low_stock(3).await.unwrap();
        let names: Vec<&str> = low.iter().map(|p| p.name.as_str()).collect();

        // stock ASC, then name ASC for ties
        assert_eq!(
            names,
            vec!["Alfajor Simple", "Galletas Vainilla", "Chocolate Barra"]
        );
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_regenerates_blank_barcode() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(input("Agua Sin Gas 600ml", 1200, 15)).await.unwrap();

        let updated = repo
            .update(&created.id, input("Agua Con Gas 600ml", 1300, 10))
            .await
            .unwrap();

        assert_eq!(updated.name, "Agua Con Gas 600ml");
        assert_eq!(updated.price_cents, 1300);
        assert_eq!(updated.stock, 10);
        assert_eq!(updated.created_at, created.created_at);
        // barcode: None in the update payload means "generate a new one"
        assert!(barcode::is_generated(&updated.barcode));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_db().await;
        let err = db
            .products()
            .update("550e8400-e29b-41d4-a716-446655440000", input("X", 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_unreferenced_product() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.create(input("Caramelos Menta x10", 1000, 20)).await.unwrap();
        repo.delete(&created.id).await.unwrap();

        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_referenced_product_fails() {
        let db = test_db().await;
        let repo = db.products();
        let product = repo.create(input("Coca Cola 500ml", 1800, 12)).await.unwrap();

        // Seed a minimal sale referencing the product.
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO profiles (id, username, full_name, role, password_hash, created_at) \
             VALUES ('u1', 'seller1', 'Seller One', 'seller', 'x', ?1)",
        )
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO sales (id, created_at, total_cents, payment_method, created_by) \
             VALUES ('s1', ?1, 1800, 'CASH', 'u1')",
        )
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, qty, unit_price_cents, line_total_cents) \
             VALUES ('i1', 's1', ?1, 1, 1800, 1800)",
        )
        .bind(&product.id)
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo.delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ProductInUse { .. }));

        // Product untouched
        assert!(repo.get_by_id(&product.id).await.unwrap().is_some());
    }
}
