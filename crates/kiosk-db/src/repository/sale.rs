//! # Sale Repository
//!
//! The checkout transaction and sale history queries.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Transaction                              │
//! │                                                                         │
//! │  1. PREPARE (pure, kiosk-core)                                          │
//! │     └── group duplicate lines, validate, sort by product id             │
//! │                                                                         │
//! │  2. BEGIN                                                               │
//! │     └── insert sale row (total 0, finalized in step 5)                  │
//! │                                                                         │
//! │  3. PER PRODUCT (sorted order = stable lock order)                      │
//! │     ├── UPDATE stock = stock - qty WHERE stock >= qty                   │
//! │     │      └── 0 rows? missing product or insufficient stock → ROLLBACK │
//! │     ├── read frozen unit price, accumulate total                        │
//! │     └── insert line item                                                │
//! │                                                                         │
//! │  4. INTEGRITY                                                           │
//! │     └── line items with zero total → ROLLBACK (never a real sale)       │
//! │                                                                         │
//! │  5. FINALIZE + COMMIT                                                   │
//! │     └── UPDATE sale total, commit everything atomically                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why the guarded UPDATE?
//! The decrement re-checks `stock >= qty` at write time, under the
//! database's write lock. Two concurrent checkouts racing for the last
//! units cannot both pass: the loser sees 0 rows affected and the whole
//! attempt rolls back with `InsufficientStock`, leaving its stock reads
//! unused. The transaction's first statement is already a write (the sale
//! row), so a checkout becomes a writer immediately instead of upgrading
//! from a stale read snapshot mid-transaction.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kiosk_core::checkout::{prepare, LineRequest};
use kiosk_core::{CoreError, Money, PaymentMethod, Sale, SaleItem};

// =============================================================================
// Checkout Types
// =============================================================================

/// Everything that can go wrong inside a checkout: business rule
/// violations (stock, unknown products, integrity) or storage failures.
/// Either way the transaction is rolled back before this is returned.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Db(DbError::from(err))
    }
}

/// Successful checkout result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    pub sale_id: String,
    pub total_cents: i64,
}

/// One line of a sale joined with its product's current name and barcode,
/// for the sale detail view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailItem {
    pub id: String,
    pub product_id: String,
    pub qty: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub product_name: String,
    pub product_barcode: String,
}

// =============================================================================
// Sale Repository
// =============================================================================

/// Repository for the checkout transaction and sale history.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Runs a checkout: converts a cart into a persisted sale and its
    /// line items while decrementing stock, atomically.
    ///
    /// ## Arguments
    /// * `lines` - Raw request lines; duplicates for the same product are
    ///   summed before any store access
    /// * `payment_method` - How the customer paid
    /// * `created_by` - Profile id of the authenticated seller
    ///
    /// ## Guarantees
    /// On any error, nothing is written: no sale row, no line items, no
    /// stock change. On success the sale total equals the sum of its line
    /// totals, and each line's unit price is a snapshot of the product
    /// price at sale time.
    pub async fn checkout(
        &self,
        lines: &[LineRequest],
        payment_method: PaymentMethod,
        created_by: &str,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // Validation and grouping happen before the transaction starts;
        // a malformed request never touches the store.
        let grouped = prepare(lines).map_err(CoreError::from)?;

        debug!(
            distinct_products = grouped.len(),
            ?payment_method,
            "Starting checkout"
        );

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Sale row first: line items reference it. The total is zero
        // until finalized below, inside the same transaction.
        sqlx::query(
            "INSERT INTO sales (id, created_at, total_cents, payment_method, created_by) \
             VALUES (?1, ?2, 0, ?3, ?4)",
        )
        .bind(&sale_id)
        .bind(now)
        .bind(payment_method)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;

        let mut total = Money::zero();

        for line in &grouped {
            // Guarded decrement: the stock check and the write are one
            // statement, serialized by the database's write lock.
            let decremented = sqlx::query(
                "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
                 WHERE id = ?1 AND stock >= ?2",
            )
            .bind(&line.product_id)
            .bind(line.qty)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                // Either the product does not exist or it does not have
                // enough units; look once more to tell the two apart.
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                        .bind(&line.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                // Dropping `tx` rolls everything back.
                return Err(match available {
                    None => CoreError::ProductNotFound(line.product_id.clone()).into(),
                    Some(available) => CoreError::InsufficientStock {
                        product_id: line.product_id.clone(),
                        available,
                        requested: line.qty,
                    }
                    .into(),
                });
            }

            // Snapshot the unit price for the line item. The decrement
            // above did not touch price, so this read is current.
            let unit_price_cents: i64 =
                sqlx::query_scalar("SELECT price_cents FROM products WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_one(&mut *tx)
                    .await?;

            let line_total = Money::from_cents(unit_price_cents).multiply_quantity(line.qty);
            total += line_total;

            sqlx::query(
                "INSERT INTO sale_items \
                 (id, sale_id, product_id, qty, unit_price_cents, line_total_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale_id)
            .bind(&line.product_id)
            .bind(line.qty)
            .bind(unit_price_cents)
            .bind(line_total.cents())
            .execute(&mut *tx)
            .await?;
        }

        // A sale with items and a zero total is a computation defect,
        // not a legitimate sale; fail loudly and keep the store clean.
        if total.is_zero() {
            error!(sale_id = %sale_id, "Checkout produced line items with a zero total");
            return Err(CoreError::TotalIntegrity { sale_id }.into());
        }

        // Finalize the derived total, then commit everything at once.
        sqlx::query("UPDATE sales SET total_cents = ?2 WHERE id = ?1")
            .bind(&sale_id)
            .bind(total.cents())
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale_id,
            total = %total,
            items = grouped.len(),
            "Sale committed"
        );

        Ok(CheckoutOutcome {
            sale_id,
            total_cents: total.cents(),
        })
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, created_at, total_cents, payment_method, created_by \
             FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT id, created_at, total_cents, payment_method, created_by \
             FROM sales ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets the raw line items of a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, product_id, qty, unit_price_cents, line_total_cents \
             FROM sale_items WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale's line items joined with product name and barcode,
    /// for the sale detail view.
    pub async fn get_items_detailed(&self, sale_id: &str) -> DbResult<Vec<SaleDetailItem>> {
        let items = sqlx::query_as::<_, SaleDetailItem>(
            "SELECT si.id, si.product_id, si.qty, si.unit_price_cents, si.line_total_cents, \
                    p.name AS product_name, p.barcode AS product_barcode \
             FROM sale_items si \
             INNER JOIN products p ON p.id = si.product_id \
             WHERE si.sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
