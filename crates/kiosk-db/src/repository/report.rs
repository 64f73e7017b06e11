//! # Report Repository
//!
//! Read-only dashboard rollups over sales, sale items and products.
//! Nothing in this module mutates the store.
//!
//! ## Time Zone Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "Today" and "this month" are calendar concepts, and the calendar       │
//! │  belongs to the store's counter, not to UTC.                            │
//! │                                                                         │
//! │  All boundaries are computed in Rust against a fixed reference          │
//! │  offset (default -05:00, no DST), then passed to SQL as plain UTC       │
//! │  range parameters. SQLite never does date math, so every rollup has     │
//! │  exactly one deterministic computation path.                            │
//! │                                                                         │
//! │       now (UTC) ──► local calendar day/month start ──► UTC bound        │
//! │                                                                         │
//! │  Methods take `now` as a parameter: rollups are pure functions of       │
//! │  the clock reading and the data, which is what makes them testable.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use kiosk_core::{Money, PaymentMethod, Product};

// =============================================================================
// Rollup Types
// =============================================================================

/// Headline numbers at the top of the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpis {
    pub sold_today_cents: i64,
    pub sold_week_cents: i64,
    pub sold_month_cents: i64,
    pub sales_count_today: i64,
    /// sold_today / sales_count_today, rounded half-up at the cent.
    pub ticket_average_today_cents: i64,
}

/// One row of the top-products ranking.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub qty_sold: i64,
    pub total_sold_cents: i64,
}

/// One row of the recent-sales table, with its item count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentSale {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
    pub items_count: i64,
    pub payment_method: PaymentMethod,
}

/// Everything the dashboard renders, computed in one call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub kpis: DashboardKpis,
    pub top_products: Vec<TopProduct>,
    pub recent_sales: Vec<RecentSale>,
    pub low_stock_products: Vec<Product>,
}

// =============================================================================
// Calendar Boundaries
// =============================================================================

/// UTC instant of local midnight for the calendar day containing `now`.
fn local_day_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let since_midnight = local.time().signed_duration_since(NaiveTime::MIN);
    now - since_midnight
}

/// UTC instant of local midnight on the 1st of the month containing `now`.
fn local_month_start(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let days_into_month = i64::from(local.day()) - 1;
    local_day_start(now, offset) - Duration::days(days_into_month)
}

// =============================================================================
// Report Repository
// =============================================================================

/// Repository for dashboard rollups.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sum of sale totals in the half-open range `[from, to)`.
    pub async fn sold_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_cents), 0) FROM sales \
             WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Number of sales in the half-open range `[from, to)`.
    pub async fn sales_count_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sales WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Top products across the whole sale history.
    ///
    /// Ranked by units sold descending; ties broken by revenue
    /// descending, so of two products with equal volume the bigger
    /// earner ranks first.
    pub async fn top_products(&self, limit: i64) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            "SELECT si.product_id, p.name, \
                    SUM(si.qty) AS qty_sold, \
                    SUM(si.line_total_cents) AS total_sold_cents \
             FROM sale_items si \
             INNER JOIN products p ON p.id = si.product_id \
             GROUP BY si.product_id, p.name \
             ORDER BY qty_sold DESC, total_sold_cents DESC \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent sales with their item counts, newest first.
    pub async fn recent_sales(&self, limit: i64) -> DbResult<Vec<RecentSale>> {
        let rows = sqlx::query_as::<_, RecentSale>(
            "SELECT s.id, s.created_at, s.total_cents, \
                    COUNT(si.id) AS items_count, s.payment_method \
             FROM sales s \
             LEFT JOIN sale_items si ON si.sale_id = s.id \
             GROUP BY s.id \
             ORDER BY s.created_at DESC \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Computes the whole dashboard.
    ///
    /// ## Arguments
    /// * `now` - Clock reading the calendar boundaries derive from
    /// * `offset` - The store's fixed reference offset
    /// * `low_stock_threshold` - Stock level for the alert list
    pub async fn dashboard(
        &self,
        now: DateTime<Utc>,
        offset: FixedOffset,
        low_stock_threshold: i64,
    ) -> DbResult<DashboardData> {
        let day_start = local_day_start(now, offset);
        let day_end = day_start + Duration::days(1);
        let week_start = now - Duration::days(7);
        let month_start = local_month_start(now, offset);

        let sold_today = self.sold_between(day_start, day_end).await?;
        let sold_week = self.sold_between(week_start, day_end).await?;
        let sold_month = self.sold_between(month_start, day_end).await?;
        let sales_count_today = self.sales_count_between(day_start, day_end).await?;

        let ticket_average_today_cents = Money::from_cents(sold_today)
            .divide_round(sales_count_today)
            .cents();

        let top_products = self.top_products(10).await?;
        let recent_sales = self.recent_sales(10).await?;
        let low_stock_products = ProductRepository::new(self.pool.clone())
            .list_low_stock(low_stock_threshold)
            .await?;

        Ok(DashboardData {
            kpis: DashboardKpis {
                sold_today_cents: sold_today,
                sold_week_cents: sold_week,
                sold_month_cents: sold_month,
                sales_count_today,
                ticket_average_today_cents,
            },
            top_products,
            recent_sales,
            low_stock_products,
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
    use chrono::TimeZone;

    /// The store's reference offset in tests: UTC-05:00.
    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_local_day_start() {
        // 2026-03-15 12:00 UTC is 07:00 local; local midnight is 05:00 UTC
        let now = utc(2026, 3, 15, 12, 0);
        assert_eq!(local_day_start(now, offset()), utc(2026, 3, 15, 5, 0));

        // 03:00 UTC is still 22:00 on the 14th locally
        let early = utc(2026, 3, 15, 3, 0);
        assert_eq!(local_day_start(early, offset()), utc(2026, 3, 14, 5, 0));
    }

    #[test]
    fn test_local_month_start() {
        let now = utc(2026, 3, 15, 12, 0);
        assert_eq!(local_month_start(now, offset()), utc(2026, 3, 1, 5, 0));

        // First local hour of the month: 2026-03-01 04:59 UTC is still
        // February locally
        let feb = utc(2026, 3, 1, 4, 59);
        assert_eq!(local_month_start(feb, offset()), utc(2026, 2, 1, 5, 0));
    }

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "INSERT INTO profiles (id, username, full_name, role, password_hash, created_at) \
             VALUES ('u1', 'seller1', 'Seller', 'seller', 'x', ?1)",
        )
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    async fn seed_sale(db: &Database, id: &str, at: DateTime<Utc>, total_cents: i64) {
        sqlx::query(
            "INSERT INTO sales (id, created_at, total_cents, payment_method, created_by) \
             VALUES (?1, ?2, ?3, 'CASH', 'u1')",
        )
        .bind(id)
        .bind(at)
        .bind(total_cents)
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn seed_product_row(db: &Database, id: &str, name: &str, stock: i64) {
        sqlx::query(
            "INSERT INTO products (id, name, price_cents, stock, barcode, created_at, updated_at) \
             VALUES (?1, ?2, 1000, ?3, ?1, ?4, ?4)",
        )
        .bind(id)
        .bind(name)
        .bind(stock)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn seed_item(db: &Database, id: &str, sale_id: &str, product_id: &str, qty: i64, line_total: i64) {
        sqlx::query(
            "INSERT INTO sale_items (id, sale_id, product_id, qty, unit_price_cents, line_total_cents) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(id)
        .bind(sale_id)
        .bind(product_id)
        .bind(qty)
        .bind(if qty > 0 { line_total / qty } else { 0 })
        .bind(line_total)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_kpi_ranges_respect_the_reference_offset() {
        let db = test_db().await;
        let now = utc(2026, 3, 15, 12, 0); // 07:00 local

        seed_sale(&db, "s-today", utc(2026, 3, 15, 10, 0), 3000).await;
        // 03:00 UTC is the previous local day: in week and month, not today
        seed_sale(&db, "s-yesterday", utc(2026, 3, 15, 3, 0), 2000).await;
        seed_sale(&db, "s-week", utc(2026, 3, 12, 12, 0), 1000).await;
        // Previous local month
        seed_sale(&db, "s-feb", utc(2026, 2, 3, 12, 0), 500).await;

        let data = db.reports().dashboard(now, offset(), 3).await.unwrap();

        assert_eq!(data.kpis.sold_today_cents, 3000);
        assert_eq!(data.kpis.sold_week_cents, 6000);
        assert_eq!(data.kpis.sold_month_cents, 6000);
        assert_eq!(data.kpis.sales_count_today, 1);
        assert_eq!(data.kpis.ticket_average_today_cents, 3000);
    }

    #[tokio::test]
    async fn test_ticket_average_rounds_half_up() {
        let db = test_db().await;
        let now = utc(2026, 3, 15, 12, 0);

        seed_sale(&db, "s1", utc(2026, 3, 15, 9, 0), 1000).await;
        seed_sale(&db, "s2", utc(2026, 3, 15, 10, 0), 1001).await;

        let data = db.reports().dashboard(now, offset(), 3).await.unwrap();

        // 2001 / 2 = 1000.5 → 1001
        assert_eq!(data.kpis.sales_count_today, 2);
        assert_eq!(data.kpis.ticket_average_today_cents, 1001);
    }

    #[tokio::test]
    async fn test_no_sales_means_zero_average() {
        let db = test_db().await;
        let data = db
            .reports()
            .dashboard(utc(2026, 3, 15, 12, 0), offset(), 3)
            .await
            .unwrap();

        assert_eq!(data.kpis.sold_today_cents, 0);
        assert_eq!(data.kpis.sales_count_today, 0);
        assert_eq!(data.kpis.ticket_average_today_cents, 0);
    }

    #[tokio::test]
    async fn test_top_products_ranking_and_tie_break() {
        let db = test_db().await;
        let at = utc(2026, 3, 15, 10, 0);

        seed_product_row(&db, "pa", "Cheap Seller", 10).await;
        seed_product_row(&db, "pb", "Premium Seller", 10).await;
        seed_product_row(&db, "pc", "Slow Mover", 10).await;

        seed_sale(&db, "s1", at, 12500).await;
        // pa and pb tie on qty (5 each); pb earned more
        seed_item(&db, "i1", "s1", "pa", 5, 5000).await;
        seed_item(&db, "i2", "s1", "pb", 5, 7500).await;

        seed_sale(&db, "s2", at, 2000).await;
        seed_item(&db, "i3", "s2", "pc", 2, 2000).await;

        let top = db.reports().top_products(10).await.unwrap();
        let names: Vec<&str> = top.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(names, vec!["Premium Seller", "Cheap Seller", "Slow Mover"]);
        assert_eq!(top[0].qty_sold, 5);
        assert_eq!(top[0].total_sold_cents, 7500);
    }

    #[tokio::test]
    async fn test_recent_sales_carry_item_counts() {
        let db = test_db().await;

        seed_product_row(&db, "pa", "A", 10).await;
        seed_sale(&db, "s1", utc(2026, 3, 15, 9, 0), 3000).await;
        seed_item(&db, "i1", "s1", "pa", 1, 1000).await;
        seed_item(&db, "i2", "s1", "pa", 2, 2000).await;
        seed_sale(&db, "s2", utc(2026, 3, 15, 10, 0), 1000).await;
        seed_item(&db, "i3", "s2", "pa", 1, 1000).await;
        // A sale with no items still shows up, with a zero count
        seed_sale(&db, "s3", utc(2026, 3, 15, 11, 0), 0).await;

        let recent = db.reports().recent_sales(10).await.unwrap();

        assert_eq!(recent.len(), 3);
        // Newest first
        assert_eq!(recent[0].id, "s3");
        assert_eq!(recent[0].items_count, 0);
        assert_eq!(recent[1].id, "s2");
        assert_eq!(recent[1].items_count, 1);
        assert_eq!(recent[2].id, "s1");
        assert_eq!(recent[2].items_count, 2);
    }

    #[tokio::test]
    async fn test_dashboard_includes_low_stock_list() {
        let db = test_db().await;
        seed_product_row(&db, "pa", "Running Out", 1).await;
        seed_product_row(&db, "pb", "Plenty", 50).await;

        let data = db
            .reports()
            .dashboard(utc(2026, 3, 15, 12, 0), offset(), 3)
            .await
            .unwrap();

        assert_eq!(data.low_stock_products.len(), 1);
        assert_eq!(data.low_stock_products[0].name, "Running Out");
    }
}
