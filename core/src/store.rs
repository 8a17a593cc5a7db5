//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The loader and the query service call store methods — they never
//! execute SQL directly.
//!
//! All access goes through a bounded r2d2 pool; the pooled-connection
//! guard returns the connection on drop, on every exit path.

use crate::{error::AnalyticsResult, types::ActivityRecord};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::sync::atomic::{AtomicU64, Ordering};

mod aggregates;
pub use aggregates::{FailureRate, KycFunnel, MonthlyActive, ProductAdoption, TopMerchant};

/// Sequence for unique shared-memory database names, so each in-memory
/// store is isolated while all of its pooled connections share one
/// database.
static MEMORY_DB_SEQ: AtomicU64 = AtomicU64::new(0);

pub(crate) type StoreConn = PooledConnection<SqliteConnectionManager>;

/// Handle on the merchant_activities table. Cheap to clone; every clone
/// shares the same bounded connection pool.
#[derive(Clone)]
pub struct ActivityStore {
    pool: Pool<SqliteConnectionManager>,
}

impl ActivityStore {
    /// Open (or create) a database with a bounded connection pool.
    pub fn open(path: &str, pool_size: u32) -> AnalyticsResult<Self> {
        let manager = SqliteConnectionManager::file(path).with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        );
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Ok(Self { pool })
    }

    /// Open an in-memory database (used in tests). Shared-cache URI so all
    /// pooled connections see the same data.
    pub fn in_memory() -> AnalyticsResult<Self> {
        let seq = MEMORY_DB_SEQ.fetch_add(1, Ordering::Relaxed);
        let uri = format!("file:analytics_mem_{seq}?mode=memory&cache=shared");
        Self::open(&uri, 4)
    }

    /// Acquire a pooled connection.
    pub(crate) fn conn(&self) -> AnalyticsResult<StoreConn> {
        Ok(self.pool.get()?)
    }

    /// Create the merchant_activities table and its five supporting
    /// indexes, one per aggregate query. Idempotent; called on every
    /// startup. A failure here is fatal to the caller; nothing else can
    /// run without the table.
    pub fn ensure_schema(&self) -> AnalyticsResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS merchant_activities (
                event_id        TEXT,
                merchant_id     VARCHAR(20),
                event_timestamp TIMESTAMP,
                product         VARCHAR(20),
                event_type      VARCHAR(30),
                amount          NUMERIC(18, 2) DEFAULT 0,
                status          VARCHAR(10),
                channel         VARCHAR(10),
                region          TEXT,
                merchant_tier   VARCHAR(10)
            );
            CREATE INDEX IF NOT EXISTS idx_status ON merchant_activities(status);
            CREATE INDEX IF NOT EXISTS idx_product_status ON merchant_activities(product, status);
            CREATE INDEX IF NOT EXISTS idx_merchant_status ON merchant_activities(merchant_id, status);
            CREATE INDEX IF NOT EXISTS idx_timestamp ON merchant_activities(event_timestamp);
            CREATE INDEX IF NOT EXISTS idx_kyc ON merchant_activities(product, event_type, status);",
        )?;
        Ok(())
    }

    /// Insert one normalized record. Autocommit per statement; a later
    /// failure in the same file never rolls this back.
    pub fn insert_activity(&self, rec: &ActivityRecord) -> AnalyticsResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO merchant_activities
                (event_id, merchant_id, event_timestamp, product,
                 event_type, amount, status, channel, region, merchant_tier)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &rec.event_id,
                &rec.merchant_id,
                &rec.event_timestamp,
                &rec.product,
                &rec.event_type,
                rec.amount,
                &rec.status,
                &rec.channel,
                &rec.region,
                &rec.merchant_tier,
            ],
        )?;
        Ok(())
    }

    /// Total stored rows. Used by the runner's end-of-run summary.
    pub fn activity_count(&self) -> AnalyticsResult<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM merchant_activities", [], |row| {
            row.get(0)
        })
        .map_err(Into::into)
    }
}
