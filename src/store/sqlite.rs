//! SQLite-backed stores.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::Mutex;

use crate::types::records::{RestaurantId, Review, ReviewSet, ScoreRecord};
use crate::JakasResult;

use super::{ResultStore, ReviewStore};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS restaurants (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        restaurant_id TEXT NOT NULL REFERENCES restaurants(id),
        review TEXT NOT NULL,
        rating REAL,
        average_price REAL
    );

    CREATE TABLE IF NOT EXISTS scores (
        restaurant_id TEXT PRIMARY KEY,
        compare_fun REAL NOT NULL,
        ai_comment TEXT NOT NULL,
        computed_at TEXT NOT NULL,
        reviews_digest TEXT NOT NULL DEFAULT '',
        review_count INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_reviews_restaurant ON reviews(restaurant_id);
"#;

/// Row counts, reported by `jakas doctor`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseCounts {
    pub restaurants: usize,
    pub reviews: usize,
    pub scores: usize,
}

/// Shared handle to the jakas database.
///
/// Cloning is cheap; all clones use the same connection. Implements both
/// [`ResultStore`] (`scores` table) and [`ReviewStore`] (`restaurants` and
/// `reviews` tables).
#[derive(Clone)]
pub struct Database {
    // Mutex rather than RwLock: rusqlite::Connection is not Sync
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database file, creating parent directories.
    pub fn open(db_path: &Path) -> JakasResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        tracing::debug!(path = %db_path.display(), "Database opened");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> JakasResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> JakasResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Counts rows in each table.
    pub async fn counts(&self) -> JakasResult<DatabaseCounts> {
        let conn = self.conn.lock().await;
        let count = |table: &str| -> JakasResult<usize> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(n as usize)
        };

        Ok(DatabaseCounts {
            restaurants: count("restaurants")?,
            reviews: count("reviews")?,
            scores: count("scores")?,
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ScoreRecord> {
    let computed_at: String = row.get(3)?;
    let computed_at = DateTime::parse_from_rfc3339(&computed_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(ScoreRecord {
        restaurant_id: RestaurantId::new(row.get::<_, String>(0)?),
        compare_fun: row.get(1)?,
        ai_comment: row.get(2)?,
        computed_at,
        reviews_digest: row.get(4)?,
        review_count: row.get::<_, i64>(5)? as usize,
    })
}

#[async_trait]
impl ResultStore for Database {
    async fn get(&self, id: &RestaurantId) -> JakasResult<Option<ScoreRecord>> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                "SELECT restaurant_id, compare_fun, ai_comment, computed_at,
                        reviews_digest, review_count
                 FROM scores WHERE restaurant_id = ?",
                params![id.as_str()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn put(&self, record: ScoreRecord) -> JakasResult<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO scores (restaurant_id, compare_fun, ai_comment,
                                            computed_at, reviews_digest, review_count)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.restaurant_id.as_str(),
                record.compare_fun,
                record.ai_comment,
                record.computed_at.to_rfc3339(),
                record.reviews_digest,
                record.review_count as i64
            ],
        )?;
        Ok(())
    }

    async fn list(&self) -> JakasResult<Vec<ScoreRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT restaurant_id, compare_fun, ai_comment, computed_at,
                    reviews_digest, review_count
             FROM scores ORDER BY restaurant_id",
        )?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

#[async_trait]
impl ReviewStore for Database {
    async fn list_reviews(&self, id: &RestaurantId) -> JakasResult<ReviewSet> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT review, rating, average_price FROM reviews
             WHERE restaurant_id = ? ORDER BY id",
        )?;
        let reviews = stmt
            .query_map(params![id.as_str()], |row| {
                Ok(Review {
                    text: row.get(0)?,
                    rating: row.get(1)?,
                    average_price: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ReviewSet::new(reviews))
    }

    async fn restaurant_exists(&self, id: &RestaurantId) -> JakasResult<bool> {
        let conn = self.conn.lock().await;
        let exists = conn
            .query_row(
                "SELECT 1 FROM restaurants WHERE id = ?",
                params![id.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }
}
