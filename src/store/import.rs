//! Review import from JSON files.

use std::path::Path;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::types::records::Review;
use crate::JakasResult;

use super::sqlite::Database;

/// Import file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportFile {
    pub restaurants: Vec<ImportedRestaurant>,
}

/// A restaurant and all of its reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedRestaurant {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub restaurants: usize,
    pub reviews: usize,
}

impl ImportFile {
    /// Reads an import file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> JakasResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Database {
    /// Upserts restaurants and replaces their reviews, in one transaction.
    ///
    /// Stored scores are left untouched; they go stale through TTL or, when
    /// enabled, through the review digest check.
    pub async fn import(&self, file: &ImportFile) -> JakasResult<ImportSummary> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut summary = ImportSummary::default();

        for restaurant in &file.restaurants {
            tx.execute(
                "INSERT INTO restaurants (id, name) VALUES (?, ?)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name",
                params![restaurant.id, restaurant.name],
            )?;
            tx.execute(
                "DELETE FROM reviews WHERE restaurant_id = ?",
                params![restaurant.id],
            )?;

            for review in &restaurant.reviews {
                tx.execute(
                    "INSERT INTO reviews (restaurant_id, review, rating, average_price)
                     VALUES (?, ?, ?, ?)",
                    params![
                        restaurant.id,
                        review.text,
                        review.rating,
                        review.average_price
                    ],
                )?;
                summary.reviews += 1;
            }

            summary.restaurants += 1;
        }

        tx.commit()?;

        tracing::info!(
            restaurants = summary.restaurants,
            reviews = summary.reviews,
            "Reviews imported"
        );

        Ok(summary)
    }
}
