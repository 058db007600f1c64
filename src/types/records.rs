//! Domain records handled by the score coordinator.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Opaque, stable restaurant identifier supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    /// Creates a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RestaurantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RestaurantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A single customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Free-form review text.
    #[serde(alias = "review", alias = "comment", alias = "textReviews")]
    pub text: String,

    /// Star rating, when the reviewer left one.
    #[serde(default)]
    pub rating: Option<f64>,

    /// Average price paid, when the reviewer reported one.
    #[serde(default, alias = "average_price")]
    pub average_price: Option<f64>,
}

impl Review {
    /// Creates a new review.
    pub fn new(text: impl Into<String>, rating: f64) -> Self {
        Self {
            text: text.into(),
            rating: Some(rating),
            average_price: None,
        }
    }

    /// Sets the average price.
    #[must_use]
    pub fn with_average_price(mut self, price: f64) -> Self {
        self.average_price = Some(price);
        self
    }
}

/// Ordered reviews of one restaurant. Empty when the restaurant has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewSet(Vec<Review>);

impl ReviewSet {
    /// Creates a review set.
    pub fn new(reviews: Vec<Review>) -> Self {
        Self(reviews)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.0.iter()
    }

    /// SHA-256 over the reviews in order.
    ///
    /// Two sets with the same reviews in the same order share a digest, so a
    /// record can tell whether the reviews it was computed from have changed.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for review in &self.0 {
            hasher.update(review.text.trim().as_bytes());
            hasher.update([0u8]);
            hash_optional(&mut hasher, review.rating);
            hash_optional(&mut hasher, review.average_price);
        }
        hex::encode(hasher.finalize())
    }
}

fn hash_optional(hasher: &mut Sha256, value: Option<f64>) {
    match value {
        Some(v) => {
            hasher.update([1u8]);
            hasher.update(v.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
}

impl From<Vec<Review>> for ReviewSet {
    fn from(reviews: Vec<Review>) -> Self {
        Self(reviews)
    }
}

/// Output of one scorer invocation, before it is stamped into a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEstimate {
    /// Value-for-money score.
    pub compare_fun: f64,

    /// Short comment on the score.
    pub ai_comment: String,
}

impl ScoreEstimate {
    pub fn new(compare_fun: f64, ai_comment: impl Into<String>) -> Self {
        Self {
            compare_fun,
            ai_comment: ai_comment.into(),
        }
    }
}

/// Most recent computed score of a restaurant.
///
/// Records are never mutated; a newer computation replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub restaurant_id: RestaurantId,
    pub compare_fun: f64,
    pub ai_comment: String,
    pub computed_at: DateTime<Utc>,

    /// Digest of the review set the score was computed from.
    #[serde(default)]
    pub reviews_digest: String,

    #[serde(default)]
    pub review_count: usize,
}

impl ScoreRecord {
    /// Stamps a scorer estimate into a record.
    pub fn new(
        restaurant_id: RestaurantId,
        estimate: ScoreEstimate,
        reviews: &ReviewSet,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            restaurant_id,
            compare_fun: estimate.compare_fun,
            ai_comment: estimate.ai_comment,
            computed_at,
            reviews_digest: reviews.digest(),
            review_count: reviews.len(),
        }
    }

    /// Age of the record at `now`. A record stamped in the future has age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.computed_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the record is still usable at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) < ttl
    }
}

/// Marks a computation that has been accepted and has not settled yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlightMarker {
    pub restaurant_id: RestaurantId,
    pub started_at: DateTime<Utc>,

    /// Identifies this attempt in logs.
    pub attempt_id: Uuid,
}

impl InFlightMarker {
    pub fn new(restaurant_id: RestaurantId, started_at: DateTime<Utc>) -> Self {
        Self {
            restaurant_id,
            started_at,
            attempt_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn record_at(secs: i64) -> ScoreRecord {
        ScoreRecord::new(
            "r1".into(),
            ScoreEstimate::new(0.9, "Najesz się niewielkim kosztem"),
            &ReviewSet::default(),
            t(secs),
        )
    }

    #[test]
    fn test_freshness_boundary() {
        let record = record_at(0);
        let ttl = Duration::from_secs(600);

        assert!(record.is_fresh(ttl, t(6)));
        assert!(record.is_fresh(ttl, t(599)));
        // Age equal to TTL is already stale
        assert!(!record.is_fresh(ttl, t(600)));
        assert!(!record.is_fresh(ttl, t(700)));
    }

    #[test]
    fn test_future_record_is_fresh() {
        let record = record_at(100);
        assert_eq!(record.age(t(0)), Duration::ZERO);
        assert!(record.is_fresh(Duration::from_secs(1), t(0)));
    }

    #[test]
    fn test_zero_ttl_never_fresh() {
        let record = record_at(0);
        assert!(!record.is_fresh(Duration::ZERO, t(0)));
    }

    #[test]
    fn test_review_digest_tracks_content() {
        let a = ReviewSet::new(vec![Review::new("Ogromne porcje", 5.0).with_average_price(40.0)]);
        let b = ReviewSet::new(vec![Review::new("Ogromne porcje", 5.0).with_average_price(40.0)]);
        let c = ReviewSet::new(vec![Review::new("Małe porcje", 2.0).with_average_price(40.0)]);

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn test_review_accepts_original_field_names() {
        let review: Review =
            serde_json::from_str(r#"{"review": "Duże porcje", "rating": 4, "average_price": 35}"#)
                .unwrap();
        assert_eq!(review.text, "Duże porcje");
        assert_eq!(review.average_price, Some(35.0));

        let review: Review = serde_json::from_str(r#"{"comment": "ok", "rating": 3}"#).unwrap();
        assert_eq!(review.average_price, None);
    }

    #[test]
    fn test_missing_rating_is_not_zero() {
        let review: Review = serde_json::from_str(r#"{"review": "Bez gwiazdek"}"#).unwrap();
        assert_eq!(review.rating, None);

        let unrated = ReviewSet::new(vec![review]);
        let zero = ReviewSet::new(vec![Review::new("Bez gwiazdek", 0.0)]);
        assert_ne!(unrated.digest(), zero.digest());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let value = serde_json::to_value(record_at(0)).unwrap();
        assert_eq!(value["restaurantId"], "r1");
        assert_eq!(value["aiComment"], "Najesz się niewielkim kosztem");
        assert!(value.get("computedAt").is_some());
    }
}
