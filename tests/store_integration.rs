//! Integration tests for the SQLite store.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use jakas::cache::CachedResultStore;
use jakas::coordinator::{CoordinatorOptions, ScoreCoordinator};
use jakas::scorer::{standard_comment, Scorer};
use jakas::store::{Database, ImportFile, ResultStore, ReviewStore};
use jakas::types::records::{RestaurantId, ReviewSet, ScoreEstimate, ScoreRecord};
use jakas::types::responses::ScoreOutcome;
use jakas::JakasResult;

fn temp_db_path() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("data").join("jakas.db");
    (temp_dir, db_path)
}

fn sample_import() -> ImportFile {
    serde_json::from_str(
        r#"{
            "restaurants": [
                {
                    "id": "r1",
                    "name": "Bar Mleczny",
                    "reviews": [
                        {"textReviews": "Pierogi za grosze, porcje ogromne", "rating": 5, "averagePrice": 25},
                        {"review": "Kolejka długa", "rating": 3}
                    ]
                },
                {
                    "id": "r2",
                    "name": "Sushi Premium",
                    "reviews": [
                        {"text": "Drogo i mało", "rating": 2, "averagePrice": 180}
                    ]
                }
            ]
        }"#,
    )
    .expect("sample import should parse")
}

struct ConstantScorer;

#[async_trait::async_trait]
impl Scorer for ConstantScorer {
    fn name(&self) -> &str {
        "constant"
    }

    async fn score(&self, reviews: &ReviewSet) -> JakasResult<ScoreEstimate> {
        let compare_fun = if reviews.len() > 1 { 0.9 } else { 0.1 };
        Ok(ScoreEstimate::new(compare_fun, standard_comment(compare_fun)))
    }
}

mod persistence {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let (_temp_dir, db_path) = temp_db_path();
        let db = Database::open(&db_path).expect("Failed to open database");

        assert!(db_path.exists());
        assert_eq!(db.counts().await.unwrap().scores, 0);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let (_temp_dir, db_path) = temp_db_path();
        let computed_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        {
            let db = Database::open(&db_path).unwrap();
            db.put(ScoreRecord::new(
                "r1".into(),
                ScoreEstimate::new(0.82, "Najesz się niewielkim kosztem"),
                &ReviewSet::default(),
                computed_at,
            ))
            .await
            .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let record = db.get(&"r1".into()).await.unwrap().expect("record should persist");
        assert_eq!(record.compare_fun, 0.82);
        assert_eq!(record.ai_comment, "Najesz się niewielkim kosztem");
        assert_eq!(record.computed_at, computed_at);
        assert_eq!(record.review_count, 0);
    }

    #[tokio::test]
    async fn test_put_replaces_previous_record() {
        let db = Database::open_in_memory().unwrap();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        for (compare_fun, comment) in [(0.3, "Dużo wydasz i się nie najesz"), (0.7, "Mogłoby być lepiej")] {
            db.put(ScoreRecord::new(
                "r1".into(),
                ScoreEstimate::new(compare_fun, comment),
                &ReviewSet::default(),
                t,
            ))
            .await
            .unwrap();
        }

        let records = db.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].compare_fun, 0.7);
    }
}

mod import {
    use super::*;

    #[tokio::test]
    async fn test_import_restaurants_and_reviews() {
        let db = Database::open_in_memory().unwrap();
        let summary = db.import(&sample_import()).await.unwrap();

        assert_eq!(summary.restaurants, 2);
        assert_eq!(summary.reviews, 3);

        let reviews = db.list_reviews(&"r1".into()).await.unwrap();
        assert_eq!(reviews.len(), 2);
        let first = reviews.iter().next().unwrap();
        assert_eq!(first.text, "Pierogi za grosze, porcje ogromne");
        assert_eq!(first.average_price, Some(25.0));

        assert!(db.restaurant_exists(&"r2".into()).await.unwrap());
        assert!(!db.restaurant_exists(&"r3".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_reimport_replaces_reviews() {
        let db = Database::open_in_memory().unwrap();
        db.import(&sample_import()).await.unwrap();
        db.import(&sample_import()).await.unwrap();

        let counts = db.counts().await.unwrap();
        assert_eq!(counts.restaurants, 2);
        assert_eq!(counts.reviews, 3);
    }

    #[tokio::test]
    async fn test_import_file_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reviews.json");
        std::fs::write(&path, serde_json::to_string(&sample_import()).unwrap()).unwrap();

        let file = ImportFile::load(&path).unwrap();
        assert_eq!(file.restaurants.len(), 2);
        assert_eq!(file.restaurants[1].name, "Sushi Premium");
    }
}

mod coordinated {
    use super::*;

    #[tokio::test]
    async fn test_coordinator_over_cached_database() {
        let (_temp_dir, db_path) = temp_db_path();
        let db = Arc::new(Database::open(&db_path).unwrap());
        db.import(&sample_import()).await.unwrap();

        let cache = Arc::new(CachedResultStore::new(db.clone(), 10));
        let coordinator = ScoreCoordinator::new(
            cache.clone(),
            db.clone(),
            Arc::new(ConstantScorer),
            CoordinatorOptions::default(),
        );

        for id in ["r1", "r2"] {
            let id = RestaurantId::from(id);
            assert_eq!(coordinator.request_score(&id).await.unwrap(), ScoreOutcome::Started);
            coordinator.wait_settled(&id).await;
        }

        let r1 = coordinator.request_score(&"r1".into()).await.unwrap().into_record().unwrap();
        assert_eq!(r1.compare_fun, 0.9);
        assert_eq!(r1.ai_comment, "Najesz się niewielkim kosztem");
        assert_eq!(r1.review_count, 2);

        // Written through to the database
        let r2 = db.get(&"r2".into()).await.unwrap().unwrap();
        assert_eq!(r2.compare_fun, 0.1);
        assert_eq!(r2.ai_comment, "Dużo wydasz i się nie najesz");

        assert!(cache.stats().hits >= 1);
    }
}
