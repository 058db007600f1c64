//! Implementation of the jakas CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cache::CachedResultStore;
use crate::coordinator::{CoordinatorOptions, ScoreCoordinator};
use crate::scorer::{GeminiScorer, Scorer};
use crate::store::{Database, ImportFile, ResultStore, ReviewStore};
use crate::types::config::Config;
use crate::types::records::{RestaurantId, ScoreRecord};
use crate::types::responses::{ScoreOutcome, ScoreResponse};
use crate::{JakasError, JakasResult};

/// Wires the coordinator to the database and the configured scorer.
pub fn build_coordinator(config: &Config, db: &Database) -> ScoreCoordinator {
    let db = Arc::new(db.clone());
    let results: Arc<dyn ResultStore> = if config.cache.enabled {
        Arc::new(CachedResultStore::new(db.clone(), config.cache.capacity))
    } else {
        db.clone()
    };

    ScoreCoordinator::new(
        results,
        db,
        Arc::new(GeminiScorer::from_config(&config.scorer)),
        CoordinatorOptions::from_config(config),
    )
}

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> JakasResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("jakas.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use 'jakas config' to modify.");
        return Ok(());
    }

    let data_dir = target_dir.join(".jakas");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(".jakas/ directory created");
    }

    update_gitignore(&target_dir)?;

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("jakas initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!("Data directory: .jakas/");
    println!();
    println!("Next steps:");
    println!("  1. Import reviews: jakas import reviews.json");
    println!("  2. Check the scorer: jakas doctor");
    println!("  3. Get a score: jakas score <restaurant-id>");

    Ok(())
}

/// Updates or creates .gitignore to include .jakas/
fn update_gitignore(target_dir: &Path) -> JakasResult<()> {
    let gitignore_path = target_dir.join(".gitignore");
    let entry = ".jakas/";
    let comment = "# jakas - local database";

    if gitignore_path.exists() {
        let content = std::fs::read_to_string(&gitignore_path)?;

        if content.lines().any(|line| line.trim() == entry || line.trim() == ".jakas") {
            tracing::debug!(".gitignore already contains .jakas/");
            return Ok(());
        }

        let mut new_content = content.trim_end().to_string();
        if !new_content.is_empty() {
            new_content.push_str("\n\n");
        }
        new_content.push_str(comment);
        new_content.push('\n');
        new_content.push_str(entry);
        new_content.push('\n');

        std::fs::write(&gitignore_path, new_content)?;
        println!(".gitignore updated with .jakas/");
    } else {
        std::fs::write(&gitignore_path, format!("{}\n{}\n", comment, entry))?;
        println!(".gitignore created with .jakas/");
    }

    Ok(())
}

/// Edits the configuration interactively.
pub async fn config_cmd(config_path: &Path) -> JakasResult<()> {
    use super::interactive::{run_interactive_config, show_config_summary};

    if config_path.exists() {
        let config = Config::load(config_path)?;
        show_config_summary(&config);
    }

    run_interactive_config(config_path)
}

/// Imports restaurants and reviews.
pub async fn import(input: &Path, config: &Config) -> JakasResult<()> {
    let file = ImportFile::load(input)?;
    let db = Database::open(&config.store.db_path)?;
    let summary = db.import(&file).await?;

    println!(
        "Imported {} restaurants and {} reviews from {}",
        summary.restaurants,
        summary.reviews,
        input.display()
    );

    Ok(())
}

/// Gets a score, waiting for the computation when needed.
pub async fn score(id: &str, json: bool, config: &Config) -> JakasResult<()> {
    let db = Database::open(&config.store.db_path)?;
    let id = RestaurantId::new(id);

    // Unknown ids never reach the coordinator
    if !db.restaurant_exists(&id).await? {
        return Err(JakasError::RestaurantNotFound(id.to_string()));
    }

    let coordinator = build_coordinator(config, &db);

    let spinner = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Scoring {}...", id));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let record = coordinator
        .await_score(&id, config.poll.max_attempts, config.poll.interval())
        .await;
    spinner.finish_and_clear();
    let record = record?;

    if json {
        let outcome = match record {
            Some(record) => ScoreOutcome::Ready(record),
            None => ScoreOutcome::Pending,
        };
        println!("{}", serde_json::to_string_pretty(&ScoreResponse::from(outcome))?);
        return Ok(());
    }

    match record {
        Some(record) => print_record(&record, config),
        None => {
            println!(
                "Score for {} is not ready after {} attempts. Check the logs and try again later.",
                id, config.poll.max_attempts
            );
        }
    }

    Ok(())
}

/// Shows stored scores.
pub async fn show(id: Option<&str>, config: &Config) -> JakasResult<()> {
    let db = Database::open(&config.store.db_path)?;

    let records = match id {
        Some(id) => db.get(&RestaurantId::new(id)).await?.into_iter().collect(),
        None => db.list().await?,
    };

    if records.is_empty() {
        println!("No scores stored.");
        return Ok(());
    }

    for record in &records {
        print_record(record, config);
    }

    Ok(())
}

fn print_record(record: &ScoreRecord, config: &Config) {
    let fresh = record.is_fresh(config.cache.ttl(), Utc::now());
    println!("{}", record.restaurant_id);
    println!("  compareFun:  {:.3}", record.compare_fun);
    println!("  comment:     {}", record.ai_comment);
    println!(
        "  computed at: {} ({})",
        record.computed_at.to_rfc3339(),
        if fresh { "fresh" } else { "stale" }
    );
    println!("  reviews:     {}", record.review_count);
}

/// Diagnoses configuration problems.
pub async fn doctor(config_path: &Path, config: &Config) -> JakasResult<()> {
    println!("Diagnosing jakas configuration...\n");

    let mut issues: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if config_path.exists() {
        println!("✓ Configuration loaded from {}", config_path.display());
    } else {
        warnings.push(format!(
            "{} not found, using defaults (run 'jakas init')",
            config_path.display()
        ));
    }

    match Database::open(&config.store.db_path) {
        Ok(db) => match db.counts().await {
            Ok(counts) => {
                println!(
                    "✓ Database {} ({} restaurants, {} reviews, {} scores)",
                    config.store.db_path.display(),
                    counts.restaurants,
                    counts.reviews,
                    counts.scores
                );
                if counts.restaurants == 0 {
                    warnings.push("No restaurants imported (run 'jakas import')".to_string());
                }
            }
            Err(e) => issues.push(format!("Database query failed: {}", e)),
        },
        Err(e) => issues.push(format!(
            "Cannot open database {}: {}",
            config.store.db_path.display(),
            e
        )),
    }

    let scorer = GeminiScorer::from_config(&config.scorer);
    if scorer.is_available().await {
        println!(
            "✓ {} is available (command: {})",
            scorer.name(),
            scorer.command()
        );
    } else {
        issues.push(format!(
            "{} is not installed (expected command: {})",
            scorer.name(),
            scorer.command()
        ));
    }

    println!(
        "✓ Scores stay fresh for {}s, scorer timeout {}s",
        config.cache.ttl_secs, config.scorer.timeout_secs
    );

    println!();
    if issues.is_empty() && warnings.is_empty() {
        println!("✓ All good! jakas is ready to use.");
    } else {
        if !warnings.is_empty() {
            println!("Warnings:");
            for warning in warnings {
                println!("  ⚠ {}", warning);
            }
        }
        if !issues.is_empty() {
            println!("Problems:");
            for issue in issues {
                println!("  ✗ {}", issue);
            }
        }
    }

    Ok(())
}

/// Shows version.
pub fn version() {
    println!("jakas {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Value-for-money restaurant scores");
}
