//! # jakas
//!
//! Value-for-money scores for restaurants, computed by an LLM from customer
//! reviews.
//!
//! Scoring is slow and costly, so every request goes through a
//! [`ScoreCoordinator`]: it serves a fresh cached score when there is one,
//! reports a computation already in flight, or launches exactly one new
//! computation per restaurant.
//!
//! ## Modules
//!
//! - [`coordinator`] - Deduplicating score coordinator
//! - [`store`] - Result and review stores (SQLite, in-memory)
//! - [`cache`] - LRU front cache for score records
//! - [`scorer`] - External scorers (Gemini CLI)
//! - [`cli`] - Command line interface
//! - [`types`] - Shared types

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod coordinator;
pub mod scorer;
pub mod store;
pub mod types;

pub use coordinator::ScoreCoordinator;
pub use types::config::Config;
pub use types::errors::{JakasError, JakasResult};
pub use types::records::{RestaurantId, Review, ReviewSet, ScoreRecord};
pub use types::responses::{ScoreOutcome, ScoreResponse};
