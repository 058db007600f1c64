//! External scorers.
//!
//! A scorer turns the reviews of one restaurant into a value-for-money
//! estimate. Scorers are slow, costly and unreliable; the coordinator makes
//! sure each one is invoked at most once per restaurant at a time.

mod base;
mod gemini;

pub use base::{standard_comment, Scorer, ScorerResponse};
pub use gemini::GeminiScorer;
