//! Scorer backed by the Gemini CLI.

use async_trait::async_trait;
use tokio::process::Command;

use super::base::{Scorer, ScorerResponse};
use crate::types::config::ScorerConfig;
use crate::types::records::{ReviewSet, ScoreEstimate};
use crate::{JakasError, JakasResult};

/// Scorer that shells out to the Gemini CLI (Google).
///
/// The invocation is not time-bounded here; the coordinator wraps every call
/// in a timeout, and the child process is killed when that future is dropped.
pub struct GeminiScorer {
    command_name: String,
    args: Vec<String>,
    model: String,
}

impl GeminiScorer {
    /// Creates a Gemini scorer with default values.
    pub fn new() -> Self {
        Self::from_config(&ScorerConfig::default())
    }

    /// Creates a scorer from the TOML configuration.
    pub fn from_config(config: &ScorerConfig) -> Self {
        Self {
            command_name: config.command.clone(),
            args: config.args.clone(),
            model: config.model.clone(),
        }
    }

    /// Returns the CLI command.
    pub fn command(&self) -> &str {
        &self.command_name
    }

    fn build_command(&self, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.command_name);
        cmd.args(&self.args);
        if !self.model.is_empty() {
            cmd.arg("-m").arg(&self.model);
        }
        cmd.arg(prompt);
        cmd.kill_on_drop(true);
        cmd
    }
}

impl Default for GeminiScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for GeminiScorer {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command_name)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn score(&self, reviews: &ReviewSet) -> JakasResult<ScoreEstimate> {
        if reviews.is_empty() {
            return Err(JakasError::ScorerFailed(
                self.name().to_string(),
                "no reviews to analyse".to_string(),
            ));
        }

        let prompt = self.build_prompt(reviews);
        tracing::debug!(
            command = %self.command_name,
            reviews = reviews.len(),
            "Invoking Gemini CLI"
        );

        match self.build_command(&prompt).output().await {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                ScorerResponse::parse_from_output(&stdout, self.name())?.into_estimate(self.name())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(JakasError::ScorerFailed(
                    self.name().to_string(),
                    stderr.trim().to_string(),
                ))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(JakasError::ScorerFailed(
                self.name().to_string(),
                format!("command '{}' not found", self.command_name),
            )),
            Err(e) => Err(JakasError::ScorerFailed(
                self.name().to_string(),
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::records::Review;

    #[tokio::test]
    async fn test_empty_reviews_are_rejected_without_spawning() {
        let scorer = GeminiScorer::from_config(&ScorerConfig::new("definitely-not-installed", &[]));
        let err = scorer.score(&ReviewSet::default()).await.unwrap_err();
        assert!(err.to_string().contains("no reviews"));
    }

    #[tokio::test]
    async fn test_missing_command_is_scorer_error() {
        let scorer =
            GeminiScorer::from_config(&ScorerConfig::new("jakas-missing-gemini-binary", &[]));
        let reviews = ReviewSet::new(vec![Review::new("Duże porcje", 5.0)]);

        let err = scorer.score(&reviews).await.unwrap_err();
        assert!(err.is_scorer());
        assert!(!scorer.is_available().await);
    }

    #[test]
    fn test_from_config() {
        let scorer = GeminiScorer::from_config(&ScorerConfig::new("gemini-dev", &["-o", "json"]));
        assert_eq!(scorer.command(), "gemini-dev");
        assert_eq!(scorer.name(), "Gemini");
    }
}
