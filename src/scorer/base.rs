//! Base trait for scorers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::records::{ReviewSet, ScoreEstimate};
use crate::{JakasError, JakasResult};

/// Trait for value-for-money scorers.
///
/// Implementations wrap an external model. They are expected to fail now and
/// then (timeouts, rate limits, unparseable answers); callers never let those
/// failures escape the computation that triggered them.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Returns the scorer name.
    fn name(&self) -> &str;

    /// Checks whether the scorer can be reached at all.
    async fn is_available(&self) -> bool {
        true
    }

    /// Scores a review set.
    async fn score(&self, reviews: &ReviewSet) -> JakasResult<ScoreEstimate>;

    /// Builds the prompt sent to the model.
    fn build_prompt(&self, reviews: &ReviewSet) -> String {
        let items: Vec<PromptReview<'_>> = reviews
            .iter()
            .map(|r| PromptReview {
                text_reviews: &r.text,
                rating: r.rating,
                average_price: r.average_price,
            })
            .collect();
        let data = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());

        let mut prompt = String::from(
            "Wszystkie recenzje są w języku polskim. \
             Proszę, przeprowadź analizę oraz generuj odpowiedzi w języku polskim.\n\n",
        );

        prompt.push_str("You are given a JSON array of reviews of a single restaurant.\n");
        prompt.push_str("Each review has the fields textReviews, rating and averagePrice.\n");
        prompt.push_str("rating or averagePrice may be null; leave those reviews out of that average.\n\n");
        prompt.push_str("1. Rate the portion size described in each review from 1 to 10 (f).\n");
        prompt.push_str("2. Compute avg_f, avg_rating and avg_price over all reviews.\n");
        prompt.push_str("3. compareFun = avg_f * avg_rating * (1 / avg_price)\n");
        prompt.push_str("4. aiComment, in Polish:\n");
        prompt.push_str("   above 0.8: \"Najesz się niewielkim kosztem\"\n");
        prompt.push_str("   0.5 to 0.8: \"Mogłoby być lepiej\"\n");
        prompt.push_str("   below 0.5: \"Dużo wydasz i się nie najesz\"\n\n");

        prompt.push_str("Respond with JSON only, in the format:\n");
        prompt.push_str("{\n");
        prompt.push_str("  \"compareFun\": 0.0,\n");
        prompt.push_str("  \"aiComment\": \"komentarz\"\n");
        prompt.push_str("}\n\n");

        prompt.push_str("JSON Data:\n");
        prompt.push_str(&data);
        prompt.push('\n');

        prompt
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptReview<'a> {
    text_reviews: &'a str,
    rating: Option<f64>,
    average_price: Option<f64>,
}

/// Standardised comment for a score, used when the model leaves it empty.
pub fn standard_comment(compare_fun: f64) -> &'static str {
    if compare_fun > 0.8 {
        "Najesz się niewielkim kosztem"
    } else if compare_fun >= 0.5 {
        "Mogłoby być lepiej"
    } else {
        "Dużo wydasz i się nie najesz"
    }
}

/// Parsed answer of a scorer.
#[derive(Debug, Deserialize)]
pub struct ScorerResponse {
    #[serde(rename = "compareFun", alias = "compare_fun")]
    pub compare_fun: f64,

    #[serde(default, rename = "aiComment", alias = "ai_comment")]
    pub ai_comment: String,
}

impl ScorerResponse {
    /// Parses model output.
    ///
    /// Accepts Markdown code fences, a CLI envelope of the form
    /// `{"response": "<model text>"}`, a bare `{compareFun, aiComment}` object
    /// and an `{"analysisResults": [...]}` wrapper (first entry wins).
    pub fn parse_from_output(output: &str, scorer_name: &str) -> JakasResult<Self> {
        let cleaned = strip_code_fences(output);

        if let Ok(value) = serde_json::from_str::<Value>(cleaned.trim()) {
            if let Some(Value::String(inner)) = value.get("response") {
                return Self::parse_from_output(inner, scorer_name);
            }
            return Self::from_value(value, scorer_name);
        }

        let json_start = cleaned.find('{');
        let json_end = cleaned.rfind('}');

        match (json_start, json_end) {
            (Some(start), Some(end)) if start < end => {
                let value: Value = serde_json::from_str(&cleaned[start..=end]).map_err(|e| {
                    JakasError::InvalidScorerOutput(
                        scorer_name.to_string(),
                        format!("failed to parse JSON: {}", e),
                    )
                })?;
                Self::from_value(value, scorer_name)
            }
            _ => Err(JakasError::InvalidScorerOutput(
                scorer_name.to_string(),
                "response contains no JSON object".to_string(),
            )),
        }
    }

    fn from_value(value: Value, scorer_name: &str) -> JakasResult<Self> {
        let body = match value.get("analysisResults") {
            Some(Value::Array(items)) => items.first().cloned().ok_or_else(|| {
                JakasError::InvalidScorerOutput(
                    scorer_name.to_string(),
                    "analysisResults is empty".to_string(),
                )
            })?,
            _ => value,
        };

        serde_json::from_value(body).map_err(|e| {
            JakasError::InvalidScorerOutput(scorer_name.to_string(), e.to_string())
        })
    }

    /// Validates the response and converts it into an estimate.
    pub fn into_estimate(self, scorer_name: &str) -> JakasResult<ScoreEstimate> {
        if !self.compare_fun.is_finite() || self.compare_fun < 0.0 {
            return Err(JakasError::InvalidScorerOutput(
                scorer_name.to_string(),
                format!("compareFun out of range: {}", self.compare_fun),
            ));
        }

        let comment = self.ai_comment.trim();
        let ai_comment = if comment.is_empty() {
            standard_comment(self.compare_fun).to_string()
        } else {
            comment.to_string()
        };

        Ok(ScoreEstimate::new(self.compare_fun, ai_comment))
    }
}

fn strip_code_fences(output: &str) -> String {
    output.replace("```json", "").replace("```", "")
}
