//! Outcomes of `request_score` and the response envelope built from them.

use serde::{Deserialize, Serialize};

use super::records::ScoreRecord;

/// Result of asking the coordinator for a score.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// A fresh record exists.
    Ready(ScoreRecord),
    /// A computation for this restaurant is already running.
    Pending,
    /// A new computation was launched by this call.
    Started,
}

impl ScoreOutcome {
    pub fn status(&self) -> ScoreStatus {
        match self {
            ScoreOutcome::Ready(_) => ScoreStatus::Ready,
            ScoreOutcome::Pending => ScoreStatus::Pending,
            ScoreOutcome::Started => ScoreStatus::Started,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ScoreOutcome::Ready(_))
    }

    /// Consumes the outcome, returning the record if ready.
    pub fn into_record(self) -> Option<ScoreRecord> {
        match self {
            ScoreOutcome::Ready(record) => Some(record),
            _ => None,
        }
    }
}

/// Wire status of a score response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Ready,
    Pending,
    Started,
}

impl std::fmt::Display for ScoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreStatus::Ready => write!(f, "ready"),
            ScoreStatus::Pending => write!(f, "pending"),
            ScoreStatus::Started => write!(f, "started"),
        }
    }
}

/// Response envelope handed to an outer transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub status: ScoreStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ScoreRecord>,
}

impl ScoreResponse {
    /// HTTP-style status code: 200 with payload, 202 for "retry later".
    pub fn status_code(&self) -> u16 {
        match self.status {
            ScoreStatus::Ready => 200,
            ScoreStatus::Pending | ScoreStatus::Started => 202,
        }
    }

    pub fn should_retry(&self) -> bool {
        self.status != ScoreStatus::Ready
    }
}

impl From<ScoreOutcome> for ScoreResponse {
    fn from(outcome: ScoreOutcome) -> Self {
        match outcome {
            ScoreOutcome::Ready(record) => Self {
                status: ScoreStatus::Ready,
                message: "Success".to_string(),
                record: Some(record),
            },
            ScoreOutcome::Pending => Self {
                status: ScoreStatus::Pending,
                message: "Please wait, your request is still in progress".to_string(),
                record: None,
            },
            ScoreOutcome::Started => Self {
                status: ScoreStatus::Started,
                message: "Score computation started, retry later".to_string(),
                record: None,
            },
        }
    }
}
