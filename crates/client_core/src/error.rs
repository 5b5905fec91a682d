use reqwest::StatusCode;
use thiserror::Error;

/// Why an analysis run did not produce results. `Display` is the text shown
/// on the error card.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Transport(String),
    #[error("Server Error: {} - {body}", status.as_u16())]
    Server { status: StatusCode, body: String },
    #[error("{0}")]
    Parse(String),
    #[error("failed to read attachment '{name}': {reason}")]
    Attachment { name: String, reason: String },
}

impl AnalysisError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
