use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Attachment;

pub const ANALYZE_PATH: &str = "/analyze";
pub const QUESTION_PART_NAME: &str = "questions.txt";
pub const QUESTION_CONTENT_TYPE: &str = "text/plain";

/// Everything one analysis run sends: the trimmed question and a snapshot of
/// the attachments held when the run started.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub question: String,
    pub attachments: Vec<Attachment>,
}

impl AnalysisRequest {
    pub fn new(question: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            question: question.into(),
            attachments,
        }
    }

    /// Multipart part names in send order.
    pub fn part_names(&self) -> Vec<&str> {
        std::iter::once(QUESTION_PART_NAME)
            .chain(self.attachments.iter().map(|a| a.name.as_str()))
            .collect()
    }
}

/// Successful `/analyze` response body: a JSON object whose keys keep the
/// order they had in the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(pub Map<String, Value>);

impl AnalysisResult {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Value> for AnalysisResult {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
