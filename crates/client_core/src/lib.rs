use anyhow::Result;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use serde_json::Value;
use shared::{
    domain::{Attachment, DEFAULT_CONTENT_TYPE},
    protocol::{AnalysisRequest, AnalysisResult, QUESTION_CONTENT_TYPE, QUESTION_PART_NAME},
};
use tracing::{debug, info};
use url::Url;

pub mod attachments;
pub mod config;
pub mod controller;
pub mod error;
pub mod plan_loader;
pub mod render;

pub use attachments::{AttachmentListView, AttachmentRow, AttachmentSet};
pub use config::{load_settings, Settings};
pub use controller::{Alerter, FormController, ResultsView, RunControl, RunOutcome};
pub use error::AnalysisError;
pub use render::{CardBody, ErrorCard, ResultCard};

/// Sends one analysis request and returns the parsed response.
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

/// Multipart `POST` to the analysis endpoint. No timeout and no retry: a run
/// lasts as long as the server takes.
pub struct HttpAnalysisClient {
    http: Client,
    endpoint: Url,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: Client::new(),
            endpoint,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.analyze_url()?))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisTransport for HttpAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let form = build_form(request).await?;
        info!(
            endpoint = %self.endpoint,
            parts = request.attachments.len() + 1,
            "posting analysis request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(AnalysisError::Server { status, body });
        }

        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), len = bytes.len(), "analysis response received");
        let value: Value = serde_json::from_slice(&bytes)?;
        AnalysisResult::try_from(value).map_err(|other| {
            AnalysisError::Parse(format!(
                "expected a JSON object in the analysis response, got {}",
                json_kind(&other)
            ))
        })
    }
}

/// `questions.txt` first, then one part per attachment named after the file.
pub async fn build_form(request: &AnalysisRequest) -> Result<Form, AnalysisError> {
    let question = Part::bytes(request.question.clone().into_bytes())
        .file_name(QUESTION_PART_NAME)
        .mime_str(QUESTION_CONTENT_TYPE)?;
    let mut form = Form::new().part(QUESTION_PART_NAME, question);

    for attachment in &request.attachments {
        form = form.part(attachment.name.clone(), attachment_part(attachment).await?);
    }
    Ok(form)
}

async fn attachment_part(attachment: &Attachment) -> Result<Part, AnalysisError> {
    let bytes = attachments::read_attachment_bytes(attachment)
        .await
        .map_err(|err| AnalysisError::Attachment {
            name: attachment.name.clone(),
            reason: err.to_string(),
        })?;
    let content_type = match attachment.content_type().parse::<mime_guess::Mime>() {
        Ok(_) => attachment.content_type(),
        Err(_) => {
            debug!(name = %attachment.name, "unparseable content type, sending as octet-stream");
            DEFAULT_CONTENT_TYPE
        }
    };
    Ok(Part::bytes(bytes)
        .file_name(attachment.name.clone())
        .mime_str(content_type)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
