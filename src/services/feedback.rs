use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::core::config::Settings;
use crate::schemas::feedback::StudentResponse;
use crate::services::rubric::{self, RubricLevel};

#[derive(Debug, Clone)]
pub(crate) struct FeedbackService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Error)]
pub(crate) enum FeedbackError {
    #[error("OpenAI API error: {0}")]
    Provider(String),
    #[error("Failed to call OpenAI API: {0}")]
    Request(String),
    #[error("OpenAI response is missing generated content")]
    MissingContent,
}

/// Feedback text with the locally computed rubric grade appended.
#[derive(Debug, Clone)]
pub(crate) struct GradedFeedback {
    pub(crate) feedback: String,
    pub(crate) grade: RubricLevel,
}

impl FeedbackService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.ai().ai_request_timeout);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.ai().openai_api_key.clone(),
            base_url: settings.ai().openai_base_url.trim_end_matches('/').to_string(),
            model: settings.ai().ai_model.clone(),
            max_tokens: settings.ai().ai_max_tokens,
            temperature: settings.ai().ai_temperature,
        })
    }

    /// Generate feedback for a response and grade it against the rubric.
    ///
    /// The grade is computed locally and does not depend on the generated
    /// text; a single non-retried completion request produces the feedback.
    pub(crate) async fn generate(
        &self,
        response: &StudentResponse,
    ) -> Result<GradedFeedback, FeedbackError> {
        let timer = Instant::now();
        let prompt = build_prompt(response);

        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        });

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| FeedbackError::Request(err.to_string()))?;

        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(FeedbackError::Provider(provider_message(&body, status.as_u16())));
        }

        let content = body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str())
            .ok_or(FeedbackError::MissingContent)?
            .trim();

        let grade = rubric::grade(response);
        let tokens_used = body
            .get("usage")
            .and_then(|usage| usage.get("total_tokens"))
            .and_then(|value| value.as_u64());

        tracing::info!(
            duration_seconds = timer.elapsed().as_secs_f64(),
            tokens_used = tokens_used,
            grade = %grade,
            "Feedback generation completed"
        );

        Ok(GradedFeedback { feedback: format!("{content}\n\nGrade: {grade}"), grade })
    }
}

fn build_prompt(response: &StudentResponse) -> String {
    format!(
        "Provide feedback for the following response:\n\n\
         Point: {}\n\
         Evidence: {}\n\
         Explanation: {}\n\n\
         Feedback should:\n\
         1. Be clear and simple enough for an 11-year-old to understand.\n\
         2. Be encouraging, highlighting strengths.\n\
         3. Be constructive, offering suggestions for improvement.\n",
        field_or_na(&response.point),
        field_or_na(&response.evidence),
        field_or_na(&response.explanation)
    )
}

fn field_or_na(field: &Option<String>) -> &str {
    match field.as_deref() {
        Some(value) if !value.trim().is_empty() => value,
        _ => "N/A",
    }
}

/// Prefer the provider's own error message; fall back to the raw body.
fn provider_message(body: &Value, status: u16) -> String {
    body.get("error")
        .and_then(|error| error.get("message"))
        .and_then(|value| value.as_str())
        .map(|message| message.to_string())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"))
}
