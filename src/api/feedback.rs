use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::feedback::{FeedbackResponse, StudentResponse, SubmitRequest};
use crate::services::extract;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_json)).route("/document", post(submit_document))
}

/// JSON submission: `{"name"?, "email"?, "response": {"Point"?, "Evidence"?,
/// "Explanation"?}}`.
async fn submit_json(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    payload.validate().map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let response = payload.response.unwrap_or_default();
    if response.is_missing() {
        return Err(ApiError::BadRequest("No response data received".to_string()));
    }

    process(&state, payload.name.as_deref(), payload.email.as_deref(), &response, "json").await
}

/// PDF submission: multipart form with a single `file` part holding the
/// filled-in response template.
async fn submit_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let max_bytes = state.settings().upload().max_upload_size_mb * 1024 * 1024;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
        {
            let next_size = bytes.len() as u64 + chunk.len() as u64;
            if next_size > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    state.settings().upload().max_upload_size_mb
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        file_bytes = Some(bytes);
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;

    let form = extract::from_pdf(&file_bytes).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    if form.response.is_missing() {
        return Err(ApiError::BadRequest("No response data received".to_string()));
    }

    process(&state, form.name.as_deref(), form.email.as_deref(), &form.response, "pdf").await
}

/// Shared pipeline: generate feedback and grade, then notify the teacher
/// best-effort. A generation failure aborts the request; a delivery failure
/// only clears the `notified` flag.
async fn process(
    state: &AppState,
    name: Option<&str>,
    email: Option<&str>,
    response: &StudentResponse,
    source: &'static str,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let submission_id = Uuid::new_v4();
    metrics::counter!("feedback_requests_total", "source" => source).increment(1);
    tracing::info!(submission_id = %submission_id, source, "Processing feedback request");

    let generated = match state.feedback().generate(response).await {
        Ok(generated) => generated,
        Err(err) => {
            metrics::counter!("feedback_failures_total", "stage" => "generation").increment(1);
            tracing::warn!(submission_id = %submission_id, error = %err, "Feedback generation failed");
            return Err(ApiError::BadGateway(err.to_string()));
        }
    };

    let notified = match state.mailer() {
        Some(mailer) => match mailer.send_feedback(name, email, &generated.feedback).await {
            Ok(()) => {
                metrics::counter!("feedback_emails_total", "outcome" => "sent").increment(1);
                tracing::info!(submission_id = %submission_id, "Feedback sent to teacher");
                true
            }
            Err(err) => {
                metrics::counter!("feedback_emails_total", "outcome" => "failed").increment(1);
                tracing::warn!(submission_id = %submission_id, error = %err, "Failed to email teacher");
                false
            }
        },
        None => {
            metrics::counter!("feedback_emails_total", "outcome" => "skipped").increment(1);
            tracing::warn!(submission_id = %submission_id, "SMTP not configured; skipping teacher notification");
            false
        }
    };

    tracing::info!(submission_id = %submission_id, grade = %generated.grade, notified, "Feedback request completed");

    Ok(Json(FeedbackResponse {
        feedback: generated.feedback,
        grade: Some(generated.grade),
        notified,
    }))
}
