use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::feedback::FeedbackService;
use crate::services::notify::Mailer;

/// Tests that touch process env must hold this lock.
pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("PEE_ENV", "test");
    std::env::set_var("PEE_STRICT_CONFIG", "0");
    std::env::remove_var("PROJECT_NAME");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
    std::env::set_var("PROMETHEUS_ENABLED", "0");

    // Nothing listens on port 9; any stray completion call fails fast
    // instead of reaching a real upstream.
    std::env::set_var("OPENAI_BASE_URL", "http://127.0.0.1:9/v1");
    std::env::remove_var("OPENAI_API_KEY");

    std::env::remove_var("SMTP_HOST");
    std::env::remove_var("SMTP_USERNAME");
    std::env::remove_var("SMTP_PASSWORD");
    std::env::remove_var("MAIL_FROM");
    std::env::remove_var("TEACHER_EMAIL");
}

pub(crate) fn set_test_mail_env() {
    std::env::set_var("SMTP_HOST", "localhost");
    std::env::set_var("SMTP_PORT", "2525");
    std::env::set_var("SMTP_USERNAME", "results@example.com");
    std::env::set_var("SMTP_PASSWORD", "app-password");
    std::env::set_var("TEACHER_EMAIL", "teacher@example.com");
}

pub(crate) fn build_app() -> Router {
    let settings = Settings::load().expect("settings");
    build_app_with_settings(settings)
}

pub(crate) fn build_app_with_settings(settings: Settings) -> Router {
    let feedback = FeedbackService::from_settings(&settings).expect("feedback service");
    let mailer = Mailer::from_settings(&settings).expect("mailer");
    let state = AppState::new(settings, feedback, mailer);
    api::router::router(state)
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) fn multipart_request(uri: &str, part_name: &str, file: Vec<u8>) -> Request<Body> {
    let boundary = "pee-feedback-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{part_name}\"; \
             filename=\"response.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(&file);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
