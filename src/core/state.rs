use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::feedback::FeedbackService;
use crate::services::notify::Mailer;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    feedback: FeedbackService,
    mailer: Option<Mailer>,
}

impl AppState {
    pub(crate) fn new(settings: Settings, feedback: FeedbackService, mailer: Option<Mailer>) -> Self {
        Self { inner: Arc::new(InnerState { settings, feedback, mailer }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn feedback(&self) -> &FeedbackService {
        &self.inner.feedback
    }

    pub(crate) fn mailer(&self) -> Option<&Mailer> {
        self.inner.mailer.as_ref()
    }
}
