use lettre::{
    message::{header, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use thiserror::Error;

use crate::core::config::Settings;

/// SMTP relay for teacher notifications. Feedback is mailed to the configured
/// teacher address for manual approval; students are never mailed directly.
pub(crate) struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    teacher: Mailbox,
}

#[derive(Debug, Error)]
pub(crate) enum NotifyError {
    #[error("invalid mail address '{0}'")]
    Address(String),
    #[error("failed to set up SMTP transport: {0}")]
    Transport(String),
    #[error("failed to build email: {0}")]
    Build(String),
    #[error("failed to send email: {0}")]
    Send(String),
}

impl Mailer {
    /// Build the mailer from settings, or `None` when SMTP is not configured.
    pub(crate) fn from_settings(settings: &Settings) -> Result<Option<Self>, NotifyError> {
        let mail = settings.mail();
        if !mail.configured() {
            return Ok(None);
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&mail.smtp_host)
            .map_err(|err| NotifyError::Transport(err.to_string()))?
            .port(mail.smtp_port)
            .credentials(Credentials::new(mail.smtp_username.clone(), mail.smtp_password.clone()))
            .build();

        let from: Mailbox =
            mail.mail_from.parse().map_err(|_| NotifyError::Address(mail.mail_from.clone()))?;
        let teacher: Mailbox = mail
            .teacher_email
            .parse()
            .map_err(|_| NotifyError::Address(mail.teacher_email.clone()))?;

        Ok(Some(Self { transport, from, teacher }))
    }

    /// Send one feedback email to the teacher. Best-effort; the caller treats
    /// a failure as non-fatal and does not retry.
    pub(crate) async fn send_feedback(
        &self,
        student_name: Option<&str>,
        student_email: Option<&str>,
        feedback: &str,
    ) -> Result<(), NotifyError> {
        let body = format!(
            "Student: {}\nStudent email: {}\n\n{}\n",
            student_name.unwrap_or("N/A"),
            student_email.unwrap_or("N/A"),
            feedback
        );

        let email = Message::builder()
            .from(self.from.clone())
            .to(self.teacher.clone())
            .subject("AI Feedback")
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|err| NotifyError::Build(err.to_string()))?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|err| NotifyError::Send(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn unconfigured_smtp_yields_no_mailer() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        let mailer = Mailer::from_settings(&settings).expect("mailer");
        assert!(mailer.is_none());
    }

    #[tokio::test]
    async fn configured_smtp_builds_mailer() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_mail_env();

        let settings = Settings::load().expect("settings");
        let mailer = Mailer::from_settings(&settings).expect("mailer");
        assert!(mailer.is_some());
    }

    #[tokio::test]
    async fn bad_teacher_address_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        test_support::set_test_mail_env();
        std::env::set_var("TEACHER_EMAIL", "not an address");

        let settings = Settings::load().expect("settings");
        let result = Mailer::from_settings(&settings);
        assert!(matches!(result, Err(NotifyError::Address(_))));
    }
}
