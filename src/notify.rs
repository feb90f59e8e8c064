//! Outbound email for account events.
//!
//! Sending runs in its own task bounded by a timeout. `deliver` waits for the
//! outcome, `dispatch` lets the request finish and only logs it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::SmtpConfig;

/// Errors that can occur when sending email
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Delivery timed out after {0:?}")]
    TimedOut(Duration),

    #[error("No mail transport configured")]
    NotConfigured,
}

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl Mail {
    pub fn welcome(to: &str, username: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Welcome to Shop API".to_string(),
            text_body: format!(
                "Hi {username},\n\nYour account has been created. You can now log in and start using the app."
            ),
            html_body: format!(
                "<p>Hi {username},</p><p>Your account has been created. You can now log in and start using the app.</p>"
            ),
        }
    }

    /// The reset code email; `valid_minutes` is stated in the body
    pub fn otp_code(to: &str, code: &str, valid_minutes: i64) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your password reset code".to_string(),
            text_body: format!(
                "Your password reset code is {code}. It is valid for {valid_minutes} minutes.\n\nIf you did not request a reset, ignore this email."
            ),
            html_body: format!(
                "<p>Your password reset code is <strong>{code}</strong>. It is valid for {valid_minutes} minutes.</p><p>If you did not request a reset, ignore this email.</p>"
            ),
        }
    }

    pub fn reset_confirmation(to: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your password was reset".to_string(),
            text_body: "Your password has been reset successfully. If this was not you, contact support."
                .to_string(),
            html_body: "<p>Your password has been reset successfully.</p><p>If this was not you, contact support.</p>"
                .to_string(),
        }
    }
}

/// Sends one email
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError>;
}

/// SMTP delivery through a STARTTLS relay
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(mail.to.clone()))?)
            .subject(mail.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(mail.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(mail.html_body.clone()),
                    ),
            )?;

        self.mailer.send(message).await?;
        Ok(())
    }
}

/// Logs recipient and subject instead of sending; used when SMTP is not configured
///
/// Nothing leaves the process, so every send reports `NotConfigured`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
        info!(to = %mail.to, subject = %mail.subject, "Email not sent (no SMTP configured)");
        Err(NotifyError::NotConfigured)
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed,
    /// No transport is configured, so nothing was attempted
    Skipped,
}

impl Delivery {
    pub fn is_sent(self) -> bool {
        self == Delivery::Sent
    }
}

/// Runs notifier calls as bounded tasks
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Send and wait for the outcome
    pub async fn deliver(&self, mail: Mail) -> Delivery {
        match self.dispatch(mail).await {
            Ok(delivery) => delivery,
            Err(e) => {
                error!("Email task did not complete: {}", e);
                Delivery::Failed
            }
        }
    }

    /// Send in the background; the outcome is logged by the task
    pub fn dispatch(&self, mail: Mail) -> JoinHandle<Delivery> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, notifier.send(&mail)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::TimedOut(timeout)),
            };

            match result {
                Ok(()) => {
                    info!(to = %mail.to, subject = %mail.subject, "Email delivered");
                    Delivery::Sent
                }
                Err(NotifyError::NotConfigured) => Delivery::Skipped,
                Err(e) => {
                    warn!(to = %mail.to, subject = %mail.subject, "Email delivery failed: {}", e);
                    Delivery::Failed
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<Mail>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    struct Stalled;

    #[async_trait]
    impl Notifier for Stalled {
        async fn send(&self, _mail: &Mail) -> Result<(), NotifyError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl Notifier for Refusing {
        async fn send(&self, mail: &Mail) -> Result<(), NotifyError> {
            Err(NotifyError::InvalidAddress(mail.to.clone()))
        }
    }

    #[test]
    fn test_otp_mail_carries_code_and_validity() {
        let mail = Mail::otp_code("a@x.com", "482913", 10);
        assert_eq!(mail.to, "a@x.com");
        assert!(mail.text_body.contains("482913"));
        assert!(mail.html_body.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_deliver_reports_sent() {
        let recording = Arc::new(Recording::default());
        let dispatcher = Dispatcher::new(recording.clone(), Duration::from_secs(1));

        let delivery = dispatcher.deliver(Mail::welcome("a@x.com", "asha")).await;

        assert_eq!(delivery, Delivery::Sent);
        assert_eq!(recording.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deliver_reports_failure() {
        let dispatcher = Dispatcher::new(Arc::new(Refusing), Duration::from_secs(1));
        assert_eq!(
            dispatcher.deliver(Mail::reset_confirmation("a@x.com")).await,
            Delivery::Failed
        );
    }

    #[tokio::test]
    async fn test_log_notifier_is_not_a_delivery() {
        let dispatcher = Dispatcher::new(Arc::new(LogNotifier), Duration::from_secs(1));
        let delivery = dispatcher.deliver(Mail::otp_code("a@x.com", "482913", 10)).await;

        assert_eq!(delivery, Delivery::Skipped);
        assert!(!delivery.is_sent());
    }

    #[tokio::test]
    async fn test_slow_notifier_times_out() {
        let dispatcher = Dispatcher::new(Arc::new(Stalled), Duration::from_millis(50));
        assert_eq!(
            dispatcher.deliver(Mail::welcome("a@x.com", "asha")).await,
            Delivery::Failed
        );
    }
}
