/// Task-creation email notifier
///
/// Fire-and-forget collaborator: the task service spawns a notification after
/// a successful create and moves on. A failed send is logged by the caller
/// and never rolls back or fails the write. Retry policy, if any, belongs to
/// the mail infrastructure, not to this service.
///
/// [`Notifier`] is a trait so the API layer can hold a test double; the real
/// implementation is [`SmtpNotifier`], an async lettre SMTP transport that
/// degrades to a logging no-op when SMTP is not configured.

use async_trait::async_trait;
use lettre::message::{header, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Error type for notification delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Recipient or sender address failed to parse
    #[error("Invalid mail address: {0}")]
    Address(String),

    /// Message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// SMTP transport failed
    #[error("Failed to send mail: {0}")]
    Transport(String),
}

/// SMTP settings for the notifier
///
/// An empty `smtp_host` puts the notifier in no-op mode, which is the
/// development and test default.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    /// SMTP relay host; empty = no-op mode
    pub smtp_host: String,

    /// SMTP relay port
    pub smtp_port: u16,

    /// SMTP username, when the relay requires authentication
    pub smtp_username: Option<String>,

    /// SMTP password
    pub smtp_password: Option<String>,

    /// Sender address, e.g. `Tasklist <noreply@example.com>`
    pub from: String,
}

/// Notification collaborator
///
/// One method per event the service emits. Implementations must be cheap to
/// clone behind an `Arc` and safe to call from a spawned task.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notifies a user that a task was created on their list
    async fn task_created(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
    ) -> Result<(), NotifyError>;
}

/// Async SMTP notifier backed by lettre
///
/// Operates in no-op mode (logs only) when no SMTP host is configured,
/// useful for development and testing without mail infrastructure.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Builds a notifier from configuration
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Address` if the sender address is invalid, or
    /// `NotifyError::Transport` if the relay cannot be configured
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("invalid sender address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; mail notifier will operate in no-op mode");
            None
        } else {
            let builder =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| {
                        NotifyError::Transport(format!("failed to configure SMTP relay: {}", e))
                    })?
                    .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self { transport, from })
    }

    /// True when an SMTP transport is configured
    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn task_created(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
    ) -> Result<(), NotifyError> {
        let Some(transport) = &self.transport else {
            info!(to = to_email, title = task_title, "Mail disabled; skipping task notification");
            return Ok(());
        };

        let to = to_email
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Address(format!("invalid recipient address: {}", e)))?;

        let text_body = format!(
            "Hi {},\n\nYou have created a new task:\n\nTitle: {}\n\nBest regards,\nThe Tasklist Team\n",
            to_name, task_title
        );
        let html_body = format!(
            "<h2>Hi {},</h2>\n<p>You have created a new task:</p>\n<h3>{}</h3>\n<p>Best regards,<br>The Tasklist Team</p>",
            to_name, task_title
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("New Task Created")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        info!(to = to_email, title = task_title, "Task notification sent");
        Ok(())
    }
}
