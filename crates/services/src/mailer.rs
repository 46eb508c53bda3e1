use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use workhub_config::SmtpSettings;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    Address(String),
    #[error("SMTP transport error: {0}")]
    Transport(String),
    #[error("Failed to build message: {0}")]
    Build(String),
}

/// What happened to an outgoing invitation email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailOutcome {
    Sent,
    /// No SMTP server configured; the caller shares the link by hand.
    NotConfigured,
    /// Delivery was attempted and failed; treated like `NotConfigured`.
    Failed,
}

impl MailOutcome {
    pub fn was_sent(&self) -> bool {
        matches!(self, MailOutcome::Sent)
    }
}

#[derive(Debug, Clone)]
pub struct InvitationEmail {
    pub to: String,
    pub organization_name: String,
    pub inviter_name: String,
    pub role: String,
    pub invite_link: String,
    pub expires_in_days: i64,
}

/// Notification sink for invitation emails. Never fails the invitation:
/// delivery problems come back as a [`MailOutcome`].
#[async_trait]
pub trait InviteMailer: Send + Sync {
    async fn send_invitation(&self, email: &InvitationEmail) -> MailOutcome;
}

/// Used when no SMTP host is configured.
#[derive(Debug, Default)]
pub struct DisabledMailer;

#[async_trait]
impl InviteMailer for DisabledMailer {
    async fn send_invitation(&self, email: &InvitationEmail) -> MailOutcome {
        debug!(to = %email.to, "SMTP not configured, skipping invitation email");
        MailOutcome::NotConfigured
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_mailbox: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport; returns `Ok(None)` when no host is configured.
    pub fn from_settings(settings: &SmtpSettings) -> Result<Option<Self>, MailError> {
        let Some(host) = settings.host.as_deref().filter(|_| settings.is_configured()) else {
            return Ok(None);
        };

        let from_mailbox: Mailbox = format!("{} <{}>", settings.from_name, settings.from_address)
            .parse()
            .map_err(|e| MailError::Address(format!("{e}")))?;

        let builder = if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Transport(format!("{e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let mut builder = builder.port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        info!(host, port = settings.port, "SMTP mailer configured");
        Ok(Some(Self {
            transport: builder.build(),
            from_mailbox,
        }))
    }

    async fn send(&self, to: &str, subject: &str, html: String, text: String) -> Result<(), MailError> {
        let to_mailbox: Mailbox = to.parse().map_err(|e| MailError::Address(format!("{e}")))?;

        let message = Message::builder()
            .from(self.from_mailbox.clone())
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::builder().header(ContentType::TEXT_PLAIN).body(text))
                    .singlepart(SinglePart::builder().header(ContentType::TEXT_HTML).body(html)),
            )
            .map_err(|e| MailError::Build(format!("{e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(format!("{e}")))?;
        Ok(())
    }
}

/// Escapes text for interpolation into HTML element content or a quoted
/// attribute value.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Subject, plain-text and HTML bodies for an invitation email.
/// Organization and inviter names are user input and are escaped in the
/// HTML part.
pub fn render_invitation(email: &InvitationEmail) -> (String, String, String) {
    let subject = format!("You're invited to join {}", email.organization_name);
    let text = format!(
        "{} invited you to join {} as {}.\n\nAccept the invitation: {}\n\nThis link expires in {} days.",
        email.inviter_name,
        email.organization_name,
        email.role,
        email.invite_link,
        email.expires_in_days,
    );
    let html = format!(
        "<p>{} invited you to join <strong>{}</strong> as {}.</p>\
         <p><a href=\"{}\">Accept the invitation</a></p>\
         <p>This link expires in {} days.</p>",
        escape_html(&email.inviter_name),
        escape_html(&email.organization_name),
        escape_html(&email.role),
        escape_html(&email.invite_link),
        email.expires_in_days,
    );
    (subject, text, html)
}

#[async_trait]
impl InviteMailer for SmtpMailer {
    async fn send_invitation(&self, email: &InvitationEmail) -> MailOutcome {
        let (subject, text, html) = render_invitation(email);

        match self.send(&email.to, &subject, html, text).await {
            Ok(()) => {
                info!(to = %email.to, "Invitation email sent");
                MailOutcome::Sent
            }
            Err(e) => {
                warn!(to = %email.to, error = %e, "Invitation email failed, returning link instead");
                MailOutcome::Failed
            }
        }
    }
}
