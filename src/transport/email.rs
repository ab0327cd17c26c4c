//! SMTP email delivery.
//!
//! [`EmailTransport`] wraps the lettre async SMTP transport: one STARTTLS
//! connection, credential login, and a single message addressed to every
//! recipient at once. When the composed message carries an HTML body the
//! email is sent as a multipart alternative so plain-text clients still get
//! the text rendition.

use lettre::message::{Mailbox, MultiPart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{debug, info};

use crate::config::EmailConfig;
use crate::transport::{OutgoingMessage, Transport, TransportError};

/// Sends messages through an SMTP relay with STARTTLS.
pub struct EmailTransport {
    config: EmailConfig,
}

impl EmailTransport {
    /// Creates a transport from validated SMTP settings.
    pub fn new(config: EmailConfig) -> Self {
        EmailTransport { config }
    }

    fn build_message(&self, message: &OutgoingMessage) -> Result<Message, TransportError> {
        let mut builder = Message::builder()
            .from(self.config.sender.parse::<Mailbox>()?)
            .subject(message.subject.clone());

        for recipient in &message.recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        let email = match &message.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text_body.clone()),
        };

        email.map_err(|e| TransportError::Build(e.to_string()))
    }
}

impl Transport for EmailTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let email = self.build_message(message)?;

        debug!(
            "connecting to {}:{} as {}",
            self.config.smtp_server,
            self.config.smtp_port,
            self.config.resolved_username()
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.resolved_username().to_owned(),
                self.config.password.clone(),
            ))
            .build();

        mailer.send(email).await.map_err(classify_smtp_error)?;

        info!("email sent to {} recipient(s)", message.recipients.len());
        Ok(())
    }
}

/// Splits credential rejections from other SMTP failures.
///
/// SMTP signals rejected credentials with a 535 reply; the relay's
/// diagnostic text is kept verbatim so the operator sees exactly what the
/// server said.
fn classify_smtp_error(error: lettre::transport::smtp::Error) -> TransportError {
    let text = error.to_string();
    if text.contains("535") || text.to_ascii_lowercase().contains("credentials") {
        TransportError::Authentication(text)
    } else {
        TransportError::Smtp(error)
    }
}
