//! Outbound transports.
//!
//! The decision core hands a finished [`OutgoingMessage`] to exactly one
//! [`Transport`] per invocation. Two implementations exist:
//!
//! - [`EmailTransport`]: SMTP with STARTTLS via lettre
//! - [`SmsTransport`]: a Twilio-compatible HTTP messaging gateway
//!
//! Transport protocol details (the SMTP handshake, the gateway's API) stay
//! behind this boundary. Errors are classified just enough for exit codes:
//! rejected credentials surface as [`TransportError::Authentication`],
//! everything else as the underlying failure. No retries happen here; the
//! external scheduler decides whether to invoke again.

mod email;
mod sms;

use mockall::automock;
use thiserror::Error;

pub use crate::transport::email::EmailTransport;
pub use crate::transport::sms::SmsTransport;

/// The composed message plus its recipients, ready to hand to a transport.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutgoingMessage {
    /// Recipient addresses or phone numbers, depending on the transport.
    pub recipients: Vec<String>,
    /// Subject line; transports without a subject concept ignore it.
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
    /// HTML body, sent as a multipart alternative when the transport
    /// supports it.
    pub html_body: Option<String>,
}

/// Error raised by a transport during a send attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport rejected our credentials. The diagnostic is surfaced
    /// verbatim; credentials are never mutated or retried.
    #[error("authentication rejected by transport: {0}")]
    Authentication(String),
    /// SMTP-level failure other than authentication.
    #[error("smtp transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    /// A sender or recipient address could not be parsed.
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    /// The MIME message could not be assembled.
    #[error("message build error: {0}")]
    Build(String),
    /// HTTP-level failure talking to the messaging gateway.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    /// The messaging gateway refused the request.
    #[error("messaging api rejected request ({status}): {body}")]
    Api {
        /// HTTP status code returned by the gateway.
        status: u16,
        /// Response body, surfaced verbatim for the operator.
        body: String,
    },
}

impl TransportError {
    /// Whether this failure is a credential rejection.
    ///
    /// Drives the distinct exit code for authentication failures.
    pub fn is_authentication(&self) -> bool {
        matches!(self, TransportError::Authentication(_))
    }
}

/// A one-shot outbound message transport.
///
/// Abstracted as a trait so the runner can be tested with mocks.
#[automock]
pub trait Transport {
    /// Attempts to deliver the message to all its recipients.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}
