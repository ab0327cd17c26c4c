//! SMS delivery through a Twilio-compatible HTTP messaging gateway.

use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::SmsConfig;
use crate::transport::{OutgoingMessage, Transport, TransportError};

/// Sends the plain-text body as one SMS per recipient.
///
/// The gateway speaks the Twilio message API: a form-encoded POST to
/// `/2010-04-01/Accounts/{sid}/Messages.json` with basic auth. The base URL
/// comes from configuration so tests can point it at a local server.
pub struct SmsTransport {
    config: SmsConfig,
    client: Client,
}

/// The slice of the gateway's create-message response we care about.
#[derive(Debug, Deserialize)]
struct MessageResponse {
    /// Server-assigned message SID, logged for traceability.
    sid: String,
}

impl SmsTransport {
    /// Creates a transport from validated gateway settings.
    pub fn new(config: SmsConfig) -> Self {
        SmsTransport {
            config,
            client: Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base, self.config.account_sid
        )
    }
}

impl Transport for SmsTransport {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        let url = self.messages_url();

        for recipient in &message.recipients {
            debug!("sending sms to {} via {}", recipient, url);

            let response = self
                .client
                .post(&url)
                .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
                .form(&[
                    ("To", recipient.as_str()),
                    ("From", self.config.from_number.as_str()),
                    ("Body", message.text_body.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Authentication(format!("{status}: {body}")));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(TransportError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let sent: MessageResponse = response.json().await?;
            info!("sms sent to {}, sid {}", recipient, sent.sid);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_base: &str) -> SmsConfig {
        SmsConfig {
            account_sid: "AC123".to_owned(),
            auth_token: "token".to_owned(),
            from_number: "+15550001111".to_owned(),
            api_base: api_base.to_owned(),
        }
    }

    fn outgoing(recipients: &[&str]) -> OutgoingMessage {
        OutgoingMessage {
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
            subject: "ignored".to_owned(),
            text_body: "day 1097 ❤️".to_owned(),
            html_body: None,
        }
    }

    #[tokio::test]
    async fn test_send_posts_form_to_gateway() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .match_header("authorization", mockito::Matcher::Regex("Basic .+".to_owned()))
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("To".to_owned(), "+60123456789".to_owned()),
                mockito::Matcher::UrlEncoded("From".to_owned(), "+15550001111".to_owned()),
            ]))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sid": "SM123"}"#)
            .create_async()
            .await;

        let transport = SmsTransport::new(config(&server.url()));
        transport.send(&outgoing(&["+60123456789"])).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_one_message_per_recipient() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"sid": "SM123"}"#)
            .expect(2)
            .create_async()
            .await;

        let transport = SmsTransport::new(config(&server.url()));
        transport
            .send(&outgoing(&["+60123456789", "+60198765432"]))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_credentials_surface_as_authentication() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(401)
            .with_body(r#"{"code": 20003, "message": "Authenticate"}"#)
            .create_async()
            .await;

        let transport = SmsTransport::new(config(&server.url()));
        let err = transport.send(&outgoing(&["+60123456789"])).await.unwrap_err();

        assert!(err.is_authentication());
        assert!(err.to_string().contains("20003"));
    }

    #[tokio::test]
    async fn test_gateway_error_surfaces_status_and_body() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/2010-04-01/Accounts/AC123/Messages.json")
            .with_status(400)
            .with_body("invalid 'To' number")
            .create_async()
            .await;

        let transport = SmsTransport::new(config(&server.url()));
        let err = transport.send(&outgoing(&["not-a-number"])).await.unwrap_err();

        match err {
            TransportError::Api { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("invalid"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
