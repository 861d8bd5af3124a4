//! Transactional email through an HTTP mail API.
//!
//! The request uses the `Messages` envelope of the Mailjet v3.1 send API and
//! HTTP basic auth with the account login and key. One attempt per call.

use super::{Channel, NotificationOutcome, Notifier};
use crate::env::MailCredentials;
use crate::errors::NotificationError;
use crate::models::NewConsultation;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendRequest<'a> {
    messages: [Message<'a>; 1],
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Message<'a> {
    pub from: Address<'a>,
    pub to: [Address<'a>; 1],
    pub subject: String,
    pub text_part: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Address<'a> {
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

pub struct EmailNotifier {
    client: reqwest::Client,
    api_url: String,
    credentials: MailCredentials,
    timeout: Duration,
}

impl EmailNotifier {
    /// Fails with [`NotificationError::MissingCredentials`] when mail is not configured.
    pub fn from_credentials(
        client: reqwest::Client,
        api_url: String,
        credentials: Option<MailCredentials>,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let credentials = credentials.ok_or(NotificationError::MissingCredentials)?;

        Ok(EmailNotifier {
            client,
            api_url,
            credentials,
            timeout,
        })
    }

    pub fn compose<'a>(
        &'a self,
        consultation: &NewConsultation,
    ) -> Result<Message<'a>, NotificationError> {
        let sender = self
            .credentials
            .sender_email
            .as_deref()
            .ok_or(NotificationError::MissingAddress("sender"))?;
        let recipient = self
            .credentials
            .recipient
            .as_deref()
            .ok_or(NotificationError::MissingAddress("recipient"))?;

        Ok(Message {
            from: Address {
                email: sender,
                name: self.credentials.sender_name.as_deref(),
            },
            to: [Address {
                email: recipient,
                name: None,
            }],
            subject: format!("[상담 신청] {}", consultation.name),
            text_part: format!(
                "새 상담 신청이 접수되었습니다.\n\n이름: {}\n연락처: {}\n유입 경로: {}\n",
                consultation.name, consultation.contact, consultation.click_source
            ),
        })
    }

    pub async fn send(
        &self,
        consultation: &NewConsultation,
    ) -> Result<NotificationOutcome, NotificationError> {
        let message = self.compose(consultation)?;
        let request = SendRequest { messages: [message] };

        tracing::info!(
            login = %self.credentials.login.masked(),
            key = %self.credentials.api_key.masked(),
            "sending consultation email"
        );

        let exchange = async {
            let response = self
                .client
                .post(&self.api_url)
                .basic_auth(
                    self.credentials.login.expose(),
                    Some(self.credentials.api_key.expose()),
                )
                .json(&request)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = timeout(self.timeout, exchange)
            .await
            .map_err(|_| NotificationError::Timeout(self.timeout))?
            .map_err(NotificationError::Transport)?;

        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(NotificationOutcome::Sent)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn notify(
        &self,
        consultation: &NewConsultation,
    ) -> Result<NotificationOutcome, NotificationError> {
        self.send(consultation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redact::Secret;
    use crate::testutils::consultation;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> MailCredentials {
        MailCredentials {
            login: Secret::new("mail-login"),
            api_key: Secret::new("mail-api-key"),
            sender_email: Some("noreply@example.com".into()),
            sender_name: Some("상담 알림".into()),
            recipient: Some("ops@example.com".into()),
        }
    }

    fn notifier(api_url: String, credentials: MailCredentials) -> EmailNotifier {
        EmailNotifier::from_credentials(
            reqwest::Client::new(),
            api_url,
            Some(credentials),
            DEFAULT_TIMEOUT,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_message_envelope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v3.1/send"))
            .and(basic_auth("mail-login", "mail-api-key"))
            .and(body_json(json!({
                "Messages": [{
                    "From": {"Email": "noreply@example.com", "Name": "상담 알림"},
                    "To": [{"Email": "ops@example.com"}],
                    "Subject": "[상담 신청] Kim",
                    "TextPart": "새 상담 신청이 접수되었습니다.\n\n이름: Kim\n연락처: 010-1111-2222\n유입 경로: unknown\n"
                }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Messages": [{"Status": "success"}]})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let email = notifier(format!("{}/v3.1/send", mock_server.uri()), credentials());
        let outcome = email.send(&consultation()).await.unwrap();
        assert_eq!(outcome, NotificationOutcome::Sent);
    }

    #[tokio::test]
    async fn test_rejected_send_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&mock_server)
            .await;

        let email = notifier(mock_server.uri(), credentials());
        let err = email.send(&consultation()).await.unwrap_err();
        assert!(matches!(
            err,
            NotificationError::Rejected { status: 401, ref body } if body == "unauthorized"
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let err = EmailNotifier::from_credentials(
            reqwest::Client::new(),
            "http://127.0.0.1:9".into(),
            None,
            DEFAULT_TIMEOUT,
        )
        .err()
        .unwrap();
        assert!(matches!(err, NotificationError::MissingCredentials));
    }

    #[tokio::test]
    async fn test_missing_recipient_fails_without_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut creds = credentials();
        creds.recipient = None;
        let email = notifier(mock_server.uri(), creds);

        let err = email.send(&consultation()).await.unwrap_err();
        assert!(matches!(err, NotificationError::MissingAddress("recipient")));
    }

    #[test]
    fn test_sender_name_optional() {
        let mut creds = credentials();
        creds.sender_name = None;
        let email = notifier("http://127.0.0.1:9".into(), creds);
        let message = email.compose(&consultation()).unwrap();

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["From"], json!({"Email": "noreply@example.com"}));
    }
}
