//! Chat webhook notifier (Slack incoming-webhook compatible).

use super::{Channel, MISSING_WEBHOOK, NotificationOutcome, Notifier};
use crate::errors::NotificationError;
use crate::models::NewConsultation;
use crate::redact::Secret;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct ChatPayload<'a> {
    text: &'a str,
}

pub struct ChatNotifier {
    client: reqwest::Client,
    webhook_url: Option<Secret>,
    timeout: Duration,
}

impl ChatNotifier {
    pub fn new(client: reqwest::Client, webhook_url: Option<Secret>, timeout: Duration) -> Self {
        ChatNotifier {
            client,
            webhook_url,
            timeout,
        }
    }

    /// Posts `text` to the webhook. Never fails: every problem becomes an outcome.
    ///
    /// The timeout covers the whole exchange, including reading an error body.
    /// When it elapses the in-flight request is dropped.
    pub async fn send(&self, text: &str) -> NotificationOutcome {
        let Some(url) = &self.webhook_url else {
            tracing::warn!("SLACK_WEBHOOK_URL is not set, skipping chat notification");
            return NotificationOutcome::Skipped {
                reason: MISSING_WEBHOOK,
            };
        };

        match timeout(self.timeout, self.deliver(url.expose(), text)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "chat webhook request failed");
                NotificationOutcome::Transport {
                    error: e.to_string(),
                }
            }
            Err(_) => {
                tracing::error!(timeout_ms = self.timeout.as_millis() as u64, "chat webhook timed out");
                NotificationOutcome::Transport {
                    error: format!("timed out after {:?}", self.timeout),
                }
            }
        }
    }

    async fn deliver(&self, url: &str, text: &str) -> Result<NotificationOutcome, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .json(&ChatPayload { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "chat webhook rejected message");
            return Ok(NotificationOutcome::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(NotificationOutcome::Sent)
    }
}

/// Text posted to the team channel for a new consultation.
pub fn consultation_message(consultation: &NewConsultation) -> String {
    format!(
        "새 상담 신청이 접수되었습니다.\n• 이름: {}\n• 연락처: {}\n• 유입 경로: {}",
        consultation.name, consultation.contact, consultation.click_source
    )
}

#[async_trait]
impl Notifier for ChatNotifier {
    fn channel(&self) -> Channel {
        Channel::Chat
    }

    async fn notify(
        &self,
        consultation: &NewConsultation,
    ) -> Result<NotificationOutcome, NotificationError> {
        Ok(self.send(&consultation_message(consultation)).await)
    }
}
