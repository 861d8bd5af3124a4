//! Best-effort notifications sent after a consultation is stored.
//!
//! Every notifier yields `Result<NotificationOutcome, NotificationError>`.
//! [`fan_out`] runs all of them and absorbs every result, so nothing in here
//! can change the response already decided by the persistence step.

pub mod chat;
pub mod email;

use crate::errors::{NotificationError, panic_message};
use crate::metrics_defs::NOTIFICATION_OUTCOME;
use crate::models::NewConsultation;
use async_trait::async_trait;
use futures::FutureExt;
use shared::counter;
use std::panic::AssertUnwindSafe;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Email,
    Chat,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Chat => "chat",
        }
    }
}

pub const MISSING_WEBHOOK: &str = "missing_webhook";
pub const MISSING_CREDENTIALS: &str = "missing_credentials";

/// Transient result of one notification attempt. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Skipped { reason: &'static str },
    Rejected { status: u16 },
    Transport { error: String },
}

impl NotificationOutcome {
    fn label(&self) -> &'static str {
        match self {
            NotificationOutcome::Sent => "sent",
            NotificationOutcome::Skipped { .. } => "skipped",
            NotificationOutcome::Rejected { .. } => "rejected",
            NotificationOutcome::Transport { .. } => "transport",
        }
    }
}

/// What [`absorb`] recorded for one channel. Errors are kept as their message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub channel: Channel,
    pub outcome: Result<NotificationOutcome, String>,
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self.outcome, Ok(NotificationOutcome::Sent))
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> Channel;

    async fn notify(
        &self,
        consultation: &NewConsultation,
    ) -> Result<NotificationOutcome, NotificationError>;
}

/// Attempts email (when configured) and chat concurrently and absorbs both results.
/// A panicking notifier is absorbed like any other failure.
pub async fn fan_out(
    email: Option<&dyn Notifier>,
    chat: &dyn Notifier,
    consultation: &NewConsultation,
) -> [Delivery; 2] {
    let email_attempt = async {
        match email {
            Some(notifier) => attempt(notifier, consultation).await,
            None => (
                Channel::Email,
                Ok(NotificationOutcome::Skipped {
                    reason: MISSING_CREDENTIALS,
                }),
            ),
        }
    };

    let ((email_channel, email_result), (chat_channel, chat_result)) =
        tokio::join!(email_attempt, attempt(chat, consultation));

    [
        absorb(email_channel, email_result),
        absorb(chat_channel, chat_result),
    ]
}

async fn attempt(
    notifier: &dyn Notifier,
    consultation: &NewConsultation,
) -> (Channel, Result<NotificationOutcome, NotificationError>) {
    let channel = notifier.channel();
    let result = AssertUnwindSafe(notifier.notify(consultation))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(NotificationError::Panicked(panic_message(&*payload))));

    (channel, result)
}

/// Logs the result of one notification and drops the error.
pub fn absorb(channel: Channel, result: Result<NotificationOutcome, NotificationError>) -> Delivery {
    let label = match &result {
        Ok(outcome) => outcome.label(),
        Err(_) => "error",
    };
    counter!(NOTIFICATION_OUTCOME, "channel" => channel.as_str(), "outcome" => label).increment(1);

    match &result {
        Ok(NotificationOutcome::Sent) => {
            tracing::info!(channel = channel.as_str(), "notification sent");
        }
        Ok(NotificationOutcome::Skipped { reason }) => {
            tracing::info!(channel = channel.as_str(), reason = *reason, "notification skipped");
        }
        Ok(NotificationOutcome::Rejected { status }) => {
            tracing::warn!(channel = channel.as_str(), status = *status, "notification rejected");
        }
        Ok(NotificationOutcome::Transport { error }) => {
            tracing::warn!(channel = channel.as_str(), error = %error, "notification transport failed");
        }
        Err(e) => {
            tracing::error!(channel = channel.as_str(), error = %e, "notification failed");
        }
    }

    Delivery {
        channel,
        outcome: result.map_err(|e| e.to_string()),
    }
}
