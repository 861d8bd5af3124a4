//! Credentials read from the process environment at call time.
//!
//! Nothing here is cached: every [`Credentials::load`] consults the
//! [`EnvSource`] again, so rotating a key or unsetting a webhook takes effect
//! on the next request.

use crate::redact::Secret;
use std::collections::HashMap;

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const MAIL_LOGIN: &str = "MAIL_LOGIN";
pub const MAIL_API_KEY: &str = "MAIL_API_KEY";
pub const MAIL_SENDER_EMAIL: &str = "MAIL_SENDER_EMAIL";
pub const MAIL_SENDER_NAME: &str = "MAIL_SENDER_NAME";
pub const MAIL_RECIPIENT: &str = "MAIL_RECIPIENT";
pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads `std::env`.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of variables, for embedding and tests.
#[derive(Default, Clone)]
pub struct StaticEnv(HashMap<String, String>);

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        StaticEnv(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

// Blank values are treated the same as unset ones.
fn non_empty(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.var(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyKind {
    ServiceRole,
    Anon,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::ServiceRole => "service_role",
            KeyKind::Anon => "anon",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PersistenceCredentials {
    pub url: String,
    pub key: Secret,
    pub key_kind: KeyKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MailCredentials {
    pub login: Secret,
    pub api_key: Secret,
    pub sender_email: Option<String>,
    pub sender_name: Option<String>,
    pub recipient: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Credentials {
    pub persistence: Option<PersistenceCredentials>,
    pub mail: Option<MailCredentials>,
    pub chat_webhook: Option<Secret>,
}

impl Credentials {
    pub fn load(env: &dyn EnvSource) -> Self {
        Credentials {
            persistence: Self::load_persistence(env),
            mail: Self::load_mail(env),
            chat_webhook: non_empty(env, SLACK_WEBHOOK_URL).map(Secret::new),
        }
    }

    fn load_persistence(env: &dyn EnvSource) -> Option<PersistenceCredentials> {
        let url = non_empty(env, SUPABASE_URL)?;
        let (key, key_kind) = match non_empty(env, SUPABASE_SERVICE_ROLE_KEY) {
            Some(key) => (key, KeyKind::ServiceRole),
            None => (non_empty(env, SUPABASE_ANON_KEY)?, KeyKind::Anon),
        };

        Some(PersistenceCredentials {
            url,
            key: Secret::new(key),
            key_kind,
        })
    }

    fn load_mail(env: &dyn EnvSource) -> Option<MailCredentials> {
        Some(MailCredentials {
            login: Secret::new(non_empty(env, MAIL_LOGIN)?),
            api_key: Secret::new(non_empty(env, MAIL_API_KEY)?),
            sender_email: non_empty(env, MAIL_SENDER_EMAIL),
            sender_name: non_empty(env, MAIL_SENDER_NAME),
            recipient: non_empty(env, MAIL_RECIPIENT),
        })
    }

    /// Human-readable presence report. Secrets appear masked.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut lines = Vec::new();

        match &self.persistence {
            Some(p) => {
                lines.push(("persistence", format!("configured ({})", p.url)));
                lines.push(("persistence key", format!("{} {}", p.key_kind.as_str(), p.key)));
            }
            None => lines.push(("persistence", "not configured".to_string())),
        }

        match &self.mail {
            Some(m) => {
                lines.push(("mail", format!("configured (login {})", m.login.masked())));
                lines.push(("mail key", m.api_key.to_string()));
                lines.push(("mail sender", presence(m.sender_email.as_deref())));
                lines.push(("mail recipient", presence(m.recipient.as_deref())));
            }
            None => lines.push(("mail", "not configured".to_string())),
        }

        match &self.chat_webhook {
            Some(url) => lines.push(("chat webhook", format!("configured {url}"))),
            None => lines.push(("chat webhook", "not configured".to_string())),
        }

        lines
    }

    pub fn log_summary(&self) {
        tracing::info!(
            persistence_configured = self.persistence.is_some(),
            persistence_key_kind = self.persistence.as_ref().map(|p| p.key_kind.as_str()),
            persistence_key = self.persistence.as_ref().map(|p| p.key.masked().to_string()),
            mail_configured = self.mail.is_some(),
            mail_login = self.mail.as_ref().map(|m| m.login.masked().to_string()),
            mail_key = self.mail.as_ref().map(|m| m.api_key.masked().to_string()),
            chat_configured = self.chat_webhook.is_some(),
            "resolved credentials"
        );
    }
}

fn presence(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("set ({v})"),
        None => "missing".to_string(),
    }
}
