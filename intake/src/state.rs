//! Per-request dependency resolution.
//!
//! Handlers never reach for globals. Each request asks the
//! [`DependencyProvider`] once for a fresh [`Dependencies`] value, and an
//! absent persistence handle is an explicit `None` the handler must check.

use crate::config::{Config, Tables};
use crate::env::{Credentials, EnvSource};
use crate::notify::Notifier;
use crate::notify::chat::ChatNotifier;
use crate::notify::email::EmailNotifier;
use crate::persistence::{RestStore, Store};
use std::sync::Arc;
use std::time::Duration;

pub struct Dependencies {
    pub store: Option<Arc<dyn Store>>,
    /// `None` when mail credentials are absent; the email step is then skipped.
    pub email: Option<Arc<dyn Notifier>>,
    pub chat: Arc<dyn Notifier>,
}

pub trait DependencyProvider: Send + Sync {
    fn resolve(&self) -> Dependencies;

    fn persistence_configured(&self) -> bool {
        self.resolve().store.is_some()
    }
}

/// Builds clients from credentials found in the environment.
pub struct EnvDependencies {
    env: Arc<dyn EnvSource>,
    client: reqwest::Client,
    chat_timeout: Duration,
    mail_api_url: String,
    mail_timeout: Duration,
}

impl EnvDependencies {
    pub fn new(config: &Config, env: Arc<dyn EnvSource>, client: reqwest::Client) -> Self {
        EnvDependencies {
            env,
            client,
            chat_timeout: Duration::from_secs(config.chat.timeout_secs),
            mail_api_url: config.mail.api_url.clone(),
            mail_timeout: Duration::from_secs(config.mail.timeout_secs),
        }
    }
}

impl DependencyProvider for EnvDependencies {
    fn resolve(&self) -> Dependencies {
        let credentials = Credentials::load(self.env.as_ref());
        credentials.log_summary();

        let store = RestStore::from_credentials(self.client.clone(), credentials.persistence.as_ref())
            .map(|store| Arc::new(store) as Arc<dyn Store>);

        let email = EmailNotifier::from_credentials(
            self.client.clone(),
            self.mail_api_url.clone(),
            credentials.mail,
            self.mail_timeout,
        )
        .ok()
        .map(|notifier| Arc::new(notifier) as Arc<dyn Notifier>);

        let chat = Arc::new(ChatNotifier::new(
            self.client.clone(),
            credentials.chat_webhook,
            self.chat_timeout,
        ));

        Dependencies { store, email, chat }
    }

    fn persistence_configured(&self) -> bool {
        Credentials::load(self.env.as_ref()).persistence.is_some()
    }
}

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn DependencyProvider>,
    tables: Arc<Tables>,
}

impl AppState {
    pub fn new(provider: Arc<dyn DependencyProvider>, tables: Tables) -> Self {
        AppState {
            provider,
            tables: Arc::new(tables),
        }
    }

    pub fn from_env(config: &Config, env: Arc<dyn EnvSource>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("leadline-intake/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let provider = EnvDependencies::new(config, env, client);

        Ok(AppState::new(Arc::new(provider), config.tables.clone()))
    }

    pub fn resolve(&self) -> Dependencies {
        self.provider.resolve()
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn is_ready(&self) -> bool {
        self.provider.persistence_configured()
    }
}
