//! Client for the hosted relational backend, spoken to over its REST interface.

use crate::env::PersistenceCredentials;
use crate::errors::PersistenceError;
use crate::redact::Secret;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Append-only access to the data store.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts one row and returns the rows as stored, generated columns included.
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, PersistenceError>;
}

// Error body returned by the REST layer on rejected writes.
#[derive(Deserialize)]
struct ProviderError {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
}

pub struct RestStore {
    client: reqwest::Client,
    rest_url: String,
    key: Secret,
}

impl RestStore {
    pub fn new(client: reqwest::Client, credentials: &PersistenceCredentials) -> Self {
        let rest_url = format!("{}/{}", credentials.url.trim_end_matches('/'), "rest/v1");

        RestStore {
            client,
            rest_url,
            key: credentials.key.clone(),
        }
    }

    /// `None` when the deployment has no persistence credentials.
    pub fn from_credentials(
        client: reqwest::Client,
        credentials: Option<&PersistenceCredentials>,
    ) -> Option<Self> {
        credentials.map(|c| RestStore::new(client, c))
    }
}

#[async_trait]
impl Store for RestStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, PersistenceError> {
        let url = format!("{}/{}", self.rest_url, table);

        let response = self
            .client
            .post(&url)
            .header("apikey", self.key.expose())
            .bearer_auth(self.key.expose())
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .map_err(PersistenceError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(table, status = status.as_u16(), body = %body, "data store rejected insert");
            return Err(rejection(status.as_u16(), &body));
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(PersistenceError::Decode)
    }
}

fn rejection(status: u16, body: &str) -> PersistenceError {
    match serde_json::from_str::<ProviderError>(body) {
        Ok(ProviderError {
            message: Some(message),
            code,
            details,
        }) => {
            if let Some(details) = details {
                tracing::debug!(details = %details, "data store rejection details");
            }
            PersistenceError::Rejected {
                status,
                message,
                code,
            }
        }
        _ => PersistenceError::Rejected {
            status,
            message: if body.is_empty() {
                format!("status {status}")
            } else {
                body.to_string()
            },
            code: None,
        },
    }
}
