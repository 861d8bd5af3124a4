use crate::config::{Config, Tables};
use crate::env::StaticEnv;
use crate::errors::{NotificationError, PersistenceError};
use crate::models::NewConsultation;
use crate::notify::{Channel, NotificationOutcome, Notifier};
use crate::persistence::Store;
use crate::state::{AppState, DependencyProvider, Dependencies};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::{Respond, ResponseTemplate};

pub fn consultation() -> NewConsultation {
    NewConsultation {
        name: "Kim".into(),
        contact: "010-1111-2222".into(),
        is_completed: false,
        click_source: "unknown".into(),
    }
}

#[derive(Clone, Copy)]
enum NotifierMode {
    Succeed,
    Fail,
    Panic,
}

pub struct RecordingNotifier {
    channel: Channel,
    mode: NotifierMode,
    calls: AtomicUsize,
}

impl RecordingNotifier {
    fn with_mode(channel: Channel, mode: NotifierMode) -> Self {
        RecordingNotifier {
            channel,
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(channel: Channel) -> Self {
        Self::with_mode(channel, NotifierMode::Succeed)
    }

    pub fn failing(channel: Channel) -> Self {
        Self::with_mode(channel, NotifierMode::Fail)
    }

    /// Panics with "mail boom" on every call.
    pub fn panicking(channel: Channel) -> Self {
        Self::with_mode(channel, NotifierMode::Panic)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn notify(
        &self,
        _consultation: &NewConsultation,
    ) -> Result<NotificationOutcome, NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            NotifierMode::Succeed => Ok(NotificationOutcome::Sent),
            NotifierMode::Fail => Err(NotificationError::Timeout(Duration::from_secs(5))),
            NotifierMode::Panic => panic!("mail boom"),
        }
    }
}

enum StoreMode {
    Echo,
    Reject(String),
    Panic,
}

pub struct RecordingStore {
    mode: StoreMode,
    inserted: Mutex<Vec<(String, Value)>>,
}

impl RecordingStore {
    fn with_mode(mode: StoreMode) -> Self {
        RecordingStore {
            mode,
            inserted: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::with_mode(StoreMode::Echo)
    }

    pub fn rejecting(message: &str) -> Self {
        Self::with_mode(StoreMode::Reject(message.to_string()))
    }

    pub fn panicking() -> Self {
        Self::with_mode(StoreMode::Panic)
    }

    pub fn inserted(&self) -> Vec<(String, Value)> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, PersistenceError> {
        let id = {
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push((table.to_string(), row.clone()));
            inserted.len()
        };

        match &self.mode {
            StoreMode::Echo => {
                let mut row = row;
                if let Value::Object(map) = &mut row {
                    map.insert("id".into(), json!(id));
                }
                Ok(vec![row])
            }
            StoreMode::Reject(message) => Err(PersistenceError::Rejected {
                status: 403,
                message: message.clone(),
                code: None,
            }),
            StoreMode::Panic => panic!("store exploded"),
        }
    }
}

/// Provider handing out the same recording doubles on every request.
#[derive(Clone)]
pub struct FixedDependencies {
    pub store: Option<Arc<RecordingStore>>,
    pub email: Option<Arc<RecordingNotifier>>,
    pub chat: Arc<RecordingNotifier>,
}

impl FixedDependencies {
    pub fn configured() -> Self {
        FixedDependencies {
            store: Some(Arc::new(RecordingStore::echo())),
            email: Some(Arc::new(RecordingNotifier::succeeding(Channel::Email))),
            chat: Arc::new(RecordingNotifier::succeeding(Channel::Chat)),
        }
    }

    pub fn unconfigured() -> Self {
        FixedDependencies {
            store: None,
            email: None,
            chat: Arc::new(RecordingNotifier::succeeding(Channel::Chat)),
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(Arc::new(self.clone()), Tables::default())
    }

    pub fn store_calls(&self) -> usize {
        self.store.as_ref().map_or(0, |s| s.inserted().len())
    }

    pub fn stored_tables(&self) -> Vec<String> {
        self.store
            .as_ref()
            .map(|s| s.inserted().into_iter().map(|(table, _)| table).collect())
            .unwrap_or_default()
    }

    pub fn email_calls(&self) -> usize {
        self.email.as_ref().map_or(0, |e| e.calls())
    }
}

impl DependencyProvider for FixedDependencies {
    fn resolve(&self) -> Dependencies {
        Dependencies {
            store: self.store.clone().map(|s| s as Arc<dyn Store>),
            email: self.email.clone().map(|e| e as Arc<dyn Notifier>),
            chat: self.chat.clone(),
        }
    }
}

/// Answers an insert the way the REST layer does with `return=representation`.
pub struct EchoInsert {
    next_id: AtomicU64,
}

impl EchoInsert {
    pub fn new() -> Self {
        EchoInsert {
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for EchoInsert {
    fn default() -> Self {
        Self::new()
    }
}

impl Respond for EchoInsert {
    fn respond(&self, request: &wiremock::Request) -> ResponseTemplate {
        let Ok(rows) = serde_json::from_slice::<Vec<Map<String, Value>>>(&request.body) else {
            return ResponseTemplate::new(400).set_body_json(json!({"message": "invalid body"}));
        };

        let stored: Vec<Value> = rows
            .into_iter()
            .map(|mut row| {
                row.insert("id".into(), json!(self.next_id.fetch_add(1, Ordering::SeqCst)));
                row.insert("created_at".into(), json!("2026-01-01T00:00:00+00:00"));
                Value::Object(row)
            })
            .collect();

        ResponseTemplate::new(201).set_body_json(stored)
    }
}

pub fn env_state(env: StaticEnv, configure: impl FnOnce(&mut Config)) -> AppState {
    let mut config = Config::default();
    configure(&mut config);
    AppState::from_env(&config, Arc::new(env)).unwrap()
}

pub async fn post_json(app: Router, path: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}
