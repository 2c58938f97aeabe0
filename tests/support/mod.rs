#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use rides::{
    auth::Navigator,
    config::AppConfig,
    error::BackendError,
    models::session::{Session, SessionUser},
    services::backend::{AuthBackend, AuthConnector, DataBackend, DataConnector},
};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

pub fn test_config(redirect: &str) -> AppConfig {
    AppConfig {
        supabase_url: Url::parse("http://backend.test/").expect("static url"),
        supabase_anon_key: "anon".into(),
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        auth_redirect_path: redirect.into(),
        request_timeout: Duration::from_secs(1),
    }
}

#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Active(String),
    Missing,
    Failing,
}

#[derive(Debug)]
pub struct StubAuth {
    outcome: SessionOutcome,
    access_token: Option<String>,
}

impl StubAuth {
    pub fn new(outcome: SessionOutcome) -> Self {
        Self {
            outcome,
            access_token: None,
        }
    }

    pub fn with_token(outcome: SessionOutcome, access_token: String) -> Self {
        Self {
            outcome,
            access_token: Some(access_token),
        }
    }
}

#[async_trait]
impl AuthBackend for StubAuth {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        match &self.outcome {
            SessionOutcome::Active(user_id) => Ok(Some(Session {
                access_token: self
                    .access_token
                    .clone()
                    .unwrap_or_else(|| format!("token-for-{user_id}")),
                user: SessionUser {
                    id: user_id.clone(),
                    email: None,
                },
            })),
            SessionOutcome::Missing => Ok(None),
            SessionOutcome::Failing => Err(BackendError::BackendUnavailable(
                "auth service unreachable".into(),
            )),
        }
    }
}

/// Maps known access tokens to user ids; everything else is anonymous.
#[derive(Debug, Default)]
pub struct TokenAuth {
    users: HashMap<String, String>,
    failing: AtomicBool,
}

impl TokenAuth {
    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.users.insert(token.into(), user_id.into());
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl AuthConnector for TokenAuth {
    fn connect(&self, access_token: Option<String>) -> Arc<dyn AuthBackend> {
        if self.failing.load(Ordering::SeqCst) {
            return Arc::new(StubAuth::new(SessionOutcome::Failing));
        }
        match access_token {
            Some(token) => {
                let outcome = self
                    .users
                    .get(&token)
                    .cloned()
                    .map_or(SessionOutcome::Missing, SessionOutcome::Active);
                Arc::new(StubAuth::with_token(outcome, token))
            }
            None => Arc::new(StubAuth::new(SessionOutcome::Missing)),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator(Mutex<Vec<String>>);

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.0.lock().expect("navigator lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.0.lock().expect("navigator lock").push(path.to_string());
    }
}

/// Stores inserted rows in memory and answers every RPC with the configured
/// driver rows. Scoped copies share the same storage and remember which
/// access token each call was made with.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    state: Arc<MemoryState>,
    access_token: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Mutex<Vec<(String, Value)>>,
    drivers: Mutex<Vec<Value>>,
    rpc_calls: Mutex<Vec<(String, Value)>>,
    call_tokens: Mutex<Vec<Option<String>>>,
    failing: AtomicBool,
}

impl MemoryBackend {
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    pub fn add_driver(&self, id: &str, distance_km: f64) {
        self.state
            .drivers
            .lock()
            .expect("drivers lock")
            .push(json!({ "id": id, "distance_km": distance_km }));
    }

    pub fn rows(&self) -> Vec<(String, Value)> {
        self.state.rows.lock().expect("rows lock").clone()
    }

    pub fn rpc_calls(&self) -> Vec<(String, Value)> {
        self.state.rpc_calls.lock().expect("rpc lock").clone()
    }

    /// The access token of every insert and rpc, in call order.
    pub fn call_tokens(&self) -> Vec<Option<String>> {
        self.state.call_tokens.lock().expect("tokens lock").clone()
    }

    fn failing(&self) -> bool {
        self.state.failing.load(Ordering::SeqCst)
    }

    fn record_token(&self) {
        self.state
            .call_tokens
            .lock()
            .expect("tokens lock")
            .push(self.access_token.clone());
    }
}

#[async_trait]
impl DataBackend for MemoryBackend {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, BackendError> {
        self.record_token();
        if self.failing() {
            return Err(BackendError::InsertFailed {
                table: table.into(),
                message: "HTTP 400: violates row-level security policy".into(),
            });
        }
        self.state
            .rows
            .lock()
            .expect("rows lock")
            .push((table.into(), record.clone()));

        let mut stored = record;
        stored["id"] = json!(Uuid::new_v4());
        stored["created_at"] = json!(Utc::now());
        Ok(stored)
    }

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value, BackendError> {
        self.record_token();
        self.state
            .rpc_calls
            .lock()
            .expect("rpc lock")
            .push((procedure.into(), args));
        if self.failing() {
            return Err(BackendError::RemoteProcedureFailed {
                procedure: procedure.into(),
                message: "HTTP 500".into(),
            });
        }
        Ok(Value::Array(
            self.state.drivers.lock().expect("drivers lock").clone(),
        ))
    }
}

impl DataConnector for MemoryBackend {
    fn scoped(&self, access_token: Option<String>) -> Arc<dyn DataBackend> {
        Arc::new(Self {
            state: self.state.clone(),
            access_token,
        })
    }
}
