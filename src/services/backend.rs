use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{error::BackendError, models::session::Session};

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// `Ok(None)` means the caller is anonymous.
    async fn get_session(&self) -> Result<Option<Session>, BackendError>;
}

/// Row storage and stored procedures of the managed backend.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Inserts one row and returns it as stored, with generated columns.
    async fn insert(&self, table: &str, record: Value) -> Result<Value, BackendError>;

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value, BackendError>;
}

/// Binds an [`AuthBackend`] to the access token a request carried.
pub trait AuthConnector: Send + Sync {
    fn connect(&self, access_token: Option<String>) -> Arc<dyn AuthBackend>;
}

/// Binds a [`DataBackend`] to the caller's access token, so row-level
/// policies on the backend see the passenger instead of the anonymous role.
pub trait DataConnector: Send + Sync {
    fn scoped(&self, access_token: Option<String>) -> Arc<dyn DataBackend>;
}
