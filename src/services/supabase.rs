use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    RequestBuilder, Response, StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    config::AppConfig,
    error::{AppError, BackendError},
    models::session::{Session, SessionUser},
};

use super::backend::{AuthBackend, AuthConnector, DataBackend, DataConnector};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// HTTP handle to a Supabase project (GoTrue + PostgREST).
///
/// A handle without an access token talks to the backend as the anonymous
/// role. [`SupabaseClient::with_access_token`] gives a cheap copy that acts
/// on behalf of one signed-in user.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Arc<Url>,
    api_key: Arc<str>,
    access_token: Option<Arc<str>>,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| AppError::Other(err.into()))?;
        Ok(Self {
            http,
            base_url: Arc::new(config.supabase_url.clone()),
            api_key: Arc::from(config.supabase_anon_key.as_str()),
            access_token: None,
        })
    }

    pub fn with_access_token(&self, access_token: Option<String>) -> Self {
        Self {
            access_token: access_token
                .filter(|token| !token.is_empty())
                .map(Arc::from),
            ..self.clone()
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|err| BackendError::BackendUnavailable(format!("bad endpoint {path}: {err}")))
    }

    // The user's JWT when there is one, the anon key otherwise.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&*self.api_key);
        request.header("apikey", &*self.api_key).bearer_auth(bearer)
    }
}

async fn error_body(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

async fn json_body(response: Response) -> Result<Value, BackendError> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl DataBackend for SupabaseClient {
    async fn insert(&self, table: &str, record: Value) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{table}"))?;
        debug!(%url, as_user = self.access_token.is_some(), "inserting row");
        let response = self
            .authorized(self.http.post(url))
            .header("Prefer", "return=representation")
            .header(ACCEPT, HeaderValue::from_static(SINGLE_OBJECT))
            .json(&record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::InsertFailed {
                table: table.to_string(),
                message: error_body(response).await,
            });
        }
        json_body(response).await
    }

    async fn rpc(&self, procedure: &str, args: Value) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{procedure}"))?;
        debug!(%url, as_user = self.access_token.is_some(), "calling remote procedure");
        let response = self
            .authorized(self.http.post(url))
            .json(&args)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::RemoteProcedureFailed {
                procedure: procedure.to_string(),
                message: error_body(response).await,
            });
        }
        json_body(response).await
    }
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let url = self.endpoint("auth/v1/user")?;
        let response = self.authorized(self.http.get(url)).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let user: UserResponse = serde_json::from_value(json_body(response).await?)?;
                Ok(Some(Session {
                    access_token: token.to_string(),
                    user: SessionUser {
                        id: user.id,
                        email: user.email,
                    },
                }))
            }
            _ => Err(BackendError::BackendUnavailable(error_body(response).await)),
        }
    }
}

impl AuthConnector for SupabaseClient {
    fn connect(&self, access_token: Option<String>) -> Arc<dyn AuthBackend> {
        Arc::new(self.with_access_token(access_token))
    }
}

impl DataConnector for SupabaseClient {
    fn scoped(&self, access_token: Option<String>) -> Arc<dyn DataBackend> {
        Arc::new(self.with_access_token(access_token))
    }
}
