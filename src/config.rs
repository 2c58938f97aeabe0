use std::{env, net::SocketAddr, time::Duration};

use url::Url;

use crate::error::AppError;

pub const DEFAULT_REDIRECT_PATH: &str = "/auth";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: Url,
    pub supabase_anon_key: String,
    pub listen_addr: SocketAddr,
    pub auth_redirect_path: String,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("SUPABASE_URL")
            .ok_or_else(|| AppError::Config("SUPABASE_URL is not set".into()))?;
        let supabase_url = parse_base_url(&raw_url)?;

        let supabase_anon_key = lookup("SUPABASE_ANON_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("SUPABASE_ANON_KEY is not set".into()))?;

        let listen_addr: SocketAddr = lookup("APP_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let auth_redirect_path =
            lookup("AUTH_REDIRECT_PATH").unwrap_or_else(|| DEFAULT_REDIRECT_PATH.to_string());
        if !is_local_path(&auth_redirect_path) {
            return Err(AppError::Config(format!(
                "AUTH_REDIRECT_PATH must be an absolute path on this host, got {auth_redirect_path:?}"
            )));
        }

        let timeout_secs: u64 = lookup("SUPABASE_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid SUPABASE_TIMEOUT_SECS: {err}")))?;

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            listen_addr,
            auth_redirect_path,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// "//host" and "/\host" are read by browsers as another origin.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

// Url::join drops the last path segment unless the base ends with a slash.
fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|err| AppError::Config(format!("invalid SUPABASE_URL: {err}")))
}
