use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Failures reported by the auth and data backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("no session")]
    NoSession,
    #[error("insert into `{table}` failed: {message}")]
    InsertFailed { table: String, message: String },
    #[error("remote procedure `{procedure}` failed: {message}")]
    RemoteProcedureFailed { procedure: String, message: String },
    #[error("unexpected backend response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::BackendUnavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("passenger id is required")]
    MissingPassenger,
    #[error("radius must be a positive number of kilometres, got {0}")]
    InvalidRadius(f64),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("redirecting to {0}")]
    Redirect(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Dispatch(DispatchError::Backend(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Redirect(path) => return Redirect::to(path).into_response(),
            AppError::Config(_) | AppError::Io(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::BadRequest(_)
            | AppError::Dispatch(DispatchError::MissingPassenger)
            | AppError::Dispatch(DispatchError::InvalidRadius(_)) => StatusCode::BAD_REQUEST,
            AppError::Dispatch(DispatchError::Backend(_)) => StatusCode::BAD_GATEWAY,
        };

        (status, self.to_string()).into_response()
    }
}
