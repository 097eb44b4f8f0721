//! Errors the engine can return.
//!
//! Every failure belongs to one of three classes ([`ErrorKind`]):
//!
//! - the network or the HTTP layer failed ([`ErrorKind::Network`]);
//! - the input was refused before any request was sent
//!   ([`ErrorKind::Validation`]);
//! - the backend refused the operation ([`ErrorKind::Rejected`]).
//!
//! The UI handles all of them the same way: log, show a blocking alert built
//! from [`EngineError::alert_message`], keep local state as it was.
use thiserror::Error;

/// Failure class, used to pick the alert wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    Rejected,
}

/// Errors returned by the HTTP backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(String),
}

impl ApiError {
    /// Maps a non-success HTTP status and the `error` body field.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Rejected(message),
            _ => Self::Server(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized | Self::Forbidden | Self::NotFound | Self::Rejected(_) => {
                ErrorKind::Rejected
            }
            Self::Server(_) | Self::Transport(_) | Self::Url(_) => ErrorKind::Network,
        }
    }
}

/// Engine custom errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),
    #[error("a submission is already in progress")]
    InFlight,
    #[error("not signed in")]
    NoSession,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InFlight | Self::NoSession => ErrorKind::Validation,
            Self::Api(err) => err.kind(),
            Self::Io(_) | Self::Json(_) => ErrorKind::Network,
        }
    }

    /// `true` when the backend no longer accepts the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(ApiError::Unauthorized))
    }

    /// Text shown to the user in the blocking alert.
    pub fn alert_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::InFlight => "Please wait, the previous request is still running.".to_string(),
            Self::NoSession => "Your session has ended. Please sign in again.".to_string(),
            Self::Api(ApiError::Unauthorized) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::Api(ApiError::Forbidden) => "You are not allowed to do this.".to_string(),
            Self::Api(ApiError::NotFound) => "The record no longer exists.".to_string(),
            Self::Api(ApiError::Rejected(message)) => message.clone(),
            Self::Api(ApiError::Server(message)) => format!("Server error: {message}"),
            Self::Api(ApiError::Transport(err)) => format!("Server unreachable: {err}"),
            Self::Api(ApiError::Url(message)) => format!("Invalid server address: {message}"),
            Self::Io(err) => format!("Local storage error: {err}"),
            Self::Json(err) => format!("Local storage is corrupted: {err}"),
        }
    }
}
