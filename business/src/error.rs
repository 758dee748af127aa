//! Error taxonomy for backend and object-store calls.
//!
//! [`ApiError`] is what a single request can fail with. [`extract_error_message`]
//! turns it into the one human-readable string the UI is allowed to show, and
//! [`PipelineError`] tags that string with the upload stage that failed.

use serde_json::Value;

use crate::http::{HttpError, HttpErrorKind};

pub const NO_CONNECTION_MESSAGE: &str = "No internet connection. Please check your network.";
pub const TIMEOUT_MESSAGE: &str = "Request timed out. Please try again.";
pub const INVALID_DATA_MESSAGE: &str = "Invalid data provided.";
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Failure of one HTTP exchange, before any message extraction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Vec<u8> },
    #[error("Unexpected response body: {0}")]
    Decode(String),
    #[error("Failed to read local file: {0}")]
    Io(String),
    #[error("{0}")]
    Rejected(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Pick the message shown to the user for a failed request.
///
/// Priority: a structured `error.message` from the server, then a `detail`
/// or `message` string, then the first entry of a `detail` validation list,
/// then the network classification, then a generic fallback.
pub fn extract_error_message(error: &ApiError) -> String {
    match error {
        ApiError::Status { status, body } => {
            server_message(body).unwrap_or_else(|| format!("Request failed with status code {status}"))
        }
        ApiError::Http(http) => match http.kind {
            HttpErrorKind::Connect => NO_CONNECTION_MESSAGE.to_owned(),
            HttpErrorKind::Timeout => TIMEOUT_MESSAGE.to_owned(),
            HttpErrorKind::Other => FALLBACK_MESSAGE.to_owned(),
        },
        ApiError::Rejected(message) | ApiError::Io(message) if !message.trim().is_empty() => {
            message.clone()
        }
        ApiError::Rejected(_) | ApiError::Io(_) | ApiError::Decode(_) => {
            FALLBACK_MESSAGE.to_owned()
        }
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    let data: Value = serde_json::from_slice(body).ok()?;

    if let Some(message) = data
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_owned());
    }

    if let Some(detail) = data.get("detail").and_then(Value::as_str) {
        return Some(detail.to_owned());
    }

    if let Some(message) = data.get("message").and_then(Value::as_str) {
        return Some(message.to_owned());
    }

    if let Some(details) = data.get("detail").and_then(Value::as_array) {
        let first = details
            .first()
            .and_then(|entry| entry.get("msg"))
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty());
        return Some(first.unwrap_or(INVALID_DATA_MESSAGE).to_owned());
    }

    None
}

/// A terminal failure of one upload stage, or the non-fatal history refresh.
///
/// Displays as the extracted message only; the stage is for logs and matching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Resolution(String),
    #[error("{message}")]
    Transfer { file_name: String, message: String },
    #[error("{0}")]
    Registration(String),
    #[error("{0}")]
    HistoryRefresh(String),
    #[error("{0}")]
    InvalidBatch(String),
}

impl PipelineError {
    pub fn resolution(error: &ApiError) -> Self {
        Self::Resolution(extract_error_message(error))
    }

    pub fn transfer(file_name: impl Into<String>, error: &ApiError) -> Self {
        Self::Transfer {
            file_name: file_name.into(),
            message: extract_error_message(error),
        }
    }

    pub fn registration(error: &ApiError) -> Self {
        Self::Registration(extract_error_message(error))
    }

    pub fn history_refresh(error: &ApiError) -> Self {
        Self::HistoryRefresh(extract_error_message(error))
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolve",
            Self::Transfer { .. } => "transfer",
            Self::Registration(_) => "register",
            Self::HistoryRefresh(_) => "history",
            Self::InvalidBatch(_) => "validate",
        }
    }
}
