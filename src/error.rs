use thiserror::Error;

use crate::domain::ApiPathError;

/// Longest error message shown to the user.
pub const DISPLAY_MESSAGE_LIMIT: usize = 100;

/// Failure of a backend call, shared by fetchers and actions.
///
/// `Clone` because one in-flight failure is handed to every caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Network-level failure (timeout, refused connection, DNS). The user may retry manually.
    #[error("could not reach the backend: {cause}")]
    Transport { cause: String },
    /// Non-2xx answer. Never retried automatically.
    #[error("backend answered {status_code}: {message}")]
    Backend {
        status_code: u16,
        message: String,
        raw_body: String,
    },
    /// 2xx answer whose body does not match the expected shape.
    #[error("could not decode the backend response: {reason}")]
    Decode { reason: String, raw_body: String },
    #[error("request was cancelled")]
    Cancelled,
    #[error("invalid backend route: {0}")]
    InvalidPath(#[from] ApiPathError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Flat classification of a [`ClientError`], for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Backend,
    Decode,
    Cancelled,
    InvalidRequest,
}

impl ClientError {
    pub fn decode(reason: impl ToString, raw_body: impl Into<String>) -> Self {
        ClientError::Decode {
            reason: reason.to_string(),
            raw_body: raw_body.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport { .. } => ErrorKind::Transport,
            ClientError::Backend { .. } => ErrorKind::Backend,
            ClientError::Decode { .. } => ErrorKind::Decode,
            ClientError::Cancelled => ErrorKind::Cancelled,
            ClientError::InvalidPath(_) | ClientError::InvalidRequest(_) => {
                ErrorKind::InvalidRequest
            }
        }
    }

    /// Only transport failures are worth offering a manual "try again" for.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }

    pub fn display_message(&self) -> String {
        truncate_message(&self.to_string(), DISPLAY_MESSAGE_LIMIT)
    }
}

/// Cuts `message` to at most `limit` characters, marking the cut with `...`.
pub fn truncate_message(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = message.chars().take(keep).collect();
    out.push_str("...");
    out
}
