//! Error types for paperaxon operations

use crate::task::TaskKind;
use std::time::Duration;

/// Boxed underlying cause carried by network failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum AxonError {
    /// The request never reached the backend, or no response came back.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The backend answered with a non-2xx status. `body` is the raw text.
    #[error("{}", http_message(.status, .body))]
    Http { status: u16, body: String },

    /// A poll ran past the caller's deadline. The backend job keeps running.
    #[error("Timed out after {waited:?} waiting for {kind} task {task_id}")]
    TaskTimeout {
        task_id: String,
        kind: TaskKind,
        waited: Duration,
    },

    /// The backend reported the task as failed.
    #[error("{kind} task {task_id} failed: {message}")]
    TaskFailed {
        task_id: String,
        kind: TaskKind,
        message: String,
    },

    #[error("Unexpected response from backend: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

fn http_message(status: &u16, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}

impl AxonError {
    pub fn network(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: source.into(),
        }
    }

    /// HTTP status code, when the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for failures of a single request (network or HTTP status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Http { .. })
    }

    /// Short machine-readable code, used for `--json` error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Http { .. } => "http_error",
            Self::TaskTimeout { .. } => "task_timeout",
            Self::TaskFailed { .. } => "task_failed",
            Self::Decode(_) => "decode_error",
            Self::Io(_) => "io_error",
            Self::ConfigParse(_) => "config_error",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }
}
