use reqwest::{Method, StatusCode};

/// Failure talking to the REST API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Server answered with a non-success status.
    #[error("{method} {path} returned {status}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
    },

    /// Connection, timeout or TLS failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body was not the expected JSON shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

/// Failure on the live update channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("invalid channel address {url}: {reason}")]
    InvalidAddress { url: String, reason: String },

    #[error("websocket handshake failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("websocket transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is not a usable base address: {value:?}")]
    InvalidBase { key: &'static str, value: String },

    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be one of `upsert` or `append`, got {value:?}")]
    InvalidPolicy { key: &'static str, value: String },
}
