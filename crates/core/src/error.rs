//! Error taxonomy for a widget session.

use reqwest::StatusCode;

/// Why a credential could not be obtained.
///
/// Every variant aborts the session attempt in the same way; the variants only
/// exist so the failure can be told apart in logs.
#[derive(Debug, thiserror::Error)]
pub enum CredentialFetchError {
    #[error("Backend URL is not configured")]
    MissingBackendUrl,
    #[error("Invalid backend URL '{0}': {1}")]
    InvalidBackendUrl(String, String),
    #[error("Token request could not complete: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Token fetch failed: {0}")]
    Rejected(StatusCode),
}

/// Coarse classification of a [`CredentialFetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    Configuration,
    Network,
    Rejected,
}

impl CredentialFetchError {
    pub fn kind(&self) -> FetchFailureKind {
        match self {
            Self::MissingBackendUrl | Self::InvalidBackendUrl(..) => FetchFailureKind::Configuration,
            Self::Network(_) => FetchFailureKind::Network,
            Self::Rejected(_) => FetchFailureKind::Rejected,
        }
    }
}

/// A data channel payload that could not be decoded. Never fatal.
#[derive(Debug, thiserror::Error)]
pub enum MalformedCommand {
    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a session ended without the UI asking for it.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not fetch session credential: {0}")]
    Credential(#[from] CredentialFetchError),
    #[error("Failed to connect to realtime server: {0:#}")]
    TransportConnect(anyhow::Error),
    #[error("Realtime session disconnected{}", reason_suffix(.reason))]
    TransportDisconnected { reason: Option<String> },
    #[error("Realtime transport failed: {0}")]
    Transport(String),
    #[error("Session task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}
