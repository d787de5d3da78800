//! Error types for e2ee-keyring
//!
//! One flat `thiserror` enum with string payloads for lower-level failures,
//! plus a `Result` alias.

/// Main error type for key lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum E2eeError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Key encoding error: {0}")]
    Encoding(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Wrong password or corrupt wrapped container.
    #[error("Failed to unwrap private key: {0}")]
    KeyUnwrap(String),

    /// The cached key pair did not pass the canary round trip.
    #[error("The E2EE password is incorrect or the stored key pair is invalid")]
    Password,

    /// Structured failure reported by the remote key service.
    #[error("Remote key service error: {0}")]
    Remote(String),

    #[error("Unexpected response code {status} for URL: {url}.{}", body_suffix(.body))]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("The provided API key is invalid")]
    InvalidApiKey,

    #[error("No API key is configured")]
    CredentialMissing,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl E2eeError {
    /// True for failures talking to the remote key service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote(_)
                | Self::UnexpectedStatus { .. }
                | Self::InvalidApiKey
                | Self::Http(_)
                | Self::Json(_)
        )
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" Response body: {body}")
    }
}

impl From<tokio::task::JoinError> for E2eeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Blocking task failed: {err}"))
    }
}

/// Result type alias for key lifecycle operations
pub type Result<T> = std::result::Result<T, E2eeError>;
