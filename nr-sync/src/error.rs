use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("credential unavailable: {0}")]
    CredentialUnavailable(String),

    #[error("discovery query failed: {0}")]
    DiscoveryQueryFailed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema bundle error: {0}")]
    Schema(String),

    #[error("registry {operation} failed for {subject}: {message}")]
    Registry {
        operation: String,
        subject: String,
        message: String
    }
}

impl SyncError {
    /// Fatal errors halt the run; per-item registry failures are absorbed
    /// by the synchronizer loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Registry { .. })
    }

    pub fn registry(operation: &str, subject: &str, message: impl ToString) -> Self {
        Self::Registry {
            operation: operation.to_string(),
            subject: subject.to_string(),
            message: message.to_string()
        }
    }
}
