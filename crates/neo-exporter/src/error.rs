use thiserror::Error;

/// Errors returned by chain access operations.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("invocation failed: {0}")]
    Invocation(String),

    #[error("no healthy client")]
    NoHealthyClient,

    #[error("unexpected stack item: {0}")]
    Stack(String),

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("invalid script hash: {0}")]
    InvalidHash(String),

    #[error("invalid network address: {0}")]
    Address(String),

    #[error("locode error: {0}")]
    Locode(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl ExporterError {
    pub fn stack(msg: impl Into<String>) -> Self {
        Self::Stack(msg.into())
    }
}
