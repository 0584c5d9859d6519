//! Worker error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Inbound data was neither the load sentinel nor a usable init payload.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Worker already has a canvas; second initialization rejected")]
    AlreadyInitialized,

    #[error("Worker has no canvas yet")]
    NotInitialized,

    #[error("2D context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Worker thread is gone")]
    Disconnected,
}
