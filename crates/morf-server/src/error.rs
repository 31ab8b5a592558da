use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] morf_core::Error),

    #[error("Malformed request: {0}")]
    Protocol(String),

    #[error("Server replied with an error: {0}")]
    Remote(String),

    #[error("Connection closed by peer")]
    Disconnected,

    #[error("Learner lock poisoned by a panicking request")]
    Poisoned,

    #[error("Learner task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
