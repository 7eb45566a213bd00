use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("A resolver worker is already running (run {run})")]
    AlreadyRunning { run: u64 },

    #[error("Failed to spawn resolver worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Blocking wait unavailable: {0}")]
    WaitUnavailable(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
