use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid card id: {0}")]
    InvalidCardId(String),

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    // Input errors
    #[error("Invalid input event: {0}")]
    InvalidInput(String),

    // Collaborator errors
    #[error("Operation '{operation}' timed out after {duration_ms}ms")]
    Timeout {
        operation: &'static str,
        duration_ms: u64,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
