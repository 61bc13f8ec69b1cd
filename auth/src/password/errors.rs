use thiserror::Error;

/// Error type for password operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Unrecognized password scheme: {0}")]
    UnrecognizedScheme(String),

    #[error("Malformed password record: {0}")]
    MalformedRecord(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
