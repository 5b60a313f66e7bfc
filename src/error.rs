//! Crate-level error type

use crate::producer::StoreError;

/// Errors surfaced by the server and by producer cycles
#[derive(Debug)]
pub enum Error {
    /// Socket or listener failure
    Io(std::io::Error),
    /// Record store rejected a write
    Store(StoreError),
    /// Payload could not be serialized
    Serialize(serde_json::Error),
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Store(e) => write!(f, "Store error: {}", e),
            Error::Serialize(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Store(e) => Some(e),
            Error::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Error::Store(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialize(e)
    }
}
