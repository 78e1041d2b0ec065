//! Error types for the ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every failure is detected before the operation stages its first write, so
/// returning any of these leaves the store exactly as it was.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed, empty or self-referential input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Amount that does not parse as a decimal (or overflows it)
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// Referenced account is not registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// Account already registered
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Restraint does not allow the requested direction
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Balance lower than the requested amount
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Storage error (RocksDB, key encoding, corrupted records)
    #[error("Storage error: {0}")]
    Store(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for the error category, used in response envelopes and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::InvalidNumber(_) => "InvalidNumber",
            Error::NotFound(_) => "NotFound",
            Error::AlreadyExists(_) => "AlreadyExists",
            Error::Forbidden(_) => "Forbidden",
            Error::InsufficientFunds(_) => "InsufficientFunds",
            Error::Store(_) | Error::Serialization(_) | Error::Io(_) => "StoreError",
            Error::Concurrency(_) => "Concurrency",
            Error::Config(_) => "Config",
        }
    }

    pub(crate) fn not_registered(username: &str) -> Self {
        Error::NotFound(format!("username {} is not registered", username))
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Store(err.to_string())
    }
}
