//! Core error types for focusloop-core.
//!
//! Storage failures carry a classification (`StorageErrorKind`) so that
//! callers can react to specific failure modes -- most importantly
//! `QuotaExceeded`, which callers are expected to answer with a pruning
//! pass and a single retry.

use serde::Serialize;
use thiserror::Error;

/// Core error type for focusloop-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Settings-related errors
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Classification of a storage failure.
///
/// This is the stable taxonomy delivered on the store's error channel;
/// the `StorageError` variants carry the underlying detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageErrorKind {
    QuotaExceeded,
    AccessDenied,
    Parse,
    Unknown,
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The medium is out of space
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The medium refused access (permissions, read-only, cannot open)
    #[error("storage access denied: {0}")]
    AccessDenied(String),

    /// A stored value could not be decoded
    #[error("stored value could not be parsed: {0}")]
    Parse(String),

    /// Anything else
    #[error("storage error: {0}")]
    Unknown(String),
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::QuotaExceeded(_) => StorageErrorKind::QuotaExceeded,
            StorageError::AccessDenied(_) => StorageErrorKind::AccessDenied,
            StorageError::Parse(_) => StorageErrorKind::Parse,
            StorageError::Unknown(_) => StorageErrorKind::Unknown,
        }
    }
}

/// Settings-specific errors.
///
/// Out-of-bound *values* never error (they are coerced to defaults); these
/// cover the string-keyed access path used by the CLI.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// No settings field with this name
    #[error("unknown settings key: {0}")]
    UnknownKey(String),

    /// The raw value cannot be parsed as the field's type
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => match code.code {
                rusqlite::ErrorCode::DiskFull => StorageError::QuotaExceeded(err.to_string()),
                rusqlite::ErrorCode::PermissionDenied
                | rusqlite::ErrorCode::ReadOnly
                | rusqlite::ErrorCode::CannotOpen => StorageError::AccessDenied(err.to_string()),
                rusqlite::ErrorCode::NotADatabase => StorageError::Parse(err.to_string()),
                _ => StorageError::Unknown(err.to_string()),
            },
            _ => StorageError::Unknown(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Parse(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
