//! Error types for keyward-core

use thiserror::Error;

/// Result type alias for keyward operations
pub type Result<T> = std::result::Result<T, KeywardError>;

/// Keyward error types
#[derive(Error, Debug)]
pub enum KeywardError {
    /// A required input was empty, released, or otherwise unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A numeric or size bound was violated
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Required key material or configuration is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A persisted record could not be read back
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Decryption failed: {0}")]
    DecryptionError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl KeywardError {
    /// Shorthand for an `InvalidArgument` naming the offending parameter
    pub(crate) fn invalid(argument: &str, reason: &str) -> Self {
        Self::InvalidArgument(format!("{}: {}", argument, reason))
    }

    /// Shorthand for an `OutOfRange` naming the offending parameter
    pub(crate) fn out_of_range(argument: &str, reason: &str) -> Self {
        Self::OutOfRange(format!("{}: {}", argument, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_argument() {
        let err = KeywardError::invalid("buffer", "must not be empty");
        assert_eq!(err.to_string(), "Invalid argument: buffer: must not be empty");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: KeywardError = io.into();
        assert!(matches!(err, KeywardError::IoError(_)));
    }
}
