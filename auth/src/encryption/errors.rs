use thiserror::Error;

/// Error type for transport envelope operations.
///
/// `DecryptionFailed` deliberately carries no cause: malformed encoding, a
/// short envelope and a failed tag check all look the same to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Invalid encryption key configuration: {0}")]
    InvalidKeyConfiguration(String),

    #[error("Error encrypting token")]
    EncryptionFailed,

    #[error("Error decrypting token. It may be invalid or tampered.")]
    DecryptionFailed,
}
