use thiserror::Error;

/// Error type for token operations.
///
/// `TokenInvalid` covers both a bad signature and an elapsed validity window;
/// the two are not told apart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Invalid signing key configuration: {0}")]
    InvalidKeyConfiguration(String),

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is invalid or expired")]
    TokenInvalid,

    #[error("Token is malformed: {0}")]
    MalformedToken(String),

    #[error("Token contains an invalid identifier: {0}")]
    InvalidIdentifier(String),
}
