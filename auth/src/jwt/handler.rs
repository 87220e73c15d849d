use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::errors::JwtError;

/// Minimum HMAC-SHA256 secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// HS256 signer and signature verifier.
///
/// Checks signatures only. Validity windows are enforced by
/// [`TokenCodec`](super::TokenCodec) against its own clock.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens, at least 32 bytes
    ///
    /// # Errors
    /// * `InvalidKeyConfiguration` - Secret is shorter than 32 bytes
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(JwtError::InvalidKeyConfiguration(format!(
                "expected at least {} bytes, got {}",
                MIN_SECRET_LENGTH,
                secret.len()
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        })
    }

    /// Create a handler from a base64 encoded secret.
    ///
    /// # Errors
    /// * `InvalidKeyConfiguration` - Secret is not valid base64 or too short
    pub fn from_base64_secret(encoded: &str) -> Result<Self, JwtError> {
        let secret = STANDARD.decode(encoded.trim()).map_err(|e| {
            JwtError::InvalidKeyConfiguration(format!("secret is not valid base64: {}", e))
        })?;

        Self::new(&secret)
    }

    /// Sign claims into a compact token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature of a token and return its claims.
    ///
    /// # Errors
    /// * `TokenInvalid` - Token is not a well-formed token signed with this key
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token signature verification failed");
                JwtError::TokenInvalid
            })
    }
}
