use std::fmt;

use aes_gcm::aead::Aead;
use aes_gcm::aead::AeadCore;
use aes_gcm::aead::KeyInit;
use aes_gcm::aead::OsRng;
use aes_gcm::Aes256Gcm;
use aes_gcm::Nonce;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::errors::EncryptionError;

/// AES-GCM nonce length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-256 key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// Symmetric AEAD wrapper for signed tokens in transit.
///
/// Envelope layout is `nonce (12 bytes) || ciphertext || tag`, base64
/// encoded. A fresh nonce is drawn from the OS random source for every
/// encryption. The key is fixed for the lifetime of the value.
#[derive(Clone)]
pub struct TransportEncryptor {
    cipher: Aes256Gcm,
}

impl TransportEncryptor {
    /// Create an encryptor from raw key bytes.
    ///
    /// # Errors
    /// * `InvalidKeyConfiguration` - Key is not exactly 32 bytes
    pub fn new(key: &[u8]) -> Result<Self, EncryptionError> {
        if key.len() != KEY_LENGTH {
            return Err(EncryptionError::InvalidKeyConfiguration(format!(
                "expected {} bytes, got {}",
                KEY_LENGTH,
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| EncryptionError::InvalidKeyConfiguration(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Create an encryptor from a base64 encoded key.
    ///
    /// # Errors
    /// * `InvalidKeyConfiguration` - Key is not valid base64 or has the wrong length
    pub fn from_base64_key(encoded: &str) -> Result<Self, EncryptionError> {
        let key = STANDARD.decode(encoded.trim()).map_err(|e| {
            EncryptionError::InvalidKeyConfiguration(format!("key is not valid base64: {}", e))
        })?;

        Self::new(&key)
    }

    /// Encrypt a token into a transport envelope.
    ///
    /// # Errors
    /// * `EncryptionFailed` - Cipher rejected the input
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| {
                tracing::error!("Error encrypting token");
                EncryptionError::EncryptionFailed
            })?;

        let mut envelope = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        envelope.extend_from_slice(nonce.as_slice());
        envelope.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(envelope))
    }

    /// Open a transport envelope.
    ///
    /// # Errors
    /// * `DecryptionFailed` - Envelope is malformed, too short, tampered with
    ///   or was sealed under another key
    pub fn decrypt(&self, envelope: &str) -> Result<String, EncryptionError> {
        let bytes = STANDARD.decode(envelope).map_err(|e| {
            tracing::debug!(error = %e, "Envelope is not valid base64");
            EncryptionError::DecryptionFailed
        })?;

        if bytes.len() < NONCE_LENGTH {
            tracing::debug!(length = bytes.len(), "Envelope shorter than nonce");
            return Err(EncryptionError::DecryptionFailed);
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LENGTH);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                tracing::debug!("Envelope authentication failed");
                EncryptionError::DecryptionFailed
            })?;

        String::from_utf8(plaintext).map_err(|_| {
            tracing::debug!("Envelope plaintext is not utf-8");
            EncryptionError::DecryptionFailed
        })
    }
}

impl fmt::Debug for TransportEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportEncryptor").finish_non_exhaustive()
    }
}
