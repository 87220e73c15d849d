use chrono::Duration;

use crate::encryption::EncryptionError;
use crate::encryption::TransportEncryptor;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenCodec;
use crate::password::PasswordError;
use crate::password::PasswordHasher;
use crate::principal::Authentication;
use crate::principal::Principal;

/// Authentication coordinator combining password verification, token
/// signing and transport encryption.
///
/// Holds the signing and encryption keys for the process lifetime; every
/// method takes `&self`, so one instance is shared behind an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    encryptor: TransportEncryptor,
    token_validity: Duration,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Encrypted, signed access token for the `Authorization` header
    pub access_token: String,
    pub authentication: Authentication,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),

    #[error("Encryption error: {0}")]
    EncryptionError(#[from] EncryptionError),
}

impl AuthenticationError {
    /// True for failures that answer "who are you" (401), false for
    /// internal faults.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthenticationError::InvalidCredentials
                | AuthenticationError::EncryptionError(EncryptionError::DecryptionFailed)
                | AuthenticationError::JwtError(
                    JwtError::TokenInvalid
                        | JwtError::MalformedToken(_)
                        | JwtError::InvalidIdentifier(_)
                )
        )
    }
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `token_codec` - Signs and verifies access tokens
    /// * `encryptor` - Wraps signed tokens for transport
    /// * `token_validity` - Lifetime of issued tokens
    pub fn new(
        token_codec: TokenCodec,
        encryptor: TransportEncryptor,
        token_validity: Duration,
    ) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            token_codec,
            encryptor,
            token_validity,
        }
    }

    /// Create an authenticator from base64 encoded key material.
    ///
    /// # Errors
    /// * `JwtError::InvalidKeyConfiguration` - Signing secret unusable
    /// * `EncryptionError::InvalidKeyConfiguration` - Encryption key unusable
    pub fn from_base64_keys(
        signing_secret: &str,
        encryption_key: &str,
        token_validity: Duration,
    ) -> Result<Self, AuthenticationError> {
        let token_codec = TokenCodec::new(JwtHandler::from_base64_secret(signing_secret)?);
        let encryptor = TransportEncryptor::from_base64_key(encryption_key)?;

        Ok(Self::new(token_codec, encryptor, token_validity))
    }

    pub fn token_codec(&self) -> &TokenCodec {
        &self.token_codec
    }

    pub fn encryptor(&self) -> &TransportEncryptor {
        &self.encryptor
    }

    pub fn token_validity(&self) -> Duration {
        self.token_validity
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and issue an encrypted access token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `principal` - Identity the token is issued for
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash is unreadable
    /// * `JwtError` / `EncryptionError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        principal: Principal,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.issue_access_token(&principal)?;

        Ok(AuthenticationResult {
            access_token,
            authentication: Authentication::Credential(principal),
        })
    }

    /// Fail a login for an identity that does not exist.
    ///
    /// Spends one password verification so the outcome matches a wrong
    /// password in message and cost.
    pub fn reject_unknown_identity(&self, password: &str) -> AuthenticationError {
        self.password_hasher.verify_dummy(password);
        AuthenticationError::InvalidCredentials
    }

    /// Sign a token for `principal` and seal it in a transport envelope.
    ///
    /// # Errors
    /// * `JwtError` - Token signing failed
    /// * `EncryptionError` - Envelope encryption failed
    pub fn issue_access_token(&self, principal: &Principal) -> Result<String, AuthenticationError> {
        let token = self.token_codec.issue(principal, self.token_validity)?;
        Ok(self.encryptor.encrypt(&token)?)
    }

    /// Open a bearer envelope and rebuild the principal it carries.
    ///
    /// # Errors
    /// * `EncryptionError::DecryptionFailed` - Envelope cannot be opened
    /// * `JwtError::TokenInvalid` - Bad signature or expired
    /// * `JwtError::MalformedToken` / `JwtError::InvalidIdentifier` - Bad claims
    pub fn authenticate_bearer(&self, envelope: &str) -> Result<Authentication, AuthenticationError> {
        let token = self.encryptor.decrypt(envelope)?;

        if !self.token_codec.verify(&token) {
            return Err(JwtError::TokenInvalid.into());
        }

        let principal = self.token_codec.decode(&token)?;
        Ok(Authentication::Token(principal))
    }
}
