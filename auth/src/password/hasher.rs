use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// Secret hashed once and used to burn a verification for unknown identities.
const DUMMY_SECRET: &str = "identity-not-found";

/// Well-formed hash with default Argon2id parameters, used when the dummy
/// secret cannot be hashed. It matches no password.
const FALLBACK_DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$YE3IuTVZfo/QCEezoVHNlA$lnw+4Uqn2HiS67SDmibjgUyzBaSmrVntgqrMKzaVxew";

/// Salted password hashing (Argon2id, PHC string format).
///
/// Verification is delegated to the argon2 crate, which compares digests in
/// constant time.
#[derive(Default)]
pub struct PasswordHasher {
    dummy_hash: OnceLock<String>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext password with a random salt.
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `InvalidHash` - Stored hash is not a valid PHC string
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Run a full verification against a fixed hash and discard the result.
    ///
    /// Used when the identity does not exist so the failure costs the same
    /// as a wrong password.
    pub fn verify_dummy(&self, password: &str) {
        let dummy_hash = self.dummy_hash.get_or_init(|| {
            self.hash(DUMMY_SECRET).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to hash dummy secret, using fallback hash");
                FALLBACK_DUMMY_HASH.to_string()
            })
        });

        let _ = self.verify(password, dummy_hash);
    }
}
