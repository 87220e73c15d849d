use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde_json::Value;

use super::claims::window_elapsed;
use super::claims::TokenClaims;
use super::errors::JwtError;
use super::handler::JwtHandler;
use crate::principal::Principal;

/// Issues and reads principal-bearing access tokens.
///
/// `verify` is the cheap yes/no check; `decode` repeats the same
/// verification before trusting any claim, so a principal is never built
/// from an unverified token. A token is valid while `now < exp`.
pub struct TokenCodec {
    handler: JwtHandler,
}

impl TokenCodec {
    pub fn new(handler: JwtHandler) -> Self {
        Self { handler }
    }

    /// Issue a token for `principal`, valid for `validity` from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn issue(&self, principal: &Principal, validity: Duration) -> Result<String, JwtError> {
        self.issue_at(principal, validity, Utc::now())
    }

    /// Issue a token with an explicit issue instant.
    pub fn issue_at(
        &self,
        principal: &Principal,
        validity: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = TokenClaims::for_principal(principal, issued_at, validity);
        self.handler.encode(&claims)
    }

    /// Signature valid and validity window not elapsed.
    pub fn verify(&self, token: &str) -> bool {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.verified_payload(token, now).is_ok()
    }

    /// Verify the token and rebuild its principal from the embedded claims.
    ///
    /// # Errors
    /// * `TokenInvalid` - Bad signature or expired
    /// * `MalformedToken` - Claims do not have the expected shape or lack `id`
    /// * `InvalidIdentifier` - `id` claim is not a UUID
    pub fn decode(&self, token: &str) -> Result<Principal, JwtError> {
        self.decode_at(token, Utc::now())
    }

    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, JwtError> {
        self.verified_claims(token, now)?.into_principal()
    }

    /// Subject (contact identifier) of a verified token.
    ///
    /// # Errors
    /// * `TokenInvalid` - Bad signature or expired
    /// * `MalformedToken` - Claims do not have the expected shape
    pub fn subject(&self, token: &str) -> Result<String, JwtError> {
        self.verified_claims(token, Utc::now())
            .map(|claims| claims.sub)
    }

    fn verified_claims(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, JwtError> {
        let payload = self.verified_payload(token, now)?;

        serde_json::from_value(payload).map_err(|e| {
            tracing::warn!(error = %e, "Verified token has malformed claims");
            JwtError::MalformedToken(e.to_string())
        })
    }

    fn verified_payload(&self, token: &str, now: DateTime<Utc>) -> Result<Value, JwtError> {
        let payload: Value = self.handler.decode(token)?;

        let expires_at = payload
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(JwtError::TokenInvalid)?;

        if window_elapsed(expires_at, now) {
            tracing::debug!(expires_at, "Token validity window elapsed");
            return Err(JwtError::TokenInvalid);
        }

        Ok(payload)
    }
}
