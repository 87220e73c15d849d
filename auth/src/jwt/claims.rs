use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;
use crate::authority::ROLE_PREFIX;
use crate::principal::Principal;
use crate::principal::PrincipalId;
use crate::principal::Profile;

/// Flat claim set carried by an access token.
///
/// Only arrays of strings nest; there is no version field. Roles travel
/// without their `ROLE_` prefix and permissions as `RESOURCE:ACTION`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Subject (contact identifier)
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Principal identifier (UUID string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub activated: bool,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub permissions: Vec<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Create claims for a principal valid from `issued_at` for `validity`.
    ///
    /// `exp` is the end of the window rounded up to the next whole second.
    pub fn for_principal(principal: &Principal, issued_at: DateTime<Utc>, validity: Duration) -> Self {
        let profile = principal.profile();

        Self {
            sub: principal.email().to_string(),
            email: Some(principal.email().to_string()),
            id: Some(principal.id().to_string()),
            name: profile.name.clone(),
            surname: profile.surname.clone(),
            phone_number: profile.phone_number.clone(),
            activated: principal.enabled(),
            roles: principal.role_names(),
            permissions: principal.permission_authorities(),
            iat: issued_at.timestamp(),
            exp: expiry_timestamp(issued_at, validity),
        }
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = exp;
        self
    }

    /// Authorities rebuilt from the embedded role and permission lists.
    pub fn authorities(&self) -> BTreeSet<String> {
        self.roles
            .iter()
            .map(|role| format!("{}{}", ROLE_PREFIX, role))
            .chain(self.permissions.iter().cloned())
            .collect()
    }

    /// Rebuild the principal carried by these claims.
    ///
    /// # Errors
    /// * `MalformedToken` - The `id` claim is absent
    /// * `InvalidIdentifier` - The `id` claim is not a UUID
    pub fn into_principal(self) -> Result<Principal, JwtError> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| JwtError::MalformedToken("missing required 'id' claim".to_string()))?;

        let id = PrincipalId::from_string(id)
            .map_err(|e| JwtError::InvalidIdentifier(e.to_string()))?;

        let authorities = self.authorities();

        Ok(Principal::new(
            id,
            self.sub,
            Profile {
                name: self.name,
                surname: self.surname,
                phone_number: self.phone_number,
            },
            self.activated,
            authorities,
        ))
    }
}

/// Unix second at which a window opened at `issued_at` has closed.
fn expiry_timestamp(issued_at: DateTime<Utc>, validity: Duration) -> i64 {
    let Some(expires_at) = issued_at.checked_add_signed(validity) else {
        return i64::MAX;
    };

    if expires_at.timestamp_subsec_nanos() > 0 {
        expires_at.timestamp() + 1
    } else {
        expires_at.timestamp()
    }
}

/// A token is valid while `now < exp`. `exp` is a whole second, so the
/// floored timestamp of `now` compares exactly.
pub(crate) fn window_elapsed(exp: i64, now: DateTime<Utc>) -> bool {
    now.timestamp() >= exp
}
