use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::authority;
use crate::authority::Role;
use crate::authority::ADMIN_AUTHORITY;
use crate::authority::ROLE_PREFIX;

/// Error for PrincipalId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrincipalIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Unique identifier of an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Generate a new random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, PrincipalIdError> {
        Uuid::parse_str(s)
            .map(PrincipalId)
            .map_err(|e| PrincipalIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PrincipalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Optional display fields of an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
}

/// The authenticated identity attached to a request.
///
/// Immutable once built. Fields are private so that nothing downstream can
/// widen the authority set after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: PrincipalId,
    email: String,
    profile: Profile,
    enabled: bool,
    authorities: BTreeSet<String>,
}

impl Principal {
    /// Build a principal from an already flattened authority set.
    pub fn new(
        id: PrincipalId,
        email: impl Into<String>,
        profile: Profile,
        enabled: bool,
        authorities: BTreeSet<String>,
    ) -> Self {
        Self {
            id,
            email: email.into(),
            profile,
            enabled,
            authorities,
        }
    }

    /// Build a principal by resolving a role graph into authorities.
    pub fn from_roles<'a, I>(
        id: PrincipalId,
        email: impl Into<String>,
        profile: Profile,
        enabled: bool,
        roles: I,
    ) -> Self
    where
        I: IntoIterator<Item = &'a Role>,
    {
        Self::new(
            id,
            email,
            profile,
            enabled,
            authority::resolve_authorities(roles),
        )
    }

    pub fn id(&self) -> PrincipalId {
        self.id
    }

    /// Contact identifier (email).
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    /// Human readable name, falling back to the email.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [&self.profile.name, &self.profile.surname]
            .into_iter()
            .flatten()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.email.clone()
        } else {
            parts.join(" ")
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }

    pub fn is_admin(&self) -> bool {
        self.has_authority(ADMIN_AUTHORITY)
    }

    /// Role names (without `ROLE_`) contained in the authority set.
    pub fn role_names(&self) -> Vec<String> {
        self.authorities
            .iter()
            .filter(|a| authority::is_role_authority(a))
            .map(|a| a[ROLE_PREFIX.len()..].to_string())
            .collect()
    }

    /// Permission authorities (`RESOURCE:ACTION`) contained in the authority set.
    pub fn permission_authorities(&self) -> Vec<String> {
        self.authorities
            .iter()
            .filter(|a| !authority::is_role_authority(a))
            .cloned()
            .collect()
    }

    /// Public-safe view of the principal.
    pub fn view(&self) -> PrincipalView {
        PrincipalView {
            id: self.id.to_string(),
            email: self.email.clone(),
            name: self.profile.name.clone(),
            surname: self.profile.surname.clone(),
            phone_number: self.profile.phone_number.clone(),
            activated: self.enabled,
            authorities: self.authorities.iter().cloned().collect(),
        }
    }
}

/// Serializable view of a principal returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
    pub activated: bool,
    pub authorities: Vec<String>,
}

/// How the principal of the current request was established.
///
/// Both variants carry the same payload; consumers that only need the
/// identity call [`Authentication::principal`] without matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Built from a verified credential at login.
    Credential(Principal),
    /// Built from a verified and decoded bearer token.
    Token(Principal),
}

impl Authentication {
    pub fn principal(&self) -> &Principal {
        match self {
            Authentication::Credential(principal) | Authentication::Token(principal) => principal,
        }
    }

    pub fn into_principal(self) -> Principal {
        match self {
            Authentication::Credential(principal) | Authentication::Token(principal) => principal,
        }
    }

    /// Name of the construction path, for logging.
    pub fn method(&self) -> &'static str {
        match self {
            Authentication::Credential(_) => "credential",
            Authentication::Token(_) => "token",
        }
    }
}
