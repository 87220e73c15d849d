use std::fmt;
use std::str::FromStr;

pub use auth::PrincipalId as UserId;
use auth::Principal;
use auth::Profile;
use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::EmailError;

/// User aggregate entity.
///
/// Carries its role graph fully materialized so a principal can be built
/// without a second lookup.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub profile: Profile,
    pub activated: bool,
    pub roles: Vec<AssignedRole>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build the principal for this user from its role graph.
    pub fn principal(&self) -> Principal {
        Principal::from_roles(
            self.id,
            self.email.as_str(),
            self.profile.clone(),
            self.activated,
            self.roles.iter().map(|assigned| &assigned.role),
        )
    }
}

/// Role unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleId(pub Uuid);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored role together with its permission graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedRole {
    pub id: RoleId,
    pub role: Role,
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Login attempt with a contact identifier and plaintext secret.
///
/// The email is kept raw so that a malformed one fails exactly like an
/// unknown one.
#[derive(Debug)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

/// Successful login: encrypted access token plus the principal it carries.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub authentication: auth::Authentication,
}

/// Command to create a new user with domain types
#[derive(Debug)]
pub struct CreateUserCommand {
    pub email: EmailAddress,
    pub password: String,
    pub profile: Profile,
    pub activated: Option<bool>,
    pub role_ids: Vec<RoleId>,
}

/// Command to update an existing user with optional validated fields.
///
/// All fields are optional to support partial updates.
#[derive(Debug, Default)]
pub struct UpdateUserCommand {
    pub email: Option<EmailAddress>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
    pub activated: Option<bool>,
}

/// Command to replace a user's own password.
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}
