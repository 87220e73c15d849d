use async_trait::async_trait;
use auth::Principal;

use crate::domain::user::models::AssignedRole;
use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::LoginOutcome;
use crate::domain::user::models::RoleId;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for the login use case.
#[async_trait]
pub trait CredentialVerifierPort: Send + Sync + 'static {
    /// Verify a contact identifier and password, then issue an access token.
    ///
    /// # Arguments
    /// * `command` - Email and plaintext password
    ///
    /// # Returns
    /// Encrypted access token and the credential-built principal
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password, indistinguishable
    /// * `TokenIssuance` - Token signing or encryption failed
    /// * `DatabaseError` - Identity lookup failed
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, UserError>;
}

/// Port for user domain service operations.
///
/// Mutating operations take the acting principal so that ownership is
/// checked inside the use case, before anything is written.
#[async_trait]
pub trait UserServicePort: Send + Sync + 'static {
    /// Create new user with the given roles.
    ///
    /// # Errors
    /// * `RolesNotFound` - At least one role id does not exist
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Update profile fields of a user owned by `actor` (administrators may
    /// update anyone).
    ///
    /// # Errors
    /// * `Forbidden` - Actor neither owns the account nor is an administrator
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update_user(
        &self,
        actor: &Principal,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError>;

    /// Replace the password of the actor's own account.
    ///
    /// No administrator override applies.
    ///
    /// # Errors
    /// * `Forbidden` - Actor is not the account owner
    /// * `NotFound` - User does not exist
    /// * `InvalidCredentials` - Current password does not match
    /// * `DatabaseError` - Database operation failed
    async fn change_password(
        &self,
        actor: &Principal,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;

    /// Delete a user owned by `actor` (administrators may delete anyone).
    ///
    /// # Errors
    /// * `Forbidden` - Actor neither owns the account nor is an administrator
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete_user(&self, actor: &Principal, id: &UserId) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user together with its role assignments.
    ///
    /// # Errors
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: User) -> Result<User, UserError>;

    /// Retrieve user by identifier, roles and permissions included.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by email address, roles and permissions included.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;

    /// Retrieve roles with their permissions.
    ///
    /// # Returns
    /// Found roles (missing ids are skipped without error)
    async fn find_roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<AssignedRole>, UserError>;

    /// Update scalar fields of an existing user. Role assignments are unchanged.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(&self, user: User) -> Result<User, UserError>;

    /// Remove user from storage.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn delete(&self, id: &UserId) -> Result<(), UserError>;
}
