use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use auth::OwnershipGuard;
use auth::Principal;
use chrono::Utc;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::CreateUserCommand;
use crate::domain::user::models::RoleId;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user operations.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    password_hasher: auth::PasswordHasher,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    pub fn new(repository: Arc<UR>) -> Self {
        Self {
            repository,
            password_hasher: auth::PasswordHasher::new(),
        }
    }

    async fn existing_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn create_user(&self, command: CreateUserCommand) -> Result<User, UserError> {
        let requested: BTreeSet<_> = command.role_ids.iter().map(|id| id.0).collect();
        let role_ids: Vec<RoleId> = requested.iter().copied().map(RoleId).collect();

        let roles = if role_ids.is_empty() {
            Vec::new()
        } else {
            self.repository.find_roles_by_ids(&role_ids).await?
        };

        if roles.len() != role_ids.len() {
            let missing: Vec<String> = role_ids
                .iter()
                .filter(|id| !roles.iter().any(|found| found.id == **id))
                .map(ToString::to_string)
                .collect();
            return Err(UserError::RolesNotFound(missing.join(", ")));
        }

        let password_hash = self.password_hasher.hash(&command.password)?;

        let user = User {
            id: UserId::new(),
            email: command.email,
            password_hash,
            profile: command.profile,
            activated: command.activated.unwrap_or(true),
            roles,
            created_at: Utc::now(),
        };

        let created_user = self.repository.create(user).await?;

        tracing::info!(
            user_id = %created_user.id,
            roles = created_user.roles.len(),
            "User created"
        );

        Ok(created_user)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.existing_user(id).await
    }

    async fn update_user(
        &self,
        actor: &Principal,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        OwnershipGuard::new(actor).check_ownership(id)?;

        let mut user = self.existing_user(id).await?;

        if let Some(email) = command.email {
            user.email = email;
        }
        if let Some(name) = command.name {
            user.profile.name = Some(name);
        }
        if let Some(surname) = command.surname {
            user.profile.surname = Some(surname);
        }
        if let Some(phone_number) = command.phone_number {
            user.profile.phone_number = Some(phone_number);
        }
        if let Some(activated) = command.activated {
            user.activated = activated;
        }

        let updated_user = self.repository.update(user).await?;

        tracing::info!(user_id = %updated_user.id, actor_id = %actor.id(), "User updated");

        Ok(updated_user)
    }

    async fn change_password(
        &self,
        actor: &Principal,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        OwnershipGuard::new(actor).check_strict_ownership(id)?;

        let mut user = self.existing_user(id).await?;

        if !self
            .password_hasher
            .verify(&command.current_password, &user.password_hash)?
        {
            tracing::warn!(user_id = %id, "Password change rejected: current password mismatch");
            return Err(UserError::InvalidCredentials);
        }

        user.password_hash = self.password_hasher.hash(&command.new_password)?;
        self.repository.update(user).await?;

        tracing::info!(user_id = %id, "Password changed");

        Ok(())
    }

    async fn delete_user(&self, actor: &Principal, id: &UserId) -> Result<(), UserError> {
        OwnershipGuard::new(actor).check_ownership(id)?;

        self.repository.delete(id).await?;

        tracing::info!(user_id = %id, actor_id = %actor.id(), "User deleted");

        Ok(())
    }
}
