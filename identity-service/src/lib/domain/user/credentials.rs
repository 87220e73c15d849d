use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::LoginOutcome;
use crate::user::errors::UserError;
use crate::user::ports::CredentialVerifierPort;
use crate::user::ports::UserRepository;

/// Login use case: resolves the identity, checks its password and issues
/// an encrypted access token.
///
/// Unknown and malformed emails spend the same password verification as a
/// wrong password and fail with the same error.
pub struct CredentialVerifier<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> CredentialVerifier<UR>
where
    UR: UserRepository,
{
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }
}

#[async_trait]
impl<UR> CredentialVerifierPort for CredentialVerifier<UR>
where
    UR: UserRepository,
{
    async fn login(&self, command: LoginCommand) -> Result<LoginOutcome, UserError> {
        let user = match EmailAddress::new(command.email) {
            Ok(email) => self.repository.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            tracing::info!("Login rejected: unknown identity");
            return Err(self
                .authenticator
                .reject_unknown_identity(&command.password)
                .into());
        };

        let result = self
            .authenticator
            .authenticate(&command.password, &user.password_hash, user.principal())
            .map_err(|e| {
                tracing::info!(user_id = %user.id, error = %e, "Login rejected");
                UserError::from(e)
            })?;

        tracing::info!(
            user_id = %user.id,
            method = result.authentication.method(),
            "Login succeeded"
        );

        Ok(LoginOutcome {
            access_token: result.access_token,
            authentication: result.authentication,
        })
    }
}
