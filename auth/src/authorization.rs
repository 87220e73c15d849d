use thiserror::Error;

use crate::principal::Principal;
use crate::principal::PrincipalId;

/// Authenticated but not allowed to act on the resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("You do not have permission to access this resource")]
    Forbidden,
}

/// Per-resource ownership checks for the current principal.
///
/// Callers pick the variant deliberately: [`OwnershipGuard::check_ownership`]
/// lets administrators act on any resource, while
/// [`OwnershipGuard::check_strict_ownership`] never does.
#[derive(Debug, Clone, Copy)]
pub struct OwnershipGuard<'a> {
    principal: &'a Principal,
}

impl<'a> OwnershipGuard<'a> {
    pub fn new(principal: &'a Principal) -> Self {
        Self { principal }
    }

    /// Succeeds when the principal owns the resource or holds `ROLE_ADMIN`.
    ///
    /// # Errors
    /// * `Forbidden` - Principal is neither owner nor administrator
    pub fn check_ownership(&self, resource_owner_id: &PrincipalId) -> Result<(), AuthorizationError> {
        if self.principal.id() == *resource_owner_id || self.principal.is_admin() {
            return Ok(());
        }

        tracing::warn!(
            principal_id = %self.principal.id(),
            resource_owner_id = %resource_owner_id,
            "Ownership check denied"
        );
        Err(AuthorizationError::Forbidden)
    }

    /// Succeeds only when the principal owns the resource. No admin override.
    ///
    /// # Errors
    /// * `Forbidden` - Principal is not the owner
    pub fn check_strict_ownership(
        &self,
        resource_owner_id: &PrincipalId,
    ) -> Result<(), AuthorizationError> {
        if self.principal.id() == *resource_owner_id {
            return Ok(());
        }

        tracing::warn!(
            principal_id = %self.principal.id(),
            resource_owner_id = %resource_owner_id,
            "Strict ownership check denied"
        );
        Err(AuthorizationError::Forbidden)
    }

    /// Identifier of the current principal, for ownership-filtered queries.
    pub fn current_user_id(&self) -> PrincipalId {
        self.principal.id()
    }
}

/// Require a single authority (role or permission) on the principal.
///
/// # Errors
/// * `Forbidden` - Authority is not granted
pub fn require_authority(principal: &Principal, authority: &str) -> Result<(), AuthorizationError> {
    if principal.has_authority(authority) {
        Ok(())
    } else {
        tracing::warn!(
            principal_id = %principal.id(),
            authority,
            "Missing required authority"
        );
        Err(AuthorizationError::Forbidden)
    }
}
