//! Stateless authentication and authorization primitives
//!
//! Provides the identity core shared by the services:
//! - Authority resolution from a role → permission graph
//! - Signed access tokens carrying a flat principal claim set (HS256)
//! - AES-256-GCM transport envelopes around those tokens
//! - Password hashing (Argon2id)
//! - Ownership checks against the current principal
//!
//! No component performs I/O. Identity lookup is left to the caller, which
//! hands an already materialized role graph to [`Principal::from_roles`].
//!
//! # Examples
//!
//! ## Authority resolution
//! ```
//! use auth::authority::{resolve_authorities, Permission, Role};
//!
//! let roles = vec![
//!     Role::new("ADMIN").with_permissions([Permission::new("USER", "READ")]),
//!     Role::new("VIEWER").with_permissions([Permission::new("USER", "READ")]),
//! ];
//! let authorities = resolve_authorities(&roles);
//! assert_eq!(authorities.len(), 3);
//! assert!(authorities.contains("ROLE_ADMIN"));
//! assert!(authorities.contains("USER:READ"));
//! ```
//!
//! ## Complete Authentication Flow
//! ```
//! use auth::{Authenticator, JwtHandler, Principal, PrincipalId, Profile, TokenCodec, TransportEncryptor};
//! use auth::authority::Role;
//! use chrono::Duration;
//!
//! let authenticator = Authenticator::new(
//!     TokenCodec::new(JwtHandler::new(b"secret_key_at_least_32_bytes_long!").unwrap()),
//!     TransportEncryptor::new(&[1u8; 32]).unwrap(),
//!     Duration::minutes(60),
//! );
//!
//! // Register: hash password
//! let hash = authenticator.hash_password("password123").unwrap();
//!
//! // Login: verify and issue an encrypted token
//! let roles = vec![Role::new("USER")];
//! let principal = Principal::from_roles(PrincipalId::new(), "a@x.com", Profile::default(), true, &roles);
//! let result = authenticator.authenticate("password123", &hash, principal).unwrap();
//!
//! // Subsequent request: open the bearer envelope
//! let authentication = authenticator.authenticate_bearer(&result.access_token).unwrap();
//! assert!(authentication.principal().has_authority("ROLE_USER"));
//! ```
//!
//! ## Ownership
//! ```
//! use auth::{OwnershipGuard, Principal, PrincipalId, Profile};
//!
//! let principal = Principal::new(PrincipalId::new(), "a@x.com", Profile::default(), true, Default::default());
//! let guard = OwnershipGuard::new(&principal);
//! assert!(guard.check_ownership(&principal.id()).is_ok());
//! assert!(guard.check_strict_ownership(&PrincipalId::new()).is_err());
//! ```

pub mod authenticator;
pub mod authority;
pub mod authorization;
pub mod encryption;
pub mod jwt;
pub mod password;
pub mod principal;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::AuthenticationResult;
pub use authenticator::Authenticator;
pub use authority::Permission;
pub use authority::Role;
pub use authorization::require_authority;
pub use authorization::AuthorizationError;
pub use authorization::OwnershipGuard;
pub use encryption::EncryptionError;
pub use encryption::TransportEncryptor;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenClaims;
pub use jwt::TokenCodec;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use principal::Authentication;
pub use principal::Principal;
pub use principal::PrincipalId;
pub use principal::PrincipalView;
pub use principal::Profile;
