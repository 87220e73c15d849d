use std::sync::Arc;

use auth::Authentication;
use auth::Authenticator;
use auth::Principal;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::public_paths::PublicPaths;

const BEARER_PREFIX: &str = "Bearer ";

/// Shared state of the authentication gate.
#[derive(Clone)]
pub struct AuthGate {
    pub authenticator: Arc<Authenticator>,
    pub public_paths: Arc<PublicPaths>,
}

/// Middleware that opens bearer envelopes and attaches the principal to the
/// request extensions.
///
/// Public paths and requests without a bearer credential pass through
/// unauthenticated; rejecting those is left to [`CurrentPrincipal`]. A
/// bearer credential that fails any check ends the request with a uniform
/// 401, the cause is only logged.
pub async fn authenticate(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    if gate.public_paths.matches(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let Some(envelope) = bearer_credential(&req) else {
        return Ok(next.run(req).await);
    };

    let authentication = gate
        .authenticator
        .authenticate_bearer(envelope)
        .map_err(|e| {
            tracing::warn!(
                path = %req.uri().path(),
                error = %e,
                "Bearer authentication failed"
            );
            ApiError::Unauthorized("Invalid or expired token".to_string()).into_response()
        })?;

    tracing::debug!(
        principal_id = %authentication.principal().id(),
        method = authentication.method(),
        "Request authenticated"
    );

    req.extensions_mut().insert(authentication);

    Ok(next.run(req).await)
}

fn bearer_credential(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
}

/// Extractor for the principal attached by [`authenticate`].
///
/// Rejects with 401 when the request carries no authentication.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Authentication>()
            .map(|authentication| CurrentPrincipal(authentication.principal().clone()))
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
