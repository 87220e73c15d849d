use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::create_user::create_user;
use super::handlers::current_principal::current_principal;
use super::handlers::delete_user::delete_user;
use super::handlers::get_user::get_user;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::update_user::update_user;
use super::middleware::authenticate;
use super::middleware::AuthGate;
use super::public_paths::PublicPaths;
use crate::domain::user::ports::CredentialVerifierPort;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServicePort>,
    pub credential_verifier: Arc<dyn CredentialVerifierPort>,
}

/// Build the HTTP application.
///
/// The authentication gate wraps every route, so it has run before any
/// handler or extractor sees the request.
pub fn create_router(
    user_service: Arc<dyn UserServicePort>,
    credential_verifier: Arc<dyn CredentialVerifierPort>,
    authenticator: Arc<Authenticator>,
    public_paths: PublicPaths,
) -> Router {
    let state = AppState {
        user_service,
        credential_verifier,
    };

    let gate = AuthGate {
        authenticator,
        public_paths: Arc::new(public_paths),
    };

    let routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(current_principal))
        .route("/api/users", post(create_user))
        .route(
            "/api/users/:user_id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/users/:user_id/password", put(change_password));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    routes
        .layer(middleware::from_fn_with_state(gate, authenticate))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
