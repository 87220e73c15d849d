use auth::PrincipalView;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::CurrentPrincipal;

/// The principal the request was authenticated as.
pub async fn current_principal(
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<ApiSuccess<PrincipalView>, ApiError> {
    Ok(ApiSuccess::new(StatusCode::OK, principal.view()))
}
