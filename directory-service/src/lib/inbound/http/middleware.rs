use axum::extract::Request;
use axum::extract::State;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::domain::auth::errors::AuthError;
use crate::domain::user::models::User;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::router::AppState;

/// Resolved principal stored in request extensions by the JWT middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Validate the bearer token and resolve it into a principal.
///
/// The principal comes from the cache when fresh enough, otherwise from the
/// store; either way handlers see the same `CurrentUser` extension.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?;

    let claims = state.auth_service.verify_session(token).map_err(|e| {
        tracing::warn!(error = %e, "Session token rejected");
        ApiError::from(e).into_response()
    })?;

    let principal = state
        .auth_service
        .resolve_principal(&claims)
        .await
        .map_err(|e: AuthError| ApiError::from(e).into_response())?;

    req.extensions_mut().insert(CurrentUser(principal));

    Ok(next.run(req).await)
}

/// Gate for administrative routes: the principal must currently manage a
/// department.
pub async fn require_manager(req: Request, next: Next) -> Result<Response, Response> {
    let is_manager = req
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.0.management.is_some());

    if !is_manager {
        return Err(ApiError::Forbidden(
            "The user must be a manager to perform this action".to_string(),
        )
        .into_response());
    }

    Ok(next.run(req).await)
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| {
            ApiError::Unauthorized("Missing Authorization header".to_string()).into_response()
        })?;

    let auth_str = auth_header.to_str().map_err(|_| {
        ApiError::Unauthorized("Invalid Authorization header".to_string()).into_response()
    })?;

    if !auth_str.starts_with("Bearer ") {
        return Err(ApiError::Unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>".to_string(),
        )
        .into_response());
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}
