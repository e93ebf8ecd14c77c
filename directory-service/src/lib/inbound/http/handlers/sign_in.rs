use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    login: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<ApiSuccess<SignInResponse>, ApiError> {
    state
        .user_service
        .sign_in(&body.login, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|token| ApiSuccess::new(StatusCode::OK, SignInResponse { token }))
}
