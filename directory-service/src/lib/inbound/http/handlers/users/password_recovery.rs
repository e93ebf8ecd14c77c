use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::users::parse_identifier;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct RequestPasswordRecoveryRequest {
    /// E-mail or cpf of the account to recover.
    pub login: String,
    pub frontend_url: String,
}

pub async fn request_password_recovery(
    State(state): State<AppState>,
    Json(body): Json<RequestPasswordRecoveryRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    state
        .user_service
        .request_password_recovery(&parse_identifier(&body.login), &body.frontend_url)
        .await
        .map_err(ApiError::from)
        .map(|()| ApiSuccess::new(StatusCode::OK, ()))
}

#[derive(Debug, Deserialize)]
pub struct RecoverPasswordRequest {
    pub password: String,
}

pub async fn recover_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<RecoverPasswordRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    state
        .user_service
        .recover_password(&token, &body.password)
        .await
        .map_err(ApiError::from)
        .map(|()| ApiSuccess::new(StatusCode::OK, ()))
}
