use std::str::FromStr;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use crate::domain::user::models::UpdateMeCommand;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::middleware::CurrentUser;
use crate::inbound::http::router::AppState;

pub async fn get_me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiSuccess<User> {
    ApiSuccess::new(StatusCode::OK, user)
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub frontend_url: String,
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<UpdateMeRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    if let Some(email) = &body.email {
        email_address::EmailAddress::from_str(email)
            .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid email: {}", e)))?;
    }

    state
        .user_service
        .update_me(
            &user,
            UpdateMeCommand {
                name: body.name,
                phone: body.phone,
                email: body.email,
                frontend_url: body.frontend_url,
            },
        )
        .await
        .map_err(ApiError::from)
        .map(|updated| ApiSuccess::new(StatusCode::OK, updated))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
    pub new_password: String,
}

pub async fn update_my_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    state
        .user_service
        .update_password(&user, &body.password, &body.new_password)
        .await
        .map_err(ApiError::from)
        .map(|updated| ApiSuccess::new(StatusCode::OK, updated))
}

pub async fn verify_my_email(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(token): Path<String>,
) -> Result<ApiSuccess<User>, ApiError> {
    state
        .user_service
        .verify_email(&user, &token)
        .await
        .map_err(ApiError::from)
        .map(|updated| ApiSuccess::new(StatusCode::OK, updated))
}
