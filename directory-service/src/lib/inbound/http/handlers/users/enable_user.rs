use std::str::FromStr;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::user::models::EnableUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::users::parse_identifier;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

/// Disabling scrubbed the contact fields; both must come back.
#[derive(Debug, Deserialize)]
pub struct EnableUserRequest {
    pub email: String,
    pub phone: String,
}

pub async fn enable_user(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(body): Json<EnableUserRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    email_address::EmailAddress::from_str(&body.email)
        .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid email: {}", e)))?;

    state
        .user_service
        .enable(
            &parse_identifier(&identifier),
            EnableUserCommand {
                email: body.email,
                phone: body.phone,
            },
        )
        .await
        .map_err(ApiError::from)
        .map(|user| ApiSuccess::new(StatusCode::OK, user))
}
