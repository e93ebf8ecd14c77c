use std::str::FromStr;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::users::parse_identifier;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_verified: Option<bool>,
    pub department_id: Option<Uuid>,
    pub is_manager: Option<bool>,
    #[serde(default)]
    pub reset_password: bool,
}

impl UpdateUserRequest {
    fn try_into_command(self) -> Result<UpdateUserCommand, ApiError> {
        if let Some(email) = &self.email {
            email_address::EmailAddress::from_str(email)
                .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid email: {}", e)))?;
        }

        Ok(UpdateUserCommand {
            name: self.name,
            cpf: self.cpf,
            email: self.email,
            phone: self.phone,
            is_verified: self.is_verified,
            department_id: self.department_id,
            is_manager: self.is_manager,
            reset_password: self.reset_password,
        })
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    let command = body.try_into_command()?;

    state
        .user_service
        .update(&parse_identifier(&identifier), command)
        .await
        .map_err(ApiError::from)
        .map(|user| ApiSuccess::new(StatusCode::OK, user))
}
