use std::str::FromStr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::ports::UserServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub department_id: Uuid,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_manager: bool,
}

impl RegisterUserRequest {
    fn try_into_command(self) -> Result<RegisterUserCommand, ApiError> {
        email_address::EmailAddress::from_str(&self.email)
            .map_err(|e| ApiError::UnprocessableEntity(format!("Invalid email: {}", e)))?;

        if self.cpf.len() != 11 || !self.cpf.chars().all(|c| c.is_ascii_digit()) {
            return Err(ApiError::UnprocessableEntity(
                "Invalid cpf: expected 11 digits".to_string(),
            ));
        }

        Ok(RegisterUserCommand {
            department_id: self.department_id,
            name: self.name,
            cpf: self.cpf,
            email: self.email,
            phone: self.phone,
            is_manager: self.is_manager,
        })
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    let command = body.try_into_command()?;

    state
        .user_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|user| ApiSuccess::new(StatusCode::CREATED, user))
}
