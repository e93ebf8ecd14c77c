use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::department::models::CreateDepartmentCommand;
use crate::domain::department::models::Department;
use crate::domain::department::ports::DepartmentServicePort;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub manager_id: Option<Uuid>,
}

pub async fn create_department(
    State(state): State<AppState>,
    Json(body): Json<CreateDepartmentRequest>,
) -> Result<ApiSuccess<Department>, ApiError> {
    state
        .department_service
        .create(CreateDepartmentCommand {
            name: body.name,
            acronym: body.acronym,
            description: body.description,
            email: body.email,
            phone: body.phone,
            manager_id: body.manager_id,
        })
        .await
        .map_err(ApiError::from)
        .map(|department| ApiSuccess::new(StatusCode::CREATED, department))
}
