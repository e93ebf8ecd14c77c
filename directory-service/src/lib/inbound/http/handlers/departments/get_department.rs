use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;

use crate::domain::department::models::Department;
use crate::domain::department::models::DepartmentIdentifier;
use crate::domain::department::ports::DepartmentServicePort;
use crate::inbound::http::handlers::departments::parse_identifier;
use crate::inbound::http::handlers::ApiError;
use crate::inbound::http::handlers::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn get_department(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<ApiSuccess<Department>, ApiError> {
    state
        .department_service
        .read_one(&parse_identifier(&identifier))
        .await
        .map_err(ApiError::from)
        .map(|department| ApiSuccess::new(StatusCode::OK, department))
}

pub async fn get_department_by_acronym(
    State(state): State<AppState>,
    Path(acronym): Path<String>,
) -> Result<ApiSuccess<Department>, ApiError> {
    state
        .department_service
        .read_one(&DepartmentIdentifier::Acronym(acronym))
        .await
        .map_err(ApiError::from)
        .map(|department| ApiSuccess::new(StatusCode::OK, department))
}
